//! Keyword scanning over English narration.
//!
//! The validator needs to know what a narration *asserts happened to the
//! player*. [`NarrativeScanner::scan`] tokenizes the text, finds effect
//! keywords, and tags each hit with its grammatical subject and whether a
//! negation or intention marker suppresses it. Everything here is a
//! token-window heuristic; it never looks past the current sentence.

use std::collections::HashSet;

/// Kind of effect a keyword asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// An item entered the inventory.
    ItemGain,
    /// An item left the inventory.
    ItemLoss,
    /// The subject took damage.
    Damage,
    /// The subject arrived somewhere.
    Movement,
    /// The subject learned a skill.
    SkillLearned,
}

impl Effect {
    /// Short label used in findings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ItemGain => "item gain",
            Self::ItemLoss => "item loss",
            Self::Damage => "damage",
            Self::Movement => "movement",
            Self::SkillLearned => "skill learned",
        }
    }
}

/// Who a keyword applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The player character.
    Player,
    /// Anyone or anything else.
    Other,
}

/// One keyword hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// What the keyword asserts.
    pub effect: Effect,
    /// The keyword as it appears in the trigger table.
    pub keyword: &'static str,
    /// Resolved subject.
    pub subject: Subject,
    /// A negation or intention marker precedes the keyword.
    pub suppressed: bool,
    /// Index of the sentence the keyword sits in, from zero.
    pub sentence: usize,
}

impl Mention {
    /// Whether the narration claims this effect actually happened to the player.
    pub fn asserted(&self) -> bool {
        !self.suppressed && self.subject == Subject::Player
    }
}

// ---------------------------------------------------------------------------
// Trigger tables
// ---------------------------------------------------------------------------

const GAIN: &[&str] = &[
    "obtain", "obtains", "obtained", "receive", "receives", "received", "acquire", "acquires",
    "acquired", "pick up", "picks up", "picked up", "collect", "collects", "collected", "harvest",
    "harvests", "harvested", "granted", "bestowed",
];

const LOSE: &[&str] = &[
    "lose", "loses", "lost", "drop", "drops", "dropped", "hand over", "hands over", "handed over",
    "gave away", "give away", "surrender", "surrenders", "surrendered", "consume", "consumed",
    "used up",
];

const DAMAGE: &[&str] = &[
    "struck", "wounded", "injured", "hurt", "bleed", "bleeds", "bleeding", "bled",
    "cough up blood", "coughs up blood", "coughed up blood", "slashed", "pierced", "burned",
    "burnt", "knocked back", "thrown back",
];

const MOVE: &[&str] = &[
    "arrive", "arrives", "arrived", "enter", "enters", "entered", "reach", "reaches", "reached",
    "step into", "steps into", "stepped into", "walk into", "walks into", "walked into",
    "make your way to", "made your way to",
];

const SKILL: &[&str] = &[
    "learn", "learns", "learned", "learnt", "mastered", "comprehend", "comprehends",
    "comprehended", "grasp", "grasps", "grasped",
];

/// Nouns that follow acquisition or loss verbs without being items.
pub const ABSTRACT_NOUNS: &[&str] = &[
    "nod", "glance", "look", "welcome", "answer", "reply", "response", "insight", "insights",
    "news", "message", "word", "words", "greeting", "respect", "attention", "blessing", "lecture",
    "lesson", "warning", "advice", "guidance", "instruction", "instructions", "praise",
    "approval", "permission", "rebuke", "scolding", "smile", "thought", "thoughts", "feeling",
    "sense", "chance", "opportunity", "enlightenment", "understanding", "favor", "favour",
    "trust", "glimpse", "hint", "impression", "idea", "experience", "qi", "energy", "strength",
    "courage", "confidence", "comfort", "peace", "information", "knowledge", "breath", "memory",
    "memories", "track", "way", "balance", "footing", "consciousness", "sight", "focus",
    "patience", "interest", "hope", "control", "composure", "face", "nerve", "heart", "count",
    "time", "yourself", "temper", "concentration", "ground",
];

const VITALS: &[&str] = &["hp", "hit", "health", "blood", "vitality", "life"];
const MANA: &[&str] = &["mp", "mana", "qi", "spiritual", "energy"];

const MOVE_EXCLUSIONS: &[&str] = &[
    "trance", "meditation", "meditative", "seclusion", "state", "combat", "battle", "stance",
    "realm", "stage", "agreement", "contest", "for", "out", "conclusion", "decision",
];
const SKILL_EXCLUSIONS: &[&str] = &[
    "that", "of", "about", "from", "nothing", "hilt", "hand", "hands", "arm", "sword", "blade",
    "handle", "rope", "edge",
];
const DAMAGE_EXCLUSIONS: &[&str] = &[
    "pride", "feelings", "beauty", "thought", "realization", "inspiration", "idea", "awe",
    "wonder", "sight", "incense",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nor", "without", "fail", "fails", "failed", "cannot", "barely",
    "nearly", "almost",
];
const INTENTIONS: &[&str] = &[
    "want", "wants", "wanted", "plan", "plans", "planned", "intend", "intends", "intended",
    "hope", "hopes", "hoped", "try", "tries", "tried", "attempt", "attempts", "prepare",
    "prepares", "prepared", "about", "could", "would", "might", "may", "will", "if", "should",
];
const CLAUSE_BREAKS: &[&str] = &["but", "yet", "however", "though", "although"];

const PLAYER_MARKERS: &[&str] = &["you", "your", "yourself", "you're", "you've"];
const OTHER_MARKERS: &[&str] = &[
    "he", "she", "it", "they", "him", "her", "them", "his", "its", "their", "beast", "lion",
    "wolf", "creature", "monster", "demon", "elder", "disciple", "disciples", "brother",
    "sister", "master", "enemy", "opponent", "foe", "cultivator", "bandit", "bandits", "man",
    "woman", "figure", "guard", "stranger", "incense", "candle", "lantern", "fire", "flames",
    "torch", "bell", "gong",
];
const ARTICLES: &[&str] = &["a", "an", "the"];
const FILLERS: &[&str] = &[
    "a", "an", "the", "your", "his", "her", "their", "its", "some", "all", "of", "any", "my",
];

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Token {
    word: String,
    sentence: usize,
    clause: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut sentence: usize = 0;
    let mut clause: usize = 0;

    let mut flush = |current: &mut String, sentence: usize, clause: &mut usize| {
        let trimmed = current.trim_matches('\'');
        let word = trimmed.strip_suffix("'s").unwrap_or(trimmed).to_owned();
        current.clear();
        if word.is_empty() {
            return;
        }
        if CLAUSE_BREAKS.contains(&word.as_str()) {
            *clause = clause.saturating_add(1);
        }
        tokens.push(Token {
            word,
            sentence,
            clause: *clause,
        });
    };

    for c in text.chars() {
        let c = if c == '\u{2019}' { '\'' } else { c };
        if c.is_alphanumeric() || c == '\'' {
            current.extend(c.to_lowercase());
            continue;
        }
        flush(&mut current, sentence, &mut clause);
        match c {
            '.' | '!' | '?' | '\n' => {
                sentence = sentence.saturating_add(1);
                clause = clause.saturating_add(1);
            }
            ';' | ':' => clause = clause.saturating_add(1),
            _ => {}
        }
    }
    flush(&mut current, sentence, &mut clause);
    tokens
}

fn contains(table: &[&str], word: &str) -> bool {
    table.contains(&word)
}

/// The first word after `end` that is not an article or possessive.
fn object_after(tokens: &[Token], end: usize, sentence: usize) -> Option<&str> {
    tokens
        .get(end..)?
        .iter()
        .take_while(|t| t.sentence == sentence)
        .map(|t| t.word.as_str())
        .find(|w| !contains(FILLERS, w))
}

fn window_after(tokens: &[Token], end: usize, sentence: usize, width: usize) -> Vec<&str> {
    tokens
        .get(end..)
        .unwrap_or_default()
        .iter()
        .take_while(|t| t.sentence == sentence)
        .take(width)
        .map(|t| t.word.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Finds effect keywords and resolves who they apply to.
#[derive(Debug, Clone)]
pub struct NarrativeScanner {
    other_markers: HashSet<String>,
    triggers: Vec<(Effect, &'static str, Vec<&'static str>)>,
}

impl NarrativeScanner {
    /// Build a scanner that also treats every word of `npc_names` as a
    /// non-player subject marker.
    pub fn new<I, S>(npc_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut other_markers: HashSet<String> =
            OTHER_MARKERS.iter().map(|w| (*w).to_owned()).collect();
        for name in npc_names {
            for token in tokenize(name.as_ref()) {
                if !contains(ARTICLES, &token.word) && token.word != "of" {
                    other_markers.insert(token.word);
                }
            }
        }

        let tables = [
            (Effect::ItemGain, GAIN),
            (Effect::ItemLoss, LOSE),
            (Effect::Damage, DAMAGE),
            (Effect::Movement, MOVE),
            (Effect::SkillLearned, SKILL),
        ];
        let mut triggers: Vec<(Effect, &'static str, Vec<&'static str>)> = tables
            .into_iter()
            .flat_map(|(effect, table)| {
                table
                    .iter()
                    .map(move |phrase| (effect, *phrase, phrase.split(' ').collect::<Vec<_>>()))
            })
            .collect();
        // Longest phrases first so "cough up blood" wins over any prefix.
        triggers.sort_by_key(|(_, _, words)| std::cmp::Reverse(words.len()));

        Self {
            other_markers,
            triggers,
        }
    }

    /// Every keyword hit in `text`, in reading order.
    pub fn scan(&self, text: &str) -> Vec<Mention> {
        let tokens = tokenize(text);
        let mut mentions = Vec::new();
        let mut index = 0;
        while index < tokens.len() {
            let hit = self.triggers.iter().find(|(_, _, words)| {
                index
                    .checked_add(words.len())
                    .and_then(|end| tokens.get(index..end))
                    .is_some_and(|span| span.iter().zip(words).all(|(t, w)| t.word == *w))
            });
            let Some((effect, keyword, words)) = hit else {
                index = index.saturating_add(1);
                continue;
            };
            let end = index.saturating_add(words.len());
            if let Some(mention) = self.classify(&tokens, index, end, *effect, keyword) {
                mentions.push(mention);
            }
            index = end;
        }
        mentions
    }

    /// Subject of whatever follows `prefix`, judged from the end of its
    /// last sentence.
    pub fn subject_before(&self, prefix: &str) -> Subject {
        let tokens = tokenize(prefix);
        let end = tokens.len();
        let sentence = tokens.last().map_or(0, |t| t.sentence);
        // A prefix ending in punctuation starts a fresh sentence.
        let closed = prefix
            .trim_end()
            .ends_with(['.', '!', '?']);
        if closed {
            return Subject::Player;
        }
        self.subject_back(&tokens, end, sentence)
    }

    fn classify(
        &self,
        tokens: &[Token],
        start: usize,
        end: usize,
        effect: Effect,
        keyword: &'static str,
    ) -> Option<Mention> {
        let first = tokens.get(start)?;
        let sentence = first.sentence;
        let single_word = end.saturating_sub(start) == 1;

        // "a drop of blood", "the wounded": noun usage.
        if single_word
            && start
                .checked_sub(1)
                .and_then(|i| tokens.get(i))
                .is_some_and(|prev| prev.sentence == sentence && contains(ARTICLES, &prev.word))
        {
            return None;
        }

        let object = object_after(tokens, end, sentence);
        let ahead = window_after(tokens, end, sentence, 4);
        let effect = match effect {
            Effect::ItemLoss => {
                if ahead.iter().any(|w| contains(VITALS, w)) {
                    Effect::Damage
                } else if ahead.iter().any(|w| contains(MANA, w))
                    || object.is_some_and(|w| contains(ABSTRACT_NOUNS, w))
                {
                    return None;
                } else {
                    Effect::ItemLoss
                }
            }
            Effect::ItemGain if object.is_some_and(|w| contains(ABSTRACT_NOUNS, w)) => return None,
            Effect::Movement if ahead.iter().any(|w| contains(MOVE_EXCLUSIONS, w)) => return None,
            Effect::SkillLearned
                if tokens
                    .get(end)
                    .filter(|t| t.sentence == sentence)
                    .is_some_and(|t| contains(SKILL_EXCLUSIONS, &t.word))
                    || object.is_some_and(|w| contains(SKILL_EXCLUSIONS, w)) =>
            {
                return None;
            }
            Effect::Damage if object.is_some_and(|w| contains(DAMAGE_EXCLUSIONS, w)) => {
                return None;
            }
            other => other,
        };

        let mut subject = self.subject_back(tokens, start, sentence);
        if subject == Subject::Other
            && matches!(effect, Effect::ItemGain | Effect::Damage)
            && Self::player_object(tokens, end, sentence)
        {
            subject = Subject::Player;
        }

        Some(Mention {
            effect,
            keyword,
            subject,
            suppressed: Self::suppressed(tokens, start, first.clause),
            sentence,
        })
    }

    /// Nearest subject marker before `start` in the same sentence. Default
    /// player.
    fn subject_back(&self, tokens: &[Token], start: usize, sentence: usize) -> Subject {
        tokens
            .get(..start)
            .unwrap_or_default()
            .iter()
            .rev()
            .take_while(|t| t.sentence == sentence)
            .find_map(|t| {
                if contains(PLAYER_MARKERS, &t.word) {
                    Some(Subject::Player)
                } else if self.other_markers.contains(&t.word) {
                    Some(Subject::Other)
                } else {
                    None
                }
            })
            .unwrap_or(Subject::Player)
    }

    /// "struck your shoulder", "granted you", "bestowed upon you".
    fn player_object(tokens: &[Token], end: usize, sentence: usize) -> bool {
        let ahead = window_after(tokens, end, sentence, 2);
        match ahead.as_slice() {
            [first, ..] if contains(PLAYER_MARKERS, first) => true,
            ["upon" | "to" | "on", second, ..] => contains(PLAYER_MARKERS, second),
            _ => false,
        }
    }

    /// A negation or intention marker within four tokens back, same clause.
    fn suppressed(tokens: &[Token], start: usize, clause: usize) -> bool {
        tokens
            .get(..start)
            .unwrap_or_default()
            .iter()
            .rev()
            .take(4)
            .take_while(|t| t.clause == clause)
            .any(|t| {
                contains(NEGATIONS, &t.word)
                    || contains(INTENTIONS, &t.word)
                    || t.word.ends_with("n't")
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scanner() -> NarrativeScanner {
        NarrativeScanner::new(["Elder Chen", "Frostflame Lion", "Senior Sister Hong"])
    }

    fn asserted(text: &str) -> Vec<Effect> {
        scanner()
            .scan(text)
            .into_iter()
            .filter(Mention::asserted)
            .map(|m| m.effect)
            .collect()
    }

    #[test]
    fn player_damage_is_asserted() {
        let effects = asserted("You are struck and lose 15 hit points.");
        assert_eq!(effects, [Effect::Damage, Effect::Damage]);
    }

    #[test]
    fn beast_damage_is_not_player_damage() {
        let mentions = scanner().scan("The beast is struck and bleeds.");
        assert_eq!(mentions.len(), 2);
        assert!(mentions.iter().all(|m| m.subject == Subject::Other));
        assert!(asserted("The beast is struck and bleeds.").is_empty());
    }

    #[test]
    fn npc_names_are_subject_markers() {
        assert!(asserted("Frostflame Lion is wounded by the blow.").is_empty());
        assert!(asserted("Elder Chen receives the scroll from a servant.").is_empty());
    }

    #[test]
    fn direct_object_you_makes_the_player_the_target() {
        assert_eq!(asserted("The lion's claw slashed your arm."), [Effect::Damage]);
        assert_eq!(
            asserted("Elder Chen bestowed upon you a Jade Slip."),
            [Effect::ItemGain]
        );
        assert!(asserted("The lion is struck by your sword.").is_empty());
    }

    #[test]
    fn negation_and_intention_suppress() {
        assert!(asserted("You did not obtain anything.").is_empty());
        assert!(asserted("You wanted to enter the library.").is_empty());
        assert!(asserted("You plan to learn the Cloud Step.").is_empty());
        assert!(asserted("You never arrived.").is_empty());
    }

    #[test]
    fn clause_break_ends_negation_scope() {
        assert_eq!(
            asserted("You do not flinch but are wounded."),
            [Effect::Damage]
        );
    }

    #[test]
    fn abstract_objects_are_ignored() {
        assert!(asserted("You receive a nod of approval.").is_empty());
        assert!(asserted("You lose your footing on the stairs.").is_empty());
        assert!(asserted("You lose 10 qi holding the barrier.").is_empty());
        assert!(asserted("You enter a deep meditative trance.").is_empty());
        assert!(asserted("You learned that the elder was away.").is_empty());
        assert!(asserted("A drop of blood falls.").is_empty());
    }

    #[test]
    fn effects_are_classified() {
        assert_eq!(asserted("You picked up a Spirit Stone."), [Effect::ItemGain]);
        assert_eq!(asserted("You hand over the Iron Sword."), [Effect::ItemLoss]);
        assert_eq!(asserted("You arrive at the Sutra Library."), [Effect::Movement]);
        assert_eq!(asserted("You comprehended the Cloud Step."), [Effect::SkillLearned]);
        assert_eq!(asserted("You cough up blood."), [Effect::Damage]);
    }

    #[test]
    fn subject_before_reads_the_open_sentence() {
        let scanner = scanner();
        assert_eq!(scanner.subject_before("The elder"), Subject::Other);
        assert_eq!(scanner.subject_before("The beast roars. You"), Subject::Player);
        assert_eq!(scanner.subject_before("The beast roars."), Subject::Player);
        assert_eq!(scanner.subject_before(""), Subject::Player);
    }
}
