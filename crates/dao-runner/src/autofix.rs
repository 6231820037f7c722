//! Level 3: derive a best-effort delta from the narration itself.
//!
//! Runs only after the Director's retry still fails validation. Extracted
//! facts fill gaps in the proposed delta and never override it. Damage is
//! only taken from an explicit number, and a destination is only kept if
//! the world graph can resolve it and the player could walk there.

use dao_types::{LocationId, PlayerState, StateDelta};
use dao_world::WorldGraph;
use regex::Regex;
use tracing::{debug, info};

use crate::error::RunnerError;
use crate::narrative::{ABSTRACT_NOUNS, NarrativeScanner, Subject};
use crate::validator::movement_refusal;

/// Longest item name, in words, that extraction will keep.
const MAX_ITEM_WORDS: usize = 4;

/// Longest destination phrase, in words, tried against the world graph.
const MAX_PLACE_WORDS: usize = 6;

const LEADING_FILLERS: &[&str] = &[
    "a", "an", "the", "some", "your", "one", "two", "three", "several", "few", "pair", "of",
];

const ITEM_STOPWORDS: &[&str] = &[
    "from", "with", "which", "that", "as", "before", "while", "in", "at", "to", "for", "into",
    "onto", "on", "by", "who", "he", "she", "they", "it", "after", "then",
];

/// What the auto-fixer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    /// The proposed delta with extracted facts merged in.
    pub delta: StateDelta,
    /// One line per change, for the log.
    pub notes: Vec<String>,
}

/// Pattern table for Level-3 extraction.
#[derive(Debug, Clone)]
pub struct AutoFixer {
    gain: Regex,
    damage: Regex,
    movement: Regex,
}

impl AutoFixer {
    /// Compile the pattern table.
    pub fn new() -> Result<Self, RunnerError> {
        Ok(Self {
            gain: Regex::new(
                r"(?i)\b(?:obtain(?:s|ed)?|receive(?:s|d)?|acquire(?:s|d)?|pick(?:s|ed)?\s+up|collect(?:s|ed)?|harvest(?:s|ed)?|granted|bestowed)(?:\s+(?:upon|to))?(?P<you>\s+you)?\s+(?P<items>[^.,;:!?\n]+)",
            )?,
            damage: Regex::new(
                r"(?i)\b(?:lose|loses|lost|take|takes|took|suffer|suffers|suffered)\s+(?P<amount>\d{1,4})\s*(?:points?\s+of\s+damage|hit\s+points?|hp|health|vitality|damage)\b",
            )?,
            movement: Regex::new(
                r"(?i)\b(?:arrive(?:s|d)?\s+(?:at|in)|enter(?:s|ed)?|reach(?:es|ed)?|step(?:s|ped)?\s+into|walk(?:s|ed)?\s+into|ma(?:k|d)e\s+your\s+way\s+to)\s+(?P<place>[^.,;:!?\n]+)",
            )?,
        })
    }

    /// Fill gaps in `delta` from the narration.
    ///
    /// `known_items` (inventory plus whatever the location may hand out)
    /// lets lower-case mentions resolve to their canonical spelling;
    /// unknown items are only accepted when written as a proper name. A
    /// location the graph does not know, or one `state` cannot reach this
    /// turn, is removed before extraction.
    pub fn repair(
        &self,
        narration: &str,
        delta: &StateDelta,
        scanner: &NarrativeScanner,
        graph: &WorldGraph,
        state: &PlayerState,
        known_items: &[String],
    ) -> Repair {
        let mut notes = Vec::new();
        let mut fixed = delta.clone();
        if let Some(location) = &fixed.location_id {
            if !graph.contains(location) {
                notes.push(format!("dropped unknown location '{location}'"));
                fixed.location_id = None;
            } else if movement_refusal(graph, state, location).is_some() {
                notes.push(format!("dropped unreachable location '{location}'"));
                fixed.location_id = None;
            }
        }

        let mut extracted = StateDelta::none();
        extracted.items_gained = self.extract_items(narration, scanner, known_items);
        extracted.hp_change = self.extract_damage(narration, scanner);
        extracted.location_id =
            self.extract_destination(narration, scanner, graph, state, &mut notes);

        if fixed.items_gained.is_empty() && !extracted.items_gained.is_empty() {
            notes.push(format!("added items {:?}", extracted.items_gained));
        }
        if fixed.hp_change == 0 && extracted.hp_change != 0 {
            notes.push(format!("set hp_change {}", extracted.hp_change));
        }
        if fixed.location_id.is_none()
            && let Some(location) = &extracted.location_id
        {
            notes.push(format!("set location_id {location}"));
        }
        fixed.merge_missing(extracted);

        for note in &notes {
            info!(fix = %note, "auto-fix");
        }
        Repair {
            delta: fixed,
            notes,
        }
    }

    fn extract_items(
        &self,
        narration: &str,
        scanner: &NarrativeScanner,
        known_items: &[String],
    ) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        for captures in self.gain.captures_iter(narration) {
            let (Some(whole), Some(list)) = (captures.get(0), captures.name("items")) else {
                continue;
            };
            let prefix = narration.get(..whole.start()).unwrap_or_default();
            if captures.name("you").is_none() && scanner.subject_before(prefix) == Subject::Other
            {
                continue;
            }
            for part in list.as_str().split(" and ") {
                if let Some(item) = clean_item(part, known_items)
                    && !items.contains(&item)
                {
                    items.push(item);
                }
            }
        }
        items
    }

    fn extract_damage(&self, narration: &str, scanner: &NarrativeScanner) -> i32 {
        self.damage
            .captures_iter(narration)
            .find_map(|captures| {
                let whole = captures.get(0)?;
                let prefix = narration.get(..whole.start()).unwrap_or_default();
                if scanner.subject_before(prefix) != Subject::Player {
                    debug!(matched = whole.as_str(), "damage number belongs to someone else");
                    return None;
                }
                captures.name("amount")?.as_str().parse::<i32>().ok()
            })
            .map_or(0, i32::saturating_neg)
    }

    fn extract_destination(
        &self,
        narration: &str,
        scanner: &NarrativeScanner,
        graph: &WorldGraph,
        state: &PlayerState,
        notes: &mut Vec<String>,
    ) -> Option<LocationId> {
        for captures in self.movement.captures_iter(narration) {
            let (Some(whole), Some(place)) = (captures.get(0), captures.name("place")) else {
                continue;
            };
            let prefix = narration.get(..whole.start()).unwrap_or_default();
            if scanner.subject_before(prefix) != Subject::Player {
                continue;
            }
            let words: Vec<&str> = place.as_str().split_whitespace().collect();
            let longest = words.len().min(MAX_PLACE_WORDS);
            let resolved = (1..=longest).rev().find_map(|len| {
                let phrase = words.get(..len)?.join(" ");
                graph.resolve(&phrase).map(|location| location.id.clone())
            });
            match resolved {
                Some(id) if movement_refusal(graph, state, &id).is_none() => return Some(id),
                Some(id) => notes.push(format!("dropped unreachable destination '{id}'")),
                None => notes.push(format!(
                    "dropped unresolvable destination '{}'",
                    place.as_str().trim()
                )),
            }
        }
        None
    }
}

/// Turn a captured phrase into an item name, or reject it.
fn clean_item(raw: &str, known_items: &[String]) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| !w.is_empty())
        .skip_while(|w| LEADING_FILLERS.contains(&w.to_lowercase().as_str()))
        .take_while(|w| !ITEM_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .take(MAX_ITEM_WORDS)
        .collect();
    let (first, last) = (words.first()?, words.last()?);
    if [first, last]
        .iter()
        .any(|w| ABSTRACT_NOUNS.contains(&w.to_lowercase().as_str()))
    {
        return None;
    }

    let phrase = words.join(" ");
    if let Some(known) = known_items
        .iter()
        .find(|known| known.eq_ignore_ascii_case(&phrase))
    {
        return Some(known.clone());
    }
    words
        .iter()
        .all(|w| w.chars().next().is_some_and(char::is_uppercase))
        .then_some(phrase)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use dao_types::{PlayerId, Tier};
    use dao_world::starting_world;

    use super::*;

    fn player_at(location: &str, tier: Tier) -> PlayerState {
        PlayerState {
            id: PlayerId::new(),
            name: "Lin".to_owned(),
            tier,
            hp: 100,
            max_hp: 100,
            mp: 50,
            max_mp: 50,
            karma: 0,
            location_id: LocationId::new(location),
            location_name: String::new(),
            inventory: Vec::new(),
            skills: BTreeSet::new(),
            cultivation_progress: 0,
            breakthrough_attempts: 0,
            experience: 0,
            current_tick: 0,
            created_at: Utc::now(),
        }
    }

    fn fix_for(state: &PlayerState, narration: &str, delta: &StateDelta) -> Repair {
        let scanner = NarrativeScanner::new(["Elder Chen", "Frostflame Lion"]);
        let known = vec!["Jade Slip".to_owned(), "Healing Herb".to_owned()];
        AutoFixer::new().unwrap().repair(
            narration,
            delta,
            &scanner,
            &starting_world().unwrap(),
            state,
            &known,
        )
    }

    fn fix(narration: &str, delta: &StateDelta) -> Repair {
        fix_for(&player_at("qingyun_plaza", Tier::FLOOR), narration, delta)
    }

    #[test]
    fn items_follow_gain_verbs() {
        let repair = fix(
            "You obtain a jade slip and a Spirit Stone from the altar.",
            &StateDelta::none(),
        );
        assert_eq!(repair.delta.items_gained, ["Jade Slip", "Spirit Stone"]);
        assert_eq!(repair.notes.len(), 1);
    }

    #[test]
    fn gifts_to_you_count_even_after_an_npc_subject() {
        let repair = fix("Elder Chen granted you a Healing Herb.", &StateDelta::none());
        assert_eq!(repair.delta.items_gained, ["Healing Herb"]);

        let repair = fix("Elder Chen received a Spirit Stone.", &StateDelta::none());
        assert!(repair.delta.items_gained.is_empty());
    }

    #[test]
    fn abstract_and_generic_objects_are_rejected() {
        let repair = fix(
            "You receive a nod of approval. You obtain a small pouch.",
            &StateDelta::none(),
        );
        assert!(repair.delta.items_gained.is_empty());
        assert!(repair.notes.is_empty());
    }

    #[test]
    fn damage_needs_an_explicit_number() {
        let repair = fix(
            "The lion rakes your side and you lose 12 hit points.",
            &StateDelta::none(),
        );
        assert_eq!(repair.delta.hp_change, -12);

        let repair = fix("You are wounded badly.", &StateDelta::none());
        assert_eq!(repair.delta.hp_change, 0);
    }

    #[test]
    fn npc_damage_numbers_are_ignored() {
        let repair = fix("The Frostflame Lion takes 30 damage.", &StateDelta::none());
        assert_eq!(repair.delta.hp_change, 0);
    }

    #[test]
    fn destinations_resolve_to_canonical_ids() {
        let elder = player_at("qingyun_plaza", Tier::new(2, 0).unwrap());
        let repair = fix_for(
            &elder,
            "You make your way to the Scripture Pavilion and bow.",
            &StateDelta::none(),
        );
        assert_eq!(
            repair.delta.location_id,
            Some(LocationId::new("qingyun_library"))
        );
    }

    #[test]
    fn unreachable_destinations_are_never_extracted() {
        let narration = "You make your way to the Scripture Pavilion and bow.";
        let repair = fix(narration, &StateDelta::none());
        assert!(repair.delta.location_id.is_none());
        assert_eq!(repair.notes, ["dropped unreachable destination 'qingyun_library'"]);

        let proposed = StateDelta {
            location_id: Some(LocationId::new("qingyun_library")),
            ..StateDelta::default()
        };
        let repair = fix_for(&player_at("qingyun_foot", Tier::FLOOR), narration, &proposed);
        assert!(repair.delta.location_id.is_none());
        assert!(repair.notes.iter().any(|note| note.starts_with("dropped unreachable location")));
    }

    #[test]
    fn unresolvable_destinations_are_dropped() {
        let delta = StateDelta {
            location_id: Some(LocationId::new("Cloud Palace")),
            ..StateDelta::default()
        };
        let repair = fix("You arrive at the Cloud Palace.", &delta);
        assert!(repair.delta.location_id.is_none());
        assert_eq!(repair.notes.len(), 2);
    }

    #[test]
    fn extraction_never_overrides_the_proposal() {
        let delta = StateDelta {
            hp_change: -5,
            items_gained: vec!["Iron Sword".to_owned()],
            ..StateDelta::default()
        };
        let repair = fix("You obtain a Spirit Stone and lose 40 hit points.", &delta);
        assert_eq!(repair.delta.hp_change, -5);
        assert_eq!(repair.delta.items_gained, ["Iron Sword"]);
    }
}
