//! Narration/state consistency checks.
//!
//! Level 1 findings are warnings: implausible magnitudes and state changes
//! the narration never mentions. Level 2 findings are errors: the
//! narration asserts something the delta does not carry, the delta points
//! outside the world graph, or applying it would drive a vital negative.
//! Errors send the Director back for another attempt.

use std::collections::BTreeSet;
use std::fmt;

use dao_core::config::ValidatorConfig;
use dao_types::{LocationId, PlayerState, StateDelta};
use dao_world::{MovementCheck, WorldGraph, validate_movement};

use crate::narrative::{Effect, Mention, NarrativeScanner};

/// Word stems that count as the narration acknowledging an HP change.
const HP_WORDS: &[&str] = &[
    "hp", "hit point", "health", "vitality", "wound", "hurt", "injur", "heal", "blood",
    "damage", "pain", "struck", "strike", "bruise", "recover",
];

/// Word stems that count as the narration acknowledging an MP change.
const MP_WORDS: &[&str] = &[
    "mp", "mana", "qi", "spiritual energy", "spirit energy", "meridian", "drain", "exhaust",
    "energy", "dantian",
];

/// Severity of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logged, never blocks.
    Warning,
    /// Triggers a Director retry.
    Error,
}

/// A single consistency rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// HP loss above the plausibility cap.
    HpLossCap,
    /// HP gain above the plausibility cap.
    HpGainCap,
    /// Karma swing above the plausibility cap.
    KarmaCap,
    /// MP loss above the plausibility cap.
    MpLossCap,
    /// Experience award above the plausibility cap.
    ExperienceCap,
    /// The delta changes something the narration never mentions.
    Unmentioned,
    /// Healing would overshoot max HP (clamped on apply).
    HpOverflow,
    /// Narration says the player obtained an item, delta gains none.
    ItemGain,
    /// Narration says the player lost an item, delta loses none.
    ItemLoss,
    /// Narration says the player was hurt, delta does not reduce HP.
    PlayerDamage,
    /// Narration says the player arrived somewhere and the delta does not
    /// move, or the delta moves somewhere the player cannot walk to.
    Movement,
    /// Narration says the player learned a skill, delta learns none.
    SkillLearned,
    /// Delta moves to an id that is not in the world graph.
    UnknownLocation,
    /// Delta would take HP below zero.
    NegativeHp,
    /// Delta would take MP below zero.
    NegativeMp,
}

impl Rule {
    /// Severity of this rule.
    pub const fn level(self) -> Level {
        match self {
            Self::HpLossCap
            | Self::HpGainCap
            | Self::KarmaCap
            | Self::MpLossCap
            | Self::ExperienceCap
            | Self::Unmentioned
            | Self::HpOverflow => Level::Warning,
            Self::ItemGain
            | Self::ItemLoss
            | Self::PlayerDamage
            | Self::Movement
            | Self::SkillLearned
            | Self::UnknownLocation
            | Self::NegativeHp
            | Self::NegativeMp => Level::Error,
        }
    }

    const fn for_effect(effect: Effect) -> Self {
        match effect {
            Effect::ItemGain => Self::ItemGain,
            Effect::ItemLoss => Self::ItemLoss,
            Effect::Damage => Self::PlayerDamage,
            Effect::Movement => Self::Movement,
            Effect::SkillLearned => Self::SkillLearned,
        }
    }
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The rule that fired.
    pub rule: Rule,
    /// Human-readable detail, also fed back to the Director.
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of validating one Director decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Level 2 findings.
    pub errors: Vec<Finding>,
    /// Level 1 findings.
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    /// No Level 2 findings.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether a given rule produced an error.
    #[cfg(test)]
    pub fn has_error(&self, rule: Rule) -> bool {
        self.errors.iter().any(|finding| finding.rule == rule)
    }

    /// The error list as Director feedback.
    pub fn feedback(&self) -> String {
        self.errors
            .iter()
            .map(|finding| format!("- {finding}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, rule: Rule, message: String) {
        let finding = Finding { rule, message };
        match rule.level() {
            Level::Warning => self.warnings.push(finding),
            Level::Error => self.errors.push(finding),
        }
    }
}

/// Levels 1 and 2 of the consistency pipeline.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    config: ValidatorConfig,
    scanner: NarrativeScanner,
}

impl ConsistencyValidator {
    /// Build a validator. `npc_names` are treated as non-player subjects.
    pub fn new<I, S>(config: &ValidatorConfig, npc_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            config: config.clone(),
            scanner: NarrativeScanner::new(npc_names),
        }
    }

    /// The scanner, shared with the auto-fixer.
    pub const fn scanner(&self) -> &NarrativeScanner {
        &self.scanner
    }

    /// Check `delta` against `narration`, the current state, and the map.
    ///
    /// The delta's location must already have been through
    /// [`WorldGraph::canonicalize_location`].
    pub fn validate(
        &self,
        narration: &str,
        delta: &StateDelta,
        state: &PlayerState,
        graph: &WorldGraph,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check_assertions(narration, delta, &mut report);
        Self::check_unmentioned(narration, delta, state, graph, &mut report);
        self.check_magnitudes(delta, &mut report);
        Self::check_bounds(delta, state, &mut report);

        if let Some(location) = &delta.location_id {
            if !graph.contains(location) {
                report.push(
                    Rule::UnknownLocation,
                    format!("location_id '{location}' does not exist on the map"),
                );
            } else if let Some(reason) = movement_refusal(graph, state, location) {
                report.push(
                    Rule::Movement,
                    format!(
                        "location_id '{location}' cannot be reached from '{}': {reason}",
                        state.location_id
                    ),
                );
            }
        }
        report
    }

    fn check_assertions(&self, narration: &str, delta: &StateDelta, report: &mut ValidationReport) {
        let mentions = self.scanner.scan(narration);
        let mut reported = BTreeSet::new();
        for mention in mentions.iter().filter(|m| m.asserted()) {
            if reflected(mention, delta) || !reported.insert(mention.effect.label()) {
                continue;
            }
            let message = match mention.effect {
                Effect::ItemGain => format!(
                    "the narration says '{}' but items_gained is empty",
                    mention.keyword
                ),
                Effect::ItemLoss => format!(
                    "the narration says '{}' but items_lost is empty",
                    mention.keyword
                ),
                Effect::Damage => format!(
                    "the narration says the player is '{}' but hp_change is {}",
                    mention.keyword, delta.hp_change
                ),
                Effect::Movement => format!(
                    "the narration says '{}' but location_id is not set",
                    mention.keyword
                ),
                Effect::SkillLearned => format!(
                    "the narration says '{}' but skills_gained is empty",
                    mention.keyword
                ),
            };
            report.push(Rule::for_effect(mention.effect), message);
        }
    }

    fn check_unmentioned(
        narration: &str,
        delta: &StateDelta,
        state: &PlayerState,
        graph: &WorldGraph,
        report: &mut ValidationReport,
    ) {
        let lowered = narration.to_lowercase();
        let named = |thing: &str| lowered.contains(&thing.to_lowercase());
        if delta.hp_change != 0 && !mentions_any(&lowered, HP_WORDS) {
            report.push(
                Rule::Unmentioned,
                format!("hp_change is {} but the narration never mentions health", delta.hp_change),
            );
        }
        if delta.mp_change != 0 && !mentions_any(&lowered, MP_WORDS) {
            report.push(
                Rule::Unmentioned,
                format!("mp_change is {} but the narration never mentions qi", delta.mp_change),
            );
        }
        if let Some(location) = &delta.location_id
            && *location != state.location_id
            && !named(location.as_str())
            && !graph.display_name(location).is_some_and(named)
        {
            report.push(
                Rule::Unmentioned,
                format!("location_id moves to '{location}' but the narration never names it"),
            );
        }
        for item in delta.items_gained.iter().filter(|item| !named(item.as_str())) {
            report.push(
                Rule::Unmentioned,
                format!("items_gained adds '{item}' but the narration never names it"),
            );
        }
        for item in delta.items_lost.iter().filter(|item| !named(item.as_str())) {
            report.push(
                Rule::Unmentioned,
                format!("items_lost removes '{item}' but the narration never names it"),
            );
        }
        for skill in delta.skills_gained.iter().filter(|skill| !named(skill.as_str())) {
            report.push(
                Rule::Unmentioned,
                format!("skills_gained adds '{skill}' but the narration never names it"),
            );
        }
    }

    fn check_magnitudes(&self, delta: &StateDelta, report: &mut ValidationReport) {
        let hp = i64::from(delta.hp_change);
        if hp.saturating_neg() > i64::from(self.config.hp_loss_cap) {
            report.push(Rule::HpLossCap, format!("hp_change {hp} is an implausibly large loss"));
        }
        if hp > i64::from(self.config.hp_gain_cap) {
            report.push(Rule::HpGainCap, format!("hp_change {hp} is an implausibly large gain"));
        }
        if delta.karma_change.unsigned_abs() > self.config.karma_cap {
            report.push(
                Rule::KarmaCap,
                format!("karma_change {} is an implausibly large swing", delta.karma_change),
            );
        }
        if i64::from(delta.mp_change).saturating_neg() > i64::from(self.config.mp_loss_cap) {
            report.push(
                Rule::MpLossCap,
                format!("mp_change {} is an implausibly large drain", delta.mp_change),
            );
        }
        if delta.experience_gained > self.config.experience_cap {
            report.push(
                Rule::ExperienceCap,
                format!(
                    "experience_gained {} is an implausibly large award",
                    delta.experience_gained
                ),
            );
        }
    }

    fn check_bounds(delta: &StateDelta, state: &PlayerState, report: &mut ValidationReport) {
        let hp_after = i64::from(state.hp).saturating_add(i64::from(delta.hp_change));
        if hp_after < 0 {
            report.push(
                Rule::NegativeHp,
                format!(
                    "hp_change {} would take HP from {} to {hp_after}",
                    delta.hp_change, state.hp
                ),
            );
        } else if hp_after > i64::from(state.max_hp) {
            report.push(
                Rule::HpOverflow,
                format!(
                    "HP would reach {hp_after}, above the maximum of {}",
                    state.max_hp
                ),
            );
        }

        let mp_after = i64::from(state.mp).saturating_add(i64::from(delta.mp_change));
        if mp_after < 0 {
            report.push(
                Rule::NegativeMp,
                format!(
                    "mp_change {} would take MP from {} to {mp_after}",
                    delta.mp_change, state.mp
                ),
            );
        }
    }
}

/// Whether any stem appears at the start of a word, or any phrase anywhere.
fn mentions_any(lowered: &str, stems: &[&str]) -> bool {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    stems.iter().any(|stem| {
        if stem.contains(' ') {
            lowered.contains(stem)
        } else {
            words.iter().any(|word| word.starts_with(stem))
        }
    })
}

/// Why the player cannot end this turn at `target`, or `None` if they can.
///
/// Staying put is always allowed. Anything else must be an exit of the
/// current location whose rank requirement the player meets.
pub fn movement_refusal(
    graph: &WorldGraph,
    state: &PlayerState,
    target: &LocationId,
) -> Option<String> {
    if *target == state.location_id {
        return None;
    }
    match validate_movement(graph, &state.location_id, target.as_str(), state.tier) {
        MovementCheck::Valid { destination_id, .. } if destination_id == *target => None,
        MovementCheck::Valid { destination_name, .. } => Some(format!(
            "that way leads to {destination_name}, not '{target}'"
        )),
        MovementCheck::Invalid { reason } => Some(reason),
    }
}

/// Whether the delta already carries what the mention asserts.
fn reflected(mention: &Mention, delta: &StateDelta) -> bool {
    match mention.effect {
        Effect::ItemGain => !delta.items_gained.is_empty(),
        Effect::ItemLoss => !delta.items_lost.is_empty(),
        Effect::Damage => delta.hp_change < 0,
        Effect::Movement => delta.location_id.is_some(),
        Effect::SkillLearned => !delta.skills_gained.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use dao_types::{LocationId, PlayerId, Tier};
    use dao_world::starting_world;

    use super::*;

    fn player() -> PlayerState {
        PlayerState {
            id: PlayerId::new(),
            name: "Lin".to_owned(),
            tier: Tier::FLOOR,
            hp: 100,
            max_hp: 100,
            mp: 50,
            max_mp: 50,
            karma: 0,
            location_id: LocationId::new("qingyun_foot"),
            location_name: "Qingyun Foothills".to_owned(),
            inventory: vec!["Cloth Robe".to_owned()],
            skills: BTreeSet::new(),
            cultivation_progress: 0,
            breakthrough_attempts: 0,
            experience: 0,
            current_tick: 0,
            created_at: Utc::now(),
        }
    }

    fn validator() -> ConsistencyValidator {
        ConsistencyValidator::new(&ValidatorConfig::default(), ["Elder Chen", "Frostflame Lion"])
    }

    fn check(narration: &str, delta: &StateDelta) -> ValidationReport {
        validator().validate(narration, delta, &player(), &starting_world().unwrap())
    }

    fn moving_to(id: &str) -> StateDelta {
        StateDelta {
            location_id: Some(LocationId::new(id)),
            ..StateDelta::default()
        }
    }

    #[test]
    fn player_damage_without_hp_change_is_an_error() {
        let report = check("You are struck and lose 15 hit points.", &StateDelta::none());
        assert!(!report.is_valid());
        assert!(report.has_error(Rule::PlayerDamage));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn beast_damage_is_not_flagged() {
        let report = check("The beast is struck and bleeds.", &StateDelta::none());
        assert!(!report.has_error(Rule::PlayerDamage));
        assert!(report.is_valid());
    }

    #[test]
    fn reflected_damage_passes() {
        let delta = StateDelta {
            hp_change: -15,
            ..StateDelta::default()
        };
        assert!(check("You are struck and lose 15 hit points.", &delta).is_valid());
    }

    #[test]
    fn assertions_need_matching_fields() {
        let report = check(
            "You obtain a Spirit Stone, learn the Cloud Step and arrive at the plaza.",
            &StateDelta::none(),
        );
        assert!(report.has_error(Rule::ItemGain));
        assert!(report.has_error(Rule::SkillLearned));
        assert!(report.has_error(Rule::Movement));
        assert!(report.feedback().lines().all(|line| line.starts_with("- ")));
    }

    #[test]
    fn negated_assertions_pass() {
        assert!(check("You did not obtain anything here.", &StateDelta::none()).is_valid());
        assert!(check("You want to enter the library.", &StateDelta::none()).is_valid());
    }

    #[test]
    fn unknown_location_is_an_error() {
        let delta = StateDelta {
            location_id: Some(LocationId::new("Cloud Palace")),
            ..StateDelta::default()
        };
        let report = check("You arrive at the Cloud Palace.", &delta);
        assert!(report.has_error(Rule::UnknownLocation));
        assert!(!report.has_error(Rule::Movement));
    }

    #[test]
    fn adjacent_destinations_pass() {
        let report = check("You arrive at the Outer Sect Plaza.", &moving_to("qingyun_plaza"));
        assert!(report.is_valid());
    }

    #[test]
    fn destinations_off_the_exit_list_are_errors() {
        let report = check(
            "You walk into the Scripture Pavilion.",
            &moving_to("qingyun_library"),
        );
        assert!(report.has_error(Rule::Movement));
        assert!(!report.has_error(Rule::UnknownLocation));
        assert!(report.feedback().contains("Available exits"));
    }

    #[test]
    fn rank_gated_destinations_are_errors() {
        let graph = starting_world().unwrap();
        let mut state = player();
        state.location_id = LocationId::new("qingyun_plaza");
        let delta = moving_to("qingyun_library");
        let report =
            validator().validate("You walk into the Scripture Pavilion.", &delta, &state, &graph);
        assert!(report.has_error(Rule::Movement));
        assert!(report.feedback().contains("requires tier"));

        state.tier = Tier::new(2, 0).unwrap();
        let report =
            validator().validate("You walk into the Scripture Pavilion.", &delta, &state, &graph);
        assert!(report.is_valid());
    }

    #[test]
    fn negative_vitals_are_errors_and_overflow_is_a_warning() {
        let delta = StateDelta {
            hp_change: -150,
            mp_change: -60,
            ..StateDelta::default()
        };
        let report = check("You are wounded and drained.", &delta);
        assert!(report.has_error(Rule::NegativeHp));
        assert!(report.has_error(Rule::NegativeMp));

        let heal = StateDelta {
            hp_change: 30,
            ..StateDelta::default()
        };
        let report = check("Warmth floods your meridians.", &heal);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.rule == Rule::HpOverflow));
    }

    #[test]
    fn magnitude_caps_only_warn() {
        let delta = StateDelta {
            hp_change: 500,
            karma_change: -80,
            experience_gained: 900,
            ..StateDelta::default()
        };
        let report = check("A miracle.", &delta);
        assert!(report.is_valid());
        let rules: Vec<Rule> = report.warnings.iter().map(|w| w.rule).collect();
        assert!(rules.contains(&Rule::HpGainCap));
        assert!(rules.contains(&Rule::KarmaCap));
        assert!(rules.contains(&Rule::ExperienceCap));
    }

    #[test]
    fn silent_vital_and_location_changes_warn() {
        let delta = StateDelta {
            hp_change: -5,
            mp_change: -5,
            location_id: Some(LocationId::new("qingyun_plaza")),
            ..StateDelta::default()
        };
        let report = check("You look around thoughtfully.", &delta);
        assert!(report.is_valid());
        let silent = report
            .warnings
            .iter()
            .filter(|w| w.rule == Rule::Unmentioned)
            .count();
        assert_eq!(silent, 3);

        let report = check(
            "A blow bruises your ribs, your qi is drained, and you reach the Outer Sect Plaza.",
            &delta,
        );
        assert!(report.warnings.iter().all(|w| w.rule != Rule::Unmentioned));
    }

    #[test]
    fn unmentioned_items_warn() {
        let delta = StateDelta {
            items_gained: vec!["Spirit Stone".to_owned()],
            ..StateDelta::default()
        };
        let report = check("You obtain a small pouch.", &delta);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.rule == Rule::Unmentioned));
        assert!(check("You obtain a spirit stone.", &delta).warnings.is_empty());
    }
}
