//! A node in the world graph.

use std::collections::{BTreeMap, BTreeSet};

use dao_types::{Direction, IntentKind, LocationId, NpcId, Tier};
use serde::{Deserialize, Serialize};

/// Neutral cultivation multiplier, in percent.
pub const NEUTRAL_CULTIVATION_BONUS_PCT: u32 = 100;

/// A static, read-only location definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Canonical key.
    pub id: LocationId,
    /// Display name used in narration.
    pub name: String,
    /// Short scene description.
    pub description: String,
    /// Minimum tier required to enter.
    #[serde(default)]
    pub rank_requirement: Tier,
    /// Directed exits keyed by compass direction.
    #[serde(default)]
    pub exits: BTreeMap<Direction, LocationId>,
    /// Probability in `[0, 1]` that a random event fires on a turn here.
    #[serde(default)]
    pub event_chance: f64,
    /// Descriptive feature tags (springs, statues, stalls).
    #[serde(default)]
    pub features: Vec<String>,
    /// NPCs the narrator may introduce here.
    #[serde(default)]
    pub allowed_npcs: Vec<NpcId>,
    /// Intents that may be resolved here.
    #[serde(default = "all_intents")]
    pub allowed_intents: BTreeSet<IntentKind>,
    /// Items that may be found here.
    #[serde(default)]
    pub allowed_items: Vec<String>,
    /// Whether hostile encounters are excluded.
    #[serde(default = "default_safe")]
    pub safe: bool,
    /// Cultivation progress multiplier in percent (100 = neutral).
    #[serde(default = "neutral_bonus")]
    pub cultivation_bonus_pct: u32,
}

fn all_intents() -> BTreeSet<IntentKind> {
    IntentKind::ALL.into_iter().collect()
}

const fn default_safe() -> bool {
    true
}

const fn neutral_bonus() -> u32 {
    NEUTRAL_CULTIVATION_BONUS_PCT
}

impl Location {
    /// Build a location with default whitelists and no exits.
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: LocationId::new(id),
            name: name.to_owned(),
            description: description.to_owned(),
            rank_requirement: Tier::FLOOR,
            exits: BTreeMap::new(),
            event_chance: 0.0,
            features: Vec::new(),
            allowed_npcs: Vec::new(),
            allowed_intents: all_intents(),
            allowed_items: Vec::new(),
            safe: true,
            cultivation_bonus_pct: NEUTRAL_CULTIVATION_BONUS_PCT,
        }
    }

    /// Whether the given intent may be resolved here.
    pub fn permits(&self, kind: IntentKind) -> bool {
        self.allowed_intents.contains(&kind)
    }

    /// The destination behind an exit, if any.
    pub fn exit(&self, direction: Direction) -> Option<&LocationId> {
        self.exits.get(&direction)
    }
}
