//! The sparse, typed state adjustment proposed for a single turn.
//!
//! Generative output is translated into a [`StateDelta`] at the parse
//! boundary; rule engines build one directly. Every field defaults to
//! "no change", so an empty delta is always safe to apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, NpcId};
use crate::tier::Tier;

/// A set of named adjustments to apply to a [`PlayerState`](crate::PlayerState).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateDelta {
    /// Signed change to current HP (clamped on apply).
    #[serde(skip_serializing_if = "is_zero")]
    pub hp_change: i32,
    /// Signed change to current MP (clamped on apply).
    #[serde(skip_serializing_if = "is_zero")]
    pub mp_change: i32,
    /// Signed change to karma.
    #[serde(skip_serializing_if = "is_zero")]
    pub karma_change: i32,
    /// Experience points awarded.
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub experience_gained: u32,
    /// Signed change to cultivation progress (floored at zero on apply).
    #[serde(skip_serializing_if = "is_zero")]
    pub progress_change: i32,
    /// Item names added to the inventory, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items_gained: Vec<String>,
    /// Item names removed from the inventory (first occurrence each).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items_lost: Vec<String>,
    /// Skill names learned.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills_gained: Vec<String>,
    /// Destination of a location change.
    ///
    /// Must be a canonical world-graph key by the time the delta is
    /// applied; the world graph's canonicalization step rewrites display
    /// names and the turn controller drops anything still unresolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,
    /// Relationship score changes keyed by NPC.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub npc_relations: BTreeMap<NpcId, i32>,

    // --- Rule-engine fields (never accepted from generative output) ---
    /// Replace the tier outright (breakthrough success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_tier: Option<Tier>,
    /// Replace cultivation progress outright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_progress: Option<u32>,
    /// Increase to maximum HP.
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_hp_change: u32,
    /// Increase to maximum MP.
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_mp_change: u32,
    /// Refill HP and MP to their (possibly raised) maxima before other changes.
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub restore_vitals: bool,
    /// Count one breakthrough attempt.
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub breakthrough_attempted: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

impl StateDelta {
    /// A delta that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether applying this delta would leave the state untouched.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether the delta changes the character's rank.
    pub const fn changes_rank(&self) -> bool {
        self.set_tier.is_some()
    }

    /// Fill fields that are unset here from `other`.
    ///
    /// Used by the auto-fixer: facts extracted from narration only fill
    /// gaps, they never override what the director proposed.
    pub fn merge_missing(&mut self, other: Self) {
        if self.hp_change == 0 {
            self.hp_change = other.hp_change;
        }
        if self.items_gained.is_empty() {
            self.items_gained = other.items_gained;
        }
        if self.skills_gained.is_empty() {
            self.skills_gained = other.skills_gained;
        }
        if self.location_id.is_none() {
            self.location_id = other.location_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_delta_serializes_to_empty_object() {
        let json = serde_json::to_string(&StateDelta::none()).unwrap_or_default();
        assert_eq!(json, "{}");
        assert!(StateDelta::none().is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<StateDelta>(r#"{"hp_change": -5, "mana": 3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn merge_missing_never_overrides() {
        let mut delta = StateDelta {
            hp_change: -10,
            items_gained: vec!["Spirit Stone".to_owned()],
            ..StateDelta::default()
        };
        delta.merge_missing(StateDelta {
            hp_change: -30,
            items_gained: vec!["Rusty Sword".to_owned()],
            location_id: Some(LocationId::new("qingyun_plaza")),
            ..StateDelta::default()
        });
        assert_eq!(delta.hp_change, -10);
        assert_eq!(delta.items_gained, vec!["Spirit Stone".to_owned()]);
        assert_eq!(delta.location_id, Some(LocationId::new("qingyun_plaza")));
    }
}
