//! The authoritative player state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::StateDelta;
use crate::ids::{LocationId, PlayerId};
use crate::tier::Tier;

/// Everything the game knows about the player character.
///
/// Invariants (restored by [`PlayerState::apply`] and
/// [`PlayerState::clamp_vitals`]): `hp <= max_hp`, `mp <= max_mp`.
/// `location_name` is a display cache derived from `location_id` and is
/// never used as a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Save identifier.
    pub id: PlayerId,
    /// Character name chosen at creation.
    pub name: String,
    /// Cultivation rank.
    pub tier: Tier,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Current mana.
    pub mp: u32,
    /// Maximum mana.
    pub max_mp: u32,
    /// Moral fortune. Unbounded, soft-capped by validator plausibility checks.
    pub karma: i32,
    /// Canonical world-graph key of the current location.
    pub location_id: LocationId,
    /// Display name of the current location.
    pub location_name: String,
    /// Item names, in acquisition order, duplicates allowed.
    pub inventory: Vec<String>,
    /// Learned skill names.
    pub skills: BTreeSet<String>,
    /// Progress toward the next breakthrough.
    pub cultivation_progress: u32,
    /// Number of breakthroughs attempted (successful or not).
    pub breakthrough_attempts: u32,
    /// Accumulated experience.
    pub experience: u32,
    /// World time at the last save.
    pub current_tick: u64,
    /// When the character was created.
    pub created_at: DateTime<Utc>,
}

impl PlayerState {
    /// Re-establish the HP/MP bounds.
    pub fn clamp_vitals(&mut self) {
        self.hp = self.hp.min(self.max_hp);
        self.mp = self.mp.min(self.max_mp);
    }

    /// Whether the character has collapsed.
    pub const fn is_incapacitated(&self) -> bool {
        self.hp == 0
    }

    /// Apply a delta, clamping every bounded quantity.
    ///
    /// The location is copied as given; callers are responsible for
    /// canonicalizing it and refreshing `location_name`. NPC relation
    /// changes are not player state and are ignored here.
    pub fn apply(&mut self, delta: &StateDelta) {
        self.max_hp = self.max_hp.saturating_add(delta.max_hp_change);
        self.max_mp = self.max_mp.saturating_add(delta.max_mp_change);
        if let Some(tier) = delta.set_tier {
            self.tier = tier;
        }
        if delta.restore_vitals {
            self.hp = self.max_hp;
            self.mp = self.max_mp;
        }

        self.hp = offset_clamped(self.hp, delta.hp_change, self.max_hp);
        self.mp = offset_clamped(self.mp, delta.mp_change, self.max_mp);
        self.karma = self.karma.saturating_add(delta.karma_change);
        self.experience = self.experience.saturating_add(delta.experience_gained);

        self.cultivation_progress = delta.set_progress.map_or_else(
            || offset_clamped(self.cultivation_progress, delta.progress_change, u32::MAX),
            |progress| progress,
        );
        if delta.breakthrough_attempted {
            self.breakthrough_attempts = self.breakthrough_attempts.saturating_add(1);
        }

        self.inventory.extend(delta.items_gained.iter().cloned());
        for lost in &delta.items_lost {
            if let Some(pos) = self.inventory.iter().position(|item| item == lost) {
                self.inventory.remove(pos);
            }
        }
        self.skills.extend(delta.skills_gained.iter().cloned());

        if let Some(location) = &delta.location_id {
            self.location_id = location.clone();
        }

        self.clamp_vitals();
    }
}

/// Shift `value` by a signed `change`, clamped into `0..=max`.
pub fn offset_clamped(value: u32, change: i32, max: u32) -> u32 {
    let shifted = i64::from(value).saturating_add(i64::from(change));
    let clamped = shifted.clamp(0, i64::from(max));
    u32::try_from(clamped).unwrap_or(max)
}
