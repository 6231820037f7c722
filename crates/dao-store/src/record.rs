//! Records shared by every store backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dao_types::{LocationId, NpcId, PlayerId, PlayerState};
use serde::{Deserialize, Serialize};

/// Oldest events are dropped once a player's log exceeds this length.
pub const MAX_EVENTS_PER_PLAYER: usize = 500;

/// One entry in a player's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Game tick at which the event happened.
    pub tick: u64,
    /// Where it happened.
    pub location_id: LocationId,
    /// Event type label, usually the intent kind (`MOVE`, `TALK`, ...).
    pub kind: String,
    /// Short summary used as context in later turns.
    pub description: String,
    /// NPC involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_npc: Option<NpcId>,
    /// Wall-clock time of recording.
    pub recorded_at: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        tick: u64,
        location_id: LocationId,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tick,
            location_id,
            kind: kind.into(),
            description: description.into(),
            related_npc: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attach the NPC involved.
    #[must_use]
    pub fn with_npc(mut self, npc: NpcId) -> Self {
        self.related_npc = Some(npc);
        self
    }
}

/// Listing entry for the save browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player id.
    pub id: PlayerId,
    /// Character name.
    pub name: String,
    /// When the character was created.
    pub created_at: DateTime<Utc>,
    /// When it was last saved.
    pub last_saved_at: DateTime<Utc>,
}

/// Everything persisted for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SaveDocument {
    pub state: PlayerState,
    pub last_saved_at: DateTime<Utc>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub relations: BTreeMap<NpcId, i32>,
}

impl SaveDocument {
    pub fn new(state: PlayerState) -> Self {
        Self {
            state,
            last_saved_at: Utc::now(),
            events: Vec::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.state.id,
            name: self.state.name.clone(),
            created_at: self.state.created_at,
            last_saved_at: self.last_saved_at,
        }
    }

    pub fn push_event(&mut self, event: EventRecord) {
        self.events.push(event);
        let excess = self.events.len().saturating_sub(MAX_EVENTS_PER_PLAYER);
        if excess > 0 {
            self.events.drain(..excess);
        }
    }

    /// Newest first.
    pub fn recent(&self, limit: usize, location: Option<&LocationId>) -> Vec<EventRecord> {
        self.events
            .iter()
            .rev()
            .filter(|event| location.is_none_or(|loc| &event.location_id == loc))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn bump_relation(&mut self, npc: &NpcId, delta: i32) -> i32 {
        let score = self.relations.entry(npc.clone()).or_insert(0);
        *score = score.saturating_add(delta);
        *score
    }
}
