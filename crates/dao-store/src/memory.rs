//! In-memory [`PlayerStore`].

use std::collections::BTreeMap;

use chrono::Utc;
use dao_types::{LocationId, NpcId, PlayerId, PlayerState};

use crate::PlayerStore;
use crate::error::StoreError;
use crate::record::{EventRecord, PlayerSummary, SaveDocument};

/// Keeps every save in a map. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: BTreeMap<PlayerId, SaveDocument>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn doc(&self, player: PlayerId) -> Result<&SaveDocument, StoreError> {
        self.saves
            .get(&player)
            .ok_or(StoreError::UnknownPlayer(player))
    }

    fn doc_mut(&mut self, player: PlayerId) -> Result<&mut SaveDocument, StoreError> {
        self.saves
            .get_mut(&player)
            .ok_or(StoreError::UnknownPlayer(player))
    }
}

impl PlayerStore for MemoryStore {
    fn create_player(&mut self, state: &PlayerState) -> Result<(), StoreError> {
        if self.saves.values().any(|doc| doc.state.name == state.name) {
            return Err(StoreError::DuplicateName(state.name.clone()));
        }
        self.saves.insert(state.id, SaveDocument::new(state.clone()));
        tracing::debug!(player = %state.name, id = %state.id, "Created player (memory)");
        Ok(())
    }

    fn load_player(&self, name: &str) -> Result<Option<PlayerState>, StoreError> {
        Ok(self
            .saves
            .values()
            .find(|doc| doc.state.name == name)
            .map(|doc| doc.state.clone()))
    }

    fn save_player(&mut self, state: &PlayerState) -> Result<(), StoreError> {
        let doc = self.doc_mut(state.id)?;
        doc.state = state.clone();
        doc.last_saved_at = Utc::now();
        Ok(())
    }

    fn log_event(&mut self, player: PlayerId, event: EventRecord) -> Result<(), StoreError> {
        self.doc_mut(player)?.push_event(event);
        Ok(())
    }

    fn recent_events(
        &self,
        player: PlayerId,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.doc(player)?.recent(limit, None))
    }

    fn location_history(
        &self,
        player: PlayerId,
        location: &LocationId,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.doc(player)?.recent(limit, Some(location)))
    }

    fn npc_relation(&self, player: PlayerId, npc: &NpcId) -> Result<i32, StoreError> {
        Ok(self
            .doc(player)?
            .relations
            .get(npc)
            .copied()
            .unwrap_or_default())
    }

    fn update_npc_relation(
        &mut self,
        player: PlayerId,
        npc: &NpcId,
        delta: i32,
    ) -> Result<i32, StoreError> {
        Ok(self.doc_mut(player)?.bump_relation(npc, delta))
    }

    fn list_players(&self) -> Result<Vec<PlayerSummary>, StoreError> {
        let mut players: Vec<PlayerSummary> =
            self.saves.values().map(SaveDocument::summary).collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players)
    }
}
