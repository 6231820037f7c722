//! Persistence for players, their event logs, and NPC relations.
//!
//! The engine talks to storage only through [`PlayerStore`]. Calls are
//! synchronous: a turn saves at most once and the documents are small.
//!
//! # Modules
//!
//! - [`memory`] -- In-process store for tests and throwaway sessions
//! - [`file`] -- One JSON document per player under a save directory
//! - [`record`] -- Event and listing records shared by both backends
//! - [`error`] -- Shared error types

pub mod error;
pub mod file;
pub mod memory;
pub mod record;

use dao_types::{LocationId, NpcId, PlayerId, PlayerState};

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{EventRecord, MAX_EVENTS_PER_PLAYER, PlayerSummary};

/// Storage collaborator used by the turn controller and front-end.
pub trait PlayerStore {
    /// Persist a freshly created character.
    ///
    /// Fails with [`StoreError::DuplicateName`] if the name is taken.
    fn create_player(&mut self, state: &PlayerState) -> Result<(), StoreError>;

    /// Load a character by name. `Ok(None)` if no such save exists.
    fn load_player(&self, name: &str) -> Result<Option<PlayerState>, StoreError>;

    /// Overwrite the stored state for `state.id`.
    fn save_player(&mut self, state: &PlayerState) -> Result<(), StoreError>;

    /// Append to the player's event log.
    fn log_event(&mut self, player: PlayerId, event: EventRecord) -> Result<(), StoreError>;

    /// The `limit` most recent events, newest first.
    fn recent_events(&self, player: PlayerId, limit: usize)
    -> Result<Vec<EventRecord>, StoreError>;

    /// The `limit` most recent events at one location, newest first.
    fn location_history(
        &self,
        player: PlayerId,
        location: &LocationId,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError>;

    /// Affinity with an NPC; zero if never recorded.
    fn npc_relation(&self, player: PlayerId, npc: &NpcId) -> Result<i32, StoreError>;

    /// Add `delta` to the affinity with an NPC and return the new score.
    fn update_npc_relation(
        &mut self,
        player: PlayerId,
        npc: &NpcId,
        delta: i32,
    ) -> Result<i32, StoreError>;

    /// Every stored character, sorted by name.
    fn list_players(&self) -> Result<Vec<PlayerSummary>, StoreError>;
}
