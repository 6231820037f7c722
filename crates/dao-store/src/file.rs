//! JSON file [`PlayerStore`].
//!
//! Each player is one document, `<save_dir>/<player-id>.json`, holding the
//! state, the event log and the relation table. Writes go to a sibling
//! temp file first and are renamed into place, so a crash mid-write leaves
//! the previous save intact. Lookups by name scan the directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dao_types::{LocationId, NpcId, PlayerId, PlayerState};

use crate::PlayerStore;
use crate::error::StoreError;
use crate::record::{EventRecord, PlayerSummary, SaveDocument};

const SAVE_EXTENSION: &str = "json";

/// Saves players as JSON documents in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a save directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "Opened save directory");
        Ok(Self { dir })
    }

    /// The save directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, player: PlayerId) -> PathBuf {
        self.dir.join(format!("{player}.{SAVE_EXTENSION}"))
    }

    fn read(&self, player: PlayerId) -> Result<SaveDocument, StoreError> {
        let path = self.path_for(player);
        if !path.exists() {
            return Err(StoreError::UnknownPlayer(player));
        }
        read_document(&path)
    }

    fn write(&self, doc: &SaveDocument) -> Result<(), StoreError> {
        let path = self.path_for(doc.state.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(doc)?;
        fs::write(&tmp, body).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    fn update<T>(
        &self,
        player: PlayerId,
        f: impl FnOnce(&mut SaveDocument) -> T,
    ) -> Result<T, StoreError> {
        let mut doc = self.read(player)?;
        let out = f(&mut doc);
        self.write(&doc)?;
        Ok(out)
    }

    fn documents(&self) -> Result<Vec<SaveDocument>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut docs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            match read_document(&path) {
                Ok(doc) => docs.push(doc),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable save");
                }
            }
        }
        Ok(docs)
    }
}

fn read_document(path: &Path) -> Result<SaveDocument, StoreError> {
    let body = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    Ok(serde_json::from_slice(&body)?)
}

impl PlayerStore for FileStore {
    fn create_player(&mut self, state: &PlayerState) -> Result<(), StoreError> {
        if self.documents()?.iter().any(|doc| doc.state.name == state.name) {
            return Err(StoreError::DuplicateName(state.name.clone()));
        }
        self.write(&SaveDocument::new(state.clone()))?;
        tracing::info!(player = %state.name, id = %state.id, "Created player save");
        Ok(())
    }

    fn load_player(&self, name: &str) -> Result<Option<PlayerState>, StoreError> {
        Ok(self
            .documents()?
            .into_iter()
            .find(|doc| doc.state.name == name)
            .map(|doc| doc.state))
    }

    fn save_player(&mut self, state: &PlayerState) -> Result<(), StoreError> {
        self.update(state.id, |doc| {
            doc.state = state.clone();
            doc.last_saved_at = Utc::now();
        })?;
        tracing::debug!(player = %state.name, tick = state.current_tick, "Saved player");
        Ok(())
    }

    fn log_event(&mut self, player: PlayerId, event: EventRecord) -> Result<(), StoreError> {
        self.update(player, |doc| doc.push_event(event))
    }

    fn recent_events(
        &self,
        player: PlayerId,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.read(player)?.recent(limit, None))
    }

    fn location_history(
        &self,
        player: PlayerId,
        location: &LocationId,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.read(player)?.recent(limit, Some(location)))
    }

    fn npc_relation(&self, player: PlayerId, npc: &NpcId) -> Result<i32, StoreError> {
        Ok(self
            .read(player)?
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
        self.update(player, |doc| doc.bump_relation(npc, delta))
    }

    fn list_players(&self) -> Result<Vec<PlayerSummary>, StoreError> {
        let mut players: Vec<PlayerSummary> =
            self.documents()?.iter().map(SaveDocument::summary).collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players)
    }
}
