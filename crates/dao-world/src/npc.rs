//! Registered non-player characters.

use std::collections::BTreeMap;
use std::path::Path;

use dao_types::{LocationId, NpcId, Tier};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A registered non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Canonical key.
    pub id: NpcId,
    /// Name as it appears in narration, title included ("Elder Chen").
    pub name: String,
    /// Role description ("Outer Sect Disciplinary Elder").
    pub title: String,
    /// Cultivation rank.
    pub tier: Tier,
    /// Where the NPC can usually be found.
    pub location_id: LocationId,
    /// Personality sketch for the Drama stage.
    #[serde(default)]
    pub personality: String,
    /// Background story for the Drama stage.
    #[serde(default)]
    pub lore: String,
    /// Fighting style for the Logic stage.
    #[serde(default)]
    pub combat_style: String,
}

/// Read-only NPC lookup table.
#[derive(Debug, Clone, Default)]
pub struct NpcRegistry {
    npcs: BTreeMap<NpcId, Npc>,
}

impl NpcRegistry {
    /// Build a registry, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateNpc`] if two entries share an id.
    pub fn new(npcs: Vec<Npc>) -> Result<Self, WorldError> {
        let mut by_id = BTreeMap::new();
        for npc in npcs {
            if by_id.contains_key(&npc.id) {
                return Err(WorldError::DuplicateNpc(npc.id));
            }
            by_id.insert(npc.id.clone(), npc);
        }
        Ok(Self { npcs: by_id })
    }

    /// Parse a registry from a JSON array of NPCs.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Parse`] or [`WorldError::DuplicateNpc`].
    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        let npcs: Vec<Npc> = serde_json::from_str(json)?;
        Self::new(npcs)
    }

    /// Load a registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let json = std::fs::read_to_string(path).map_err(|source| WorldError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Look up by id.
    pub fn get(&self, id: &NpcId) -> Option<&Npc> {
        self.npcs.get(id)
    }

    /// Look up by display name, case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&Npc> {
        let wanted = name.trim();
        self.npcs
            .values()
            .find(|npc| npc.name.eq_ignore_ascii_case(wanted))
    }

    /// NPCs whose home is `location`, in id order.
    pub fn at_location(&self, location: &LocationId) -> Vec<&Npc> {
        self.npcs
            .values()
            .filter(|npc| &npc.location_id == location)
            .collect()
    }

    /// Iterate over all NPCs in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    /// Number of registered NPCs.
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Whether no NPCs are registered.
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::starting_world::starting_npcs;

    #[test]
    fn lookups_by_id_name_and_location() {
        let registry = starting_npcs().unwrap();
        let chen = registry.get(&NpcId::new("npc_002_elder_chen")).unwrap();
        assert_eq!(chen.name, "Elder Chen");
        assert_eq!(registry.by_name("elder chen").map(|n| &n.id), Some(&chen.id));
        let at_plaza = registry.at_location(&LocationId::new("qingyun_plaza"));
        assert!(at_plaza.iter().any(|npc| npc.id == chen.id));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": "a", "name": "Elder A", "title": "t", "tier": 1.0, "location_id": "x"},
            {"id": "a", "name": "Elder B", "title": "t", "tier": 1.0, "location_id": "x"}
        ]"#;
        assert!(matches!(
            NpcRegistry::from_json(json),
            Err(WorldError::DuplicateNpc(_))
        ));
    }
}
