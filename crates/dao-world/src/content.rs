//! World-content collaborator.
//!
//! The agent pipeline and the NPC guard only read content through the
//! [`ContentSource`] trait; [`Catalog`] is the in-process implementation
//! backed by a [`WorldGraph`] and an [`NpcRegistry`].

use std::sync::Arc;

use dao_types::{LocationId, NpcId};

use crate::error::WorldError;
use crate::npc::{Npc, NpcRegistry};
use crate::world_graph::WorldGraph;

/// Static, read-only lookups over NPC and location content.
pub trait ContentSource {
    /// NPC by canonical id.
    fn npc(&self, id: &NpcId) -> Option<&Npc>;

    /// NPC by display name.
    fn npc_by_name(&self, name: &str) -> Option<&Npc>;

    /// NPCs whose home is `location`.
    fn npcs_at(&self, location: &LocationId) -> Vec<&Npc>;

    /// NPCs the narrator may introduce at `location` (residents plus the
    /// location's whitelist).
    fn available_npcs(&self, location: &LocationId) -> Vec<&Npc>;

    /// Items the narrator may hand out at `location`.
    fn available_items(&self, location: &LocationId) -> Vec<String>;

    /// Resolve a reference that may be an id or a display name.
    fn resolve_npc(&self, reference: &str) -> Option<&Npc> {
        self.npc(&NpcId::new(reference.trim()))
            .or_else(|| self.npc_by_name(reference))
    }
}

/// Content catalog for one session.
#[derive(Debug, Clone)]
pub struct Catalog {
    graph: Arc<WorldGraph>,
    npcs: NpcRegistry,
}

impl Catalog {
    /// Pair a graph with a registry, checking that every NPC and every
    /// whitelisted NPC refers to something that exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NpcLocationNotFound`] if an NPC lives at an
    /// unknown location.
    pub fn new(graph: Arc<WorldGraph>, npcs: NpcRegistry) -> Result<Self, WorldError> {
        for npc in npcs.iter() {
            if !graph.contains(&npc.location_id) {
                return Err(WorldError::NpcLocationNotFound {
                    npc: npc.id.clone(),
                    location: npc.location_id.clone(),
                });
            }
        }
        for location in graph.locations() {
            for id in &location.allowed_npcs {
                if npcs.get(id).is_none() {
                    tracing::warn!(
                        location = %location.id,
                        npc = %id,
                        "whitelisted npc is not registered, ignoring"
                    );
                }
            }
        }
        Ok(Self { graph, npcs })
    }

    /// The world graph.
    pub fn graph(&self) -> &WorldGraph {
        &self.graph
    }

    /// Shared handle to the world graph.
    pub fn graph_handle(&self) -> Arc<WorldGraph> {
        Arc::clone(&self.graph)
    }

    /// The NPC registry.
    pub const fn registry(&self) -> &NpcRegistry {
        &self.npcs
    }
}

impl ContentSource for Catalog {
    fn npc(&self, id: &NpcId) -> Option<&Npc> {
        self.npcs.get(id)
    }

    fn npc_by_name(&self, name: &str) -> Option<&Npc> {
        self.npcs.by_name(name)
    }

    fn npcs_at(&self, location: &LocationId) -> Vec<&Npc> {
        self.npcs.at_location(location)
    }

    fn available_npcs(&self, location: &LocationId) -> Vec<&Npc> {
        let mut available = self.npcs.at_location(location);
        if let Some(place) = self.graph.get(location) {
            for id in &place.allowed_npcs {
                if let Some(npc) = self.npcs.get(id)
                    && !available.iter().any(|known| known.id == npc.id)
                {
                    available.push(npc);
                }
            }
        }
        available
    }

    fn available_items(&self, location: &LocationId) -> Vec<String> {
        self.graph
            .get(location)
            .map(|place| place.allowed_items.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::starting_world::{starting_npcs, starting_world};

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(starting_world().unwrap()), starting_npcs().unwrap()).unwrap()
    }

    #[test]
    fn resolve_npc_accepts_id_or_name() {
        let catalog = catalog();
        assert!(catalog.resolve_npc("npc_005_elder_mu").is_some());
        assert!(catalog.resolve_npc("Elder Mu").is_some());
        assert!(catalog.resolve_npc("Elder Nobody").is_none());
    }

    #[test]
    fn available_npcs_include_whitelisted_visitors() {
        let catalog = catalog();
        let main_hall = LocationId::new("qingyun_main_hall");
        let names: Vec<&str> = catalog
            .available_npcs(&main_hall)
            .iter()
            .map(|npc| npc.name.as_str())
            .collect();
        assert!(names.contains(&"Sect Master Xuanqing"));
        assert!(names.contains(&"Elder Chen"));
    }

    #[test]
    fn available_items_come_from_the_location() {
        let catalog = catalog();
        let items = catalog.available_items(&LocationId::new("qingyun_herb"));
        assert!(items.contains(&"Spirit Grass".to_owned()));
        assert!(catalog.available_items(&LocationId::new("limbo")).is_empty());
    }

    #[test]
    fn npc_at_unknown_location_is_rejected() {
        let json = r#"[{"id": "x", "name": "Hermit X", "title": "t", "tier": 1.0, "location_id": "limbo"}]"#;
        let registry = NpcRegistry::from_json(json).unwrap();
        let result = Catalog::new(Arc::new(starting_world().unwrap()), registry);
        assert!(matches!(result, Err(WorldError::NpcLocationNotFound { .. })));
    }
}
