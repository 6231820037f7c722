//! World graph: locations as nodes, compass exits as directed edges.
//!
//! The [`WorldGraph`] is loaded once at session start and is immutable
//! afterwards. Construction validates that every exit target exists, so
//! any [`LocationId`] obtained from an exit is always resolvable.
//!
//! The graph is also the translation boundary for location references
//! coming out of narration: display names are rewritten to canonical ids
//! by [`WorldGraph::canonicalize_location`], and anything that cannot be
//! resolved is reported rather than guessed.

use std::collections::BTreeMap;
use std::path::Path;

use dao_types::{LocationId, StateDelta};
use serde::Deserialize;

use crate::error::WorldError;
use crate::location::Location;

/// Cap on the extra event probability granted by karma.
const MAX_KARMA_EVENT_BONUS: f64 = 0.10;

/// Karma points per unit of event probability.
const KARMA_PER_EVENT_UNIT: f64 = 1000.0;

/// The immutable location graph for a session.
#[derive(Debug, Clone)]
pub struct WorldGraph {
    locations: BTreeMap<LocationId, Location>,
    /// Lowercased display name -> id.
    names: BTreeMap<String, LocationId>,
    start: LocationId,
}

/// On-disk shape of a world content file.
#[derive(Debug, Deserialize)]
struct WorldFile {
    start: LocationId,
    locations: Vec<Location>,
}

/// Outcome of translating a delta's location reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationResolution {
    /// The delta carries no location change.
    Absent,
    /// The reference was already a canonical id.
    Canonical(LocationId),
    /// A display name was rewritten to its canonical id.
    Rewritten {
        /// The display name as proposed.
        from: String,
        /// The canonical id it now carries.
        to: LocationId,
    },
    /// The reference matches nothing in the graph and was left in place.
    Unresolved(String),
}

impl WorldGraph {
    /// Build a graph, validating ids, exits, and the start location.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateLocation`] for repeated ids,
    /// [`WorldError::DanglingExit`] for exits to unknown locations, or
    /// [`WorldError::LocationNotFound`] if `start` is missing.
    pub fn new(locations: Vec<Location>, start: LocationId) -> Result<Self, WorldError> {
        let mut by_id = BTreeMap::new();
        let mut names = BTreeMap::new();
        for location in locations {
            if by_id.contains_key(&location.id) {
                return Err(WorldError::DuplicateLocation(location.id));
            }
            names.insert(location.name.trim().to_lowercase(), location.id.clone());
            by_id.insert(location.id.clone(), location);
        }

        for location in by_id.values() {
            for (direction, target) in &location.exits {
                if !by_id.contains_key(target) {
                    return Err(WorldError::DanglingExit {
                        from: location.id.clone(),
                        direction: *direction,
                        to: target.clone(),
                    });
                }
            }
        }

        if !by_id.contains_key(&start) {
            return Err(WorldError::LocationNotFound(start));
        }

        Ok(Self {
            locations: by_id,
            names,
            start,
        })
    }

    /// Parse a graph from JSON (`{"start": "...", "locations": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Parse`] for malformed JSON, or any error from
    /// [`WorldGraph::new`].
    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        let file: WorldFile = serde_json::from_str(json)?;
        Self::new(file.locations, file.start)
    }

    /// Load a graph from a JSON file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Io`] if the file cannot be read, or any error
    /// from [`WorldGraph::from_json`].
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let json = std::fs::read_to_string(path).map_err(|source| WorldError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    /// Location where new characters begin.
    pub const fn start(&self) -> &LocationId {
        &self.start
    }

    /// Look up a location by canonical id.
    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    /// Whether a canonical id exists.
    pub fn contains(&self, id: &LocationId) -> bool {
        self.locations.contains_key(id)
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the graph has no locations (never true for a validated graph).
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Iterate over all locations in id order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Display name for an id, if it exists.
    pub fn display_name(&self, id: &LocationId) -> Option<&str> {
        self.get(id).map(|location| location.name.as_str())
    }

    /// Resolve a free-form label (canonical id or display name).
    ///
    /// Display names match case-insensitively, with an optional leading
    /// "the".
    pub fn resolve(&self, label: &str) -> Option<&Location> {
        let trimmed = label.trim();
        if let Some(location) = self.locations.get(&LocationId::new(trimmed)) {
            return Some(location);
        }
        let lowered = trimmed.to_lowercase();
        let name = lowered.strip_prefix("the ").unwrap_or(&lowered);
        self.names
            .get(name.trim())
            .and_then(|id| self.locations.get(id))
    }

    // -------------------------------------------------------------------
    // Translation boundary
    // -------------------------------------------------------------------

    /// Rewrite the delta's location reference to a canonical id.
    ///
    /// Unresolvable references are left in place so the validator can
    /// count them; the turn controller drops whatever is still
    /// unresolvable at apply time.
    pub fn canonicalize_location(&self, delta: &mut StateDelta) -> LocationResolution {
        let Some(reference) = delta.location_id.as_ref() else {
            return LocationResolution::Absent;
        };
        if self.contains(reference) {
            return LocationResolution::Canonical(reference.clone());
        }
        let raw = reference.as_str().to_owned();
        match self.resolve(&raw) {
            Some(location) => {
                delta.location_id = Some(location.id.clone());
                LocationResolution::Rewritten {
                    from: raw,
                    to: location.id.clone(),
                }
            }
            None => LocationResolution::Unresolved(raw),
        }
    }

    // -------------------------------------------------------------------
    // Context for the agent pipeline
    // -------------------------------------------------------------------

    /// Human-readable list of exits, e.g. `north (Outer Sect Plaza), east (...)`.
    ///
    /// Returns an empty string for dead ends and unknown ids.
    pub fn exits_summary(&self, id: &LocationId) -> String {
        self.get(id)
            .map(|location| {
                location
                    .exits
                    .iter()
                    .map(|(direction, target)| {
                        let name = self.display_name(target).unwrap_or(target.as_str());
                        format!("{direction} ({name})")
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    /// Movement-context summary handed to the Logic stage.
    pub fn movement_context(&self, id: &LocationId) -> String {
        let Some(location) = self.get(id) else {
            return format!("Unknown location '{id}'.");
        };
        let mut lines = vec![format!("Current location: {} [{}]", location.name, location.id)];
        if location.exits.is_empty() {
            lines.push("Exits: none (dead end)".to_owned());
        } else {
            lines.push(format!("Exits: {}", self.exits_summary(id)));
        }
        for (direction, target) in &location.exits {
            if let Some(dest) = self.get(target)
                && dest.rank_requirement > location.rank_requirement
            {
                lines.push(format!(
                    "{} requires tier {} (via {direction})",
                    dest.name, dest.rank_requirement
                ));
            }
        }
        if !location.features.is_empty() {
            lines.push(format!("Features: {}", location.features.join(", ")));
        }
        lines.push(if location.safe {
            "Safety: safe".to_owned()
        } else {
            "Safety: dangerous".to_owned()
        });
        lines.join("\n")
    }

    /// Probability that a random event fires here for the given karma.
    ///
    /// Positive karma adds up to ten percentage points; negative karma
    /// never lowers the base chance.
    pub fn event_probability(&self, id: &LocationId, karma: i32) -> f64 {
        let Some(location) = self.get(id) else {
            return 0.0;
        };
        let bonus = (f64::from(karma) / KARMA_PER_EVENT_UNIT).clamp(0.0, MAX_KARMA_EVENT_BONUS);
        (location.event_chance + bonus).clamp(0.0, 1.0)
    }

    /// Whether a random event fires for a uniform `roll` in `[0, 1)`.
    pub fn event_fires(&self, id: &LocationId, karma: i32, roll: f64) -> bool {
        roll < self.event_probability(id, karma)
    }

    /// Roll for a random event.
    pub fn roll_event(&self, id: &LocationId, karma: i32, rng: &mut impl rand::Rng) -> bool {
        let roll: f64 = rng.random();
        self.event_fires(id, karma, roll)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dao_types::Direction;

    use super::*;
    use crate::starting_world::starting_world;

    fn qingyun() -> WorldGraph {
        starting_world().unwrap()
    }

    fn tiny() -> Vec<Location> {
        let mut gate = Location::new("gate", "Mountain Gate", "A gate.");
        gate.exits.insert(Direction::North, LocationId::new("hall"));
        let mut hall = Location::new("hall", "Great Hall", "A hall.");
        hall.exits.insert(Direction::South, LocationId::new("gate"));
        vec![gate, hall]
    }

    #[test]
    fn rejects_dangling_exit() {
        let mut locations = tiny();
        if let Some(first) = locations.first_mut() {
            first.exits.insert(Direction::East, LocationId::new("void"));
        }
        let result = WorldGraph::new(locations, LocationId::new("gate"));
        assert!(matches!(result, Err(WorldError::DanglingExit { .. })));
    }

    #[test]
    fn rejects_duplicates_and_missing_start() {
        let mut locations = tiny();
        locations.push(Location::new("gate", "Copy", "Copy."));
        assert!(matches!(
            WorldGraph::new(locations, LocationId::new("gate")),
            Err(WorldError::DuplicateLocation(_))
        ));
        assert!(matches!(
            WorldGraph::new(tiny(), LocationId::new("nowhere")),
            Err(WorldError::LocationNotFound(_))
        ));
    }

    #[test]
    fn resolve_accepts_ids_and_names() {
        let graph = qingyun();
        assert_eq!(
            graph.resolve("qingyun_plaza").map(|l| l.id.as_str()),
            Some("qingyun_plaza")
        );
        assert_eq!(
            graph.resolve("outer sect plaza").map(|l| l.id.as_str()),
            Some("qingyun_plaza")
        );
        assert_eq!(
            graph.resolve("the Spirit Beast Forest").map(|l| l.id.as_str()),
            Some("wildlands_forest")
        );
        assert!(graph.resolve("Moon Palace").is_none());
    }

    #[test]
    fn canonicalize_rewrites_display_names() {
        let graph = qingyun();
        let mut delta = StateDelta {
            location_id: Some(LocationId::new("Spirit Spring Pool")),
            ..StateDelta::default()
        };
        let resolution = graph.canonicalize_location(&mut delta);
        assert_eq!(delta.location_id, Some(LocationId::new("qingyun_pool")));
        assert!(matches!(resolution, LocationResolution::Rewritten { .. }));
    }

    #[test]
    fn canonicalize_never_leaves_a_display_name() {
        let graph = qingyun();
        for location in graph.locations() {
            let mut delta = StateDelta {
                location_id: Some(LocationId::new(location.name.clone())),
                ..StateDelta::default()
            };
            graph.canonicalize_location(&mut delta);
            assert_eq!(delta.location_id.as_ref(), Some(&location.id));
        }
    }

    #[test]
    fn canonicalize_reports_unresolved() {
        let graph = qingyun();
        let mut delta = StateDelta {
            location_id: Some(LocationId::new("Moon Palace")),
            ..StateDelta::default()
        };
        assert_eq!(
            graph.canonicalize_location(&mut delta),
            LocationResolution::Unresolved("Moon Palace".to_owned())
        );
        let mut empty = StateDelta::default();
        assert_eq!(graph.canonicalize_location(&mut empty), LocationResolution::Absent);
    }

    #[test]
    fn karma_bonus_is_capped() {
        let graph = qingyun();
        let forest = LocationId::new("wildlands_forest");
        let base = graph.event_probability(&forest, 0);
        let capped = graph.event_probability(&forest, 10_000);
        assert!((capped - base - MAX_KARMA_EVENT_BONUS).abs() < 1e-9);
        assert!((graph.event_probability(&forest, -500) - base).abs() < 1e-9);
        assert!(graph.event_fires(&forest, 0, 0.0));
        assert!(!graph.event_fires(&forest, 0, 0.999));
    }

    #[test]
    fn movement_context_lists_exits_and_requirements() {
        let graph = qingyun();
        let context = graph.movement_context(&LocationId::new("qingyun_plaza"));
        assert!(context.contains("Outer Sect Plaza"));
        assert!(context.contains("west (Scripture Pavilion)"));
        assert!(context.contains("Scripture Pavilion requires tier 2.0"));
    }

    #[test]
    fn json_round_trip_through_loader() {
        let json = r#"{
            "start": "gate",
            "locations": [
                {"id": "gate", "name": "Gate", "description": "d", "exits": {"north": "hall"}},
                {"id": "hall", "name": "Hall", "description": "d", "rank_requirement": 1.5}
            ]
        }"#;
        let graph = WorldGraph::from_json(json).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.start().as_str(), "gate");
    }
}
