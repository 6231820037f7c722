//! Geography, movement rules, and NPC content for the Dao narrative engine.
//!
//! This crate models everything static about the world: locations as a
//! directed graph of compass exits, the deterministic direction
//! classifier, movement legality, and the registered NPC roster.
//!
//! # Modules
//!
//! - [`content`] -- The read-only content collaborator consumed by the
//!   agent pipeline and NPC validation.
//! - [`direction`] -- Alias table mapping short inputs to compass directions.
//! - [`error`] -- Error types for world loading and validation.
//! - [`location`] -- A single location node and its whitelists.
//! - [`movement`] -- Movement legality and fast-path arrival narration.
//! - [`npc`] -- Registered non-player characters.
//! - [`starting_world`] -- Built-in Qingyun Sect map and roster.
//! - [`world_graph`] -- The immutable world graph and the location
//!   translation boundary.

pub mod content;
pub mod direction;
pub mod error;
pub mod location;
pub mod movement;
pub mod npc;
pub mod starting_world;
pub mod world_graph;

// Re-export primary types at crate root.
pub use content::{Catalog, ContentSource};
pub use direction::classify_direction;
pub use error::WorldError;
pub use location::Location;
pub use movement::{MovementCheck, arrival_narration, validate_movement};
pub use npc::{Npc, NpcRegistry};
pub use starting_world::{START_LOCATION, starting_npcs, starting_world};
pub use world_graph::{LocationResolution, WorldGraph};
