//! Shared type definitions for the Dao cultivation narrative engine.
//!
//! This crate is the single source of truth for the data that flows
//! between the rule engines, the agent orchestrator, the consistency
//! validator, and the persistence layer.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed identifiers for players, locations, and NPCs
//! - [`enums`] -- Compass directions, calendar labels, and intent kinds
//! - [`tier`] -- The cultivation rank with its major/sub-rank split
//! - [`player`] -- The authoritative player state
//! - [`intent`] -- The classified purpose of a turn's input
//! - [`delta`] -- The sparse, typed state adjustment proposed for a turn

pub mod delta;
pub mod enums;
pub mod ids;
pub mod intent;
pub mod player;
pub mod tier;

// Re-export all public types at crate root for convenience.
pub use delta::StateDelta;
pub use enums::{DayPeriod, Direction, IntentKind, Season};
pub use ids::{LocationId, NpcId, PlayerId};
pub use intent::Intent;
pub use player::PlayerState;
pub use tier::{Tier, TierError};
