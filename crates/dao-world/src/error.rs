//! Error types for the `dao-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use dao_types::{Direction, LocationId, NpcId};

/// Errors that can occur while building or loading world content.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A location was not found in the world graph.
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// Two locations share the same id.
    #[error("duplicate location id: {0}")]
    DuplicateLocation(LocationId),

    /// An exit points at a location that does not exist.
    #[error("exit {direction} from {from} leads to unknown location {to}")]
    DanglingExit {
        /// Location the exit leaves from.
        from: LocationId,
        /// Direction label of the exit.
        direction: Direction,
        /// Missing target.
        to: LocationId,
    },

    /// Two NPCs share the same id.
    #[error("duplicate npc id: {0}")]
    DuplicateNpc(NpcId),

    /// An NPC is placed at a location that does not exist.
    #[error("npc {npc} is placed at unknown location {location}")]
    NpcLocationNotFound {
        /// The misplaced NPC.
        npc: NpcId,
        /// The missing location.
        location: LocationId,
    },

    /// Content file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Content file is not valid JSON for the expected shape.
    #[error("invalid world content: {0}")]
    Parse(#[from] serde_json::Error),
}
