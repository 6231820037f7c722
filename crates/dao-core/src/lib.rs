//! Configuration, world clock, and cultivation rules for the Dao narrative engine.
//!
//! # Modules
//!
//! - [`config`] -- YAML game configuration with per-field defaults.
//! - [`clock`] -- The tick counter, action costs, and calendar labels.
//! - [`cultivation`] -- Realm table, breakthrough odds, and meditation.

pub mod clock;
pub mod config;
pub mod cultivation;

pub use clock::{ClockError, TimeAdvance, TimeEngine, tick_cost};
pub use config::{ConfigError, GameConfig, LogFormat};
pub use cultivation::{
    BreakthroughBlocker, BreakthroughOutcome, CultivationError, CultivationGain, TierProfile,
    attempt_breakthrough, can_breakthrough, cultivate, resolve_breakthrough, success_rate,
    tier_profile,
};
