//! Configuration loading and typed config structures.
//!
//! The game configuration lives in a YAML file (`dao-config.yaml` by
//! default). Every field has a default, so a partial file (or no file at
//! all) is valid. Backend credentials are not part of this file; the
//! runner reads them from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dao_types::Tier;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Session and turn-loop settings.
    #[serde(default)]
    pub game: SessionConfig,

    /// Initial character template.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Action cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Generative service call policy and per-role models.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Consistency validator thresholds.
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional content files replacing the built-in world.
    #[serde(default)]
    pub world: WorldFilesConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Same as [`GameConfig::from_file`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                reason: "service.max_attempts must be at least 1".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.validator.confidence_threshold) {
            return Err(ConfigError::Invalid {
                reason: "validator.confidence_threshold must be within [0, 1]".to_owned(),
            });
        }
        if self.player.max_hp == 0 {
            return Err(ConfigError::Invalid {
                reason: "player.max_hp must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Session and turn-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Title shown by the front-end.
    #[serde(default = "default_title")]
    pub title: String,

    /// How many recent events feed the agent context.
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,

    /// Save every this many resolved turns regardless of triggers.
    #[serde(default = "default_autosave_every")]
    pub autosave_every_turns: u32,

    /// An HP loss larger than this triggers an immediate save.
    #[serde(default = "default_large_hp_loss")]
    pub large_hp_loss: u32,

    /// An experience gain at least this large triggers an immediate save.
    #[serde(default = "default_large_experience_gain")]
    pub large_experience_gain: u32,

    /// Return the Logic/Drama exchange to the front-end for display.
    #[serde(default)]
    pub show_debate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            recent_events: default_recent_events(),
            autosave_every_turns: default_autosave_every(),
            large_hp_loss: default_large_hp_loss(),
            large_experience_gain: default_large_experience_gain(),
            show_debate: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Player template
// ---------------------------------------------------------------------------

/// Values a new character starts with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Starting tier.
    #[serde(default)]
    pub tier: Tier,

    /// Starting and maximum HP.
    #[serde(default = "default_max_hp")]
    pub max_hp: u32,

    /// Starting and maximum MP.
    #[serde(default = "default_max_mp")]
    pub max_mp: u32,

    /// Starting inventory.
    #[serde(default = "default_inventory")]
    pub inventory: Vec<String>,

    /// Starting skills.
    #[serde(default = "default_skills")]
    pub skills: Vec<String>,

    /// Starting location id; the world's start location when unset.
    #[serde(default)]
    pub start_location: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tier: Tier::FLOOR,
            max_hp: default_max_hp(),
            max_mp: default_max_mp(),
            inventory: default_inventory(),
            skills: default_skills(),
            start_location: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Action cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is consulted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Entry time-to-live.
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generative service
// ---------------------------------------------------------------------------

/// Call policy for the generative text service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Backoff growth factor for connectivity, server, and timeout failures.
    #[serde(default = "default_standard_backoff_factor")]
    pub standard_backoff_factor: u32,

    /// Backoff growth factor for rate-limit failures.
    #[serde(default = "default_rate_limit_backoff_factor")]
    pub rate_limit_backoff_factor: u32,

    /// Response length cap passed to the backend.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Observer stage model.
    #[serde(default = "default_observer_role")]
    pub observer: RoleConfig,

    /// Logic stage model.
    #[serde(default = "default_logic_role")]
    pub logic: RoleConfig,

    /// Drama stage model.
    #[serde(default = "default_drama_role")]
    pub drama: RoleConfig,

    /// Director stage model.
    #[serde(default = "default_director_role")]
    pub director: RoleConfig,

    /// Opening-scene model.
    #[serde(default = "default_opening_role")]
    pub opening: RoleConfig,
}

impl ServiceConfig {
    /// Per-attempt timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before the first retry.
    pub const fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            base_backoff_ms: default_base_backoff_ms(),
            standard_backoff_factor: default_standard_backoff_factor(),
            rate_limit_backoff_factor: default_rate_limit_backoff_factor(),
            max_tokens: default_max_tokens(),
            observer: default_observer_role(),
            logic: default_logic_role(),
            drama: default_drama_role(),
            director: default_director_role(),
            opening: default_opening_role(),
        }
    }
}

/// Model and sampling temperature for one pipeline role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleConfig {
    /// Model identifier passed to the backend.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
}

fn role(temperature: f64) -> RoleConfig {
    RoleConfig {
        model: DEFAULT_MODEL.to_owned(),
        temperature,
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Thresholds for the consistency validator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidatorConfig {
    /// Observer confidence below this short-circuits the turn.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Larger single-turn HP losses are flagged as implausible.
    #[serde(default = "default_hp_loss_cap")]
    pub hp_loss_cap: u32,

    /// Larger single-turn HP gains are flagged as implausible.
    #[serde(default = "default_hp_gain_cap")]
    pub hp_gain_cap: u32,

    /// Larger single-turn karma swings (either sign) are flagged.
    #[serde(default = "default_karma_cap")]
    pub karma_cap: u32,

    /// Larger single-turn MP losses are flagged.
    #[serde(default = "default_mp_loss_cap")]
    pub mp_loss_cap: u32,

    /// Larger single-turn experience awards are flagged.
    #[serde(default = "default_experience_cap")]
    pub experience_cap: u32,

    /// How many times the Director is re-invoked after a Level-2 failure.
    #[serde(default = "default_director_retries")]
    pub director_retries: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            hp_loss_cap: default_hp_loss_cap(),
            hp_gain_cap: default_hp_gain_cap(),
            karma_cap: default_karma_cap(),
            mp_loss_cap: default_mp_loss_cap(),
            experience_cap: default_experience_cap(),
            director_retries: default_director_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging and content
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// Optional content files replacing the built-in world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorldFilesConfig {
    /// JSON world graph.
    #[serde(default)]
    pub map_file: Option<PathBuf>,

    /// JSON NPC roster.
    #[serde(default)]
    pub npc_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const DEFAULT_MODEL: &str = "gpt-4o-mini";

fn default_title() -> String {
    "Chronicles of Qingyun".to_owned()
}
const fn default_recent_events() -> usize {
    5
}
const fn default_autosave_every() -> u32 {
    3
}
const fn default_large_hp_loss() -> u32 {
    20
}
const fn default_large_experience_gain() -> u32 {
    20
}
const fn default_max_hp() -> u32 {
    100
}
const fn default_max_mp() -> u32 {
    50
}
fn default_inventory() -> Vec<String> {
    vec!["Cloth Robe".to_owned(), "Dry Rations".to_owned()]
}
fn default_skills() -> Vec<String> {
    vec!["Basic Swordplay".to_owned()]
}
const fn default_true() -> bool {
    true
}
const fn default_cache_ttl_secs() -> u64 {
    300
}
const fn default_max_attempts() -> u32 {
    3
}
const fn default_request_timeout_secs() -> u64 {
    30
}
const fn default_base_backoff_ms() -> u64 {
    1_000
}
const fn default_standard_backoff_factor() -> u32 {
    2
}
const fn default_rate_limit_backoff_factor() -> u32 {
    4
}
const fn default_max_tokens() -> u32 {
    800
}
fn default_observer_role() -> RoleConfig {
    role(0.5)
}
fn default_logic_role() -> RoleConfig {
    role(0.5)
}
fn default_drama_role() -> RoleConfig {
    role(0.8)
}
fn default_director_role() -> RoleConfig {
    role(0.7)
}
fn default_opening_role() -> RoleConfig {
    role(0.9)
}
const fn default_confidence_threshold() -> f64 {
    0.3
}
const fn default_hp_loss_cap() -> u32 {
    200
}
const fn default_hp_gain_cap() -> u32 {
    100
}
const fn default_karma_cap() -> u32 {
    50
}
const fn default_mp_loss_cap() -> u32 {
    100
}
const fn default_experience_cap() -> u32 {
    500
}
const fn default_director_retries() -> u32 {
    1
}
fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.game.recent_events, 5);
        assert_eq!(config.game.autosave_every_turns, 3);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.service.max_attempts, 3);
        assert_eq!(config.service.request_timeout(), Duration::from_secs(30));
        assert!((config.service.drama.temperature - 0.8).abs() < f64::EPSILON);
        assert!((config.validator.confidence_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.player.max_hp, 100);
        assert_eq!(config.player.tier, Tier::FLOOR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
game:
  autosave_every_turns: 5
  show_debate: true
service:
  rate_limit_backoff_factor: 6
  director:
    model: "big-model"
    temperature: 0.6
player:
  tier: 1.5
  inventory: ["Iron Sword"]
logging:
  format: json
"#;
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.game.autosave_every_turns, 5);
        assert!(config.game.show_debate);
        assert_eq!(config.game.large_hp_loss, 20);
        assert_eq!(config.service.rate_limit_backoff_factor, 6);
        assert_eq!(config.service.standard_backoff_factor, 2);
        assert_eq!(config.service.director.model, "big-model");
        assert_eq!(config.service.observer.model, DEFAULT_MODEL);
        assert_eq!(config.player.tier, Tier::new(1, 5).unwrap());
        assert_eq!(config.player.inventory, vec!["Iron Sword".to_owned()]);
        assert_eq!(config.player.skills, default_skills());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = GameConfig::parse("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let result = GameConfig::parse("service:\n  max_attempts: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = GameConfig::parse("game: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, GameConfig::default());

        let path = dir.path().join("dao-config.yaml");
        std::fs::write(&path, "cache:\n  enabled: false\n").unwrap();
        let config = GameConfig::load_or_default(&path).unwrap();
        assert!(!config.cache.enabled);
    }
}
