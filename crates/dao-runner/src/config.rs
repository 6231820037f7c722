//! Runner configuration from environment variables.
//!
//! Game rules live in the YAML file handled by `dao_core::config`. This
//! layer only says where things are: which backend to call, where the
//! YAML file and the saves live, and where template overrides are.

use std::path::PathBuf;

use crate::error::RunnerError;

/// Default location of the game configuration file.
const DEFAULT_CONFIG_PATH: &str = "dao.yaml";

/// Default save directory.
const DEFAULT_SAVE_DIR: &str = "saves";

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Generative service backend.
    pub backend: LlmBackendConfig,
    /// Path to the YAML game configuration.
    pub game_config_path: PathBuf,
    /// Directory holding one save file per character.
    pub save_dir: PathBuf,
    /// Optional directory of `.j2` files overriding the built-in prompts.
    pub templates_dir: Option<PathBuf>,
}

/// Connection settings for the generative service.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
}

/// Supported backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in `LLM_BACKEND`.
    pub fn parse(name: &str) -> Result<Self, RunnerError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(RunnerError::Config(format!(
                "unknown backend type: {other}"
            ))),
        }
    }

    /// API base used when `LLM_API_URL` is not set.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `LLM_API_KEY` -- API key for the generative service
    ///
    /// Optional variables:
    /// - `LLM_BACKEND` -- `openai` (default) or `anthropic`
    /// - `LLM_API_URL` -- API base URL (default depends on the backend)
    /// - `DAO_CONFIG` -- game configuration file (default `dao.yaml`)
    /// - `DAO_SAVE_DIR` -- save directory (default `saves`)
    /// - `TEMPLATES_DIR` -- prompt template overrides (default: built-ins only)
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let backend_type = BackendType::parse(
            &lookup("LLM_BACKEND").unwrap_or_else(|| "openai".to_owned()),
        )?;
        let api_url = lookup("LLM_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| backend_type.default_api_url().to_owned());
        let api_key = lookup("LLM_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RunnerError::Config("missing required env var LLM_API_KEY".to_owned()))?;

        Ok(Self {
            backend: LlmBackendConfig {
                backend_type,
                api_url: api_url.trim_end_matches('/').to_owned(),
                api_key,
            },
            game_config_path: lookup("DAO_CONFIG")
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from),
            save_dir: lookup("DAO_SAVE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR), PathBuf::from),
            templates_dir: lookup("TEMPLATES_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}
