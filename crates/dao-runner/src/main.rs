//! Terminal runner for the Dao cultivation narrative engine.
//!
//! Resolves each line of player input into a narrated outcome and a
//! validated state change. Movement and menu shortcuts are settled by the
//! rule engines; everything else goes through a four-stage generative
//! pipeline whose output is checked against the player state before it
//! is applied.
//!
//! # Architecture
//!
//! ```text
//! input --> shortcut/direction --(fast path)--> rule engines ----------------+
//!        \                                                                   v
//!         --> Observer --> cache --> Logic || Drama --> Director --> NPC guard
//!                                                                      |
//!                      apply + clock + event log + save <-- validate/retry/auto-fix
//! ```
//!
//! Configuration comes from environment variables (backend, paths) and a
//! YAML game file (rules, thresholds, models). Narration goes to stdout,
//! logs to stderr.

mod autofix;
mod cache;
mod config;
mod error;
mod frontend;
mod llm;
mod narrative;
mod npc_guard;
mod orchestrator;
mod parse;
mod prompt;
mod service;
mod shortcut;
#[cfg(test)]
mod testing;
mod turn;
mod validator;

use std::sync::Arc;

use dao_core::config::LoggingConfig;
use dao_core::{GameConfig, LogFormat};
use dao_store::FileStore;
use dao_world::{Catalog, NpcRegistry, WorldGraph, starting_npcs, starting_world};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::frontend::Frontend;
use crate::llm::create_backend;
use crate::orchestrator::Orchestrator;
use crate::prompt::PromptEngine;
use crate::service::{RetryPolicy, ServiceCaller};

/// Application entry point.
///
/// Loads both configuration layers, installs logging, builds the world,
/// the save store and the service pipeline, then hands stdin/stdout to
/// the front-end.
///
/// # Errors
///
/// Returns an error if configuration, content or the save directory
/// cannot be loaded, or if terminal I/O fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runner = RunnerConfig::from_env()?;
    let game = GameConfig::load_or_default(&runner.game_config_path)?;
    init_logging(&game.logging);

    info!(
        backend = ?runner.backend.backend_type,
        api_url = %runner.backend.api_url,
        config = %runner.game_config_path.display(),
        saves = %runner.save_dir.display(),
        "dao-runner starting"
    );

    let graph = match &game.world.map_file {
        Some(path) => WorldGraph::load(path)?,
        None => starting_world()?,
    };
    let npcs = match &game.world.npc_file {
        Some(path) => NpcRegistry::load(path)?,
        None => starting_npcs()?,
    };
    info!(locations = graph.len(), npcs = npcs.len(), "world loaded");
    let catalog = Catalog::new(Arc::new(graph), npcs)?;

    let store = FileStore::open(&runner.save_dir)?;
    let backend = create_backend(&runner.backend);
    info!(backend = backend.name(), "generative backend ready");
    let prompts = PromptEngine::new(runner.templates_dir.as_deref())?;
    let orchestrator = Orchestrator::new(
        ServiceCaller::new(backend, RetryPolicy::from_config(&game.service)),
        prompts,
        game.service.clone(),
    );

    Frontend::new(orchestrator, catalog, store, game)
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    info!("dao-runner stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
