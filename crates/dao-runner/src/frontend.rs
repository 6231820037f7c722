//! Line-oriented terminal front-end.
//!
//! Reads commands from any async line source and writes to any async
//! sink, so the same loop drives stdin/stdout and the tests. The main
//! menu creates or loads a character; inside a session every line that
//! is not a front-end command becomes a turn.

use dao_core::GameConfig;
use dao_store::PlayerStore;
use dao_world::Catalog;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{info, warn};

use crate::error::RunnerError;
use crate::llm::TextGenerator;
use crate::orchestrator::Orchestrator;
use crate::turn::{TurnController, TurnOutcome, new_character};

const MENU_HELP: &str = "\
Commands:
  new <name>    create a character
  load <name>   continue a saved character
  saves         list saved characters
  quit          leave";

const GAME_HELP: &str = "\
Type what you want to do in plain words, or use a shortcut:
  n/s/e/w/u/d   move            i   inventory     st  status
  c   cultivate   b   breakthrough   r   rest
  m   look for a way onward   l   look around
  a   attack the first person here   t1-t3   talk to someone here
Front-end commands: help, save, cache, cache clear, quit (saves first)";

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// `quit`: back to the menu.
    Menu,
    /// Input closed.
    Closed,
}

/// The interactive shell around [`TurnController`].
pub struct Frontend<G, S> {
    orchestrator: Orchestrator<G>,
    catalog: Catalog,
    store: S,
    config: GameConfig,
}

impl<G: TextGenerator, S: PlayerStore> Frontend<G, S> {
    /// Wire the shell to its collaborators.
    pub const fn new(
        orchestrator: Orchestrator<G>,
        catalog: Catalog,
        store: S,
        config: GameConfig,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            store,
            config,
        }
    }

    /// Run the menu until `quit` or end of input. Returns the store.
    pub async fn run<R, W>(self, input: R, mut out: W) -> Result<S, RunnerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Self {
            mut orchestrator,
            mut catalog,
            mut store,
            config,
        } = self;
        let mut lines = input.lines();
        say(&mut out, &format!("=== {} ===\n{MENU_HELP}", config.game.title)).await?;

        loop {
            prompt(&mut out, "menu> ").await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let (command, argument) = split_command(&line);
            let state = match command.as_str() {
                "" => continue,
                "quit" | "exit" | "q" => break,
                "help" | "h" | "?" => {
                    say(&mut out, MENU_HELP).await?;
                    continue;
                }
                "saves" | "list" => {
                    let saves = store.list_players()?;
                    if saves.is_empty() {
                        say(&mut out, "No saved characters.").await?;
                    }
                    for save in saves {
                        let line = format!(
                            "  {} (last saved {})",
                            save.name,
                            save.last_saved_at.format("%Y-%m-%d %H:%M")
                        );
                        say(&mut out, &line).await?;
                    }
                    continue;
                }
                "new" => {
                    let Some(name) = ask_name(argument, &mut lines, &mut out).await? else {
                        break;
                    };
                    if store.load_player(&name)?.is_some() {
                        say(&mut out, &format!("A character named {name} already exists.")).await?;
                        continue;
                    }
                    let state = new_character(&name, &config.player, catalog.graph())?;
                    store.create_player(&state)?;
                    info!(player = %state.name, id = %state.id, "character created");
                    state
                }
                "load" => {
                    let Some(name) = ask_name(argument, &mut lines, &mut out).await? else {
                        break;
                    };
                    match store.load_player(&name)? {
                        Some(state) => state,
                        None => {
                            say(&mut out, &format!("No saved character named {name}.")).await?;
                            continue;
                        }
                    }
                }
                _ => {
                    say(&mut out, "Unknown command. Type help.").await?;
                    continue;
                }
            };

            let fresh = state.current_tick == 0;
            let mut session =
                TurnController::new(orchestrator, catalog, store, config.clone(), state)?;
            let greeting = if fresh {
                session.opening_scene().await?
            } else {
                format!(
                    "Welcome back, {}. You stand in {}.",
                    session.state().name,
                    session.state().location_name
                )
            };
            say(&mut out, &greeting).await?;
            say(&mut out, "(type help for commands)").await?;

            let end = play(&mut session, &mut lines, &mut out).await?;
            (orchestrator, catalog, store) = session.finish();
            if end == SessionEnd::Closed {
                break;
            }
        }
        say(&mut out, "Farewell.").await?;
        Ok(store)
    }
}

async fn play<G, S, R, W>(
    session: &mut TurnController<G, S>,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<SessionEnd, RunnerError>
where
    G: TextGenerator,
    S: PlayerStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        prompt(out, "> ").await?;
        let Some(line) = lines.next_line().await? else {
            session.save()?;
            return Ok(SessionEnd::Closed);
        };
        match line.trim().to_lowercase().as_str() {
            "" => {}
            "help" | "?" => say(out, GAME_HELP).await?,
            "save" => {
                session.save()?;
                say(out, "Progress saved.").await?;
            }
            "cache" => {
                let stats = session.cache_stats();
                let line = format!(
                    "Cache {}: {} entries, {} hits.",
                    if stats.enabled { "on" } else { "off" },
                    stats.total_entries,
                    stats.total_hits
                );
                say(out, &line).await?;
            }
            "cache clear" => {
                session.clear_cache();
                say(out, "Cache cleared.").await?;
            }
            "quit" | "exit" => {
                session.save()?;
                say(out, "Progress saved. Returning to the menu.").await?;
                return Ok(SessionEnd::Menu);
            }
            _ => match session.play_turn(&line).await {
                Ok(outcome) => say(out, &render(&outcome)).await?,
                Err(error) => {
                    warn!(error = %error, "turn failed");
                    say(out, &format!("Something went wrong: {error}")).await?;
                }
            },
        }
        if session.state().is_incapacitated() {
            say(
                out,
                "Your vision darkens and you collapse. Rest (r) before you do anything rash.",
            )
            .await?;
        }
    }
}

/// Text shown for one turn.
fn render(outcome: &TurnOutcome) -> String {
    let mut parts = Vec::new();
    if let Some(debate) = &outcome.debate {
        parts.push(format!("[Logic] {}\n[Drama] {}", debate.logic, debate.drama));
    }
    if !outcome.narration.is_empty() {
        parts.push(outcome.narration.clone());
    }
    parts.extend(outcome.messages.iter().map(|message| format!("* {message}")));
    if let Some(time) = &outcome.time {
        parts.push(format!("[{}]", time.label));
    }
    if outcome.saved {
        parts.push("(progress saved)".to_owned());
    }
    parts.join("\n")
}

fn split_command(line: &str) -> (String, Option<String>) {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (
            command.to_lowercase(),
            Some(rest.trim().to_owned()).filter(|r| !r.is_empty()),
        ),
        None => (trimmed.to_lowercase(), None),
    }
}

/// The name given inline, or one read from the next line. `None` when
/// input closes first.
async fn ask_name<R, W>(
    given: Option<String>,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<Option<String>, RunnerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(name) = given {
        return Ok(Some(name));
    }
    loop {
        prompt(out, "Name: ").await?;
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let name = line.trim();
        if !name.is_empty() {
            return Ok(Some(name.to_owned()));
        }
    }
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), RunnerError> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

async fn prompt<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), RunnerError> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use dao_store::MemoryStore;
    use dao_types::LocationId;
    use dao_world::{starting_npcs, starting_world};
    use tokio::io::BufReader;

    use super::*;
    use crate::prompt::PromptEngine;
    use crate::service::{RetryPolicy, ServiceCaller};
    use crate::testing::{self, FakeService};

    async fn run_script(script: &str, store: MemoryStore) -> (String, MemoryStore) {
        let config = GameConfig {
            service: testing::service_config(),
            ..GameConfig::default()
        };
        let orchestrator = Orchestrator::new(
            ServiceCaller::new(FakeService::new(), RetryPolicy::from_config(&config.service)),
            PromptEngine::new(None).unwrap(),
            config.service.clone(),
        );
        let catalog =
            Catalog::new(Arc::new(starting_world().unwrap()), starting_npcs().unwrap()).unwrap();
        let mut out = Vec::new();
        let store = Frontend::new(orchestrator, catalog, store, config)
            .run(BufReader::new(script.as_bytes()), &mut out)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), store)
    }

    #[tokio::test]
    async fn new_character_moves_and_saves_on_quit() {
        let (out, store) = run_script("new Lin\nn\nquit\nquit\n", MemoryStore::new()).await;
        assert!(out.contains("Your path of cultivation begins here, Lin."));
        assert!(out.contains("Outer Sect Plaza"));
        assert!(out.contains("Farewell."));

        let saved = store.load_player("Lin").unwrap().unwrap();
        assert_eq!(saved.location_id, LocationId::new("qingyun_plaza"));
        assert_eq!(saved.current_tick, 3);
    }

    #[tokio::test]
    async fn loading_resumes_a_saved_character() {
        let (_, store) = run_script("new Lin\nn\nquit\n", MemoryStore::new()).await;
        let (out, _) = run_script("saves\nload Lin\nst\n", store).await;
        assert!(out.contains("  Lin (last saved"));
        assert!(out.contains("Welcome back, Lin. You stand in Outer Sect Plaza."));
        assert!(out.contains("HP 100/100"));
    }

    #[tokio::test]
    async fn duplicate_and_missing_names_are_reported() {
        let (out, _) = run_script("new Lin\nquit\nnew Lin\nload Mei\n", MemoryStore::new()).await;
        assert!(out.contains("A character named Lin already exists."));
        assert!(out.contains("No saved character named Mei."));
    }

    #[tokio::test]
    async fn cache_commands_report_and_clear() {
        let (out, _) = run_script("new Lin\ncache\ncache clear\n", MemoryStore::new()).await;
        assert!(out.contains("Cache on: 0 entries, 0 hits."));
        assert!(out.contains("Cache cleared."));
    }

    #[test]
    fn commands_split_into_verb_and_argument() {
        assert_eq!(
            split_command("  NEW  Lin Mei "),
            ("new".to_owned(), Some("Lin Mei".to_owned()))
        );
        assert_eq!(split_command("saves"), ("saves".to_owned(), None));
    }
}
