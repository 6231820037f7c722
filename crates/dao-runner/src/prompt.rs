//! Prompt template loading and rendering via `minijinja`.
//!
//! Every pipeline role has a system and a user template. Built-in copies
//! are compiled into the binary; a `TEMPLATES_DIR` may override any of
//! them with a file named `<role>_system.j2` or `<role>_user.j2`.

use std::path::Path;

use minijinja::Environment;
use tracing::info;

use crate::error::RunnerError;

/// A stage of the agent pipeline that talks to the generative service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Intent classification.
    Observer,
    /// Feasibility analysis.
    Logic,
    /// Narrative proposal.
    Drama,
    /// Final narration and state delta.
    Director,
    /// New-character opening scene.
    Opening,
}

impl Role {
    /// Every role, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Observer,
        Self::Logic,
        Self::Drama,
        Self::Director,
        Self::Opening,
    ];

    /// Template name prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observer => "observer",
            Self::Logic => "logic",
            Self::Drama => "drama",
            Self::Director => "director",
            Self::Opening => "opening",
        }
    }

    const fn builtin(self) -> (&'static str, &'static str) {
        match self {
            Self::Observer => (
                include_str!("../templates/observer_system.j2"),
                include_str!("../templates/observer_user.j2"),
            ),
            Self::Logic => (
                include_str!("../templates/logic_system.j2"),
                include_str!("../templates/logic_user.j2"),
            ),
            Self::Drama => (
                include_str!("../templates/drama_system.j2"),
                include_str!("../templates/drama_user.j2"),
            ),
            Self::Director => (
                include_str!("../templates/director_system.j2"),
                include_str!("../templates/director_user.j2"),
            ),
            Self::Opening => (
                include_str!("../templates/opening_system.j2"),
                include_str!("../templates/opening_user.j2"),
            ),
        }
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System role text.
    pub system: String,
    /// User role text.
    pub user: String,
}

impl PromptEngine {
    /// Load the built-in templates, then apply overrides from `templates_dir`.
    pub fn new(templates_dir: Option<&Path>) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for role in Role::ALL {
            let (system, user) = role.builtin();
            add(&mut env, format!("{}_system", role.as_str()), system.to_owned())?;
            add(&mut env, format!("{}_user", role.as_str()), user.to_owned())?;
        }

        if let Some(dir) = templates_dir {
            for role in Role::ALL {
                for part in ["system", "user"] {
                    let name = format!("{}_{part}", role.as_str());
                    let path = dir.join(format!("{name}.j2"));
                    if !path.exists() {
                        continue;
                    }
                    let source = std::fs::read_to_string(&path).map_err(|e| {
                        RunnerError::Template(format!("failed to read {}: {e}", path.display()))
                    })?;
                    add(&mut env, name.clone(), source)?;
                    info!(template = name, path = %path.display(), "prompt template overridden");
                }
            }
        }

        Ok(Self { env })
    }

    /// Render both halves of a role's prompt against `context`.
    pub fn render(
        &self,
        role: Role,
        context: &serde_json::Value,
    ) -> Result<RenderedPrompt, RunnerError> {
        Ok(RenderedPrompt {
            system: self.render_one(&format!("{}_system", role.as_str()), context)?,
            user: self.render_one(&format!("{}_user", role.as_str()), context)?,
        })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, RunnerError> {
        self.env
            .get_template(name)
            .map_err(|e| RunnerError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map(|text| text.trim().to_owned())
            .map_err(|e| RunnerError::Template(format!("{name} render failed: {e}")))
    }
}

fn add(env: &mut Environment<'static>, name: String, source: String) -> Result<(), RunnerError> {
    env.add_template_owned(name.clone(), source)
        .map_err(|e| RunnerError::Template(format!("failed to add {name} template: {e}")))
}
