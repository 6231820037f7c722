//! The four-stage agent pipeline.
//!
//! - **Observer** classifies the input into an [`Intent`].
//! - **Logic** and **Drama** run concurrently and never see each other's
//!   output.
//! - **Director** weighs both and is the only stage that proposes a
//!   [`StateDelta`](dao_types::StateDelta).
//!
//! Every stage degrades to a fixed fallback when the service returns an
//! empty result; only template failures surface as errors.

use dao_core::config::{RoleConfig, ServiceConfig};
use dao_core::tier_profile;
use dao_types::{Intent, IntentKind, PlayerState};
use dao_world::{Location, Npc};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::llm::{GenerationRequest, TextGenerator};
use crate::parse::{DirectorOutput, parse_director, parse_intent};
use crate::prompt::{PromptEngine, RenderedPrompt, Role};
use crate::service::ServiceCaller;

/// Logic report used when the Logic stage returns nothing.
pub const LOGIC_FALLBACK: &str =
    "No feasibility analysis is available. Judge the action by the rules alone.";

/// Drama proposal used when the Drama stage returns nothing.
pub const DRAMA_FALLBACK: &str =
    "No proposal. Keep the scene quiet and grounded in what the player did.";

/// Everything the Logic, Drama and Director stages read.
#[derive(Debug, Clone)]
pub struct TurnContext<'a> {
    /// Current player state.
    pub state: &'a PlayerState,
    /// Observer output.
    pub intent: &'a Intent,
    /// NPC the intent targets, if it resolved to a registered one.
    pub npc: Option<&'a Npc>,
    /// Recent event descriptions, newest first.
    pub recent_events: &'a [String],
    /// Earlier events at the current location, newest first.
    pub location_history: &'a [String],
    /// Exit and requirement summary for Logic.
    pub movement_context: String,
    /// Exit list for the Director.
    pub exits: String,
    /// Characters Drama may involve here.
    pub allowed_npcs: Vec<String>,
    /// Items Drama may hand out here.
    pub allowed_items: Vec<String>,
    /// Every canonical location id, for the Director's instructions.
    pub location_ids: Vec<String>,
    /// Whether this turn's random event roll fired.
    pub event_fired: bool,
    /// Current time description.
    pub time: String,
}

impl TurnContext<'_> {
    fn to_value(&self) -> Value {
        json!({
            "player": player_value(self.state),
            "intent": {
                "kind": self.intent.kind.as_str(),
                "target": self.intent.target,
                "details": self.intent.details,
                "confidence": self.intent.confidence,
            },
            "npc": self.npc.map(npc_value),
            "recent_events": self.recent_events,
            "location_history": self.location_history,
            "movement_context": self.movement_context,
            "exits": self.exits,
            "allowed_npcs": self.allowed_npcs,
            "allowed_items": self.allowed_items,
            "location_ids": self.location_ids,
            "event_fired": self.event_fired,
            "time": self.time,
        })
    }
}

/// Logic and Drama outputs for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deliberation {
    /// Feasibility report.
    pub logic: String,
    /// Narrative proposal.
    pub drama: String,
}

/// Drives the generative stages of a slow-path turn.
pub struct Orchestrator<G> {
    caller: ServiceCaller<G>,
    prompts: PromptEngine,
    service: ServiceConfig,
}

impl<G: TextGenerator> Orchestrator<G> {
    /// Assemble the pipeline.
    pub const fn new(caller: ServiceCaller<G>, prompts: PromptEngine, service: ServiceConfig) -> Self {
        Self {
            caller,
            prompts,
            service,
        }
    }

    /// Classify raw input. A failed or unparsable reply is `UNKNOWN` with
    /// zero confidence.
    pub async fn observe(&self, input: &str, recent: &[String]) -> Result<Intent, RunnerError> {
        let kinds: Vec<&str> = IntentKind::ALL.iter().map(|k| k.as_str()).collect();
        let context = json!({
            "input": input,
            "recent_events": recent,
            "intent_kinds": kinds,
        });
        let prompt = self.prompts.render(Role::Observer, &context)?;
        let intent = match self.ask(Role::Observer, prompt).await {
            Some(raw) => parse_intent(&raw),
            None => Intent::unknown(),
        };
        info!(
            intent = intent.kind.as_str(),
            confidence = intent.confidence,
            target = intent.target.as_deref().unwrap_or(""),
            "observer classified input"
        );
        Ok(intent)
    }

    /// Run Logic and Drama concurrently and wait for both.
    pub async fn deliberate(&self, ctx: &TurnContext<'_>) -> Result<Deliberation, RunnerError> {
        let context = ctx.to_value();
        let logic_prompt = self.prompts.render(Role::Logic, &context)?;
        let drama_prompt = self.prompts.render(Role::Drama, &context)?;

        let (logic, drama) = tokio::join!(
            self.ask(Role::Logic, logic_prompt),
            self.ask(Role::Drama, drama_prompt),
        );
        let logic = logic.unwrap_or_else(|| {
            warn!("logic stage returned nothing, using fallback");
            LOGIC_FALLBACK.to_owned()
        });
        let drama = drama.unwrap_or_else(|| {
            warn!("drama stage returned nothing, using fallback");
            DRAMA_FALLBACK.to_owned()
        });
        debug!(logic = %logic, drama = %drama, "deliberation complete");
        Ok(Deliberation { logic, drama })
    }

    /// Ask the Director for the final narration and delta. `feedback` is
    /// the previous attempt's error list, if any.
    pub async fn direct(
        &self,
        ctx: &TurnContext<'_>,
        deliberation: &Deliberation,
        feedback: Option<&str>,
    ) -> Result<DirectorOutput, RunnerError> {
        let mut context = ctx.to_value();
        if let Value::Object(map) = &mut context {
            map.insert("logic_report".to_owned(), json!(deliberation.logic));
            map.insert("drama_proposal".to_owned(), json!(deliberation.drama));
            map.insert("feedback".to_owned(), json!(feedback));
        }
        let prompt = self.prompts.render(Role::Director, &context)?;
        Ok(match self.ask(Role::Director, prompt).await {
            Some(raw) => parse_director(&raw),
            None => {
                warn!("director returned nothing, using fallback narration");
                DirectorOutput::fallback()
            }
        })
    }

    /// Opening narration for a new character, with a fixed fallback.
    pub async fn opening_scene(
        &self,
        state: &PlayerState,
        location: &Location,
    ) -> Result<String, RunnerError> {
        let context = json!({
            "player": player_value(state),
            "location_description": location.description,
        });
        let prompt = self.prompts.render(Role::Opening, &context)?;
        Ok(self
            .ask(Role::Opening, prompt)
            .await
            .map(|text| text.trim().to_owned())
            .unwrap_or_else(|| {
                format!(
                    "Mist clings to {}. {} Your path of cultivation begins here, {}.",
                    location.name, location.description, state.name
                )
            }))
    }

    async fn ask(&self, role: Role, prompt: RenderedPrompt) -> Option<String> {
        let settings = self.role_config(role);
        let request = GenerationRequest {
            system: prompt.system,
            user: prompt.user,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: self.service.max_tokens,
        };
        debug!(role = role.as_str(), model = %request.model, "calling service");
        self.caller.call(&request).await
    }

    const fn role_config(&self, role: Role) -> &RoleConfig {
        match role {
            Role::Observer => &self.service.observer,
            Role::Logic => &self.service.logic,
            Role::Drama => &self.service.drama,
            Role::Director => &self.service.director,
            Role::Opening => &self.service.opening,
        }
    }
}

fn player_value(state: &PlayerState) -> Value {
    let profile = tier_profile(state.tier);
    json!({
        "name": state.name,
        "tier": state.tier.to_string(),
        "tier_title": profile.title(),
        "hp": state.hp,
        "max_hp": state.max_hp,
        "mp": state.mp,
        "max_mp": state.max_mp,
        "karma": state.karma,
        "cultivation_progress": state.cultivation_progress,
        "required_progress": profile.required_progress,
        "inventory": state.inventory,
        "skills": state.skills,
        "location_id": state.location_id.as_str(),
        "location_name": state.location_name,
    })
}

fn npc_value(npc: &Npc) -> Value {
    json!({
        "id": npc.id.as_str(),
        "name": npc.name,
        "title": npc.title,
        "tier": npc.tier.to_string(),
        "combat_style": npc.combat_style,
        "personality": npc.personality,
        "lore": npc.lore,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use dao_types::{LocationId, PlayerId, Tier};
    use dao_world::starting_world;

    use super::*;
    use crate::service::RetryPolicy;
    use crate::testing::{self, FakeService};

    fn orchestrator(service: FakeService) -> Orchestrator<FakeService> {
        let config = testing::service_config();
        Orchestrator::new(
            ServiceCaller::new(service, RetryPolicy::from_config(&config)),
            PromptEngine::new(None).unwrap(),
            config,
        )
    }

    fn player() -> PlayerState {
        PlayerState {
            id: PlayerId::new(),
            name: "Lin".to_owned(),
            tier: Tier::FLOOR,
            hp: 100,
            max_hp: 100,
            mp: 50,
            max_mp: 50,
            karma: 0,
            location_id: LocationId::new("qingyun_plaza"),
            location_name: "Outer Sect Plaza".to_owned(),
            inventory: vec!["Cloth Robe".to_owned()],
            skills: BTreeSet::new(),
            cultivation_progress: 0,
            breakthrough_attempts: 0,
            experience: 0,
            current_tick: 0,
            created_at: Utc::now(),
        }
    }

    fn context<'a>(state: &'a PlayerState, intent: &'a Intent) -> TurnContext<'a> {
        TurnContext {
            state,
            intent,
            npc: None,
            recent_events: &[],
            location_history: &[],
            movement_context: "north: Hall of Azure Clouds".to_owned(),
            exits: "north (Hall of Azure Clouds)".to_owned(),
            allowed_npcs: vec!["Elder Chen".to_owned()],
            allowed_items: Vec::new(),
            location_ids: vec!["qingyun_plaza".to_owned()],
            event_fired: false,
            time: "Day 1, Dawn (Spring)".to_owned(),
        }
    }

    #[tokio::test]
    async fn observer_parses_intent() {
        let service = FakeService::new().queue(
            testing::OBSERVER,
            r#"{"intent": "TALK", "target": "Elder Chen", "confidence": 0.9}"#,
        );
        let intent = orchestrator(service)
            .observe("greet the elder", &[])
            .await
            .unwrap();
        assert_eq!(intent.kind, IntentKind::Talk);
        assert_eq!(intent.target.as_deref(), Some("Elder Chen"));
    }

    #[tokio::test]
    async fn observer_failure_is_unknown() {
        let intent = orchestrator(FakeService::new())
            .observe("greet the elder", &[])
            .await
            .unwrap();
        assert_eq!(intent, Intent::unknown());
    }

    #[tokio::test]
    async fn deliberation_calls_both_stages_and_falls_back() {
        let service = FakeService::new().queue(testing::LOGIC, "Feasible. Costs nothing.");
        let script = service.clone();
        let orchestrator = orchestrator(service);
        let (state, intent) = (player(), Intent::new(IntentKind::Inspect, 0.9));
        let deliberation = orchestrator
            .deliberate(&context(&state, &intent))
            .await
            .unwrap();
        assert_eq!(deliberation.logic, "Feasible. Costs nothing.");
        assert_eq!(deliberation.drama, DRAMA_FALLBACK);
        assert_eq!(script.calls_to(testing::DRAMA), 1);
    }

    #[tokio::test]
    async fn director_receives_feedback() {
        let service = FakeService::new().always(
            testing::DIRECTOR,
            r#"{"narrative": "You bow.", "state_update": {"karma_change": 1}}"#,
        );
        let script = service.clone();
        let orchestrator = orchestrator(service);
        let (state, intent) = (player(), Intent::new(IntentKind::Talk, 0.9));
        let deliberation = Deliberation {
            logic: "ok".to_owned(),
            drama: "ok".to_owned(),
        };
        let out = orchestrator
            .direct(&context(&state, &intent), &deliberation, Some("- hp_change is missing"))
            .await
            .unwrap();
        assert_eq!(out.narration, "You bow.");
        assert_eq!(out.delta.karma_change, 1);

        let requests = script.requests();
        let last = requests.last().unwrap();
        assert!(last.user.contains("hp_change is missing"));
        assert!((last.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn opening_scene_has_a_fallback() {
        let graph = starting_world().unwrap();
        let plaza = graph.get(&LocationId::new("qingyun_plaza")).unwrap();
        let text = orchestrator(FakeService::new())
            .opening_scene(&player(), plaza)
            .await
            .unwrap();
        assert!(text.contains("Outer Sect Plaza"));
        assert!(text.contains("Lin"));
    }
}
