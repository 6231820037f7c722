//! The turn controller: one input in, one narrated and validated outcome
//! out.
//!
//! Shortcuts and direction aliases are settled on the fast path by the
//! rule engines. Everything else goes through the Observer, the action
//! cache, and the Logic/Drama/Director pipeline, then through NPC
//! sanitizing and the three validation levels. The controller is the
//! only writer of [`PlayerState`]: every path ends in the same apply,
//! clock, event-log and save-trigger step.

use chrono::Utc;
use dao_core::config::{GameConfig, PlayerConfig};
use dao_core::{TimeAdvance, TimeEngine, attempt_breakthrough, cultivate};
use dao_store::{EventRecord, PlayerStore};
use dao_types::{Intent, IntentKind, NpcId, PlayerId, PlayerState, StateDelta};
use dao_world::movement::ARRIVAL_VARIANTS;
use dao_world::{
    Catalog, ContentSource, Location, LocationResolution, MovementCheck, WorldError, WorldGraph,
    arrival_narration, validate_movement,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::autofix::AutoFixer;
use crate::cache::{ActionCache, CacheStats, CachedTurn};
use crate::error::RunnerError;
use crate::llm::TextGenerator;
use crate::npc_guard::{NpcGuard, Scene};
use crate::orchestrator::{Deliberation, Orchestrator, TurnContext};
use crate::parse::DirectorOutput;
use crate::shortcut::{self, Shortcut};
use crate::validator::{ConsistencyValidator, ValidationReport, movement_refusal};

/// Event descriptions are cut to this many characters.
const EVENT_SUMMARY_CHARS: usize = 150;

/// Share of max HP restored by resting, in percent.
const REST_HP_PCT: u32 = 20;

/// Share of max MP restored by resting, in percent.
const REST_MP_PCT: u32 = 30;

const CLARIFICATION: &str =
    "The mists of intent are unclear. Could you describe what you want to do more plainly?";

/// How a turn was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPath {
    /// Answered from state alone; no time passed.
    Instant,
    /// Resolved by the rule engines without the generative service.
    FastPath,
    /// Replayed from the action cache.
    Cached,
    /// Resolved through the agent pipeline.
    Generated,
    /// Intent confidence was too low; nothing changed.
    Clarification,
    /// The action is not possible here or now; nothing changed.
    Refused,
}

/// Everything the front-end needs to show for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Narration, empty for refusals and clarifications.
    pub narration: String,
    /// Clock movement, if time passed.
    pub time: Option<TimeAdvance>,
    /// System messages: refusals, clarifications, hints.
    pub messages: Vec<String>,
    /// Resolution path.
    pub path: TurnPath,
    /// The delta still failed validation after auto-fix and was applied
    /// with its unsafe parts removed.
    pub best_effort: bool,
    /// Whether the player was saved after this turn.
    pub saved: bool,
    /// Logic and Drama output, when debate display is enabled.
    pub debate: Option<Deliberation>,
}

impl TurnOutcome {
    const fn quiet(path: TurnPath, narration: String, messages: Vec<String>) -> Self {
        Self {
            narration,
            time: None,
            messages,
            path,
            best_effort: false,
            saved: false,
            debate: None,
        }
    }

    const fn instant(text: String) -> Self {
        Self::quiet(TurnPath::Instant, text, Vec::new())
    }

    fn refused(text: impl Into<String>) -> Self {
        Self::quiet(TurnPath::Refused, String::new(), vec![text.into()])
    }
}

/// Narration and delta settled by the slow path.
struct Resolution {
    narration: String,
    delta: StateDelta,
    best_effort: bool,
    debate: Deliberation,
}

/// Director output after canonicalization, NPC sanitizing and validation.
struct Checked {
    narration: String,
    delta: StateDelta,
    report: ValidationReport,
}

/// Build a fresh character from the player template.
pub fn new_character(
    name: &str,
    config: &PlayerConfig,
    graph: &WorldGraph,
) -> Result<PlayerState, RunnerError> {
    let start = match &config.start_location {
        Some(label) => graph.resolve(label).ok_or_else(|| {
            RunnerError::Config(format!("start location '{label}' is not on the map"))
        })?,
        None => graph
            .get(graph.start())
            .ok_or_else(|| WorldError::LocationNotFound(graph.start().clone()))?,
    };
    Ok(PlayerState {
        id: PlayerId::new(),
        name: name.trim().to_owned(),
        tier: config.tier,
        hp: config.max_hp,
        max_hp: config.max_hp,
        mp: config.max_mp,
        max_mp: config.max_mp,
        karma: 0,
        location_id: start.id.clone(),
        location_name: start.name.clone(),
        inventory: config.inventory.clone(),
        skills: config.skills.iter().cloned().collect(),
        cultivation_progress: 0,
        breakthrough_attempts: 0,
        experience: 0,
        current_tick: 0,
        created_at: Utc::now(),
    })
}

/// Owns the player state for one session and resolves turns against it.
pub struct TurnController<G, S> {
    state: PlayerState,
    clock: TimeEngine,
    cache: ActionCache,
    orchestrator: Orchestrator<G>,
    validator: ConsistencyValidator,
    fixer: AutoFixer,
    guard: NpcGuard,
    catalog: Catalog,
    store: S,
    config: GameConfig,
    turns_since_save: u32,
    rng: StdRng,
}

impl<G: TextGenerator, S: PlayerStore> TurnController<G, S> {
    /// Start a session for `state`, which must already exist in `store`.
    pub fn new(
        orchestrator: Orchestrator<G>,
        catalog: Catalog,
        store: S,
        config: GameConfig,
        state: PlayerState,
    ) -> Result<Self, RunnerError> {
        let npc_names: Vec<String> = catalog
            .registry()
            .iter()
            .map(|npc| npc.name.clone())
            .collect();
        let validator = ConsistencyValidator::new(&config.validator, &npc_names);
        info!(
            player = %state.name,
            location = %state.location_id,
            tick = state.current_tick,
            "session started"
        );
        Ok(Self {
            clock: TimeEngine::at(state.current_tick),
            cache: ActionCache::new(config.cache.ttl(), config.cache.enabled),
            orchestrator,
            validator,
            fixer: AutoFixer::new()?,
            guard: NpcGuard::new()?,
            catalog,
            store,
            config,
            turns_since_save: 0,
            rng: StdRng::from_os_rng(),
            state,
        })
    }

    /// Replace the random source, for reproducible sessions.
    #[cfg(test)]
    #[must_use]
    pub const fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Current player state.
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Action cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached turn.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        info!("action cache cleared");
    }

    /// End the session, handing back what the next session needs.
    pub fn finish(self) -> (Orchestrator<G>, Catalog, S) {
        (self.orchestrator, self.catalog, self.store)
    }

    /// Persist the current state now.
    pub fn save(&mut self) -> Result<(), RunnerError> {
        self.store.save_player(&self.state)?;
        self.turns_since_save = 0;
        Ok(())
    }

    /// Opening narration for the current location.
    pub async fn opening_scene(&self) -> Result<String, RunnerError> {
        let location = self.here()?;
        self.orchestrator.opening_scene(&self.state, location).await
    }

    /// Resolve one line of player input.
    pub async fn play_turn(&mut self, input: &str) -> Result<TurnOutcome, RunnerError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::refused("Say or do something."));
        }
        let swept = self.cache.sweep_expired();
        if swept > 0 {
            debug!(swept, "evicted expired cache entries");
        }

        let npcs_here: Vec<String> = self
            .catalog
            .npcs_at(&self.state.location_id)
            .into_iter()
            .map(|npc| npc.name.clone())
            .collect();
        let shortcut = shortcut::classify(input, &npcs_here);
        debug!(input, shortcut = ?shortcut, "classified input");

        let outcome = match shortcut {
            Some(Shortcut::Inventory) => TurnOutcome::instant(inventory_panel(&self.state)),
            Some(Shortcut::Status) => TurnOutcome::instant(status_panel(&self.state, &self.clock)),
            Some(Shortcut::Move(direction)) => self.travel(direction.as_str())?,
            Some(Shortcut::Cultivate) => self.meditate()?,
            Some(Shortcut::Breakthrough) => self.break_through()?,
            Some(Shortcut::Rest) => self.rest()?,
            Some(Shortcut::Invalid(reason)) => TurnOutcome::refused(reason),
            Some(Shortcut::Expand(phrase)) => self.slow_path(&phrase).await?,
            None => self.slow_path(input).await?,
        };
        info!(
            player = %self.state.name,
            path = ?outcome.path,
            tick = self.clock.tick(),
            best_effort = outcome.best_effort,
            saved = outcome.saved,
            "turn resolved"
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Fast path
    // -----------------------------------------------------------------

    fn travel(&mut self, direction_or_label: &str) -> Result<TurnOutcome, RunnerError> {
        let graph = self.catalog.graph();
        match validate_movement(
            graph,
            &self.state.location_id,
            direction_or_label,
            self.state.tier,
        ) {
            MovementCheck::Valid {
                destination_id,
                destination_name,
                direction,
            } => {
                let variant = self.rng.random_range(0..ARRIVAL_VARIANTS);
                let narration = arrival_narration(graph, &destination_id, direction, variant);
                info!(to = %destination_id, name = %destination_name, "fast-path move");
                let delta = StateDelta {
                    location_id: Some(destination_id),
                    ..StateDelta::default()
                };
                self.commit(TurnPath::FastPath, IntentKind::Move, narration, &delta, None)
            }
            MovementCheck::Invalid { reason } => {
                debug!(reason = %reason, "movement refused");
                Ok(TurnOutcome::refused(reason))
            }
        }
    }

    fn meditate(&mut self) -> Result<TurnOutcome, RunnerError> {
        let here = self.here()?;
        if !here.permits(IntentKind::Cultivate) {
            return Ok(TurnOutcome::refused(format!(
                "{} is no place for meditation.",
                here.name
            )));
        }
        let gain = match cultivate(&self.state, here.cultivation_bonus_pct) {
            Ok(gain) => gain,
            Err(refusal) => return Ok(TurnOutcome::refused(format!("You cannot cultivate: {refusal}."))),
        };
        let mut outcome = self.commit(
            TurnPath::FastPath,
            IntentKind::Cultivate,
            gain.message.clone(),
            &gain.delta,
            None,
        )?;
        if gain.breakthrough_ready {
            outcome
                .messages
                .push("Your foundation is full. You may attempt a breakthrough (b).".to_owned());
        }
        Ok(outcome)
    }

    fn break_through(&mut self) -> Result<TurnOutcome, RunnerError> {
        let here = self.here()?;
        if !here.permits(IntentKind::Cultivate) {
            return Ok(TurnOutcome::refused(format!(
                "{} is too turbulent for a breakthrough.",
                here.name
            )));
        }
        let outcome = match attempt_breakthrough(&self.state, &mut self.rng) {
            Ok(outcome) => outcome,
            Err(refusal) => {
                return Ok(TurnOutcome::refused(format!(
                    "You cannot attempt a breakthrough: {refusal}."
                )));
            }
        };
        info!(
            success = outcome.success,
            roll = outcome.roll,
            rate = outcome.rate,
            from = %outcome.from,
            to = %outcome.to,
            "breakthrough attempted"
        );
        self.commit(
            TurnPath::FastPath,
            IntentKind::Cultivate,
            outcome.message.clone(),
            &outcome.delta,
            None,
        )
    }

    fn rest(&mut self) -> Result<TurnOutcome, RunnerError> {
        let here = self.here()?;
        if !here.permits(IntentKind::Rest) {
            return Ok(TurnOutcome::refused(format!(
                "It is not safe to rest in {}.",
                here.name
            )));
        }
        let hp = percent_of(self.state.max_hp, REST_HP_PCT);
        let mp = percent_of(self.state.max_mp, REST_MP_PCT);
        let healed = self.state.max_hp.saturating_sub(self.state.hp).min(hp);
        let restored = self.state.max_mp.saturating_sub(self.state.mp).min(mp);
        let delta = StateDelta {
            hp_change: i32::try_from(hp).unwrap_or(i32::MAX),
            mp_change: i32::try_from(mp).unwrap_or(i32::MAX),
            ..StateDelta::default()
        };
        let narration = format!(
            "You sit in stillness and let your breath settle. You recover {healed} HP and {restored} MP."
        );
        self.commit(TurnPath::FastPath, IntentKind::Rest, narration, &delta, None)
    }

    // -----------------------------------------------------------------
    // Slow path
    // -----------------------------------------------------------------

    async fn slow_path(&mut self, input: &str) -> Result<TurnOutcome, RunnerError> {
        let recent = self.recent_descriptions()?;
        let intent = self.orchestrator.observe(input, &recent).await?;
        if intent.confidence < self.config.validator.confidence_threshold {
            info!(
                confidence = intent.confidence,
                threshold = self.config.validator.confidence_threshold,
                "intent unclear, asking for clarification"
            );
            return Ok(TurnOutcome::quiet(
                TurnPath::Clarification,
                String::new(),
                vec![CLARIFICATION.to_owned()],
            ));
        }

        if intent.kind == IntentKind::Move
            && let Some(target) = intent.target.as_deref()
        {
            return self.travel(target);
        }
        let here = self.here()?;
        if !here.permits(intent.kind) {
            return Ok(TurnOutcome::refused(format!(
                "That cannot be done in {}.",
                here.name
            )));
        }

        let cacheable = intent.kind.is_cacheable();
        let fingerprint = ActionCache::fingerprint(input, &self.state);
        if cacheable && let Some(hit) = self.cache.get(&fingerprint) {
            info!(intent = hit.kind.as_str(), "serving cached turn");
            return self.commit(TurnPath::Cached, hit.kind, hit.narration, &hit.delta, None);
        }

        let related = intent
            .target
            .as_deref()
            .and_then(|target| self.catalog.resolve_npc(target))
            .map(|npc| npc.id.clone());
        let event_fired = self.catalog.graph().roll_event(
            &self.state.location_id,
            self.state.karma,
            &mut self.rng,
        );
        if event_fired {
            info!(location = %self.state.location_id, "random event fired");
        }

        let resolution = self.generate(&intent, &recent, event_fired).await?;
        if cacheable
            && !resolution.best_effort
            && !event_fired
            && ActionCache::replayable(&resolution.delta)
        {
            self.cache.set(
                fingerprint,
                CachedTurn {
                    narration: resolution.narration.clone(),
                    delta: resolution.delta.clone(),
                    kind: intent.kind,
                },
            );
        }

        let mut outcome = self.commit(
            TurnPath::Generated,
            intent.kind,
            resolution.narration,
            &resolution.delta,
            related,
        )?;
        outcome.best_effort = resolution.best_effort;
        if self.config.game.show_debate {
            outcome.debate = Some(resolution.debate);
        }
        Ok(outcome)
    }

    async fn generate(
        &self,
        intent: &Intent,
        recent: &[String],
        event_fired: bool,
    ) -> Result<Resolution, RunnerError> {
        let graph = self.catalog.graph();
        let location = &self.state.location_id;
        let history: Vec<String> = self
            .store
            .location_history(self.state.id, location, self.config.game.recent_events)?
            .into_iter()
            .map(|event| event.description)
            .collect();
        let ctx = TurnContext {
            state: &self.state,
            intent,
            npc: intent
                .target
                .as_deref()
                .and_then(|target| self.catalog.resolve_npc(target)),
            recent_events: recent,
            location_history: &history,
            movement_context: graph.movement_context(location),
            exits: graph.exits_summary(location),
            allowed_npcs: self
                .catalog
                .available_npcs(location)
                .into_iter()
                .map(|npc| npc.name.clone())
                .collect(),
            allowed_items: self.catalog.available_items(location),
            location_ids: graph.locations().map(|l| l.id.to_string()).collect(),
            event_fired,
            time: self.clock.describe(),
        };
        let debate = self.orchestrator.deliberate(&ctx).await?;
        let scene = Scene {
            location,
            player_name: &self.state.name,
            recent,
        };

        let retries = self.config.validator.director_retries;
        let mut feedback: Option<String> = None;
        let mut attempt: u32 = 0;
        let checked = loop {
            let output = self
                .orchestrator
                .direct(&ctx, &debate, feedback.as_deref())
                .await?;
            let checked = self.check(output, &scene);
            if checked.report.is_valid() || attempt >= retries {
                break checked;
            }
            attempt = attempt.saturating_add(1);
            warn!(
                attempt,
                errors = checked.report.errors.len(),
                "director output failed validation, retrying with feedback"
            );
            feedback = Some(checked.report.feedback());
        };

        if checked.report.is_valid() {
            return Ok(Resolution {
                narration: checked.narration,
                delta: checked.delta,
                best_effort: false,
                debate,
            });
        }

        let mut known_items = self.state.inventory.clone();
        known_items.extend(self.catalog.available_items(location));
        let repair = self.fixer.repair(
            &checked.narration,
            &checked.delta,
            self.validator.scanner(),
            graph,
            &self.state,
            &known_items,
        );
        let report = self
            .validator
            .validate(&checked.narration, &repair.delta, &self.state, graph);
        let (delta, best_effort) = if report.is_valid() {
            info!(fixes = repair.notes.len(), "auto-fix reconciled the delta");
            (repair.delta, false)
        } else {
            let remaining: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
            warn!(errors = ?remaining, "proceeding with best-effort delta");
            (self.strip_unsafe(repair.delta), true)
        };
        Ok(Resolution {
            narration: checked.narration,
            delta,
            best_effort,
            debate,
        })
    }

    fn check(&self, output: DirectorOutput, scene: &Scene<'_>) -> Checked {
        if !output.parsed {
            warn!("director reply carried no usable decision, using fallback narration");
        }
        if !output.dropped_keys.is_empty() {
            warn!(keys = ?output.dropped_keys, "dropped unknown state keys");
        }
        let graph = self.catalog.graph();
        let mut delta = output.delta;
        match graph.canonicalize_location(&mut delta) {
            LocationResolution::Rewritten { from, to } => {
                debug!(from = %from, to = %to, "canonicalized location");
            }
            LocationResolution::Unresolved(raw) => {
                warn!(location = %raw, "delta names a location that is not on the map");
            }
            LocationResolution::Absent | LocationResolution::Canonical(_) => {}
        }

        let guarded = self.guard.sanitize(
            &output.narration,
            &delta,
            &output.characters,
            scene,
            &self.catalog,
        );
        debug!(
            replaced = guarded.replaced.len(),
            dropped_relations = guarded.dropped_relations.len(),
            "npc guard applied"
        );
        let report = self
            .validator
            .validate(&guarded.narration, &guarded.delta, &self.state, graph);
        for finding in &report.warnings {
            warn!(rule = ?finding.rule, message = %finding.message, "consistency warning");
        }
        for finding in &report.errors {
            warn!(rule = ?finding.rule, message = %finding.message, "consistency error");
        }
        Checked {
            narration: guarded.narration,
            delta: guarded.delta,
            report,
        }
    }

    /// Remove the parts of a still-invalid delta that would corrupt state.
    fn strip_unsafe(&self, mut delta: StateDelta) -> StateDelta {
        if let Some(location) = &delta.location_id
            && let Some(reason) = movement_refusal(self.catalog.graph(), &self.state, location)
        {
            debug!(location = %location, reason = %reason, "dropped illegal destination");
            delta.location_id = None;
        }
        let hp_floor = i32::try_from(self.state.hp).map_or(i32::MIN, i32::saturating_neg);
        let mp_floor = i32::try_from(self.state.mp).map_or(i32::MIN, i32::saturating_neg);
        delta.hp_change = delta.hp_change.max(hp_floor);
        delta.mp_change = delta.mp_change.max(mp_floor);
        delta
            .items_lost
            .retain(|item| self.state.inventory.contains(item));
        delta
    }

    // -----------------------------------------------------------------
    // Apply
    // -----------------------------------------------------------------

    /// Apply `delta` as one step.
    ///
    /// The next state and clock are built on copies and only replace the
    /// live ones once the event log, relations, and any save have been
    /// written. A failed write leaves the session where it was.
    fn commit(
        &mut self,
        path: TurnPath,
        kind: IntentKind,
        narration: String,
        delta: &StateDelta,
        related: Option<NpcId>,
    ) -> Result<TurnOutcome, RunnerError> {
        let mut next = self.state.clone();
        next.apply(delta);
        if let Some(name) = self.catalog.graph().display_name(&next.location_id) {
            next.location_name = name.to_owned();
        }
        let mut clock = self.clock.clone();
        let time = clock.advance_for(kind)?;
        next.current_tick = time.tick;

        let mut record = EventRecord::new(
            time.tick,
            next.location_id.clone(),
            kind.as_str(),
            narration.chars().take(EVENT_SUMMARY_CHARS).collect::<String>(),
        );
        if let Some(npc) = related {
            record = record.with_npc(npc);
        }
        self.store.log_event(next.id, record)?;

        for (npc, change) in &delta.npc_relations {
            let score = self.store.update_npc_relation(next.id, npc, *change)?;
            info!(npc = %npc, change, score, "relation updated");
        }

        let turns = self.turns_since_save.saturating_add(1);
        let reason = self.save_reason(&next, delta, turns);
        if let Some(reason) = reason {
            self.store.save_player(&next)?;
            info!(player = %next.name, reason, "player saved");
        }

        self.state = next;
        self.clock = clock;
        self.turns_since_save = if reason.is_some() { 0 } else { turns };
        Ok(TurnOutcome {
            narration,
            time: Some(time),
            messages: Vec::new(),
            path,
            best_effort: false,
            saved: reason.is_some(),
            debate: None,
        })
    }

    /// Why the turn that led from the live state to `next` should be saved.
    fn save_reason(
        &self,
        next: &PlayerState,
        delta: &StateDelta,
        turns: u32,
    ) -> Option<&'static str> {
        let game = &self.config.game;
        let hp_lost = self.state.hp.saturating_sub(next.hp);
        if hp_lost > game.large_hp_loss {
            Some("large hp loss")
        } else if !delta.items_gained.is_empty() || !delta.skills_gained.is_empty() {
            Some("acquisition")
        } else if self.state.location_id != next.location_id {
            Some("location change")
        } else if delta.changes_rank() {
            Some("rank change")
        } else if delta.experience_gained > 0
            && delta.experience_gained >= game.large_experience_gain
        {
            Some("experience gain")
        } else if game.autosave_every_turns > 0 && turns >= game.autosave_every_turns {
            Some("autosave")
        } else {
            None
        }
    }

    fn recent_descriptions(&self) -> Result<Vec<String>, RunnerError> {
        Ok(self
            .store
            .recent_events(self.state.id, self.config.game.recent_events)?
            .into_iter()
            .map(|event| event.description)
            .collect())
    }

    fn here(&self) -> Result<&Location, RunnerError> {
        self.catalog
            .graph()
            .get(&self.state.location_id)
            .ok_or_else(|| WorldError::LocationNotFound(self.state.location_id.clone()).into())
    }
}

fn percent_of(value: u32, pct: u32) -> u32 {
    value.saturating_mul(pct) / 100
}

fn inventory_panel(state: &PlayerState) -> String {
    if state.inventory.is_empty() {
        return "Your pouch is empty.".to_owned();
    }
    let lines: Vec<String> = state
        .inventory
        .iter()
        .map(|item| format!("  - {item}"))
        .collect();
    format!("You carry:\n{}", lines.join("\n"))
}

fn status_panel(state: &PlayerState, clock: &TimeEngine) -> String {
    let profile = dao_core::tier_profile(state.tier);
    let skills = if state.skills.is_empty() {
        "none".to_owned()
    } else {
        state.skills.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    format!(
        "{name} | {title} (tier {tier})\n\
         HP {hp}/{max_hp}  MP {mp}/{max_mp}  Karma {karma}\n\
         Cultivation {progress}/{required}  Experience {experience}\n\
         Location: {location}\n\
         Skills: {skills}\n\
         {time}",
        name = state.name,
        title = profile.title(),
        tier = state.tier,
        hp = state.hp,
        max_hp = state.max_hp,
        mp = state.mp,
        max_mp = state.max_mp,
        karma = state.karma,
        progress = state.cultivation_progress,
        required = profile.required_progress,
        experience = state.experience,
        location = state.location_name,
        time = clock.describe(),
    )
}
