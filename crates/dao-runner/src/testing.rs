//! Test doubles shared by the orchestrator and turn controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use dao_core::config::{RoleConfig, ServiceConfig};

use crate::error::ServiceError;
use crate::llm::{GenerationRequest, TextGenerator};

/// Observer model id in [`service_config`].
pub const OBSERVER: &str = "observer-model";
/// Logic model id.
pub const LOGIC: &str = "logic-model";
/// Drama model id.
pub const DRAMA: &str = "drama-model";
/// Director model id.
pub const DIRECTOR: &str = "director-model";
/// Opening-scene model id.
pub const OPENING: &str = "opening-model";

/// Service settings with a distinct model per role so the fake can tell
/// the stages apart.
pub fn service_config() -> ServiceConfig {
    let role = |model: &str, temperature: f64| RoleConfig {
        model: model.to_owned(),
        temperature,
    };
    ServiceConfig {
        observer: role(OBSERVER, 0.5),
        logic: role(LOGIC, 0.5),
        drama: role(DRAMA, 0.8),
        director: role(DIRECTOR, 0.7),
        opening: role(OPENING, 0.9),
        ..ServiceConfig::default()
    }
}

/// Replies per model from a queue, then from a standing default. A model
/// with neither is refused with a non-retryable error. Clones share
/// state, so a test can keep one to inspect the calls.
#[derive(Clone, Default)]
pub struct FakeService {
    queued: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    standing: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl FakeService {
    /// A service with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply once with `text` for `model`.
    pub fn queue(self, model: &str, text: &str) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued
                .entry(model.to_owned())
                .or_default()
                .push_back(text.to_owned());
        }
        self
    }

    /// Reply with `text` for `model` whenever the queue is empty.
    pub fn always(self, model: &str, text: &str) -> Self {
        if let Ok(mut standing) = self.standing.lock() {
            standing.insert(model.to_owned(), text.to_owned());
        }
        self
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests for `model`.
    pub fn calls_to(&self, model: &str) -> usize {
        self.requests().iter().filter(|r| r.model == model).count()
    }
}

impl TextGenerator for FakeService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let queued = self
            .queued
            .lock()
            .ok()
            .and_then(|mut q| q.get_mut(&request.model).and_then(VecDeque::pop_front));
        let reply = queued.or_else(|| {
            self.standing
                .lock()
                .ok()
                .and_then(|s| s.get(&request.model).cloned())
        });
        reply.ok_or_else(|| ServiceError::Rejected {
            status: 400,
            body: format!("no scripted reply for {}", request.model),
        })
    }
}
