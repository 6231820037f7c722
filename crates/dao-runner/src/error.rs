//! Error types for the turn pipeline.
//!
//! [`RunnerError`] covers everything that can stop the runner itself:
//! configuration, templates, storage, content. [`ServiceError`] is kept
//! separate because generative-service failures never stop a turn; the
//! service caller classifies them and degrades to an empty result.

use std::time::Duration;

/// Errors that can occur during runner operation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to load or render a prompt template.
    #[error("template error: {0}")]
    Template(String),

    /// A built-in extraction pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The game configuration file could not be loaded.
    #[error("game config error: {0}")]
    GameConfig(#[from] dao_core::ConfigError),

    /// World or NPC content could not be loaded.
    #[error("world error: {0}")]
    World(#[from] dao_world::WorldError),

    /// The save store failed.
    #[error("store error: {0}")]
    Store(#[from] dao_store::StoreError),

    /// The world clock could not advance.
    #[error("clock error: {0}")]
    Clock(#[from] dao_core::ClockError),

    /// Terminal input or output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// How the service caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retrying cannot help (bad credentials, rejected request).
    Fatal,
    /// The service asked us to slow down; retry with the longer backoff.
    RateLimited,
    /// Connectivity, server, timeout or garbled reply; retry normally.
    Transient,
}

/// A failed call to the generative text service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// Credentials were refused (HTTP 401/403).
    #[error("authentication failed ({status}): {body}")]
    Authentication {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request itself was refused (other 4xx).
    #[error("request rejected ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Too many requests (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The service could not be reached.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The service failed (5xx).
    #[error("server error ({status}): {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// No reply within the per-call deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The reply did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Authentication { status, body },
            429 => Self::RateLimited(body),
            500..=599 => Self::Server { status, body },
            _ => Self::Rejected { status, body },
        }
    }

    /// Retry classification.
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Authentication { .. } | Self::Rejected { .. } => FailureClass::Fatal,
            Self::RateLimited(_) => FailureClass::RateLimited,
            Self::Connectivity(_)
            | Self::Server { .. }
            | Self::Timeout(_)
            | Self::MalformedResponse(_) => FailureClass::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_classes() {
        assert_eq!(
            ServiceError::from_status(401, String::new()).class(),
            FailureClass::Fatal
        );
        assert_eq!(
            ServiceError::from_status(403, String::new()).class(),
            FailureClass::Fatal
        );
        assert_eq!(
            ServiceError::from_status(400, String::new()).class(),
            FailureClass::Fatal
        );
        assert_eq!(
            ServiceError::from_status(429, String::new()).class(),
            FailureClass::RateLimited
        );
        assert_eq!(
            ServiceError::from_status(503, String::new()).class(),
            FailureClass::Transient
        );
        assert_eq!(
            ServiceError::Timeout(Duration::from_secs(30)).class(),
            FailureClass::Transient
        );
    }
}
