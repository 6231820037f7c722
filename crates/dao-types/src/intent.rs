//! The classified purpose of a turn's input.

use serde::{Deserialize, Serialize};

use crate::enums::IntentKind;

/// Output of the observer stage. Produced once per slow-path turn and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// What the player is trying to do.
    pub kind: IntentKind,
    /// NPC, item, or place the action is aimed at, as the player named it.
    pub target: Option<String>,
    /// Free-text elaboration from the observer.
    pub details: Option<String>,
    /// Observer confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Intent {
    /// Build an intent, clamping confidence into `[0, 1]`.
    ///
    /// A non-finite confidence counts as zero.
    pub fn new(kind: IntentKind, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            kind,
            target: None,
            details: None,
            confidence,
        }
    }

    /// The fallback returned when the observer fails or its output is unusable.
    pub fn unknown() -> Self {
        Self::new(IntentKind::Unknown, 0.0)
    }

    /// Attach a target reference.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attach observer details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert!((Intent::new(IntentKind::Talk, 1.7).confidence - 1.0).abs() < f64::EPSILON);
        assert!(Intent::new(IntentKind::Talk, -0.2).confidence.abs() < f64::EPSILON);
        assert!(Intent::new(IntentKind::Talk, f64::NAN).confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_has_zero_confidence() {
        let intent = Intent::unknown();
        assert_eq!(intent.kind, IntentKind::Unknown);
        assert!(intent.target.is_none());
        assert!(intent.confidence.abs() < f64::EPSILON);
    }
}
