//! Outcome of a generation attempt.
//!
//! The adapter never fails outward. It returns either the model's text or
//! the deterministic fallback together with the reason it was used.

use serde::{Deserialize, Serialize};

use crate::providers::{FailureKind, ProviderError, TokenUsage};

/// Why the fallback payload was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The service call failed or timed out
    ServiceUnavailable { failure: FailureKind, detail: String },

    /// The circuit breaker was open, no call was made
    CircuitOpen,
}

impl FallbackReason {
    pub fn from_error(error: &ProviderError) -> Self {
        FallbackReason::ServiceUnavailable {
            failure: error.kind(),
            detail: error.to_string(),
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::ServiceUnavailable { detail, .. } => {
                write!(f, "service unavailable: {}", detail)
            }
            FallbackReason::CircuitOpen => f.write_str("circuit_open"),
        }
    }
}

/// Two-branch result of the generation step.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The service answered
    Model {
        payload: String,
        model: String,
        usage: TokenUsage,
    },

    /// Deterministic substitute
    Fallback {
        payload: String,
        reason: FallbackReason,
    },
}

impl GenerationOutcome {
    /// Raw payload text, whichever branch produced it.
    pub fn payload(&self) -> &str {
        match self {
            GenerationOutcome::Model { payload, .. } => payload,
            GenerationOutcome::Fallback { payload, .. } => payload,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationOutcome::Fallback { .. })
    }

    /// Provenance record for the report.
    pub fn source(&self) -> GenerationSource {
        match self {
            GenerationOutcome::Model { model, usage, .. } => GenerationSource::Model {
                model: model.clone(),
                usage: *usage,
            },
            GenerationOutcome::Fallback { reason, .. } => GenerationSource::Fallback {
                reason: reason.clone(),
            },
        }
    }
}

/// Where a document's payload came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationSource {
    Model { model: String, usage: TokenUsage },
    Fallback { reason: FallbackReason },
}

impl GenerationSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationSource::Fallback { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_reason_from_error() {
        let reason = FallbackReason::from_error(&ProviderError::Timeout(Duration::from_secs(5)));
        match reason {
            FallbackReason::ServiceUnavailable { failure, detail } => {
                assert_eq!(failure, FailureKind::Timeout);
                assert!(detail.contains("Timeout"));
            }
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_source_serialization() {
        let outcome = GenerationOutcome::Fallback {
            payload: "{}".to_string(),
            reason: FallbackReason::CircuitOpen,
        };
        assert!(outcome.is_fallback());
        assert_eq!(outcome.payload(), "{}");

        let value = serde_json::to_value(outcome.source()).unwrap();
        assert_eq!(value["kind"], "fallback");
        assert_eq!(value["reason"]["type"], "circuit_open");

        let model = GenerationOutcome::Model {
            payload: "{}".to_string(),
            model: "gpt-4o-mini".to_string(),
            usage: TokenUsage::default(),
        };
        let value = serde_json::to_value(model.source()).unwrap();
        assert_eq!(value["kind"], "model");
        assert_eq!(value["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_auth_failure_is_recorded() {
        let reason = FallbackReason::from_error(&ProviderError::AuthError);
        let value = serde_json::to_value(&reason).unwrap();
        assert_eq!(value["type"], "service_unavailable");
        assert_eq!(value["failure"], "authorization");
    }
}
