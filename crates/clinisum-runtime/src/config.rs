//! Runtime configuration.
//!
//! Everything the adapter and pipeline need is passed in explicitly through
//! [`RuntimeConfig`]; nothing below this layer reads the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::prompts::PromptVersion;
use crate::providers::CompletionConfig;
use crate::resilience::CircuitBreakerConfig;

/// Configuration for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Prompt variant for every document in the batch
    #[serde(default)]
    pub prompt_version: PromptVersion,

    /// Completion request settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Circuit breaker thresholds
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

impl RuntimeConfig {
    pub fn with_prompt_version(mut self, version: PromptVersion) -> Self {
        self.prompt_version = version;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.completion.model = model.into();
        self
    }

    /// Upper bound on one service call; expiry counts as a service failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.completion.timeout = timeout;
        self
    }

    /// Open the circuit after `threshold` consecutive failures; 0 keeps it off.
    pub fn with_circuit_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker.failure_threshold = threshold;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.completion.timeout
    }
}

/// Serialize a `Duration` as whole seconds.
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
