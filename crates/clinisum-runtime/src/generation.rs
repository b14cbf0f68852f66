//! Generation Adapter: model call with timeout, circuit breaker and fallback.
//!
//! ```text
//! generate(doc, version)
//!   ├─ circuit open?          ─> Fallback { CircuitOpen }
//!   ├─ complete() within timeout
//!   │    ├─ Ok(response)      ─> Model { payload }
//!   │    └─ Err / elapsed     ─> Fallback { ServiceUnavailable }
//! ```
//!
//! No error crosses this boundary.

use std::sync::Arc;

use clinisum_core::{fallback_payload, Protocol, SourceDocument};

use crate::prompts::{PromptLibrary, PromptVersion, SYSTEM_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::{
    CircuitBreaker, CircuitBreakerConfig, FallbackReason, GenerationOutcome,
};

pub struct GenerationAdapter {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    prompts: PromptLibrary,
    breaker: CircuitBreaker,
    fallback: String,
}

impl GenerationAdapter {
    /// The fallback text is rendered once from the protocol's bounds.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        completion: CompletionConfig,
        breaker: CircuitBreakerConfig,
        prompts: PromptLibrary,
        protocol: &Protocol,
    ) -> Self {
        Self {
            provider,
            completion,
            prompts,
            breaker: CircuitBreaker::new(breaker),
            fallback: fallback_payload(protocol).to_string(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Produce raw payload text for one document.
    pub async fn generate(
        &self,
        document: &SourceDocument,
        version: PromptVersion,
    ) -> GenerationOutcome {
        if self.breaker.is_open() {
            tracing::warn!(
                document = %document.id,
                "Circuit open, using fallback payload"
            );
            return self.fall_back(FallbackReason::CircuitOpen);
        }

        match self.call(document, version).await {
            Ok(response) => {
                self.breaker.record_success();
                tracing::debug!(
                    document = %document.id,
                    model = %response.model,
                    tokens = response.usage.total(),
                    "Model response received"
                );
                GenerationOutcome::Model {
                    payload: response.content,
                    model: response.model,
                    usage: response.usage,
                }
            }
            Err(e) => {
                self.breaker.record_failure();
                tracing::warn!(
                    document = %document.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Generation failed, using fallback payload"
                );
                self.fall_back(FallbackReason::from_error(&e))
            }
        }
    }

    async fn call(
        &self,
        document: &SourceDocument,
        version: PromptVersion,
    ) -> Result<crate::providers::CompletionResponse, ProviderError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(self.prompts.render(version, &document.text)),
        ];

        let timeout = self.completion.timeout;
        match tokio::time::timeout(timeout, self.provider.complete(messages, &self.completion))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }

    fn fall_back(&self, reason: FallbackReason) -> GenerationOutcome {
        GenerationOutcome::Fallback {
            payload: self.fallback.clone(),
            reason,
        }
    }
}

impl std::fmt::Debug for GenerationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationAdapter")
            .field("provider", &self.provider.name())
            .field("completion", &self.completion)
            .field("circuit", &self.breaker.state())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, FailureKind, OfflineProvider, TokenUsage};
    use crate::resilience::CircuitState;
    use async_trait::async_trait;
    use clinisum_core::{check_payload, SchemaValidator};
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Replies with a fixed text and records the prompts it saw.
    pub(crate) struct EchoProvider {
        pub reply: String,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl EchoProvider {
        pub fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().push(messages);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                },
                model: config.model.clone(),
                stop_reason: Some("stop".to_string()),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::HttpError("unreachable".to_string()))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn adapter(provider: Arc<dyn LlmProvider>) -> GenerationAdapter {
        GenerationAdapter::new(
            provider,
            CompletionConfig::default(),
            CircuitBreakerConfig::default(),
            PromptLibrary::builtin(),
            &Protocol::default(),
        )
    }

    fn doc() -> SourceDocument {
        SourceDocument::new("a.txt", "I always arrive late on purpose.")
    }

    #[tokio::test]
    async fn test_model_branch() {
        let provider = Arc::new(EchoProvider::new("{\"x\": 1}"));
        let adapter = adapter(provider.clone());

        let outcome = adapter.generate(&doc(), PromptVersion::V2).await;
        match &outcome {
            GenerationOutcome::Model { payload, model, usage } => {
                assert_eq!(payload, "{\"x\": 1}");
                assert_eq!(model, "gpt-4o-mini");
                assert_eq!(usage.total(), 30);
            }
            other => panic!("Expected model outcome, got {:?}", other),
        }

        let seen = provider.seen.lock();
        assert_eq!(seen[0][0].content, SYSTEM_PROMPT);
        assert!(seen[0][1].content.contains("I always arrive late on purpose."));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_to_valid_payload() {
        let adapter = adapter(Arc::new(OfflineProvider));
        let outcome = adapter.generate(&doc(), PromptVersion::V1).await;

        match &outcome {
            GenerationOutcome::Fallback {
                reason: FallbackReason::ServiceUnavailable { failure, .. },
                ..
            } => assert_eq!(*failure, FailureKind::NotConfigured),
            other => panic!("Expected fallback, got {:?}", other),
        }

        let validator = SchemaValidator::new(Protocol::default()).unwrap();
        assert!(check_payload(&validator, outcome.payload()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let adapter = GenerationAdapter::new(
            Arc::new(SlowProvider),
            CompletionConfig {
                timeout: Duration::from_secs(2),
                ..Default::default()
            },
            CircuitBreakerConfig::default(),
            PromptLibrary::builtin(),
            &Protocol::default(),
        );

        let outcome = adapter.generate(&doc(), PromptVersion::V2).await;
        match outcome {
            GenerationOutcome::Fallback {
                reason: FallbackReason::ServiceUnavailable { failure, .. },
                ..
            } => assert_eq!(failure, FailureKind::Timeout),
            other => panic!("Expected timeout fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_circuit_opens_and_skips_calls() {
        let adapter = GenerationAdapter::new(
            Arc::new(OfflineProvider),
            CompletionConfig::default(),
            CircuitBreakerConfig {
                failure_threshold: 3,
                ..Default::default()
            },
            PromptLibrary::builtin(),
            &Protocol::default(),
        );

        for _ in 0..3 {
            let outcome = adapter.generate(&doc(), PromptVersion::V2).await;
            assert!(matches!(
                outcome,
                GenerationOutcome::Fallback {
                    reason: FallbackReason::ServiceUnavailable { .. },
                    ..
                }
            ));
        }
        assert!(matches!(
            adapter.circuit_breaker().state(),
            CircuitState::Open { .. }
        ));

        let outcome = adapter.generate(&doc(), PromptVersion::V2).await;
        assert!(matches!(
            outcome,
            GenerationOutcome::Fallback {
                reason: FallbackReason::CircuitOpen,
                ..
            }
        ));
    }
}
