//! Offline provider: never reaches a service.
//!
//! Every call fails with [`ProviderError::NotConfigured`], so each document
//! takes the fallback path. Used for dry runs and for reproducible reports.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, ProviderFactory,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl LlmProvider for OfflineProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "offline mode: no generative service".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

pub struct OfflineProviderFactory;

impl ProviderFactory for OfflineProviderFactory {
    fn provider_type(&self) -> &'static str {
        "offline"
    }

    fn create(&self, _config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(OfflineProvider))
    }

    fn validate_config(&self, _config: &JsonValue) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_always_fails() {
        let result = OfflineProvider
            .complete(vec![ChatMessage::user("x")], &CompletionConfig::default())
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
