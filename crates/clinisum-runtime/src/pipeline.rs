//! Per-document state machine.
//!
//! ```text
//! Start -> Generating -> Decoding -> Validating -> Success
//!                           |             |
//!                           +-> Failed    +-> Failed
//! ```
//!
//! Generating cannot fail outwardly. A decode failure is a
//! `generation_error`, a rule violation is a `validation_error`. No stage
//! is retried.

use serde::ser::{Serialize, Serializer};

use clinisum_core::{decode_payload, ClinicalOutput, SchemaValidator, SourceDocument};

use crate::generation::GenerationAdapter;
use crate::prompts::PromptVersion;
use crate::resilience::GenerationSource;

/// Pipeline stages, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Generating,
    Decoding,
    Validating,
    Success,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Start => "start",
            PipelineStage::Generating => "generating",
            PipelineStage::Decoding => "decoding",
            PipelineStage::Validating => "validating",
            PipelineStage::Success => "success",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Success | PipelineStage::Failed)
    }
}

/// Terminal outcome of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Success(ClinicalOutput),

    /// Payload text could not be decoded
    GenerationError { message: String },

    /// Decoded payload broke a rule
    ValidationError { rule: &'static str, message: String },
}

impl DocumentOutcome {
    /// Report status string.
    pub fn status(&self) -> &'static str {
        match self {
            DocumentOutcome::Success(_) => "success",
            DocumentOutcome::GenerationError { .. } => "generation_error",
            DocumentOutcome::ValidationError { .. } => "validation_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DocumentOutcome::Success(_))
    }

    pub fn output(&self) -> Option<&ClinicalOutput> {
        match self {
            DocumentOutcome::Success(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DocumentOutcome::Success(_) => None,
            DocumentOutcome::GenerationError { message } => Some(message),
            DocumentOutcome::ValidationError { message, .. } => Some(message),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        if self.is_success() {
            PipelineStage::Success
        } else {
            PipelineStage::Failed
        }
    }
}

/// Per-document record in the batch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub document_id: String,
    pub source: GenerationSource,
    pub outcome: DocumentOutcome,
}

#[derive(serde::Serialize)]
struct ResultRecord<'a> {
    document_id: &'a str,
    status: &'static str,
    source: &'a GenerationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<&'static str>,
    output: Option<&'a ClinicalOutput>,
    error: Option<&'a str>,
}

impl Serialize for PipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rule = match &self.outcome {
            DocumentOutcome::ValidationError { rule, .. } => Some(*rule),
            _ => None,
        };
        ResultRecord {
            document_id: &self.document_id,
            status: self.outcome.status(),
            source: &self.source,
            rule,
            output: self.outcome.output(),
            error: self.outcome.error(),
        }
        .serialize(serializer)
    }
}

/// Drives one document through generate, decode and validate.
#[derive(Debug)]
pub struct DocumentPipeline {
    adapter: GenerationAdapter,
    validator: SchemaValidator,
    version: PromptVersion,
}

impl DocumentPipeline {
    pub fn new(adapter: GenerationAdapter, validator: SchemaValidator, version: PromptVersion) -> Self {
        Self {
            adapter,
            validator,
            version,
        }
    }

    pub fn adapter(&self) -> &GenerationAdapter {
        &self.adapter
    }

    pub fn version(&self) -> PromptVersion {
        self.version
    }

    /// Run one document to a terminal state.
    pub async fn run(&self, document: &SourceDocument) -> PipelineResult {
        let id = document.id.as_str();
        enter(id, PipelineStage::Start);

        enter(id, PipelineStage::Generating);
        let generated = self.adapter.generate(document, self.version).await;
        let source = generated.source();

        enter(id, PipelineStage::Decoding);
        let outcome = match decode_payload(generated.payload()) {
            Err(e) => DocumentOutcome::GenerationError {
                message: e.to_string(),
            },
            Ok(candidate) => {
                enter(id, PipelineStage::Validating);
                match self.validator.validate(&candidate) {
                    Ok(output) => DocumentOutcome::Success(output),
                    Err(e) => DocumentOutcome::ValidationError {
                        rule: e.rule(),
                        message: e.to_string(),
                    },
                }
            }
        };

        match &outcome {
            DocumentOutcome::Success(_) => tracing::info!(
                document = %id,
                stage = PipelineStage::Success.as_str(),
                fallback = source.is_fallback(),
                "Document validated"
            ),
            failed => tracing::warn!(
                document = %id,
                stage = PipelineStage::Failed.as_str(),
                status = failed.status(),
                error = failed.error().unwrap_or_default(),
                "Document failed"
            ),
        }

        PipelineResult {
            document_id: document.id.clone(),
            source,
            outcome,
        }
    }
}

fn enter(document: &str, stage: PipelineStage) {
    tracing::debug!(document = %document, stage = stage.as_str(), "Entering stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tests::EchoProvider;
    use crate::prompts::PromptLibrary;
    use crate::providers::{CompletionConfig, LlmProvider, OfflineProvider};
    use crate::resilience::CircuitBreakerConfig;
    use clinisum_core::{fallback_payload, Protocol};
    use std::sync::Arc;

    fn pipeline(provider: Arc<dyn LlmProvider>) -> DocumentPipeline {
        let protocol = Protocol::default();
        let adapter = GenerationAdapter::new(
            provider,
            CompletionConfig::default(),
            CircuitBreakerConfig::default(),
            PromptLibrary::builtin(),
            &protocol,
        );
        DocumentPipeline::new(
            adapter,
            SchemaValidator::new(protocol).unwrap(),
            PromptVersion::V2,
        )
    }

    fn doc() -> SourceDocument {
        SourceDocument::new("note.txt", "I keep silent when I arrive.")
    }

    #[tokio::test]
    async fn test_model_payload_validates() {
        let reply = fallback_payload(&Protocol::default()).to_string();
        let result = pipeline(Arc::new(EchoProvider::new(reply))).run(&doc()).await;

        assert!(result.outcome.is_success());
        assert!(!result.source.is_fallback());
        assert_eq!(result.document_id, "note.txt");
    }

    #[tokio::test]
    async fn test_fenced_model_payload_validates() {
        let reply = format!(
            "```json\n{}\n```",
            fallback_payload(&Protocol::default())
        );
        let result = pipeline(Arc::new(EchoProvider::new(reply))).run(&doc()).await;
        assert!(result.outcome.is_success());
    }

    #[tokio::test]
    async fn test_decode_failure_is_generation_error() {
        let result = pipeline(Arc::new(EchoProvider::new("Sorry, I cannot help.")))
            .run(&doc())
            .await;

        assert_eq!(result.outcome.status(), "generation_error");
        assert_eq!(result.outcome.stage(), PipelineStage::Failed);
        assert!(result.outcome.output().is_none());
    }

    #[tokio::test]
    async fn test_rule_violation_is_validation_error() {
        let mut payload = fallback_payload(&Protocol::default());
        payload["risk_assessment"] = serde_json::json!("moderate");
        let result = pipeline(Arc::new(EchoProvider::new(payload.to_string())))
            .run(&doc())
            .await;

        match &result.outcome {
            DocumentOutcome::ValidationError { rule, message } => {
                assert_eq!(*rule, "invalid_enum_value");
                assert!(message.contains("moderate"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_failure_still_reaches_success() {
        let result = pipeline(Arc::new(OfflineProvider)).run(&doc()).await;

        assert!(result.outcome.is_success());
        assert!(result.source.is_fallback());
        assert!(result.outcome.stage().is_terminal());
    }

    #[tokio::test]
    async fn test_result_serialization() {
        let result = pipeline(Arc::new(EchoProvider::new("[1, 2]")))
            .run(&doc())
            .await;
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["document_id"], "note.txt");
        assert_eq!(value["status"], "generation_error");
        assert!(value["output"].is_null());
        assert!(value["error"].as_str().is_some());
        assert!(value.get("rule").is_none());
    }
}
