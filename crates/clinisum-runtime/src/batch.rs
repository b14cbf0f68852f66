//! Batch Aggregator: sequential run over a document set.
//!
//! Every document reaches a terminal state and lands in the report in input
//! order. Nothing short-circuits; a batch where every document fails still
//! produces a complete report.

use std::sync::Arc;

use serde::Serialize;

use clinisum_core::{Protocol, SchemaValidator, SourceDocument};

use crate::config::RuntimeConfig;
use crate::generation::GenerationAdapter;
use crate::pipeline::{DocumentPipeline, PipelineResult};
use crate::prompts::{PromptLibrary, PromptVersion};
use crate::providers::LlmProvider;
use crate::RuntimeError;

/// Consolidated result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub prompt_version: PromptVersion,
    pub provider: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Documents whose payload came from the fallback path
    pub fallbacks: usize,
    pub results: Vec<PipelineResult>,
}

impl BatchReport {
    fn from_results(
        prompt_version: PromptVersion,
        provider: String,
        results: Vec<PipelineResult>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        let fallbacks = results.iter().filter(|r| r.source.is_fallback()).count();
        Self {
            prompt_version,
            provider,
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            fallbacks,
            results,
        }
    }

    /// Counters agree with the result list.
    pub fn is_consistent(&self) -> bool {
        self.total == self.results.len()
            && self.succeeded + self.failed == self.total
            && self.fallbacks <= self.total
    }
}

pub struct BatchAggregator {
    pipeline: DocumentPipeline,
}

impl BatchAggregator {
    pub fn builder() -> BatchAggregatorBuilder {
        BatchAggregatorBuilder::new()
    }

    /// Run every document, in order, and fold the results.
    pub async fn run(&self, documents: &[SourceDocument]) -> BatchReport {
        let adapter = self.pipeline.adapter();
        adapter.circuit_breaker().reset();

        tracing::info!(
            documents = documents.len(),
            prompt_version = %self.pipeline.version(),
            provider = adapter.provider_name(),
            "Starting batch"
        );

        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            results.push(self.pipeline.run(document).await);
        }

        let report = BatchReport::from_results(
            self.pipeline.version(),
            adapter.provider_name().to_string(),
            results,
        );

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            fallbacks = report.fallbacks,
            "Batch complete"
        );

        report
    }
}

/// Builder for [`BatchAggregator`].
///
/// `build` checks the protocol, so inverted bounds fail before any document
/// is touched.
pub struct BatchAggregatorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    protocol: Protocol,
    config: RuntimeConfig,
    prompts: PromptLibrary,
}

impl BatchAggregatorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            protocol: Protocol::default(),
            config: RuntimeConfig::default(),
            prompts: PromptLibrary::builtin(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn build(self) -> Result<BatchAggregator, RuntimeError> {
        let provider = self.provider.ok_or(RuntimeError::NotConfigured)?;
        let validator = SchemaValidator::new(self.protocol)?;

        let adapter = GenerationAdapter::new(
            provider,
            self.config.completion,
            self.config.circuit_breaker,
            self.prompts,
            validator.protocol(),
        );

        Ok(BatchAggregator {
            pipeline: DocumentPipeline::new(adapter, validator, self.config.prompt_version),
        })
    }
}

impl Default for BatchAggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
