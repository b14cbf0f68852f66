//! # clinisum-runtime
//!
//! Model-backed generation and batch orchestration for clinisum.
//!
//! Each document goes through generate, decode and validate. The generation
//! step calls a provider under a timeout and a circuit breaker, and falls
//! back to a deterministic payload that satisfies the active protocol when
//! the service is unavailable. Validation is delegated to `clinisum-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use clinisum_runtime::{BatchAggregator, JsonFileSink, ProviderRegistry, ReportSink};
//!
//! let provider = ProviderRegistry::with_defaults().create("openai", &serde_json::json!({}))?;
//! let aggregator = BatchAggregator::builder()
//!     .provider(provider)
//!     .protocol(protocol)
//!     .build()?;
//!
//! let report = aggregator.run(&documents).await;
//! JsonFileSink::new("results.json").write(&report)?;
//! ```

use thiserror::Error;

pub mod batch;
pub mod config;
pub mod generation;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod resilience;

pub use batch::{BatchAggregator, BatchAggregatorBuilder, BatchReport};
pub use config::RuntimeConfig;
pub use generation::GenerationAdapter;
pub use pipeline::{DocumentOutcome, DocumentPipeline, PipelineResult, PipelineStage};
pub use prompts::{PromptLibrary, PromptVersion};
pub use providers::{
    CompletionConfig, FailureKind, LlmProvider, OfflineProvider, ProviderError, ProviderRegistry,
};
pub use report::{JsonFileSink, ReportError, ReportSink};
pub use resilience::{CircuitBreakerConfig, FallbackReason, GenerationOutcome, GenerationSource};

#[cfg(feature = "openai")]
pub use providers::OpenAiProvider;

/// Errors raised while assembling a batch run.
///
/// Per-document problems never surface here; they are recorded in the
/// report instead.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("No generative provider configured")]
    NotConfigured,

    #[error("Invalid protocol: {0}")]
    Protocol(#[from] clinisum_core::ProtocolError),
}
