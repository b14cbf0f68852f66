//! Resilience patterns for clinisum-runtime.
//!
//! This module provides:
//! - Circuit breaker around the generative service
//! - The two-branch generation outcome (model or fallback with reason)

mod circuit_breaker;
mod fallback;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::{FallbackReason, GenerationOutcome, GenerationSource};
