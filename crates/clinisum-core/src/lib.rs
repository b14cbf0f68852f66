//! # clinisum-core
//!
//! Deterministic guardrail for model-generated clinical summaries.
//!
//! This crate answers one question for every candidate payload: is it a
//! fully valid [`ClinicalOutput`] under the active [`Protocol`], and if not,
//! which single rule did it break?
//!
//! ## Key Guarantees
//!
//! 1. **Pure**: validation has no side effects and makes no model calls
//! 2. **All or nothing**: a `ClinicalOutput` only exists if every rule passed
//! 3. **Traceable**: every rejection names exactly one rule and its values
//! 4. **Configurable**: all numeric bounds come from the protocol
//!
//! ## Example
//!
//! ```rust,ignore
//! use clinisum_core::{check_payload, Protocol, SchemaValidator};
//!
//! let validator = SchemaValidator::new(Protocol::from_file("protocol.yaml")?)?;
//! match check_payload(&validator, &model_text) {
//!     Ok(output) => println!("OK: {} themes", output.themes().len()),
//!     Err(e) => println!("REJECTED: {}", e),
//! }
//! ```

pub mod decode;
pub mod fallback;
pub mod protocol;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use decode::{decode_payload, CandidatePayload, DecodeError};
pub use fallback::fallback_payload;
pub use protocol::{Bounds, Protocol, ProtocolError};
pub use types::{
    word_count, ClinicalOutput, ClinicalReport, ListField, RiskAssessment, RiskLevel,
    SourceDocument,
};
pub use validator::{SchemaValidator, ValidationError};

use thiserror::Error;

/// Why a raw payload text was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Decode then validate a raw payload text.
///
/// This is the whole guardrail for one document in a single call.
pub fn check_payload(validator: &SchemaValidator, raw: &str) -> Result<ClinicalOutput, PayloadError> {
    let candidate = decode_payload(raw)?;
    Ok(validator.validate(&candidate)?)
}
