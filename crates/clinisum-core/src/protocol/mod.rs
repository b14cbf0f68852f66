//! Protocol loading and validation.
//!
//! A protocol carries the numeric bounds of the schema guardrail (list
//! cardinalities and the analysis word range). Protocols are structured data
//! validated against an embedded JSON Schema, then checked for inverted ranges.

mod parser;
mod schema;

pub use parser::{Bounds, Protocol, ProtocolError};
pub use schema::validate_protocol_schema;
