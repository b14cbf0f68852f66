//! Decoding of raw model text into a candidate payload.
//!
//! Decode failures are generation-stage errors: they never reach the
//! schema validator.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

lazy_static! {
    /// A single Markdown code fence around the whole response,
    /// with an optional language tag.
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)\A```[A-Za-z0-9_-]*[ \t]*\r?\n(?P<body>.*?)\r?\n?```\z").unwrap();
}

/// Errors from decoding a model response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty model response")]
    Empty,

    #[error("Invalid JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// The decoded candidate: a key/value mapping not yet validated.
pub type CandidatePayload = Map<String, Value>;

/// Decode model text into a candidate mapping.
pub fn decode_payload(raw: &str) -> Result<CandidatePayload, DecodeError> {
    let body = strip_code_fence(raw.trim());
    if body.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| DecodeError::Syntax {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Remove one Markdown fence wrapping the entire text, if any.
fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|caps| caps.name("body")) {
        Some(body) => body.as_str(),
        None => text,
    }
}

/// JSON type name used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
