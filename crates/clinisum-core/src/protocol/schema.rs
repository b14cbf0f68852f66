//! JSON Schema validation for protocol files.
//!
//! Protocol documents are checked against the embedded
//! `schema/protocol.schema.json` before they are deserialized, so a typo in a
//! key is reported instead of being silently replaced by a default.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded protocol schema (loaded at compile time).
const PROTOCOL_SCHEMA_JSON: &str = include_str!("../../schema/protocol.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(PROTOCOL_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a protocol document against the schema.
///
/// Returns every violation found, formatted as `"<message> at <path>"`.
pub fn validate_protocol_schema(protocol_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(protocol_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_protocol_passes_schema() {
        assert!(validate_protocol_schema(&serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_full_protocol_passes_schema() {
        let value = serde_json::json!({
            "name": "psychoanalytic-intake",
            "themes": { "min": 3, "max": 6 },
            "signifiers": { "min": 3, "max": 8 },
            "hypotheses": { "min": 2, "max": 4 },
            "questions": { "min": 3, "max": 6 },
            "analysis_words": { "min": 40, "max": 200 }
        });
        assert!(validate_protocol_schema(&value).is_ok());
    }

    #[test]
    fn test_unknown_key_fails() {
        let value = serde_json::json!({
            "themse": { "min": 3, "max": 6 }
        });
        assert!(validate_protocol_schema(&value).is_err());
    }

    #[test]
    fn test_negative_bound_fails() {
        let value = serde_json::json!({
            "themes": { "min": -1, "max": 6 }
        });
        let errors = validate_protocol_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/themes/min")));
    }

    #[test]
    fn test_bounds_require_both_ends() {
        let value = serde_json::json!({
            "questions": { "min": 3 }
        });
        assert!(validate_protocol_schema(&value).is_err());
    }
}
