//! Schema guardrail for structured clinical summaries.
//!
//! The validator turns a decoded candidate mapping into a [`ClinicalOutput`]
//! or reports exactly one violated rule. Checks run in a fixed order and the
//! first failure wins:
//!
//! 1. `analysis` is present and a string
//! 2. `themes`, `signifiers`, `hypotheses`, `questions`: each a list of
//!    strings whose length lies within the protocol bounds
//! 3. `risk_assessment`: one of `low`, `medium`, `high` (bare string or
//!    `{ level, signals }` object)
//! 4. `clinical_report` (optional): `{ required: bool, summary: string }`
//! 5. `analysis` word count within the protocol word range

use serde_json::Value;
use thiserror::Error;

use crate::decode::{json_type_name, CandidatePayload};
use crate::protocol::{Bounds, Protocol, ProtocolError};
use crate::types::{
    word_count, ClinicalOutput, ClinicalReport, ListField, RiskAssessment, RiskLevel,
};

/// A single violated validation rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field `{field}`")]
    MissingField { field: String },

    #[error("Field `{field}` must be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Schema violation: {}", describe_cardinality(.field, .actual, .bounds))]
    SchemaViolation {
        field: ListField,
        actual: usize,
        bounds: Bounds,
    },

    #[error("Invalid value for `{field}`: '{value}' (expected one of: low, medium, high)")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("Analysis too short: {words} words < minimum {min}")]
    TooShort { words: usize, min: usize },

    #[error("Analysis too long: {words} words > maximum {max}")]
    TooLong { words: usize, max: usize },
}

impl ValidationError {
    /// Stable rule identifier for reports.
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::WrongType { .. } => "wrong_type",
            ValidationError::SchemaViolation { .. } => "schema_violation",
            ValidationError::InvalidEnumValue { .. } => "invalid_enum_value",
            ValidationError::TooShort { .. } => "too_short",
            ValidationError::TooLong { .. } => "too_long",
        }
    }
}

fn describe_cardinality(field: &ListField, actual: &usize, bounds: &Bounds) -> String {
    if *actual < bounds.min {
        format!("`{}` length {} < minimum {}", field, actual, bounds.min)
    } else {
        format!("`{}` length {} > maximum {}", field, actual, bounds.max)
    }
}

/// Validates candidate payloads against a protocol.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    protocol: Protocol,
}

impl SchemaValidator {
    /// Create a validator, rejecting a protocol with inverted bounds.
    pub fn new(protocol: Protocol) -> Result<Self, ProtocolError> {
        protocol.validate()?;
        Ok(Self { protocol })
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Validate an arbitrary JSON value; anything but an object is a type error.
    pub fn validate_value(&self, value: &Value) -> Result<ClinicalOutput, ValidationError> {
        match value {
            Value::Object(map) => self.validate(map),
            other => Err(ValidationError::WrongType {
                field: "$".to_string(),
                expected: "an object",
                found: json_type_name(other),
            }),
        }
    }

    /// Validate a decoded candidate mapping.
    pub fn validate(&self, candidate: &CandidatePayload) -> Result<ClinicalOutput, ValidationError> {
        let analysis = require_string(candidate, "analysis")?;

        let themes = self.bounded_list(candidate, ListField::Themes)?;
        let signifiers = self.bounded_list(candidate, ListField::Signifiers)?;
        let hypotheses = self.bounded_list(candidate, ListField::Hypotheses)?;
        let questions = self.bounded_list(candidate, ListField::Questions)?;

        let risk_assessment = parse_risk_assessment(candidate)?;
        let clinical_report = parse_clinical_report(candidate)?;

        // Custom rule, runs after every type check
        let words = word_count(&analysis);
        let range = self.protocol.analysis_words;
        if words < range.min {
            return Err(ValidationError::TooShort {
                words,
                min: range.min,
            });
        }
        if words > range.max {
            return Err(ValidationError::TooLong {
                words,
                max: range.max,
            });
        }

        Ok(ClinicalOutput {
            analysis,
            themes,
            signifiers,
            hypotheses,
            questions,
            risk_assessment,
            clinical_report,
        })
    }

    fn bounded_list(
        &self,
        candidate: &CandidatePayload,
        field: ListField,
    ) -> Result<Vec<String>, ValidationError> {
        let value = candidate
            .get(field.key())
            .ok_or_else(|| ValidationError::MissingField {
                field: field.key().to_string(),
            })?;
        let items = string_list(value, field.key())?;

        let bounds = self.protocol.list_bounds(field);
        if !bounds.contains(items.len()) {
            return Err(ValidationError::SchemaViolation {
                field,
                actual: items.len(),
                bounds,
            });
        }
        Ok(items)
    }
}

fn require_string(candidate: &CandidatePayload, key: &str) -> Result<String, ValidationError> {
    match candidate.get(key) {
        None => Err(ValidationError::MissingField {
            field: key.to_string(),
        }),
        Some(value) => as_string(value, key),
    }
}

fn as_string(value: &Value, field: &str) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "a string",
            found: json_type_name(other),
        }),
    }
}

/// A JSON array whose every element is a string.
fn string_list(value: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "a list of strings",
            found: json_type_name(value),
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| as_string(item, &format!("{}[{}]", field, i)))
        .collect()
}

fn parse_risk_level(value: &Value, field: &'static str) -> Result<RiskLevel, ValidationError> {
    let raw = as_string(value, field)?;
    raw.parse::<RiskLevel>()
        .map_err(|value| ValidationError::InvalidEnumValue { field, value })
}

fn parse_risk_assessment(candidate: &CandidatePayload) -> Result<RiskAssessment, ValidationError> {
    let value = candidate
        .get("risk_assessment")
        .ok_or_else(|| ValidationError::MissingField {
            field: "risk_assessment".to_string(),
        })?;

    match value {
        Value::String(_) => Ok(RiskAssessment {
            level: parse_risk_level(value, "risk_assessment")?,
            signals: Vec::new(),
        }),
        Value::Object(map) => {
            let level = map
                .get("level")
                .ok_or_else(|| ValidationError::MissingField {
                    field: "risk_assessment.level".to_string(),
                })?;
            let level = parse_risk_level(level, "risk_assessment.level")?;
            let signals = match map.get("signals") {
                None | Some(Value::Null) => Vec::new(),
                Some(signals) => string_list(signals, "risk_assessment.signals")?,
            };
            Ok(RiskAssessment { level, signals })
        }
        other => Err(ValidationError::WrongType {
            field: "risk_assessment".to_string(),
            expected: "a risk level string or object",
            found: json_type_name(other),
        }),
    }
}

fn parse_clinical_report(
    candidate: &CandidatePayload,
) -> Result<Option<ClinicalReport>, ValidationError> {
    let map = match candidate.get("clinical_report") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: "clinical_report".to_string(),
                expected: "an object",
                found: json_type_name(other),
            })
        }
    };

    let required = match map.get("required") {
        None => {
            return Err(ValidationError::MissingField {
                field: "clinical_report.required".to_string(),
            })
        }
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: "clinical_report.required".to_string(),
                expected: "a boolean",
                found: json_type_name(other),
            })
        }
    };
    let summary = require_string(map, "summary").map_err(|e| match e {
        ValidationError::MissingField { .. } => ValidationError::MissingField {
            field: "clinical_report.summary".to_string(),
        },
        ValidationError::WrongType {
            expected, found, ..
        } => ValidationError::WrongType {
            field: "clinical_report.summary".to_string(),
            expected,
            found,
        },
        other => other,
    })?;

    Ok(Some(ClinicalReport { required, summary }))
}
