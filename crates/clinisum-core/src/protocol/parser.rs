//! Protocol parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_protocol_schema;
use crate::types::ListField;

/// Errors that can occur when loading a protocol.
///
/// Every variant is fatal: a batch must not start with a broken protocol.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to read protocol file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Protocol does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Invalid bounds for {field}: min {min} > max {max}")]
    InvalidBounds {
        field: &'static str,
        min: usize,
        max: usize,
    },
}

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.min && value <= self.max
    }

    /// Nearest in-range value.
    pub fn clamp(&self, value: usize) -> usize {
        value.max(self.min).min(self.max)
    }

    fn check(&self, field: &'static str) -> Result<(), ProtocolError> {
        if self.min > self.max {
            return Err(ProtocolError::InvalidBounds {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Numeric bounds the schema guardrail enforces.
///
/// Missing sections fall back to the clinical defaults, so a protocol file
/// only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    /// Human-readable name
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_themes")]
    pub themes: Bounds,

    #[serde(default = "default_signifiers")]
    pub signifiers: Bounds,

    #[serde(default = "default_hypotheses")]
    pub hypotheses: Bounds,

    #[serde(default = "default_questions")]
    pub questions: Bounds,

    /// Word count range of the analysis text
    #[serde(default = "default_analysis_words")]
    pub analysis_words: Bounds,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_themes() -> Bounds {
    Bounds::new(3, 6)
}

fn default_signifiers() -> Bounds {
    Bounds::new(3, 8)
}

fn default_hypotheses() -> Bounds {
    Bounds::new(2, 4)
}

fn default_questions() -> Bounds {
    Bounds::new(3, 6)
}

fn default_analysis_words() -> Bounds {
    Bounds::new(40, 200)
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            name: default_name(),
            themes: default_themes(),
            signifiers: default_signifiers(),
            hypotheses: default_hypotheses(),
            questions: default_questions(),
            analysis_words: default_analysis_words(),
        }
    }
}

impl Protocol {
    /// Parse a protocol from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProtocolError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        // Empty YAML documents parse to null
        let json = match value {
            serde_yaml::Value::Null => serde_json::json!({}),
            other => serde_json::to_value(other)?,
        };
        Self::from_value(json)
    }

    /// Parse a protocol from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load a protocol file, choosing the format by extension.
    ///
    /// `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let protocol = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            _ => Self::from_yaml(&contents)?,
        };
        tracing::debug!(path = %path.display(), name = %protocol.name, "Loaded protocol");
        Ok(protocol)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ProtocolError> {
        validate_protocol_schema(&value).map_err(ProtocolError::SchemaError)?;
        let protocol: Protocol = serde_json::from_value(value)?;
        protocol.validate()?;
        Ok(protocol)
    }

    /// Replace the bounds of one list field.
    pub fn with_list_bounds(mut self, field: ListField, bounds: Bounds) -> Self {
        *self.list_bounds_mut(field) = bounds;
        self
    }

    /// Replace the analysis word range.
    pub fn with_analysis_words(mut self, bounds: Bounds) -> Self {
        self.analysis_words = bounds;
        self
    }

    /// Bounds configured for a list field.
    pub fn list_bounds(&self, field: ListField) -> Bounds {
        match field {
            ListField::Themes => self.themes,
            ListField::Signifiers => self.signifiers,
            ListField::Hypotheses => self.hypotheses,
            ListField::Questions => self.questions,
        }
    }

    fn list_bounds_mut(&mut self, field: ListField) -> &mut Bounds {
        match field {
            ListField::Themes => &mut self.themes,
            ListField::Signifiers => &mut self.signifiers,
            ListField::Hypotheses => &mut self.hypotheses,
            ListField::Questions => &mut self.questions,
        }
    }

    /// Reject inverted ranges.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        for field in ListField::ALL {
            self.list_bounds(field).check(field.key())?;
        }
        self.analysis_words.check("analysis_words")?;
        Ok(())
    }
}
