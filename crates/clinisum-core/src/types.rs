//! Core types for clinical summary generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A clinical free-text document as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Identifier, usually the file name
    pub id: String,

    /// Raw text content
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Risk level vocabulary. Exactly three values, matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Accepted spellings, in order.
    pub const VOCABULARY: [&'static str; 3] = ["low", "medium", "high"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(other.to_string()),
        }
    }
}

/// Risk assessment: level plus the signals that support it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,

    /// Observed signals (may be empty when the payload gave only a level)
    pub signals: Vec<String>,
}

/// Whether a formal clinical report is needed, with its summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalReport {
    pub required: bool,
    pub summary: String,
}

/// A structured clinical summary that passed every validation rule.
///
/// There is no public constructor: the only way to obtain one is
/// [`SchemaValidator::validate`](crate::SchemaValidator::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalOutput {
    pub(crate) analysis: String,
    pub(crate) themes: Vec<String>,
    pub(crate) signifiers: Vec<String>,
    pub(crate) hypotheses: Vec<String>,
    pub(crate) questions: Vec<String>,
    pub(crate) risk_assessment: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) clinical_report: Option<ClinicalReport>,
}

impl ClinicalOutput {
    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn signifiers(&self) -> &[String] {
        &self.signifiers
    }

    pub fn hypotheses(&self) -> &[String] {
        &self.hypotheses
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn risk_assessment(&self) -> &RiskAssessment {
        &self.risk_assessment
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_assessment.level
    }

    pub fn clinical_report(&self) -> Option<&ClinicalReport> {
        self.clinical_report.as_ref()
    }

    /// Number of whitespace-separated words in the analysis.
    pub fn analysis_word_count(&self) -> usize {
        word_count(&self.analysis)
    }
}

/// Count whitespace-separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The bounded list fields of a [`ClinicalOutput`], in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListField {
    Themes,
    Signifiers,
    Hypotheses,
    Questions,
}

impl ListField {
    pub const ALL: [ListField; 4] = [
        ListField::Themes,
        ListField::Signifiers,
        ListField::Hypotheses,
        ListField::Questions,
    ];

    /// Key of this field in the payload.
    pub fn key(&self) -> &'static str {
        match self {
            ListField::Themes => "themes",
            ListField::Signifiers => "signifiers",
            ListField::Hypotheses => "hypotheses",
            ListField::Questions => "questions",
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
