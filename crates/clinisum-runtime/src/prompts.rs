//! Prompt variants for the clinical summary generator.
//!
//! Two variants exist:
//! 1. `v1` ("raw") - a short instruction, the model chooses the layout
//! 2. `v2` ("structured") - spells out every field and its bounds
//!
//! Templates on disk (`<dir>/prompt_<version>.txt`) take precedence over the
//! built-in text. The document replaces the `{INPUT}` placeholder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Placeholder replaced by the document text.
pub const INPUT_PLACEHOLDER: &str = "{INPUT}";

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a clinical assistant specialised in \
psychoanalytic case formulation. Respond strictly with a single JSON object and \
no surrounding prose.";

const RAW_TEMPLATE: &str = r#"Analyse the clinical note below and return ONLY a valid JSON object.

Note:
{INPUT}
"#;

const STRUCTURED_TEMPLATE: &str = r#"Analyse the clinical note below and return ONLY a valid JSON object with these keys:

- "analysis": a structured clinical analysis of 40 to 200 words
- "themes": 3 to 6 short themes
- "signifiers": 3 to 8 significant words or expressions taken from the note
- "hypotheses": 2 to 4 clinical hypotheses
- "questions": 3 to 6 questions the clinician could ask next
- "risk_assessment": {"level": "low" | "medium" | "high", "signals": [strings]}
- "clinical_report": {"required": true | false, "summary": string}

Do not add keys. Do not wrap the JSON in Markdown.

Note:
{INPUT}
"#;

/// Prompt variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVersion {
    /// Minimal instruction
    V1,
    /// Field-by-field instruction
    #[default]
    V2,
}

impl PromptVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVersion::V1 => "v1",
            PromptVersion::V2 => "v2",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            PromptVersion::V1 => RAW_TEMPLATE,
            PromptVersion::V2 => STRUCTURED_TEMPLATE,
        }
    }
}

impl fmt::Display for PromptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(PromptVersion::V1),
            "v2" => Ok(PromptVersion::V2),
            other => Err(format!("unknown prompt version '{other}', expected v1 or v2")),
        }
    }
}

/// Resolves prompt templates, from disk or built in.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    dir: Option<PathBuf>,
}

impl PromptLibrary {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// Look in `dir` first, then fall back to the built-in templates.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Template text for a variant.
    ///
    /// A missing or unreadable file is not an error.
    pub fn template(&self, version: PromptVersion) -> String {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("prompt_{}.txt", version));
            match std::fs::read_to_string(&path) {
                Ok(text) => return text,
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "Prompt file unavailable, using built-in template"
                    );
                }
            }
        }
        version.builtin().to_string()
    }

    /// Fill the template with the document text.
    pub fn render(&self, version: PromptVersion, text: &str) -> String {
        fill(&self.template(version), text)
    }
}

fn fill(template: &str, text: &str) -> String {
    if template.contains(INPUT_PLACEHOLDER) {
        template.replace(INPUT_PLACEHOLDER, text)
    } else {
        format!("{}\n\n{}", template.trim_end(), text)
    }
}
