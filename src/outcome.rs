//! Shared response contract for oracle exchanges.
//!
//! Every exchange after game start is expected to come back as a JSON
//! serialization of [`OracleOutcome`]. The expectation binds an external
//! generator, not a type checker, so parsing is permissive and every
//! call site supplies its own fallback.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fallback answer used when a mid-game reply cannot be parsed.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't process that. Try again.";

/// Placeholder identity used when the collaborator never surfaces a name.
pub const PLACEHOLDER_IDENTITY: &str = "someone famous";

/// Canonical answer phrases the game master is instructed to use.
///
/// Convention only: the collaborator is told to stick to these, but
/// nothing here enforces it and the game must tolerate violations.
pub const CANONICAL_ANSWERS: [&str; 5] = [
    "Yes",
    "No",
    "Partially",
    "I am unsure",
    "Ask a Yes or No question",
];

/// Structured outcome expected from every oracle exchange after game start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleOutcome {
    /// Display answer, by convention one of [`CANONICAL_ANSWERS`].
    pub answer: String,

    /// True only when the user's guess matched the secret identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,

    /// Full name of the secret identity; populated on a correct guess or
    /// when the game is ending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_name: Option<String>,

    /// Free-text comment. Display-only, drives no transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl OracleOutcome {
    /// Fallback outcome returned when a reply fails to parse.
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            is_correct: None,
            revealed_name: None,
            feedback: None,
        }
    }

    /// Whether this outcome signals a correct guess.
    pub fn signals_correct(&self) -> bool {
        self.is_correct.unwrap_or(false)
    }
}

/// Parses a raw reply as an [`OracleOutcome`].
///
/// Trims surrounding whitespace and strips a Markdown code fence if the
/// collaborator wrapped its JSON in one. Returns `None` on any shape
/// failure; never errors.
pub(crate) fn parse_outcome(raw: &str) -> Option<OracleOutcome> {
    let body = strip_code_fence(raw);
    match serde_json::from_str(body) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(error = %e, reply_length = raw.len(), "Failed to parse oracle reply");
            None
        }
    }
}

/// Extracts a single string field from a reply without requiring the full
/// outcome shape. Used for the opening acknowledgment (`answer`) and the
/// final reveal (`revealedName`), which are loose field lookups rather
/// than full records.
pub(crate) fn parse_field(raw: &str, field: &str) -> Option<String> {
    let body = strip_code_fence(raw);
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Fence may carry a language tag on the opening line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
