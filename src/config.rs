//! Game configuration.

use crate::llm_client::{LlmConfig, LlmProvider};
use crate::session::QUESTION_BUDGET;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Configuration for the oracle and game session.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct OracleConfig {
    /// LLM provider (openai or anthropic).
    #[serde(default = "default_provider")]
    llm_provider: LlmProvider,

    /// LLM model name (e.g., "gpt-4o-mini", "claude-3-5-haiku-20241022").
    #[serde(default = "default_model")]
    llm_model: String,

    /// Maximum tokens for LLM responses.
    #[serde(default = "default_max_tokens")]
    llm_max_tokens: u32,

    /// Number of questions the player gets per game.
    #[serde(default = "default_question_budget")]
    question_budget: u32,
}

fn default_provider() -> LlmProvider {
    LlmProvider::OpenAI
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_question_budget() -> u32 {
    QUESTION_BUDGET
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_provider(),
            llm_model: default_model(),
            llm_max_tokens: default_max_tokens(),
            question_budget: default_question_budget(),
        }
    }
}

impl OracleConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(model = %config.llm_model, "Config loaded successfully");
        Ok(config)
    }

    /// Creates the LLM configuration from this config.
    ///
    /// Reads `OPENAI_API_KEY` or `ANTHROPIC_API_KEY` from the environment.
    /// A missing key is not an error here: the client is still constructed
    /// and every call fails at the service boundary instead.
    #[instrument(skip(self), fields(provider = ?self.llm_provider, model = %self.llm_model))]
    pub fn create_llm_config(&self) -> LlmConfig {
        debug!("Creating LLM config");

        let api_key = match self.llm_provider {
            LlmProvider::OpenAI => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            LlmProvider::Anthropic => std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
        };

        LlmConfig::new(
            self.llm_provider,
            api_key,
            self.llm_model.clone(),
            self.llm_max_tokens,
        )
    }

    /// Overrides the provider.
    pub fn set_provider(&mut self, provider: LlmProvider) {
        self.llm_provider = provider;
    }

    /// Overrides the model name.
    pub fn set_model(&mut self, model: String) {
        self.llm_model = model;
    }

    /// Overrides the question budget.
    pub fn set_question_budget(&mut self, budget: u32) {
        self.question_budget = budget;
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: OracleConfig = toml::from_str("llm_model = \"gpt-4o\"").expect("valid toml");
        assert_eq!(config.llm_model(), "gpt-4o");
        assert_eq!(*config.llm_max_tokens(), 300);
        assert_eq!(*config.question_budget(), QUESTION_BUDGET);
        assert_eq!(*config.llm_provider(), LlmProvider::OpenAI);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "llm_provider = \"anthropic\"\nllm_model = \"claude-3-5-haiku-20241022\"\nquestion_budget = 10"
        )
        .expect("write");

        let config = OracleConfig::from_file(file.path()).expect("load");
        assert_eq!(*config.llm_provider(), LlmProvider::Anthropic);
        assert_eq!(*config.question_budget(), 10);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = OracleConfig::from_file("does_not_exist.toml");
        assert!(result.is_err());
    }
}
