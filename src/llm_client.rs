//! LLM chat transport for OpenAI and Anthropic.
//!
//! The chat-completions APIs are stateless, so [`ChatSession`] carries the
//! accumulated turn list and replays it on every send. The handle is the
//! "conversation" the rest of the crate talks about; nothing outside it
//! ever sees the transcript.

use crate::oracle::{ChatProvider, Conversation};
use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// LLM provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI (GPT models).
    OpenAI,
    /// Anthropic (Claude models).
    Anthropic,
}

/// Configuration for LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    provider: LlmProvider,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmConfig {
    /// Creates a new LLM configuration.
    ///
    /// An empty `api_key` is accepted; calls fail at the service boundary
    /// rather than here.
    #[instrument(skip(api_key), fields(provider = ?provider, model = %model))]
    pub fn new(provider: LlmProvider, api_key: String, model: String, max_tokens: u32) -> Self {
        debug!("Creating LLM config");
        Self {
            provider,
            api_key,
            model,
            max_tokens,
        }
    }

    /// Gets the provider.
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Gets the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Gets the max tokens.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// LLM client that abstracts over multiple providers.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    /// Creates a new LLM client.
    #[instrument(skip(config), fields(provider = ?config.provider()))]
    pub fn new(config: LlmConfig) -> Self {
        info!("Creating LLM client");
        Self { config }
    }
}

#[async_trait]
impl ChatProvider for LlmClient {
    type Chat = ChatSession;

    #[instrument(skip(self, system_instruction))]
    async fn open(&self, system_instruction: &str) -> Result<ChatSession, LlmError> {
        debug!("Opening chat session");
        Ok(ChatSession {
            config: self.config.clone(),
            system_instruction: system_instruction.to_string(),
            turns: Vec::new(),
        })
    }
}

/// Who spoke a recorded turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
struct ChatTurn {
    role: TurnRole,
    text: String,
}

/// One stateful conversation with the configured provider.
///
/// Turns are committed to the transcript only after the provider answers,
/// so a failed send leaves the conversation where it was and the caller
/// can retry the same turn.
#[derive(Debug)]
pub struct ChatSession {
    config: LlmConfig,
    system_instruction: String,
    turns: Vec<ChatTurn>,
}

#[async_trait]
impl Conversation for ChatSession {
    #[instrument(skip(self, text), fields(provider = ?self.config.provider, model = %self.config.model, turn_count = self.turns.len()))]
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        debug!("Sending conversation turn");
        let reply = match self.config.provider {
            LlmProvider::OpenAI => self.send_openai(text).await?,
            LlmProvider::Anthropic => self.send_anthropic(text).await?,
        };

        self.turns.push(ChatTurn {
            role: TurnRole::User,
            text: text.to_string(),
        });
        self.turns.push(ChatTurn {
            role: TurnRole::Assistant,
            text: reply.clone(),
        });

        info!(reply_length = reply.len(), "Received conversation reply");
        Ok(reply)
    }
}

impl ChatSession {
    /// Sends the transcript plus one new turn to Anthropic.
    #[instrument(skip(self, text))]
    async fn send_anthropic(&self, text: &str) -> Result<String, LlmError> {
        let client = reqwest::Client::new();

        debug!("Building Anthropic API request");
        let mut messages: Vec<serde_json::Value> = self
            .turns
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": match turn.role {
                        TurnRole::User => "user",
                        TurnRole::Assistant => "assistant",
                    },
                    "content": turn.text,
                })
            })
            .collect();
        messages.push(serde_json::json!({ "role": "user", "content": text }));

        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": self.system_instruction,
            "messages": messages,
        });

        debug!("Sending request to Anthropic");
        let response = client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", self.config.api_key.clone())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Anthropic API request failed");
                LlmError::new(format!("Anthropic API request failed: {}", e))
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read Anthropic response");
            LlmError::new(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            error!(status = %status, response = %response_text, "Anthropic API error");
            return Err(LlmError::new(format!(
                "Anthropic API error {}: {}",
                status, response_text
            )));
        }

        let response_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = ?e, response = %response_text, "Failed to parse Anthropic response");
            LlmError::new(format!("Failed to parse response: {}", e))
        })?;

        let content = response_json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                error!(response = %response_json, "No text content in Anthropic response");
                LlmError::new("No text content in Anthropic response".to_string())
            })?
            .to_string();

        Ok(content)
    }

    /// Sends the transcript plus one new turn to OpenAI.
    #[instrument(skip(self, text))]
    async fn send_openai(&self, text: &str) -> Result<String, LlmError> {
        let client = OpenAIClient::with_config(
            OpenAIConfig::new().with_api_key(self.config.api_key.clone()),
        );

        debug!("Building chat completion request");
        let mut messages = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_instruction.as_str())
                .build()
                .map_err(|e| {
                    error!(error = ?e, "Failed to build system message");
                    LlmError::new(format!("Failed to build system message: {}", e))
                })?,
        )];

        for turn in &self.turns {
            let message = match turn.role {
                TurnRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text.as_str())
                        .build()
                        .map_err(|e| {
                            error!(error = ?e, "Failed to build user message");
                            LlmError::new(format!("Failed to build user message: {}", e))
                        })?,
                ),
                TurnRole::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.text.as_str())
                        .build()
                        .map_err(|e| {
                            error!(error = ?e, "Failed to build assistant message");
                            LlmError::new(format!("Failed to build assistant message: {}", e))
                        })?,
                ),
            };
            messages.push(message);
        }

        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| {
                    error!(error = ?e, "Failed to build user message");
                    LlmError::new(format!("Failed to build user message: {}", e))
                })?,
        ));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build request");
                LlmError::new(format!("Failed to build request: {}", e))
            })?;

        debug!("Sending request to OpenAI");
        let response = client.chat().create(request).await.map_err(|e| {
            error!(error = ?e, "OpenAI API error");
            LlmError::new(format!("OpenAI API error: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                error!("No content in OpenAI response");
                LlmError::new("No content in OpenAI response".to_string())
            })?;

        Ok(content)
    }
}

/// LLM client error.
#[derive(Debug, Clone, Display, Error)]
#[display("LLM error: {} at {}:{}", message, file, line)]
pub struct LlmError {
    /// Error message.
    pub message: String,
    /// Line number where the error was created.
    pub line: u32,
    /// Source file where the error was created.
    pub file: &'static str,
}

impl LlmError {
    /// Creates a new LLM error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "LLM error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
