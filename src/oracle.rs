//! Oracle wrapper around a stateful LLM conversation.
//!
//! [`PersonaOracle`] owns exactly one external conversation per game and is
//! the sole arbiter of the secret identity: neither it nor the session ever
//! stores or validates the chosen person locally. The conversation's memory
//! is the only place the secret exists.

use crate::llm_client::LlmError;
use crate::outcome::{self, OracleOutcome, PLACEHOLDER_IDENTITY};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use tracing::{debug, info, instrument, warn};

/// System instruction priming a new conversation as the game master.
pub const SYSTEM_INSTRUCTION: &str = "\
You are the Game Master for 'Persona Guess: 21 Questions'.
Your goal is to choose a highly famous person (dead or alive) that is known globally for their achievements in fields like science, arts, sports, politics, or entertainment.

Rules:
1. When starting, confirm you have picked someone. Do not reveal who it is.
2. For valid questions, you MUST primarily answer with: \"Yes\", \"No\", or \"Partially\".
3. If you do not know the answer to a specific question about your chosen persona, your 'answer' must be EXACTLY: \"I am unsure\".
4. If a question is open-ended or cannot be answered with a Yes, No, or Partially, your 'answer' must be EXACTLY: \"Ask a Yes or No question\".
5. If the user makes a direct guess (e.g., \"Are you Albert Einstein?\" or \"Is it Albert Einstein?\"), evaluate if it matches your persona.
6. Your response MUST be in JSON format.

JSON Schema for your response:
{
  \"answer\": \"string (the yes/no/unsure/invalid-prompt response)\",
  \"isCorrect\": boolean (optional, set to true ONLY if the user guessed the name correctly),
  \"revealedName\": \"string (optional, provide the full name of the person if isCorrect is true or the game is ending)\",
  \"feedback\": \"string (optional, any additional brief comment)\"
}

Keep your choice varied. Ensure the person is world-famous.";

/// First message sent on a fresh conversation.
pub const START_MESSAGE: &str = "Start the game. Pick a person and say you're ready.";

/// Final exchange used to retrieve the name when the game was not won.
pub const REVEAL_MESSAGE: &str = "Reveal who you were thinking of.";

/// Opening text used when the acknowledgment cannot be parsed.
pub const DEFAULT_OPENING: &str = "I have someone in mind. Let the 21 questions begin!";

/// One open external conversation.
///
/// The conversation is the sole holder of conversational memory; callers
/// only ever push one turn at a time and read back the raw reply text.
#[async_trait]
pub trait Conversation: Send {
    /// Sends one turn and returns the collaborator's raw reply text.
    async fn send(&mut self, text: &str) -> Result<String, LlmError>;
}

/// Capability to open a new conversation primed with a system instruction.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Conversation handle type produced by this provider.
    type Chat: Conversation;

    /// Opens a fresh conversation.
    async fn open(&self, system_instruction: &str) -> Result<Self::Chat, LlmError>;
}

/// AI chat wrapper translating game actions into conversation turns.
pub struct PersonaOracle<P: ChatProvider> {
    provider: P,
    chat: Option<P::Chat>,
}

impl<P: ChatProvider> PersonaOracle<P> {
    /// Creates an oracle with no conversation open yet.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            chat: None,
        }
    }

    /// Opens a new conversation and asks the collaborator to pick a person.
    ///
    /// Returns the collaborator's opening acknowledgment, or
    /// [`DEFAULT_OPENING`] when the reply is not the expected shape.
    /// Any previously open conversation is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] when the conversation cannot be opened or
    /// the start exchange fails at the transport.
    #[instrument(skip(self))]
    pub async fn start_new_game(&mut self) -> Result<String, OracleError> {
        info!("Starting new game conversation");
        let mut chat = self.provider.open(SYSTEM_INSTRUCTION).await?;
        let reply = chat.send(START_MESSAGE).await?;
        self.chat = Some(chat);

        let opening = outcome::parse_field(&reply, "answer")
            .unwrap_or_else(|| DEFAULT_OPENING.to_string());
        debug!(opening = %opening, "Game started");
        Ok(opening)
    }

    /// Sends the user's raw input as the next conversation turn.
    ///
    /// Shape failures are swallowed here and surfaced as data: a reply
    /// that does not parse yields [`OracleOutcome::fallback`], never an
    /// error. The state machine treats that turn as answered.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::NotStarted`] when no conversation is open,
    /// or a transport error from the underlying client.
    #[instrument(skip(self, input), fields(input_length = input.len()))]
    pub async fn ask(&mut self, input: &str) -> Result<OracleOutcome, OracleError> {
        let chat = self.chat.as_mut().ok_or(OracleError::NotStarted)?;
        let reply = chat.send(&format!("Question/Guess: {input}")).await?;

        let parsed = outcome::parse_outcome(&reply);
        if parsed.is_none() {
            warn!("Oracle reply did not parse; returning fallback outcome");
        }
        Ok(parsed.unwrap_or_else(OracleOutcome::fallback))
    }

    /// Asks the collaborator to reveal who it was thinking of.
    ///
    /// Falls back to [`PLACEHOLDER_IDENTITY`] when the reply carries no
    /// name or no conversation is open.
    ///
    /// # Errors
    ///
    /// Returns a transport error from the underlying client.
    #[instrument(skip(self))]
    pub async fn reveal_identity(&mut self) -> Result<String, OracleError> {
        let Some(chat) = self.chat.as_mut() else {
            warn!("Reveal requested with no open conversation");
            return Ok(PLACEHOLDER_IDENTITY.to_string());
        };
        let reply = chat.send(REVEAL_MESSAGE).await?;

        let name = outcome::parse_field(&reply, "revealedName")
            .unwrap_or_else(|| PLACEHOLDER_IDENTITY.to_string());
        info!(name = %name, "Identity revealed");
        Ok(name)
    }
}

/// Oracle error.
#[derive(Debug, Clone, Display, Error, From)]
pub enum OracleError {
    /// No conversation is open; `start_new_game` must run first.
    #[display("Game not started")]
    NotStarted,
    /// The underlying chat transport failed.
    #[display("{_0}")]
    Transport(LlmError),
}
