//! Persona Guess - a 21 Questions guessing game against an LLM game master.
//!
//! The game master silently picks a globally famous person; the player has
//! 21 yes/no questions to identify them, or can spend a turnless guess at
//! any point.
//!
//! # Architecture
//!
//! - **Session**: the game state machine (phase, turn budget, history)
//! - **Oracle**: the chat wrapper owning one stateful LLM conversation
//! - **Outcome**: the structured response contract parsed from replies
//! - **LlmClient**: provider-abstracted chat transport (OpenAI, Anthropic)
//!
//! # Example
//!
//! ```no_run
//! use persona_guess::{ActionKind, GameSession, LlmClient, OracleConfig, PersonaOracle};
//!
//! # async fn example() -> Result<(), persona_guess::GameError> {
//! let config = OracleConfig::default();
//! let client = LlmClient::new(config.create_llm_config());
//! let mut session = GameSession::new(PersonaOracle::new(client));
//!
//! session.start().await?;
//! session.interact("Are you alive?", ActionKind::Question).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cli;
mod config;
mod llm_client;
mod oracle;
mod outcome;
mod session;

// Crate-level exports - CLI
pub use cli::{Cli, Command};

// Crate-level exports - Configuration
pub use config::{ConfigError, OracleConfig};

// Crate-level exports - LLM transport
pub use llm_client::{ChatSession, LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Oracle wrapper
pub use oracle::{
    ChatProvider, Conversation, DEFAULT_OPENING, OracleError, PersonaOracle, REVEAL_MESSAGE,
    START_MESSAGE, SYSTEM_INSTRUCTION,
};

// Crate-level exports - Response contract
pub use outcome::{CANONICAL_ANSWERS, FALLBACK_ANSWER, OracleOutcome, PLACEHOLDER_IDENTITY};

// Crate-level exports - Game session
pub use session::{
    ActionKind, GameError, GamePhase, GameSession, GameState, Message, MessageKind,
    QUESTION_BUDGET, Speaker,
};
