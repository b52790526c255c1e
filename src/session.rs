//! Game session state machine.
//!
//! [`GameSession`] owns the [`GameState`] aggregate and the rules for when
//! it changes. The session is the only writer: the UI layer reads
//! snapshots via [`GameSession::state`] and triggers transitions via
//! [`GameSession::start`] and [`GameSession::interact`], nothing more.

use crate::oracle::{ChatProvider, OracleError, PersonaOracle};
use crate::outcome::PLACEHOLDER_IDENTITY;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Fixed question budget for a fresh game.
pub const QUESTION_BUDGET: u32 = 21;

/// Phase of a game session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// No game underway.
    Idle,
    /// Waiting for the oracle to acknowledge game start.
    Initializing,
    /// Game in progress, accepting questions and guesses.
    Playing,
    /// Reserved. Present in the phase vocabulary but never entered by any
    /// transition.
    Guessing,
    /// The user guessed the identity.
    Won,
    /// The question budget ran out.
    Lost,
}

/// Who spoke a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human player.
    User,
    /// The AI game master.
    Oracle,
}

/// What a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A yes/no question from the user.
    Question,
    /// The oracle's answer to a question or guess.
    Answer,
    /// A direct identity guess from the user.
    Guess,
    /// Oracle commentary outside the question/answer loop.
    System,
}

/// The kind of action the user submits to [`GameSession::interact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A question; consumes one turn on a successful exchange.
    Question,
    /// A guess; never consumes a turn.
    Guess,
}

impl ActionKind {
    fn message_kind(self) -> MessageKind {
        match self {
            ActionKind::Question => MessageKind::Question,
            ActionKind::Guess => MessageKind::Guess,
        }
    }
}

/// One turn of the visible conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Message {
    /// Who spoke.
    speaker: Speaker,
    /// Display text.
    text: String,
    /// What the message is.
    kind: MessageKind,
}

impl Message {
    /// Creates a new message.
    pub fn new(speaker: Speaker, text: String, kind: MessageKind) -> Self {
        Self {
            speaker,
            text,
            kind,
        }
    }
}

/// The single mutable aggregate owned by the session.
///
/// Created fresh at game start and replaced wholesale on reset; nothing
/// carries over between plays and nothing persists across sessions.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase.
    phase: GamePhase,
    /// Questions left. Never negative; hits 0 only as the game ends.
    turns_remaining: u32,
    /// Append-only conversation history in display order.
    history: Vec<Message>,
    /// The revealed identity; populated only in `Won`/`Lost`.
    secret_identity: Option<String>,
}

impl GameState {
    fn fresh(budget: u32) -> Self {
        Self {
            phase: GamePhase::Idle,
            turns_remaining: budget,
            history: Vec::new(),
            secret_identity: None,
        }
    }
}

/// Owns the game state and the oracle for one play session.
pub struct GameSession<P: ChatProvider> {
    oracle: PersonaOracle<P>,
    state: GameState,
    budget: u32,
    busy: bool,
}

impl<P: ChatProvider> GameSession<P> {
    /// Creates a session with the standard 21-question budget.
    pub fn new(oracle: PersonaOracle<P>) -> Self {
        Self::with_budget(oracle, QUESTION_BUDGET)
    }

    /// Creates a session with a custom question budget.
    pub fn with_budget(oracle: PersonaOracle<P>, budget: u32) -> Self {
        info!(budget, "Creating game session");
        Self {
            oracle,
            state: GameState::fresh(budget),
            budget,
            busy: false,
        }
    }

    /// Read-only snapshot of the current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Whether an oracle exchange is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Starts (or restarts) a game.
    ///
    /// Replaces the state wholesale, asks the oracle to pick a person, and
    /// enters `Playing` with one system message on success. On failure the
    /// phase reverts to `Idle` so the caller can retry cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] when the start exchange fails at the
    /// transport.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), GameError> {
        if self.busy {
            debug!("Start ignored: exchange in flight");
            return Ok(());
        }

        info!("Starting new game");
        self.state = GameState::fresh(self.budget);
        self.state.phase = GamePhase::Initializing;

        self.busy = true;
        let result = self.oracle.start_new_game().await;
        self.busy = false;

        match result {
            Ok(opening) => {
                self.state.phase = GamePhase::Playing;
                self.state
                    .history
                    .push(Message::new(Speaker::Oracle, opening, MessageKind::System));
                info!("Game started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Game start failed, reverting to idle");
                self.state.phase = GamePhase::Idle;
                Err(e.into())
            }
        }
    }

    /// Submits a question or guess.
    ///
    /// No-ops on empty input, while an exchange is in flight, or outside
    /// the `Playing` phase. The user's message is appended optimistically;
    /// if the exchange then fails it stays in history with no reply, and
    /// all other staged changes are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] when the oracle exchange (or the end-of-game
    /// reveal exchange) fails at the transport.
    #[instrument(skip(self, text), fields(kind = %kind, phase = %self.state.phase))]
    pub async fn interact(&mut self, text: &str, kind: ActionKind) -> Result<(), GameError> {
        if text.trim().is_empty() || self.busy || self.state.phase != GamePhase::Playing {
            debug!(
                busy = self.busy,
                "Interaction dropped by no-op guard"
            );
            return Ok(());
        }

        // Optimistic append: survives even if the exchange fails.
        self.state.history.push(Message::new(
            Speaker::User,
            text.to_string(),
            kind.message_kind(),
        ));

        self.busy = true;
        let result = self.resolve_turn(text, kind).await;
        self.busy = false;
        result
    }

    /// Runs one oracle exchange and folds the outcome into new state.
    ///
    /// All mutations besides the already-appended user message are staged
    /// locally and committed only once every exchange has succeeded.
    async fn resolve_turn(&mut self, text: &str, kind: ActionKind) -> Result<(), GameError> {
        let outcome = self.oracle.ask(text).await?;

        // Decrement keys on the action kind alone, not the outcome: a
        // winning guess submitted as a question still costs a turn.
        let remaining = match kind {
            ActionKind::Question => self.state.turns_remaining.saturating_sub(1),
            ActionKind::Guess => self.state.turns_remaining,
        };

        // Win takes priority over exhaustion on the same turn.
        let (phase, secret) = if outcome.signals_correct() {
            let name = outcome
                .revealed_name
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IDENTITY.to_string());
            info!(name = %name, "Correct guess, game won");
            (GamePhase::Won, Some(name))
        } else if remaining == 0 {
            let name = self.oracle.reveal_identity().await?;
            info!(name = %name, "Out of questions, game lost");
            (GamePhase::Lost, Some(name))
        } else {
            (GamePhase::Playing, None)
        };

        self.state.turns_remaining = remaining;
        self.state.phase = phase;
        if secret.is_some() {
            self.state.secret_identity = secret;
        }
        self.state.history.push(Message::new(
            Speaker::Oracle,
            outcome.answer,
            MessageKind::Answer,
        ));

        debug!(
            remaining = self.state.turns_remaining,
            phase = %self.state.phase,
            "Turn resolved"
        );
        Ok(())
    }
}

/// Game session error.
#[derive(Debug, Clone, Display, Error)]
#[display("Game error: {} at {}:{}", message, file, line)]
pub struct GameError {
    /// Error message.
    pub message: String,
    /// Line number where the error was created.
    pub line: u32,
    /// Source file where the error was created.
    pub file: &'static str,
}

impl GameError {
    /// Creates a new game error.
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

impl From<OracleError> for GameError {
    #[track_caller]
    fn from(e: OracleError) -> Self {
        GameError::new(e.to_string())
    }
}
