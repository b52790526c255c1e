//! Integration tests for the oracle wrapper's prompt contract and
//! fallback behavior.

use async_trait::async_trait;
use persona_guess::{
    ChatProvider, Conversation, DEFAULT_OPENING, FALLBACK_ANSWER, LlmError, PLACEHOLDER_IDENTITY,
    PersonaOracle, REVEAL_MESSAGE, START_MESSAGE, SYSTEM_INSTRUCTION,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Script {
    replies: Arc<Mutex<VecDeque<&'static str>>>,
    sent: Arc<Mutex<Vec<String>>>,
    system: Arc<Mutex<Option<String>>>,
}

impl Script {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.iter().copied().collect())),
            sent: Arc::new(Mutex::new(Vec::new())),
            system: Arc::new(Mutex::new(None)),
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn system(&self) -> Option<String> {
        self.system.lock().unwrap().clone()
    }
}

struct ScriptedChat {
    script: Script,
}

#[async_trait]
impl Conversation for ScriptedChat {
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        self.script.sent.lock().unwrap().push(text.to_string());
        self.script
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .map(|r| r.to_string())
            .ok_or_else(|| LlmError::new("script exhausted".to_string()))
    }
}

#[async_trait]
impl ChatProvider for Script {
    type Chat = ScriptedChat;

    async fn open(&self, system_instruction: &str) -> Result<ScriptedChat, LlmError> {
        *self.system.lock().unwrap() = Some(system_instruction.to_string());
        Ok(ScriptedChat {
            script: self.clone(),
        })
    }
}

#[tokio::test]
async fn exchanges_use_the_fixed_prompt_literals() {
    let script = Script::new(&[
        r#"{"answer": "Ready when you are."}"#,
        r#"{"answer": "No"}"#,
        r#"{"revealedName": "Nelson Mandela"}"#,
    ]);
    let mut oracle = PersonaOracle::new(script.clone());

    oracle.start_new_game().await.expect("start");
    oracle.ask("Are you alive?").await.expect("ask");
    oracle.reveal_identity().await.expect("reveal");

    assert_eq!(script.system().as_deref(), Some(SYSTEM_INSTRUCTION));
    assert_eq!(
        script.sent(),
        vec![
            START_MESSAGE.to_string(),
            "Question/Guess: Are you alive?".to_string(),
            REVEAL_MESSAGE.to_string(),
        ]
    );
}

#[tokio::test]
async fn start_returns_parsed_acknowledgment() {
    let script = Script::new(&[r#"{"answer": "I picked someone. Go!"}"#]);
    let mut oracle = PersonaOracle::new(script);

    let opening = oracle.start_new_game().await.expect("start");
    assert_eq!(opening, "I picked someone. Go!");
}

#[tokio::test]
async fn start_falls_back_on_unparseable_acknowledgment() {
    let script = Script::new(&["Sure thing, I'm ready!"]);
    let mut oracle = PersonaOracle::new(script);

    let opening = oracle.start_new_game().await.expect("start");
    assert_eq!(opening, DEFAULT_OPENING);
}

#[tokio::test]
async fn start_propagates_transport_failure() {
    // Empty script: the first send fails.
    let script = Script::new(&[]);
    let mut oracle = PersonaOracle::new(script);

    assert!(oracle.start_new_game().await.is_err());
}

#[tokio::test]
async fn ask_without_a_game_is_an_error() {
    let script = Script::new(&[r#"{"answer": "No"}"#]);
    let mut oracle = PersonaOracle::new(script.clone());

    assert!(oracle.ask("Are you alive?").await.is_err());
    // No conversation was opened, so nothing was sent.
    assert!(script.sent().is_empty());
}

#[tokio::test]
async fn ask_passes_outcome_fields_through() {
    let script = Script::new(&[
        r#"{"answer": "Ready."}"#,
        r#"{"answer": "Yes", "isCorrect": true, "revealedName": "Ada Lovelace", "feedback": "Sharp guess!"}"#,
    ]);
    let mut oracle = PersonaOracle::new(script);
    oracle.start_new_game().await.expect("start");

    let outcome = oracle.ask("Are you Ada Lovelace?").await.expect("ask");
    assert_eq!(outcome.answer, "Yes");
    assert!(outcome.signals_correct());
    assert_eq!(outcome.revealed_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(outcome.feedback.as_deref(), Some("Sharp guess!"));
}

#[tokio::test]
async fn ask_swallows_shape_failures_as_fallback_data() {
    let script = Script::new(&[r#"{"answer": "Ready."}"#, "certainly not JSON"]);
    let mut oracle = PersonaOracle::new(script);
    oracle.start_new_game().await.expect("start");

    let outcome = oracle.ask("Are you alive?").await.expect("fallback, not error");
    assert_eq!(outcome.answer, FALLBACK_ANSWER);
    assert_eq!(outcome.is_correct, None);
}

#[tokio::test]
async fn reveal_without_a_game_returns_placeholder() {
    let script = Script::new(&[]);
    let mut oracle = PersonaOracle::new(script.clone());

    let name = oracle.reveal_identity().await.expect("placeholder");
    assert_eq!(name, PLACEHOLDER_IDENTITY);
    assert!(script.sent().is_empty());
}

#[tokio::test]
async fn reveal_extracts_name_from_loose_reply() {
    // Reveal replies need not carry the full outcome shape.
    let script = Script::new(&[
        r#"{"answer": "Ready."}"#,
        r#"{"revealedName": "Mahatma Gandhi"}"#,
    ]);
    let mut oracle = PersonaOracle::new(script);
    oracle.start_new_game().await.expect("start");

    let name = oracle.reveal_identity().await.expect("reveal");
    assert_eq!(name, "Mahatma Gandhi");
}

#[tokio::test]
async fn reveal_falls_back_when_name_is_missing() {
    let script = Script::new(&[r#"{"answer": "Ready."}"#, r#"{"answer": "Goodbye"}"#]);
    let mut oracle = PersonaOracle::new(script);
    oracle.start_new_game().await.expect("start");

    let name = oracle.reveal_identity().await.expect("reveal");
    assert_eq!(name, PLACEHOLDER_IDENTITY);
}
