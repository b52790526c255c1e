//! Persona Guess - 21 Questions in the terminal.
//!
//! Presentation layer only: reads lines, calls the session's three
//! operations, and prints state snapshots. All game rules live in the
//! library.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use persona_guess::{
    ActionKind, ChatProvider, Cli, Command, GamePhase, GameSession, LlmClient, LlmProvider,
    OracleConfig, PersonaOracle, Speaker,
};
use std::io::Write as _;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Quiet by default so log lines don't interleave with the chat.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            provider,
            model,
            budget,
        } => run_play(config, provider, model, budget).await,
    }
}

/// Run the terminal game loop
async fn run_play(
    config_path: std::path::PathBuf,
    provider: Option<String>,
    model: Option<String>,
    budget: Option<u32>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;

    if let Some(provider) = provider {
        config.set_provider(parse_provider(&provider)?);
    }
    if let Some(model) = model {
        config.set_model(model);
    }
    if let Some(budget) = budget {
        config.set_question_budget(budget);
    }

    let client = LlmClient::new(config.create_llm_config());
    let mut session = GameSession::with_budget(PersonaOracle::new(client), *config.question_budget());

    println!("PERSONA GUESS - 21 Questions");
    println!(
        "I'm thinking of a globally famous person. You have {} questions to figure out who.",
        config.question_budget()
    );
    println!("Ask a Yes/No question, or type `/guess <name>` when you're ready.");
    println!("`/new` restarts, `/quit` exits.");
    println!();

    start_game(&mut session).await;

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("[{} left] > ", session.state().turns_remaining());
        std::io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "/quit" | "/exit" => break,
            "/new" => {
                start_game(&mut session).await;
                continue;
            }
            _ => {}
        }

        let (text, kind) = match input.strip_prefix("/guess ") {
            Some(name) => (name, ActionKind::Guess),
            None => (input, ActionKind::Question),
        };

        if let Err(e) = session.interact(text, kind).await {
            eprintln!("Something went wrong with the AI response. Try again. ({e})");
            continue;
        }

        render_reply(&session);
        render_ending(&session);
    }

    Ok(())
}

/// Start (or restart) a game, reporting failures without exiting
async fn start_game<P: ChatProvider>(session: &mut GameSession<P>) {
    println!("Shuffling famous faces...");
    match session.start().await {
        Ok(()) => {
            if let Some(opening) = session.state().history().first() {
                println!("Oracle: {}", opening.text());
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize game. Check your network or API key. ({e})");
            eprintln!("Type /new to try again.");
        }
    }
}

/// Print the oracle's latest reply, if the last turn produced one
fn render_reply<P: ChatProvider>(session: &GameSession<P>) {
    if let Some(message) = session.state().history().last() {
        if *message.speaker() == Speaker::Oracle {
            println!("Oracle: {}", message.text());
        }
    }
}

/// Print the win/loss banner once the game ends
fn render_ending<P: ChatProvider>(session: &GameSession<P>) {
    let state = session.state();
    let name = state.secret_identity().as_deref().unwrap_or("a mystery");
    match state.phase() {
        GamePhase::Won => {
            println!();
            println!(
                "Victory! You correctly guessed {} with {} questions to spare.",
                name,
                state.turns_remaining()
            );
            println!("Type /new to play again.");
        }
        GamePhase::Lost => {
            println!();
            println!("Out of questions! The secret persona was {}.", name);
            println!("Type /new to play again.");
        }
        _ => {}
    }
}

fn load_config(path: &Path) -> Result<OracleConfig> {
    if path.exists() {
        Ok(OracleConfig::from_file(path)?)
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Ok(OracleConfig::default())
    }
}

fn parse_provider(raw: &str) -> Result<LlmProvider> {
    match raw.to_ascii_lowercase().as_str() {
        "openai" => Ok(LlmProvider::OpenAI),
        "anthropic" => Ok(LlmProvider::Anthropic),
        other => anyhow::bail!("Unknown provider: {other} (expected openai or anthropic)"),
    }
}
