//! Command-line interface for persona_guess.

use clap::{Parser, Subcommand};

/// Persona Guess - 21 Questions against an LLM game master
#[derive(Parser, Debug)]
#[command(name = "persona_guess")]
#[command(about = "Guess the famous person in 21 questions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal
    Play {
        /// Path to the game configuration file
        #[arg(short, long, default_value = "persona_guess.toml")]
        config: std::path::PathBuf,

        /// Override the LLM provider (openai or anthropic)
        #[arg(long)]
        provider: Option<String>,

        /// Override the LLM model
        #[arg(long)]
        model: Option<String>,

        /// Override the question budget
        #[arg(long)]
        budget: Option<u32>,
    },
}
