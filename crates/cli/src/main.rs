//! Watchpost CLI - operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Generate a value for WATCHPOST_OWNER_TOKEN
//! watchpost-cli token generate
//!
//! # Generate a longer one
//! watchpost-cli token generate --length 24
//!
//! # Validate the environment / .env file the bot would start with
//! watchpost-cli config check
//! ```
//!
//! # Commands
//!
//! - `token generate` - Generate an owner activation token
//! - `config check` - Load and validate bot configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "watchpost-cli")]
#[command(author, version, about = "Watchpost operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage activation tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Inspect bot configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Generate a random owner activation token
    Generate {
        /// Token length in characters
        #[arg(short, long, default_value_t = commands::token::DEFAULT_OWNER_TOKEN_LENGTH)]
        length: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load configuration from the environment and report problems
    Check,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Generate { length } => {
                let token = commands::token::generate_owner_token(length)?;
                tracing::info!("Add this to your environment:");
                tracing::info!("  WATCHPOST_OWNER_TOKEN={token}");
                tracing::info!("");
                tracing::info!("Then send `/activate {token}` to the bot within one day.");
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Check => commands::config::check()?,
        },
    }
    Ok(())
}
