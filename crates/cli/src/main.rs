//! Tilda Bridge CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tb-cli migrate
//!
//! # Promote a chat user to the operator role
//! tb-cli operator grant --chat-id 987654321
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `operator grant` - Grant the operator role to an existing chat user
//!   (the user must have contacted the bot at least once)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tb-cli")]
#[command(author, version, about = "Tilda Bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the operator account
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },
}

#[derive(Subcommand)]
enum OperatorAction {
    /// Grant the operator role to a chat user
    Grant {
        /// Telegram chat id of the user
        #[arg(short, long)]
        chat_id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Operator { action } => match action {
            OperatorAction::Grant { chat_id } => {
                commands::operator::grant(chat_id).await?;
            }
        },
    }
    Ok(())
}
