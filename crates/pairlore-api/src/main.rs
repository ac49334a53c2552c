//! Pairlore CLI entry point.
//!
//! Binary name: `plore`
//!
//! Parses CLI arguments, initializes the database and retention
//! scheduler, then dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ListResource};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,pairlore=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "plore", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, scheduler)
    let state = AppState::init().await?;

    match cli.command {
        Commands::List { resource } => match resource {
            ListResource::Chats => {
                cli::chats::list_chats(&state, cli.json).await?;
            }
        },

        Commands::Stats { external_id } => {
            cli::chats::chat_stats(&state, external_id, cli.json).await?;
        }

        Commands::Purge { external_id, yes } => {
            cli::chats::purge_chat(&state, external_id, yes, cli.json).await?;
        }

        Commands::Chat {
            external_id,
            user_id,
            no_admin,
        } => {
            cli::repl::run(&state, external_id, user_id, !no_admin).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
