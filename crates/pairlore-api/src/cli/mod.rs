//! CLI command definitions and dispatch for the `plore` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! verb-noun pattern (e.g., `plore list chats`, `plore purge`).

pub mod chats;
pub mod repl;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Operate a word-pair learning chat bot.
#[derive(Parser)]
#[command(name = "plore", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show learned-pair stats for a chat.
    Stats {
        /// Platform-assigned chat id.
        external_id: i64,
    },

    /// Evict a chat's learned data immediately.
    Purge {
        /// Platform-assigned chat id.
        external_id: i64,

        /// Skip the confirmation hint and delete right away.
        #[arg(long)]
        yes: bool,
    },

    /// Drive a chat from the terminal (local platform stand-in).
    Chat {
        /// Platform-assigned chat id.
        external_id: i64,

        /// Sender id to attribute messages to.
        #[arg(long, default_value_t = 1)]
        user_id: i64,

        /// Answer the administrator check with "no".
        #[arg(long)]
        no_admin: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// Tracked chats.
    Chats,
}
