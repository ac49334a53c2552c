//! Local chat REPL.
//!
//! Drives the command router from the terminal with a console-backed
//! platform stand-in: the administrator check answers from a flag and
//! replies print to stdout. Lets an operator exercise the full command
//! surface without any platform transport.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use console::style;
use tokio::io::AsyncBufReadExt;

use pairlore_core::command::CommandRouter;
use pairlore_core::platform::ChatPlatform;
use pairlore_types::chat::Chat;
use pairlore_types::error::PlatformError;
use pairlore_types::message::IncomingMessage;

use crate::state::AppState;

/// Platform stand-in for local operation.
pub struct ConsolePlatform {
    admin: bool,
}

impl ChatPlatform for ConsolePlatform {
    async fn is_administrator(
        &self,
        _chat_external_id: i64,
        _user_id: i64,
    ) -> Result<bool, PlatformError> {
        Ok(self.admin)
    }

    async fn send_reply(&self, _chat: &Chat, text: &str) -> Result<(), PlatformError> {
        println!("{} {}", style("bot>").cyan().bold(), text);
        Ok(())
    }
}

/// Run the interactive loop for one chat.
pub async fn run(state: &AppState, external_id: i64, user_id: i64, admin: bool) -> Result<()> {
    let platform = Arc::new(ConsolePlatform { admin });
    let router = CommandRouter::new(
        Arc::clone(&state.store),
        Arc::clone(&platform),
        &state.config,
    );

    println!();
    println!(
        "  Driving chat {} as user {}{}. Type {} for commands, Ctrl-D to exit.",
        style(external_id).cyan(),
        style(user_id).cyan(),
        if admin { "" } else { " (not an admin)" },
        style("/help").yellow()
    );
    println!();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("{} ", style("you>").green().bold());
        std::io::stdout().flush()?;

        match lines.next_line().await? {
            Some(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                router
                    .handle(&IncomingMessage {
                        chat_external_id: external_id,
                        sender_id: user_id,
                        text: line,
                    })
                    .await;
            }
            None => break,
        }
    }

    println!();
    Ok(())
}
