//! Command router: maps inbound `/commands` to handlers and replies.
//!
//! Every inbound command is one request/response flow. Data- or
//! platform-layer failures inside a handler are logged and reported to
//! the requester as a generic failure; they never propagate out of
//! `handle` and never crash the process.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tracing::{error, warn};

use pairlore_types::chat::{Chat, RandomChance};
use pairlore_types::config::PairloreConfig;
use pairlore_types::message::IncomingMessage;

use crate::chat::ChatService;
use crate::moderation::{format_matches, ModerationEngine, ModerationError, ModerationOutcome};
use crate::platform::ChatPlatform;
use crate::store::AssociationStore;

const PING_ANSWERS: [&str; 5] = ["echo", "pong", "ACK", "reply", "pingback"];

const INVALID_COMMAND: &str = "Invalid command! Type /help";
const GENERIC_FAILURE: &str = "Something went wrong, try again later";
const SET_CHANCE_USAGE: &str = "Usage: /set_chance 1-50.";
const MODERATE_USAGE: &str = "Usage:\n\
    /moderate <word> for search\n\
    /moderate <word> <word_id> for deletion";
const NO_WORDS_FOUND: &str = "No words found!";
const NOT_ADMIN: &str = "You don't have admin privileges!";

/// Dispatches inbound commands into the core.
pub struct CommandRouter<S, P> {
    chats: ChatService<S>,
    moderation: ModerationEngine<S, P>,
    platform: Arc<P>,
    retention_hours: u64,
}

impl<S: AssociationStore, P: ChatPlatform> CommandRouter<S, P> {
    pub fn new(store: Arc<S>, platform: Arc<P>, config: &PairloreConfig) -> Self {
        Self {
            chats: ChatService::new(Arc::clone(&store)),
            moderation: ModerationEngine::new(store, Arc::clone(&platform), config.search_limit),
            platform,
            retention_hours: config.retention_hours,
        }
    }

    /// Handle one inbound message. Non-command text is ignored; the chat
    /// row is resolved (created on first contact) before dispatch.
    pub async fn handle(&self, message: &IncomingMessage) {
        let Some(command) = super::Command::parse(&message.text) else {
            return;
        };

        let chat = match self.chats.get_or_create(message.chat_external_id).await {
            Ok(chat) => chat,
            Err(err) => {
                error!(
                    external_id = message.chat_external_id,
                    error = %err,
                    "failed to resolve chat for command"
                );
                return;
            }
        };

        let reply = match self.dispatch(&chat, &command, message.sender_id).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(
                    chat_id = chat.id,
                    command = %command.name,
                    error = %err,
                    "command failed"
                );
                Some(GENERIC_FAILURE.to_string())
            }
        };

        if let Some(text) = reply {
            if let Err(err) = self.platform.send_reply(&chat, &text).await {
                warn!(chat_id = chat.id, error = %err, "failed to deliver reply");
            }
        }
    }

    async fn dispatch(
        &self,
        chat: &Chat,
        command: &super::Command,
        sender_id: i64,
    ) -> Result<Option<String>, ModerationError> {
        match command.name.as_str() {
            "start" => Ok(Some("Hi! :3".to_string())),
            "help" => Ok(Some(self.help_text())),
            "ping" => Ok(Some(ping_answer())),
            "set_chance" => self.set_chance(chat, &command.args).await,
            "get_chance" => Ok(Some(format!("Current chance: {}", chat.random_chance))),
            "get_stats" => {
                let pairs = self.chats.pair_count(chat).await?;
                Ok(Some(format!("Pairs: {pairs}")))
            }
            "moderate" => self.moderate(chat, sender_id, &command.args).await,
            _ => Ok(Some(INVALID_COMMAND.to_string())),
        }
    }

    async fn set_chance(
        &self,
        chat: &Chat,
        args: &[String],
    ) -> Result<Option<String>, ModerationError> {
        let Some(chance) = args.first().and_then(|raw| raw.parse::<RandomChance>().ok()) else {
            return Ok(Some(SET_CHANCE_USAGE.to_string()));
        };
        self.chats.set_random_chance(chat, chance).await?;
        Ok(Some(format!("Set chance to: {chance}")))
    }

    async fn moderate(
        &self,
        chat: &Chat,
        sender_id: i64,
        args: &[String],
    ) -> Result<Option<String>, ModerationError> {
        let outcome = self.moderation.moderate(chat, sender_id, args).await?;
        Ok(match outcome {
            ModerationOutcome::Found(words) => Some(format_matches(&words)),
            ModerationOutcome::NotFound => Some(NO_WORDS_FOUND.to_string()),
            // Success needs no confirmation; the engine already logged it.
            ModerationOutcome::Deleted { .. } => None,
            ModerationOutcome::Denied => Some(NOT_ADMIN.to_string()),
            ModerationOutcome::UsageError => Some(MODERATE_USAGE.to_string()),
        })
    }

    fn help_text(&self) -> String {
        format!(
            "Add me to your group and let me listen to your chat for a while.\n\
             When I learn enough word pairs, I'll start bringing fun and absurdity \
             to your conversations.\n\
             \n\
             Available commands:\n\
             • /ping,\n\
             • /get_stats: get the number of word pairs I've learned in this chat,\n\
             • /set_chance: set the chance that I'll reply to a random message \
             (must be in range 1-50, default: 5),\n\
             • /get_chance: get the current chance of my random reply.\n\
             \n\
             If you get tired of me, you can kick me from the group. In {hours} hours, \
             I'll forget everything that has been learned in your chat, so you can add \
             me again and teach me new things!",
            hours = self.retention_hours
        )
    }
}

fn ping_answer() -> String {
    PING_ANSWERS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("pong")
        .to_string()
}
