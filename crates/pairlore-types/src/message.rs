//! Inbound message envelope.

use serde::{Deserialize, Serialize};

/// A message observed in a chat, as handed to the command router.
///
/// Carries only what the core needs: the platform identities of the chat
/// and sender, and the raw text. Parsing and formatting of the platform's
/// own message shape stays outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat_external_id: i64,
    pub sender_id: i64,
    pub text: String,
}
