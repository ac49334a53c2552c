//! ChatPlatform trait definition.
//!
//! The platform collaborator verifies administrator status and delivers
//! replies. The real transport lives outside this core; tests and the
//! local REPL provide their own implementations.

use pairlore_types::chat::Chat;
use pairlore_types::error::PlatformError;

/// Port to the chat platform the bot runs on.
pub trait ChatPlatform: Send + Sync {
    /// Whether `user_id` administers the chat identified by
    /// `chat_external_id`.
    fn is_administrator(
        &self,
        chat_external_id: i64,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, PlatformError>> + Send;

    /// Deliver `text` to `chat`. Fire-and-forget from the core's
    /// perspective; callers log failures and move on.
    fn send_reply(
        &self,
        chat: &Chat,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;
}
