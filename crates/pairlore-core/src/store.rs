//! AssociationStore trait definition.
//!
//! Provides lookup, filtered query, and delete-by-id-set operations over
//! chats, words, pairs, and replies. Uses native async fn in traits
//! (RPITIT, Rust 2024 edition); the SQLite implementation lives in
//! pairlore-infra.

use pairlore_types::chat::{Chat, RandomChance};
use pairlore_types::error::RepositoryError;
use pairlore_types::word::{Pair, WordMatch};

/// Persistence port for the association graph.
///
/// Chats, words, pairs, and replies are owned exclusively by the store;
/// the core mutates them only through the retention eviction path and the
/// moderation deletion path.
pub trait AssociationStore: Send + Sync {
    /// Get a chat by its internal id.
    fn find_chat(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Get a chat by its platform-assigned id.
    fn find_chat_by_external_id(
        &self,
        external_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// All tracked chats, ordered by internal id.
    ///
    /// Used on startup to re-arm pending retention tasks, which do not
    /// survive a restart.
    fn list_chats(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Create a chat row for a newly observed external chat, with the
    /// default reply chance.
    fn create_chat(
        &self,
        external_id: i64,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Update a chat's reply chance.
    fn update_chat_chance(
        &self,
        id: i64,
        chance: RandomChance,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Words whose text starts with `prefix` (case-sensitive), ordered
    /// lexicographically ascending, capped at `limit`.
    ///
    /// The returned order is part of the contract: moderation carries it
    /// through a later filter step unchanged.
    fn find_words_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<WordMatch>, RepositoryError>> + Send;

    /// Pairs in `chat_id` where either side is one of `word_ids`
    /// (a single OR-membership query against both columns).
    fn find_pairs(
        &self,
        chat_id: i64,
        word_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<Vec<Pair>, RepositoryError>> + Send;

    /// Ids of every pair in `chat_id`.
    fn pair_ids_for_chat(
        &self,
        chat_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<i64>, RepositoryError>> + Send;

    /// Delete the given pairs.
    fn delete_pairs(
        &self,
        pair_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every reply whose parent pair is in `pair_ids`.
    fn delete_replies_for_pairs(
        &self,
        pair_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a chat row.
    fn delete_chat(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Number of pairs learned in `chat_id`.
    fn count_pairs(
        &self,
        chat_id: i64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
