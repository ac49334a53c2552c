//! Administrator search and prune over the association graph.
//!
//! Words are global but pairs are chat-scoped: a word that matches the
//! admin's prefix may be entirely unused in the chat being moderated, so
//! search runs a two-phase filter -- prefix candidates first, then a
//! single pair query that prunes candidates with no pair in this chat.
//! Deletion removes a target word's pairs and their replies, children
//! before parents, and never touches word rows or other chats.

use std::collections::HashSet;
use std::sync::Arc;

use pairlore_types::chat::Chat;
use pairlore_types::error::{PlatformError, RepositoryError};
use pairlore_types::word::WordMatch;

use crate::platform::ChatPlatform;
use crate::store::AssociationStore;

/// A moderation request, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationRequest {
    /// One argument: list words starting with `prefix` that are linked in
    /// this chat.
    Search { prefix: String },
    /// Two arguments: remove every pair in this chat referencing the
    /// target word.
    Delete { prefix: String, target_word_id: i64 },
}

impl ModerationRequest {
    /// Parse the raw argument list. `None` means the shape is malformed
    /// (wrong arity or a non-numeric target id) and the caller should
    /// report usage.
    pub fn parse(args: &[String]) -> Option<Self> {
        match args {
            [prefix] => Some(Self::Search {
                prefix: prefix.clone(),
            }),
            [prefix, raw_id] => raw_id.parse().ok().map(|target_word_id| Self::Delete {
                prefix: prefix.clone(),
                target_word_id,
            }),
            _ => None,
        }
    }
}

/// Result of a moderation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Surviving search candidates, in lexicographic order.
    Found(Vec<WordMatch>),
    /// No word matched, or none of the matches is linked in this chat.
    NotFound,
    /// Deletion ran; no user-visible confirmation beyond success.
    Deleted { pairs_removed: usize },
    /// The requester does not administer this chat.
    Denied,
    /// Malformed argument shape.
    UsageError,
}

/// Failures from the collaborators behind a moderation request. The
/// router reports these as a generic failure; they are never shown as a
/// moderation outcome.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("store failure: {0}")]
    Store(#[from] RepositoryError),

    #[error("platform failure: {0}")]
    Platform(#[from] PlatformError),
}

/// Render surviving candidates, one `- <text> : <id>` line per word.
pub fn format_matches(words: &[WordMatch]) -> String {
    let lines: Vec<String> = words
        .iter()
        .map(|word| format!("- {} : {}", word.text, word.id))
        .collect();
    lines.join("\n")
}

/// Resolves administrator search/delete requests against the store.
pub struct ModerationEngine<S, P> {
    store: Arc<S>,
    platform: Arc<P>,
    search_limit: u32,
}

impl<S: AssociationStore, P: ChatPlatform> ModerationEngine<S, P> {
    pub fn new(store: Arc<S>, platform: Arc<P>, search_limit: u32) -> Self {
        Self {
            store,
            platform,
            search_limit,
        }
    }

    /// Handle a moderation request for `chat` from `requester_id`.
    ///
    /// Authorization runs first: non-admins are denied before any data is
    /// read or modified. Search is read-only; deletion mutates only this
    /// chat's pairs and replies.
    pub async fn moderate(
        &self,
        chat: &Chat,
        requester_id: i64,
        args: &[String],
    ) -> Result<ModerationOutcome, ModerationError> {
        if !self
            .platform
            .is_administrator(chat.external_id, requester_id)
            .await?
        {
            return Ok(ModerationOutcome::Denied);
        }

        let Some(request) = ModerationRequest::parse(args) else {
            return Ok(ModerationOutcome::UsageError);
        };

        match request {
            ModerationRequest::Search { prefix } => Ok(self.search(chat, &prefix).await?),
            ModerationRequest::Delete {
                target_word_id, ..
            } => Ok(self.delete(chat, target_word_id).await?),
        }
    }

    /// Two-phase filter: prefix candidates, then prune the ones with no
    /// pair in this chat, preserving the lexicographic candidate order.
    async fn search(
        &self,
        chat: &Chat,
        prefix: &str,
    ) -> Result<ModerationOutcome, RepositoryError> {
        let candidates = self
            .store
            .find_words_by_prefix(prefix, self.search_limit)
            .await?;
        if candidates.is_empty() {
            return Ok(ModerationOutcome::NotFound);
        }

        let candidate_ids: Vec<i64> = candidates.iter().map(|word| word.id).collect();
        let pairs = self.store.find_pairs(chat.id, &candidate_ids).await?;

        let mut keep = HashSet::new();
        for pair in &pairs {
            keep.insert(pair.first_word_id);
            keep.insert(pair.second_word_id);
        }

        let surviving: Vec<WordMatch> = candidates
            .into_iter()
            .filter(|word| keep.contains(&word.id))
            .collect();

        if surviving.is_empty() {
            Ok(ModerationOutcome::NotFound)
        } else {
            Ok(ModerationOutcome::Found(surviving))
        }
    }

    /// Remove every pair in this chat referencing the target word, and the
    /// replies of those pairs first. Word rows are never touched.
    async fn delete(
        &self,
        chat: &Chat,
        target_word_id: i64,
    ) -> Result<ModerationOutcome, RepositoryError> {
        let pairs = self.store.find_pairs(chat.id, &[target_word_id]).await?;
        let pair_ids: Vec<i64> = pairs.iter().map(|pair| pair.id).collect();

        if !pair_ids.is_empty() {
            self.store.delete_replies_for_pairs(&pair_ids).await?;
            self.store.delete_pairs(&pair_ids).await?;
        }

        tracing::info!(
            chat_id = chat.id,
            target_word_id,
            pairs_removed = pair_ids.len(),
            "moderation removed pairs"
        );
        Ok(ModerationOutcome::Deleted {
            pairs_removed: pair_ids.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingPlatform};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn engine(
        store: &Arc<MemoryStore>,
        platform: &Arc<RecordingPlatform>,
    ) -> ModerationEngine<MemoryStore, RecordingPlatform> {
        ModerationEngine::new(Arc::clone(store), Arc::clone(platform), 10)
    }

    #[test]
    fn parse_request_shapes() {
        assert_eq!(
            ModerationRequest::parse(&args(&["ca"])),
            Some(ModerationRequest::Search {
                prefix: "ca".into()
            })
        );
        assert_eq!(
            ModerationRequest::parse(&args(&["ca", "12"])),
            Some(ModerationRequest::Delete {
                prefix: "ca".into(),
                target_word_id: 12
            })
        );
        assert_eq!(ModerationRequest::parse(&args(&[])), None);
        assert_eq!(ModerationRequest::parse(&args(&["a", "b", "c"])), None);
        assert_eq!(ModerationRequest::parse(&args(&["ca", "twelve"])), None);
    }

    #[test]
    fn format_matches_one_line_per_word() {
        let words = vec![
            WordMatch {
                id: 3,
                text: "car".into(),
            },
            WordMatch {
                id: 7,
                text: "cat".into(),
            },
        ];
        assert_eq!(format_matches(&words), "- car : 3\n- cat : 7");
    }

    #[tokio::test]
    async fn non_admin_is_denied_without_touching_data() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(false));
        let chat = store.seed_chat(100);
        let word = store.seed_word("cat");
        let pair = store.seed_pair(chat.id, word, word);
        store.seed_reply(pair, "meow");

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["cat", &word.to_string()]))
            .await
            .unwrap();

        assert_eq!(outcome, ModerationOutcome::Denied);
        assert_eq!(store.pair_count_in(chat.id), 1);
        assert_eq!(store.reply_count(), 1);
    }

    #[tokio::test]
    async fn malformed_arguments_are_usage_errors() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let engine = engine(&store, &platform);

        for bad in [args(&[]), args(&["a", "b", "c"]), args(&["ca", "NaN"])] {
            let outcome = engine.moderate(&chat, 1, &bad).await.unwrap();
            assert_eq!(outcome, ModerationOutcome::UsageError, "args: {bad:?}");
        }
    }

    #[tokio::test]
    async fn search_orders_lexicographically_and_caps() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let anchor = store.seed_word("zz-anchor");
        for text in ["cat", "car", "care", "dog"] {
            let id = store.seed_word(text);
            store.seed_pair(chat.id, id, anchor);
        }

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await
            .unwrap();

        let ModerationOutcome::Found(words) = outcome else {
            panic!("expected Found, got {outcome:?}");
        };
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["car", "care", "cat"]);
    }

    #[tokio::test]
    async fn search_never_returns_more_than_the_limit() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let anchor = store.seed_word("zz-anchor");
        for n in 0..15 {
            let id = store.seed_word(&format!("ca{n:02}"));
            store.seed_pair(chat.id, id, anchor);
        }

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await
            .unwrap();

        let ModerationOutcome::Found(words) = outcome else {
            panic!("expected Found, got {outcome:?}");
        };
        assert_eq!(words.len(), 10);
    }

    #[tokio::test]
    async fn search_prunes_words_unused_in_this_chat() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let other = store.seed_chat(200);
        let anchor = store.seed_word("zz-anchor");

        let cat = store.seed_word("cat");
        store.seed_pair(chat.id, cat, anchor);

        // Globally present, but never paired in `chat`.
        store.seed_word("cab");
        let cap = store.seed_word("cap");
        store.seed_pair(other.id, cap, anchor);

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await
            .unwrap();

        let ModerationOutcome::Found(words) = outcome else {
            panic!("expected Found, got {outcome:?}");
        };
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["cat"]);
    }

    #[tokio::test]
    async fn search_with_no_global_match_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        store.seed_word("dog");

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await
            .unwrap();
        assert_eq!(outcome, ModerationOutcome::NotFound);
    }

    #[tokio::test]
    async fn search_with_empty_keep_set_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        store.seed_word("cat");

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await
            .unwrap();
        assert_eq!(outcome, ModerationOutcome::NotFound);
    }

    #[tokio::test]
    async fn deletion_cascades_replies_before_pairs() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let target = store.seed_word("cat");
        let dog = store.seed_word("dog");
        let sun = store.seed_word("sun");

        let doomed = store.seed_pair(chat.id, target, dog);
        store.seed_reply(doomed, "meow");
        store.seed_reply(doomed, "purr");
        let kept = store.seed_pair(chat.id, dog, sun);
        store.seed_reply(kept, "woof");

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["cat", &target.to_string()]))
            .await
            .unwrap();

        assert_eq!(outcome, ModerationOutcome::Deleted { pairs_removed: 1 });
        assert_eq!(store.pair_count_in(chat.id), 1);
        assert_eq!(store.reply_count(), 1);
        // Word rows are global and survive.
        assert!(store.word_texts().contains(&"cat".to_string()));
    }

    #[tokio::test]
    async fn deletion_stays_inside_the_requesting_chat() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let other = store.seed_chat(200);
        let shared = store.seed_word("cat");
        let dog = store.seed_word("dog");

        store.seed_pair(chat.id, shared, dog);
        let foreign = store.seed_pair(other.id, shared, dog);
        store.seed_reply(foreign, "kept");

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["cat", &shared.to_string()]))
            .await
            .unwrap();

        assert_eq!(outcome, ModerationOutcome::Deleted { pairs_removed: 1 });
        assert_eq!(store.pair_count_in(other.id), 1);
        assert_eq!(store.reply_count(), 1);
    }

    #[tokio::test]
    async fn deletion_matches_either_side_of_a_pair() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        let chat = store.seed_chat(100);
        let target = store.seed_word("cat");
        let dog = store.seed_word("dog");

        store.seed_pair(chat.id, target, dog);
        store.seed_pair(chat.id, dog, target);

        let outcome = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["cat", &target.to_string()]))
            .await
            .unwrap();
        assert_eq!(outcome, ModerationOutcome::Deleted { pairs_removed: 2 });
        assert_eq!(store.pair_count_in(chat.id), 0);
    }

    #[tokio::test]
    async fn platform_failure_surfaces_as_error() {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(RecordingPlatform::new(true));
        platform
            .fail_admin_check
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let chat = store.seed_chat(100);

        let result = engine(&store, &platform)
            .moderate(&chat, 1, &args(&["ca"]))
            .await;
        assert!(matches!(result, Err(ModerationError::Platform(_))));
    }
}
