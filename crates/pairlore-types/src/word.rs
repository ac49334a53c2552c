//! Word, pair, and reply types.
//!
//! Words are global: a single `Word` row may participate in pairs across
//! many chats. Pairs are chat-scoped ordered associations between two
//! words; replies are payloads attached to a pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A globally unique text token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    /// Case-sensitive token text.
    pub text: String,
}

/// A chat-scoped, ordered association between two words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: i64,
    pub chat_id: i64,
    pub first_word_id: i64,
    pub second_word_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Pair {
    /// Whether either side of the pair references `word_id`.
    pub fn references(&self, word_id: i64) -> bool {
        self.first_word_id == word_id || self.second_word_id == word_id
    }
}

/// A stored response payload attached to a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub pair_id: i64,
    pub text: String,
}

/// A prefix-search hit.
///
/// Carried in a `Vec` (not a map) because the lexicographic result order
/// from the store is part of the moderation contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMatch {
    pub id: i64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_references_either_side() {
        let pair = Pair {
            id: 1,
            chat_id: 7,
            first_word_id: 10,
            second_word_id: 20,
            created_at: Utc::now(),
        };
        assert!(pair.references(10));
        assert!(pair.references(20));
        assert!(!pair.references(30));
    }

    #[test]
    fn test_word_match_roundtrip() {
        let hit = WordMatch {
            id: 42,
            text: "care".to_string(),
        };
        let json = serde_json::to_string(&hit).unwrap();
        let parsed: WordMatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hit);
    }
}
