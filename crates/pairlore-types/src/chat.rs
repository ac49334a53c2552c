//! Tracked chat and reply-chance types.
//!
//! A `Chat` is a group conversation the bot has been observing. Each chat
//! carries its own reply chance and owns the pairs learned inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Chance (in percent) that the bot replies to a random message.
///
/// Maps to the CHECK-style contract on the `chats` table: values outside
/// 1-50 are rejected at the boundary, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RandomChance(i64);

impl RandomChance {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 50;

    /// Validate a raw value into a `RandomChance`.
    pub fn new(value: i64) -> Result<Self, String> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "chance must be in range {}-{}, got {value}",
                Self::MIN,
                Self::MAX
            ))
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl Default for RandomChance {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<i64> for RandomChance {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RandomChance> for i64 {
    fn from(chance: RandomChance) -> i64 {
        chance.0
    }
}

impl FromStr for RandomChance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("not a number: '{s}'"))?;
        Self::new(value)
    }
}

impl fmt::Display for RandomChance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked group conversation.
///
/// Created on the first observed message from a new external chat; deleted
/// by the retention scheduler's eviction callback or an explicit operator
/// purge. `external_id` is the platform-assigned identity, `id` is ours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub external_id: i64,
    pub random_chance: RandomChance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
