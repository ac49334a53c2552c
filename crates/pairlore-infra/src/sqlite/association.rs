//! SQLite association store implementation.
//!
//! Implements `AssociationStore` from `pairlore-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, writes on the writer pool.

use chrono::{DateTime, Utc};
use sqlx::Row;

use pairlore_core::store::AssociationStore;
use pairlore_types::chat::{Chat, RandomChance};
use pairlore_types::error::RepositoryError;
use pairlore_types::word::{Pair, WordMatch};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `AssociationStore`.
pub struct SqliteAssociationStore {
    pool: DatabasePool,
}

impl SqliteAssociationStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Chat.
struct ChatRow {
    id: i64,
    external_id: i64,
    random_chance: i64,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            random_chance: row.try_get("random_chance")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        let random_chance = RandomChance::new(self.random_chance)
            .map_err(|e| RepositoryError::Query(format!("invalid random_chance: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(Chat {
            id: self.id,
            external_id: self.external_id,
            random_chance,
            created_at,
            updated_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Pair.
struct PairRow {
    id: i64,
    chat_id: i64,
    first_word_id: i64,
    second_word_id: i64,
    created_at: String,
}

impl PairRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            first_word_id: row.try_get("first_word_id")?,
            second_word_id: row.try_get("second_word_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_pair(self) -> Result<Pair, RepositoryError> {
        Ok(Pair {
            id: self.id,
            chat_id: self.chat_id,
            first_word_id: self.first_word_id,
            second_word_id: self.second_word_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// `?,?,...` list for a dynamic IN clause.
fn placeholders(count: usize) -> String {
    let mut marks = String::with_capacity(count * 2);
    for i in 0..count {
        if i > 0 {
            marks.push(',');
        }
        marks.push('?');
    }
    marks
}

// ---------------------------------------------------------------------------
// AssociationStore implementation
// ---------------------------------------------------------------------------

impl AssociationStore for SqliteAssociationStore {
    async fn find_chat(&self, id: i64) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn find_chat_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn list_chats(&self) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chats ORDER BY id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_row =
                ChatRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            chats.push(chat_row.into_chat()?);
        }

        Ok(chats)
    }

    async fn create_chat(&self, external_id: i64) -> Result<Chat, RepositoryError> {
        let now = Utc::now();
        let random_chance = RandomChance::default();

        let result = sqlx::query(
            "INSERT INTO chats (external_id, random_chance, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(external_id)
        .bind(random_chance.value())
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Chat {
            id: result.last_insert_rowid(),
            external_id,
            random_chance,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_chat_chance(
        &self,
        id: i64,
        chance: RandomChance,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET random_chance = ?, updated_at = ? WHERE id = ?")
            .bind(chance.value())
            .bind(format_datetime(&Utc::now()))
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find_words_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<WordMatch>, RepositoryError> {
        // substr comparison instead of LIKE: binary collation keeps the
        // prefix match case-sensitive and needs no wildcard escaping.
        let rows = sqlx::query(
            "SELECT id, text FROM words WHERE substr(text, 1, length(?)) = ? ORDER BY text ASC LIMIT ?",
        )
        .bind(prefix)
        .bind(prefix)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            matches.push(WordMatch {
                id: row
                    .try_get("id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
                text: row
                    .try_get("text")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
            });
        }

        Ok(matches)
    }

    async fn find_pairs(
        &self,
        chat_id: i64,
        word_ids: &[i64],
    ) -> Result<Vec<Pair>, RepositoryError> {
        if word_ids.is_empty() {
            return Ok(Vec::new());
        }

        let marks = placeholders(word_ids.len());
        let sql = format!(
            "SELECT * FROM pairs WHERE chat_id = ? AND (first_word_id IN ({marks}) OR second_word_id IN ({marks}))",
        );

        let mut query = sqlx::query(&sql).bind(chat_id);
        for id in word_ids {
            query = query.bind(id);
        }
        for id in word_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let pair_row =
                PairRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            pairs.push(pair_row.into_pair()?);
        }

        Ok(pairs)
    }

    async fn pair_ids_for_chat(&self, chat_id: i64) -> Result<Vec<i64>, RepositoryError> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM pairs WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn delete_pairs(&self, pair_ids: &[i64]) -> Result<(), RepositoryError> {
        if pair_ids.is_empty() {
            return Ok(());
        }

        let marks = placeholders(pair_ids.len());
        let sql = format!("DELETE FROM pairs WHERE id IN ({marks})");

        let mut query = sqlx::query(&sql);
        for id in pair_ids {
            query = query.bind(id);
        }

        query
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_replies_for_pairs(&self, pair_ids: &[i64]) -> Result<(), RepositoryError> {
        if pair_ids.is_empty() {
            return Ok(());
        }

        let marks = placeholders(pair_ids.len());
        let sql = format!("DELETE FROM replies WHERE pair_id IN ({marks})");

        let mut query = sqlx::query(&sql);
        for id in pair_ids {
            query = query.bind(id);
        }

        query
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_chat(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn count_pairs(&self, chat_id: i64) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pairs WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
