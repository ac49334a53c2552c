//! In-memory test doubles for the store and platform ports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::Semaphore;

use pairlore_types::chat::{Chat, RandomChance};
use pairlore_types::error::{PlatformError, RepositoryError};
use pairlore_types::word::{Pair, Reply, WordMatch};

use crate::platform::ChatPlatform;
use crate::store::AssociationStore;

#[derive(Default)]
struct StoreData {
    next_id: i64,
    chats: Vec<Chat>,
    words: Vec<(i64, String)>,
    pairs: Vec<Pair>,
    replies: Vec<Reply>,
}

impl StoreData {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory `AssociationStore` with seeding and inspection helpers.
pub(crate) struct MemoryStore {
    data: Mutex<StoreData>,
    pub delete_chat_calls: AtomicUsize,
    gate_find_chat: AtomicBool,
    find_chat_permits: Semaphore,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(StoreData::default()),
            delete_chat_calls: AtomicUsize::new(0),
            gate_find_chat: AtomicBool::new(false),
            find_chat_permits: Semaphore::new(0),
        }
    }

    pub fn seed_chat(&self, external_id: i64) -> Chat {
        let mut data = self.data.lock().unwrap();
        let now = Utc::now();
        let chat = Chat {
            id: data.allocate_id(),
            external_id,
            random_chance: RandomChance::default(),
            created_at: now,
            updated_at: now,
        };
        data.chats.push(chat.clone());
        chat
    }

    pub fn seed_word(&self, text: &str) -> i64 {
        let mut data = self.data.lock().unwrap();
        let id = data.allocate_id();
        data.words.push((id, text.to_string()));
        id
    }

    pub fn seed_pair(&self, chat_id: i64, first_word_id: i64, second_word_id: i64) -> i64 {
        let mut data = self.data.lock().unwrap();
        let id = data.allocate_id();
        data.pairs.push(Pair {
            id,
            chat_id,
            first_word_id,
            second_word_id,
            created_at: Utc::now(),
        });
        id
    }

    pub fn seed_reply(&self, pair_id: i64, text: &str) {
        let mut data = self.data.lock().unwrap();
        let id = data.allocate_id();
        data.replies.push(Reply {
            id,
            pair_id,
            text: text.to_string(),
        });
    }

    pub fn chat_exists(&self, chat_id: i64) -> bool {
        self.data
            .lock()
            .unwrap()
            .chats
            .iter()
            .any(|chat| chat.id == chat_id)
    }

    pub fn chat_chance(&self, chat_id: i64) -> Option<i64> {
        self.data
            .lock()
            .unwrap()
            .chats
            .iter()
            .find(|chat| chat.id == chat_id)
            .map(|chat| chat.random_chance.value())
    }

    pub fn pair_count_in(&self, chat_id: i64) -> usize {
        self.data
            .lock()
            .unwrap()
            .pairs
            .iter()
            .filter(|pair| pair.chat_id == chat_id)
            .count()
    }

    pub fn reply_count(&self) -> usize {
        self.data.lock().unwrap().replies.len()
    }

    pub fn word_texts(&self) -> Vec<String> {
        self.data
            .lock()
            .unwrap()
            .words
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Remove a chat row without going through the store contract,
    /// simulating an out-of-band delete racing a pending timer.
    pub fn remove_chat_directly(&self, chat_id: i64) {
        self.data
            .lock()
            .unwrap()
            .chats
            .retain(|chat| chat.id != chat_id);
    }

    /// Make the next `find_chat` call park until `release_find_chat`.
    pub fn gate_find_chat(&self) {
        self.gate_find_chat.store(true, Ordering::SeqCst);
    }

    /// Unpark a gated `find_chat` and stop gating further calls.
    pub fn release_find_chat(&self) {
        self.gate_find_chat.store(false, Ordering::SeqCst);
        self.find_chat_permits.add_permits(1);
    }
}

impl AssociationStore for MemoryStore {
    async fn find_chat(&self, id: i64) -> Result<Option<Chat>, RepositoryError> {
        if self.gate_find_chat.load(Ordering::SeqCst) {
            self.find_chat_permits.acquire().await.unwrap().forget();
        }
        Ok(self
            .data
            .lock()
            .unwrap()
            .chats
            .iter()
            .find(|chat| chat.id == id)
            .cloned())
    }

    async fn find_chat_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Chat>, RepositoryError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .chats
            .iter()
            .find(|chat| chat.external_id == external_id)
            .cloned())
    }

    async fn list_chats(&self) -> Result<Vec<Chat>, RepositoryError> {
        Ok(self.data.lock().unwrap().chats.clone())
    }

    async fn create_chat(&self, external_id: i64) -> Result<Chat, RepositoryError> {
        Ok(self.seed_chat(external_id))
    }

    async fn update_chat_chance(
        &self,
        id: i64,
        chance: RandomChance,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.lock().unwrap();
        let chat = data
            .chats
            .iter_mut()
            .find(|chat| chat.id == id)
            .ok_or(RepositoryError::NotFound)?;
        chat.random_chance = chance;
        chat.updated_at = Utc::now();
        Ok(())
    }

    async fn find_words_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<WordMatch>, RepositoryError> {
        let data = self.data.lock().unwrap();
        let mut matches: Vec<WordMatch> = data
            .words
            .iter()
            .filter(|(_, text)| text.starts_with(prefix))
            .map(|(id, text)| WordMatch {
                id: *id,
                text: text.clone(),
            })
            .collect();
        matches.sort_by(|a, b| a.text.cmp(&b.text));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn find_pairs(
        &self,
        chat_id: i64,
        word_ids: &[i64],
    ) -> Result<Vec<Pair>, RepositoryError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .pairs
            .iter()
            .filter(|pair| {
                pair.chat_id == chat_id
                    && (word_ids.contains(&pair.first_word_id)
                        || word_ids.contains(&pair.second_word_id))
            })
            .cloned()
            .collect())
    }

    async fn pair_ids_for_chat(&self, chat_id: i64) -> Result<Vec<i64>, RepositoryError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .pairs
            .iter()
            .filter(|pair| pair.chat_id == chat_id)
            .map(|pair| pair.id)
            .collect())
    }

    async fn delete_pairs(&self, pair_ids: &[i64]) -> Result<(), RepositoryError> {
        let mut data = self.data.lock().unwrap();
        data.pairs.retain(|pair| !pair_ids.contains(&pair.id));
        Ok(())
    }

    async fn delete_replies_for_pairs(&self, pair_ids: &[i64]) -> Result<(), RepositoryError> {
        let mut data = self.data.lock().unwrap();
        data.replies.retain(|reply| !pair_ids.contains(&reply.pair_id));
        Ok(())
    }

    async fn delete_chat(&self, id: i64) -> Result<(), RepositoryError> {
        self.delete_chat_calls.fetch_add(1, Ordering::SeqCst);
        let mut data = self.data.lock().unwrap();
        data.chats.retain(|chat| chat.id != id);
        Ok(())
    }

    async fn count_pairs(&self, chat_id: i64) -> Result<u64, RepositoryError> {
        Ok(self.pair_count_in(chat_id) as u64)
    }
}

/// `ChatPlatform` double that records every reply and answers the admin
/// check from a flag.
pub(crate) struct RecordingPlatform {
    pub admin: AtomicBool,
    pub fail_admin_check: AtomicBool,
    replies: Mutex<Vec<(i64, String)>>,
}

impl RecordingPlatform {
    pub fn new(admin: bool) -> Self {
        Self {
            admin: AtomicBool::new(admin),
            fail_admin_check: AtomicBool::new(false),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(&self) -> Vec<(i64, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.replies
            .lock()
            .unwrap()
            .last()
            .map(|(_, text)| text.clone())
    }
}

impl ChatPlatform for RecordingPlatform {
    async fn is_administrator(
        &self,
        _chat_external_id: i64,
        _user_id: i64,
    ) -> Result<bool, PlatformError> {
        if self.fail_admin_check.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("administrator lookup failed".into()));
        }
        Ok(self.admin.load(Ordering::SeqCst))
    }

    async fn send_reply(&self, chat: &Chat, text: &str) -> Result<(), PlatformError> {
        self.replies
            .lock()
            .unwrap()
            .push((chat.id, text.to_string()));
        Ok(())
    }
}
