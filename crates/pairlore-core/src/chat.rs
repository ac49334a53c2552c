//! Chat lifecycle service.
//!
//! Thin orchestration over the store: resolves the chat row for an
//! inbound message (creating it on first contact) and applies the
//! chat-level settings commands.

use std::sync::Arc;

use pairlore_types::chat::{Chat, RandomChance};
use pairlore_types::error::RepositoryError;
use tracing::info;

use crate::store::AssociationStore;

/// Orchestrates chat row lifecycle and settings.
pub struct ChatService<S> {
    store: Arc<S>,
}

impl<S: AssociationStore> ChatService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve the chat for a platform id, creating it on first contact.
    pub async fn get_or_create(&self, external_id: i64) -> Result<Chat, RepositoryError> {
        if let Some(chat) = self.store.find_chat_by_external_id(external_id).await? {
            return Ok(chat);
        }
        let chat = self.store.create_chat(external_id).await?;
        info!(chat_id = chat.id, external_id, "tracking new chat");
        Ok(chat)
    }

    /// Update the chance that the bot replies to a random message.
    pub async fn set_random_chance(
        &self,
        chat: &Chat,
        chance: RandomChance,
    ) -> Result<(), RepositoryError> {
        self.store.update_chat_chance(chat.id, chance).await?;
        info!(chat_id = chat.id, chance = chance.value(), "chance updated");
        Ok(())
    }

    /// Number of pairs learned in this chat.
    pub async fn pair_count(&self, chat: &Chat) -> Result<u64, RepositoryError> {
        self.store.count_pairs(chat.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn get_or_create_reuses_existing_chat() {
        let store = Arc::new(MemoryStore::new());
        let service = ChatService::new(Arc::clone(&store));

        let first = service.get_or_create(-1001).await.unwrap();
        let second = service.get_or_create(-1001).await.unwrap();
        assert_eq!(first.id, second.id);

        let third = service.get_or_create(-1002).await.unwrap();
        assert_ne!(first.id, third.id);
    }

    #[tokio::test]
    async fn new_chat_gets_default_chance() {
        let store = Arc::new(MemoryStore::new());
        let service = ChatService::new(Arc::clone(&store));

        let chat = service.get_or_create(-1001).await.unwrap();
        assert_eq!(chat.random_chance, RandomChance::default());
    }

    #[tokio::test]
    async fn set_random_chance_persists() {
        let store = Arc::new(MemoryStore::new());
        let service = ChatService::new(Arc::clone(&store));

        let chat = service.get_or_create(-1001).await.unwrap();
        service
            .set_random_chance(&chat, RandomChance::new(30).unwrap())
            .await
            .unwrap();
        assert_eq!(store.chat_chance(chat.id), Some(30));
    }
}
