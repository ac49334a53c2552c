//! Retention scheduler: one-shot eviction timers, one per chat.
//!
//! Owns the chat-id -> pending-task registry and the cancellation
//! lifecycle of every timer. Guarantees at most one live task per chat:
//! scheduling atomically replaces any pending task, cancelling is
//! idempotent, and the eviction callback re-validates everything it
//! touches because a concurrent schedule/cancel may have raced it.
//!
//! The registry is in-memory only. Pending tasks do not survive a
//! restart; process startup re-arms one task per persisted chat.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use pairlore_types::error::RepositoryError;

use crate::store::AssociationStore;

/// Errors that can occur while arming the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// `start` was called outside a tokio runtime, so timers cannot fire.
    #[error("no timer runtime available")]
    NoRuntime,
}

/// A pending eviction, keyed by chat id in the registry.
struct RetentionTask {
    /// Identity of this task instance. The eviction callback only removes
    /// the registry entry if it still carries this id, so a newer task
    /// installed by a concurrent `schedule` is never clobbered.
    instance: Uuid,
    interval: Duration,
    token: CancellationToken,
}

/// Schedules the destructive eviction of idle chats.
///
/// `schedule` and `cancel` are safe to call concurrently for different
/// chats; for the same chat, the registry entry is accessed under the
/// map's per-key lock, so replace/cancel/fire are linearizable per chat.
pub struct RetentionScheduler<S> {
    store: Arc<S>,
    default_interval: Duration,
    tasks: Arc<DashMap<i64, RetentionTask>>,
    runtime: OnceLock<Handle>,
}

impl<S: AssociationStore + 'static> RetentionScheduler<S> {
    /// Create a scheduler (not yet started) with the process-wide default
    /// interval.
    pub fn new(store: Arc<S>, default_interval: Duration) -> Self {
        Self {
            store,
            default_interval,
            tasks: Arc::new(DashMap::new()),
            runtime: OnceLock::new(),
        }
    }

    /// Arm the scheduler on the current tokio runtime. Must be called
    /// before any `schedule`/`cancel`; those degrade to logged no-ops
    /// until then.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let _ = self.runtime.set(handle);
        tracing::info!(interval = ?self.default_interval, "retention scheduler started");
        Ok(())
    }

    /// Queue `chat_id` for eviction after `interval` (the default when
    /// `None`). Replaces any pending task for the chat.
    pub fn schedule(&self, chat_id: i64, interval: Option<Duration>) {
        let Some(runtime) = self.runtime.get() else {
            tracing::error!(chat_id, "retention scheduler is not started, dropping schedule");
            return;
        };
        let interval = interval.unwrap_or(self.default_interval);
        let instance = Uuid::new_v4();
        let token = CancellationToken::new();

        // Install the registry entry before spawning the timer: if a
        // concurrent schedule for the same chat displaces it in between,
        // our token is already cancelled by the time the timer polls.
        let displaced = self.tasks.insert(
            chat_id,
            RetentionTask {
                instance,
                interval,
                token: token.clone(),
            },
        );
        if let Some(previous) = displaced {
            previous.token.cancel();
            tracing::debug!(chat_id, "replaced pending eviction task");
        }

        let store = Arc::clone(&self.store);
        let tasks = Arc::clone(&self.tasks);
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(interval) => {
                    run_eviction(store, tasks, chat_id, instance).await;
                }
            }
        });

        tracing::info!(chat_id, ?interval, "chat added to eviction queue");
    }

    /// Cancel the pending eviction for `chat_id`, if any. Cancelling a
    /// chat with no task is a silent no-op; cancellation of a timer that
    /// has already begun firing is best-effort (the callback defends
    /// itself).
    pub fn cancel(&self, chat_id: i64) {
        if self.runtime.get().is_none() {
            tracing::error!(chat_id, "retention scheduler is not started, dropping cancel");
            return;
        }
        if let Some((_, task)) = self.tasks.remove(&chat_id) {
            task.token.cancel();
            tracing::info!(chat_id, "chat removed from eviction queue");
        }
    }

    /// Cancel any pending task and evict the chat immediately (operator
    /// purge path). Returns whether a chat row existed.
    pub async fn evict_now(&self, chat_id: i64) -> Result<bool, RepositoryError> {
        if let Some((_, task)) = self.tasks.remove(&chat_id) {
            task.token.cancel();
        }
        evict_chat(self.store.as_ref(), chat_id).await
    }

    /// Cancel every pending task and clear the registry (shutdown path).
    pub fn stop(&self) {
        for entry in self.tasks.iter() {
            entry.value().token.cancel();
        }
        self.tasks.clear();
        tracing::info!("retention scheduler stopped");
    }

    /// Number of chats currently queued for eviction.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// The interval of the pending task for `chat_id`, if one exists.
    pub fn scheduled_interval(&self, chat_id: i64) -> Option<Duration> {
        self.tasks.get(&chat_id).map(|task| task.interval)
    }
}

/// Timer callback: evict, then drop the registry entry if it is still ours.
async fn run_eviction<S: AssociationStore>(
    store: Arc<S>,
    tasks: Arc<DashMap<i64, RetentionTask>>,
    chat_id: i64,
    instance: Uuid,
) {
    match evict_chat(store.as_ref(), chat_id).await {
        Ok(true) => tracing::info!(chat_id, "evicted chat data"),
        Ok(false) => tracing::debug!(chat_id, "chat already gone, nothing to evict"),
        Err(error) => {
            tracing::error!(chat_id, %error, "eviction failed, chat data left in place");
        }
    }
    tasks.remove_if(&chat_id, |_, task| task.instance == instance);
}

/// Delete a chat and all its chat-scoped rows, children before parents:
/// replies of the chat's pairs, then the pairs, then the chat itself.
///
/// A chat that no longer exists is a no-op (`Ok(false)`).
pub async fn evict_chat<S: AssociationStore>(
    store: &S,
    chat_id: i64,
) -> Result<bool, RepositoryError> {
    if store.find_chat(chat_id).await?.is_none() {
        return Ok(false);
    }

    let pair_ids = store.pair_ids_for_chat(chat_id).await?;
    if !pair_ids.is_empty() {
        store.delete_replies_for_pairs(&pair_ids).await?;
        store.delete_pairs(&pair_ids).await?;
    }
    store.delete_chat(chat_id).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use std::sync::atomic::Ordering;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    /// Let spawned timer tasks run to completion at the current instant.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn started_scheduler(store: &Arc<MemoryStore>, default: Duration) -> RetentionScheduler<MemoryStore> {
        let scheduler = RetentionScheduler::new(Arc::clone(store), default);
        scheduler.start().unwrap();
        scheduler
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_evicts_after_interval() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(60));

        scheduler.schedule(chat.id, None);
        assert_eq!(scheduler.pending_count(), 1);
        settle().await;

        tokio::time::advance(secs(59)).await;
        settle().await;
        assert!(store.chat_exists(chat.id), "fired too early");

        tokio::time::advance(secs(2)).await;
        settle().await;
        assert!(!store.chat_exists(chat.id));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_replaces_never_stacks() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(60));

        scheduler.schedule(chat.id, Some(secs(10)));
        scheduler.schedule(chat.id, Some(secs(5)));
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.scheduled_interval(chat.id), Some(secs(5)));
        settle().await;

        // Fires at ~5 time units with the newer interval.
        tokio::time::advance(secs(5)).await;
        settle().await;
        assert!(!store.chat_exists(chat.id));
        assert_eq!(store.delete_chat_calls.load(Ordering::SeqCst), 1);

        // The displaced 10-unit timer never fires a second eviction.
        tokio::time::advance(secs(10)).await;
        settle().await;
        assert_eq!(store.delete_chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_order_independent() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(60));

        // Cancel with no task pending: silent no-op.
        scheduler.cancel(chat.id);

        scheduler.schedule(chat.id, Some(secs(5)));
        settle().await;
        scheduler.cancel(chat.id);
        scheduler.cancel(chat.id);
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::advance(secs(10)).await;
        settle().await;
        assert!(store.chat_exists(chat.id), "cancelled timer still fired");
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_is_destructive_and_complete() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let cat = store.seed_word("cat");
        let dog = store.seed_word("dog");
        let sun = store.seed_word("sun");
        let p1 = store.seed_pair(chat.id, cat, dog);
        store.seed_pair(chat.id, dog, sun);
        store.seed_pair(chat.id, sun, cat);
        store.seed_reply(p1, "meow");
        store.seed_reply(p1, "woof");
        let scheduler = started_scheduler(&store, secs(5));

        scheduler.schedule(chat.id, None);
        settle().await;
        tokio::time::advance(secs(5)).await;
        settle().await;

        assert!(!store.chat_exists(chat.id));
        assert_eq!(store.pair_count_in(chat.id), 0);
        assert_eq!(store.reply_count(), 0);
        // Words are global and survive eviction.
        assert!(!store.word_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_of_vanished_chat_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(5));

        scheduler.schedule(chat.id, None);
        store.remove_chat_directly(chat.id);
        settle().await;

        tokio::time::advance(secs(5)).await;
        settle().await;
        assert_eq!(store.delete_chat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_does_not_clobber_newer_task() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(60));

        // Park the in-flight eviction inside its chat-existence re-check.
        scheduler.schedule(chat.id, Some(secs(1)));
        store.gate_find_chat();
        settle().await;
        tokio::time::advance(secs(1)).await;
        settle().await;

        // While the callback is mid-flight, a newer task is installed.
        scheduler.schedule(chat.id, Some(secs(30)));
        assert_eq!(scheduler.pending_count(), 1);

        store.release_find_chat();
        settle().await;

        // The lost-race eviction completed, but the registry still holds
        // the newer task instance.
        assert!(!store.chat_exists(chat.id));
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.scheduled_interval(chat.id), Some(secs(30)));

        // When the newer timer fires the chat is already gone: no-op.
        tokio::time::advance(secs(30)).await;
        settle().await;
        assert_eq!(store.delete_chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unstarted_scheduler_degrades_to_noop() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = RetentionScheduler::new(Arc::clone(&store), secs(5));

        scheduler.schedule(chat.id, None);
        scheduler.cancel(chat.id);
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::advance(secs(10)).await;
        settle().await;
        assert!(store.chat_exists(chat.id));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_everything() {
        let store = Arc::new(MemoryStore::new());
        let a = store.seed_chat(100);
        let b = store.seed_chat(200);
        let scheduler = started_scheduler(&store, secs(5));

        scheduler.schedule(a.id, None);
        scheduler.schedule(b.id, None);
        assert_eq!(scheduler.pending_count(), 2);
        settle().await;

        scheduler.stop();
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::advance(secs(10)).await;
        settle().await;
        assert!(store.chat_exists(a.id));
        assert!(store.chat_exists(b.id));
    }

    #[tokio::test(start_paused = true)]
    async fn evict_now_cancels_and_deletes() {
        let store = Arc::new(MemoryStore::new());
        let chat = store.seed_chat(100);
        let scheduler = started_scheduler(&store, secs(60));

        scheduler.schedule(chat.id, None);
        let existed = scheduler.evict_now(chat.id).await.unwrap();
        assert!(existed);
        assert!(!store.chat_exists(chat.id));
        assert_eq!(scheduler.pending_count(), 0);

        // Purging an unknown chat reports that nothing existed.
        let existed = scheduler.evict_now(chat.id).await.unwrap();
        assert!(!existed);
    }
}
