//! Bounded working-memory view over a [`MemoryStore`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::memory::core::config::{RetentionPolicy, WindowConfig};
use crate::memory::core::errors::MemoryResult;
use crate::memory::core::ids::ConversationId;
use crate::memory::core::message::ChatMessage;
use crate::memory::core::turn::ConversationTurn;
use crate::memory::store::MemoryStore;

/// Exposes the most recent turns of a conversation and records new ones.
///
/// Stateless apart from the per-conversation locks; every call goes to the
/// store.
pub struct MemoryProvider {
    store: Arc<dyn MemoryStore>,
    window: WindowConfig,
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl MemoryProvider {
    /// Create a provider over a store.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, window: WindowConfig) -> Self {
        Self {
            store,
            window,
            locks: DashMap::new(),
        }
    }

    /// Configured window size.
    #[must_use]
    pub const fn max_messages(&self) -> usize {
        self.window.max_messages
    }

    /// Configured retention policy.
    #[must_use]
    pub const fn retention(&self) -> RetentionPolicy {
        self.window.retention
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Load at most `max_messages` of the newest turns, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn get_window(
        &self,
        id: ConversationId,
        max_messages: usize,
    ) -> MemoryResult<Vec<ConversationTurn>> {
        let turns = self.store.load(id).await?;
        Ok(latest_window(turns, max_messages))
    }

    /// [`get_window`](Self::get_window) with the configured bound.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn current_window(&self, id: ConversationId) -> MemoryResult<Vec<ConversationTurn>> {
        self.get_window(id, self.window.max_messages).await
    }

    /// Full stored history of a conversation.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn history(&self, id: ConversationId) -> MemoryResult<Vec<ConversationTurn>> {
        self.store.load(id).await
    }

    /// Persist one encoded message as a new turn.
    ///
    /// Under [`RetentionPolicy::TrimOnWrite`] the stored log is compacted to
    /// the window afterwards.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn record_turn(&self, id: ConversationId, payload: String) -> MemoryResult<()> {
        self.store.append(id, vec![payload]).await?;

        if self.window.retention == RetentionPolicy::TrimOnWrite {
            let removed = self
                .store
                .retain_latest(id, self.window.max_messages)
                .await?;
            if removed > 0 {
                debug!(conversation = %id, removed, "trimmed stored turns to window");
            }
        }

        Ok(())
    }

    /// Encode and persist a message.
    ///
    /// # Errors
    /// Returns an error if encoding or the store fails.
    pub async fn record_message(&self, id: ConversationId, message: &ChatMessage) -> MemoryResult<()> {
        self.record_turn(id, message.to_json()?).await
    }

    /// Delete a conversation.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn forget(&self, id: ConversationId) -> MemoryResult<()> {
        self.store.delete(id).await
    }

    /// Acquire the serialization lock of a conversation.
    ///
    /// Holders of the guard are the only writers for `id` among callers that
    /// go through this provider. Other conversations are not affected. The
    /// lock entry is released with the last guard or waiter.
    pub async fn lock(&self, id: ConversationId) -> ConversationGuard<'_> {
        let mutex = self.locks.entry(id).or_default().value().clone();
        let guard = mutex.lock_owned().await;
        ConversationGuard {
            locks: &self.locks,
            id,
            guard: Some(guard),
        }
    }

    /// Number of tracked conversation locks.
    #[must_use]
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one conversation, held until dropped.
pub struct ConversationGuard<'a> {
    locks: &'a DashMap<ConversationId, Arc<Mutex<()>>>,
    id: ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ConversationGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still references an idle mutex.
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Keep the newest `max_messages` turns, preserving order.
#[must_use]
pub fn latest_window(mut turns: Vec<ConversationTurn>, max_messages: usize) -> Vec<ConversationTurn> {
    if turns.len() > max_messages {
        let start = turns.len() - max_messages;
        return turns.split_off(start);
    }
    turns
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::store::{InMemoryStore, SqliteMemoryStore};

    fn provider(max_messages: usize, retention: RetentionPolicy) -> MemoryProvider {
        MemoryProvider::new(
            Arc::new(InMemoryStore::new()),
            WindowConfig {
                max_messages,
                retention,
            },
        )
    }

    fn texts(turns: &[ConversationTurn]) -> Vec<String> {
        turns
            .iter()
            .filter_map(|t| t.message().ok())
            .map(|m| m.text().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_window_returns_all_when_under_bound() {
        let provider = provider(100, RetentionPolicy::TrimOnRead);
        let id = ConversationId::new(42);
        for text in ["A", "B", "C"] {
            assert!(provider.record_message(id, &ChatMessage::user(text)).await.is_ok());
        }

        let window = provider.get_window(id, 100).await.unwrap_or_default();
        assert_eq!(texts(&window), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_window_keeps_latest_in_order() {
        let provider = provider(100, RetentionPolicy::TrimOnRead);
        let id = ConversationId::new(7);
        for i in 1..=150 {
            let msg = ChatMessage::user(i.to_string());
            assert!(provider.record_message(id, &msg).await.is_ok());
        }

        let window = provider.get_window(id, 100).await.unwrap_or_default();
        let expected: Vec<String> = (51..=150).map(|i: i32| i.to_string()).collect();
        assert_eq!(texts(&window), expected);

        // Reading does not mutate and is repeatable.
        let again = provider.get_window(id, 100).await.unwrap_or_default();
        assert_eq!(window, again);
        assert_eq!(provider.store().count(id).await.unwrap_or(0), 150);
    }

    #[tokio::test]
    async fn test_zero_window_is_empty() {
        let provider = provider(100, RetentionPolicy::TrimOnRead);
        let id = ConversationId::new(1);
        assert!(provider.record_message(id, &ChatMessage::user("x")).await.is_ok());
        assert!(provider.get_window(id, 0).await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_trim_on_write_bounds_storage() {
        let provider = provider(3, RetentionPolicy::TrimOnWrite);
        let id = ConversationId::new(9);
        for i in 1..=5 {
            let msg = ChatMessage::ai(i.to_string());
            assert!(provider.record_message(id, &msg).await.is_ok());
        }

        assert_eq!(provider.store().count(id).await.unwrap_or(0), 3);
        let history = provider.history(id).await.unwrap_or_default();
        assert_eq!(texts(&history), vec!["3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_forget_clears_conversation() {
        let provider = provider(10, RetentionPolicy::TrimOnRead);
        let id = ConversationId::new(42);
        assert!(provider.record_message(id, &ChatMessage::user("hi")).await.is_ok());

        let guard = provider.lock(id).await;
        assert!(provider.forget(id).await.is_ok());
        drop(guard);

        assert!(provider.current_window(id).await.unwrap_or_default().is_empty());
        assert_eq!(provider.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_released_locks_are_not_retained() {
        let provider = provider(10, RetentionPolicy::TrimOnRead);
        for raw in 0..500 {
            drop(provider.lock(ConversationId::new(raw)).await);
        }
        assert_eq!(provider.tracked_locks(), 0);

        let guard = provider.lock(ConversationId::new(1)).await;
        assert_eq!(provider.tracked_locks(), 1);
        drop(guard);
        assert_eq!(provider.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_lock_entry() {
        let provider = Arc::new(provider(10, RetentionPolicy::TrimOnRead));
        let id = ConversationId::new(3);

        let guard = provider.lock(id).await;
        let waiter = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                let _held = provider.lock(id).await;
                provider.tracked_locks()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        // The waiter still found the shared entry while it held the lock.
        assert_eq!(waiter.await.unwrap_or(0), 1);
        assert_eq!(provider.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_lock_serializes_same_conversation() {
        let provider = provider(10, RetentionPolicy::TrimOnRead);
        let id = ConversationId::new(5);

        let guard = provider.lock(id).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), provider.lock(id)).await;
        assert!(blocked.is_err());

        let other = tokio::time::timeout(
            Duration::from_millis(50),
            provider.lock(ConversationId::new(6)),
        )
        .await;
        assert!(other.is_ok());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(50), provider.lock(id)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_window_keeps_latest_in_order() -> MemoryResult<()> {
        let provider = MemoryProvider::new(
            Arc::new(SqliteMemoryStore::in_memory().await?),
            WindowConfig::default(),
        );
        let id = ConversationId::new(7);
        // Appends land within the same millisecond, so order rests on the row id.
        for i in 1..=150 {
            provider
                .record_message(id, &ChatMessage::user(i.to_string()))
                .await?;
        }

        let window = provider.get_window(id, 100).await?;
        let expected: Vec<String> = (51..=150).map(|i: i32| i.to_string()).collect();
        assert_eq!(texts(&window), expected);
        assert_eq!(provider.store().count(id).await?, 150);
        Ok(())
    }

    #[test]
    fn test_latest_window_helper() {
        let turns: Vec<ConversationTurn> = (0..5)
            .map(|i| ConversationTurn {
                id: i,
                conversation_id: ConversationId::new(1),
                created_at: chrono::Utc::now(),
                content: i.to_string(),
            })
            .collect();

        let window = latest_window(turns.clone(), 2);
        assert_eq!(window.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(latest_window(turns.clone(), 5), turns);
        assert_eq!(latest_window(turns.clone(), 50), turns);
    }
}
