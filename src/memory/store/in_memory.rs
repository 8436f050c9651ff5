//! Process-local turn log with the same ordering rules as the `SQLite` store.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::ids::ConversationId;
use crate::memory::core::turn::ConversationTurn;
use crate::memory::store::{MemoryStore, StoreFuture};

/// In-memory memory store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    turns: DashMap<ConversationId, Vec<ConversationTurn>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with at least one turn.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.turns.len()
    }
}

impl MemoryStore for InMemoryStore {
    fn load(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<Vec<ConversationTurn>>> {
        let turns = self
            .turns
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(turns) })
    }

    fn append(&self, id: ConversationId, payloads: Vec<String>) -> StoreFuture<'_, MemoryResult<()>> {
        if !payloads.is_empty() {
            let mut entry = self.turns.entry(id).or_default();
            let now = Utc::now();
            let created_at = entry
                .last()
                .map_or(now, |newest| now.max(newest.created_at));
            for content in payloads {
                let row_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                entry.push(ConversationTurn {
                    id: row_id,
                    conversation_id: id,
                    created_at,
                    content,
                });
            }
        }
        Box::pin(async move { Ok(()) })
    }

    fn delete(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<()>> {
        self.turns.remove(&id);
        Box::pin(async move { Ok(()) })
    }

    fn retain_latest(&self, id: ConversationId, keep: usize) -> StoreFuture<'_, MemoryResult<u64>> {
        let mut removed = 0_usize;
        if let Some(mut entry) = self.turns.get_mut(&id) {
            removed = entry.len().saturating_sub(keep);
            let kept = entry.split_off(removed);
            *entry = kept;
        }
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        Box::pin(async move { Ok(removed) })
    }

    fn count(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<u64>> {
        let count = self.turns.get(&id).map_or(0, |entry| entry.len());
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        Box::pin(async move { Ok(count) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_load_delete() {
        let store = InMemoryStore::new();
        let id = ConversationId::new(42);

        assert!(store.load(id).await.unwrap_or_default().is_empty());

        assert!(
            store
                .append(id, vec!["A".to_string(), "B".to_string(), "C".to_string()])
                .await
                .is_ok()
        );
        let contents: Vec<String> = store
            .load(id)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["A", "B", "C"]);
        assert_eq!(store.conversation_count(), 1);

        assert!(store.delete(id).await.is_ok());
        assert!(store.load(id).await.unwrap_or_default().is_empty());
        assert_eq!(store.conversation_count(), 0);
    }

    #[tokio::test]
    async fn test_ids_and_keys_are_monotonic() {
        let store = InMemoryStore::new();
        let id = ConversationId::new(1);
        for i in 0..5 {
            assert!(store.append(id, vec![i.to_string()]).await.is_ok());
        }
        let turns = store.load(id).await.unwrap_or_default();
        assert_eq!(turns.len(), 5);
        assert!(turns.windows(2).all(|w| w[0].id < w[1].id));
        assert!(turns.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_retain_latest() {
        let store = InMemoryStore::new();
        let id = ConversationId::new(3);
        let payloads: Vec<String> = (1..=5).map(|i| i.to_string()).collect();
        assert!(store.append(id, payloads).await.is_ok());

        assert_eq!(store.retain_latest(id, 2).await.unwrap_or(0), 3);
        assert_eq!(store.count(id).await.unwrap_or(0), 2);
        // Nothing to drop when already within bounds.
        assert_eq!(store.retain_latest(id, 10).await.unwrap_or(99), 0);
        // Unknown conversations are untouched.
        assert_eq!(store.retain_latest(ConversationId::new(4), 1).await.unwrap_or(99), 0);
    }
}
