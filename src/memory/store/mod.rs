//! Durable, ordered, keyed append log of conversation turns.

pub mod in_memory;
pub mod sqlite_store;

use std::future::Future;
use std::pin::Pin;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::ids::ConversationId;
use crate::memory::core::turn::ConversationTurn;

pub use in_memory::InMemoryStore;
pub use sqlite_store::SqliteMemoryStore;

/// Boxed future type for memory store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Append-only turn storage partitioned by conversation.
///
/// Implementations make a single attempt per call and surface storage
/// failures unchanged.
pub trait MemoryStore: Send + Sync {
    /// Load every turn of a conversation, oldest first.
    ///
    /// An unknown conversation yields an empty vector.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<Vec<ConversationTurn>>>;

    /// Append payloads as new turns, keeping call order.
    ///
    /// Each new turn gets an ordering key no earlier than any turn already
    /// stored for `id`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn append(&self, id: ConversationId, payloads: Vec<String>) -> StoreFuture<'_, MemoryResult<()>>;

    /// Remove every turn of a conversation. Unknown ids are a no-op.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<()>>;

    /// Drop all but the newest `keep` turns, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn retain_latest(&self, id: ConversationId, keep: usize) -> StoreFuture<'_, MemoryResult<u64>>;

    /// Count stored turns for a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn count(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<u64>>;
}
