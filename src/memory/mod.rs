//! Conversation memory subsystem.
//!
//! - `core`: configuration, errors, identifiers, messages and turns
//! - `store`: the durable append log (`SQLite`, in-memory)
//! - `provider`: bounded window view and per-conversation locking
//! - `prompt`: rendering the window for the model
//! - `assistant`: chat orchestration over provider and model

pub mod assistant;
pub mod core;
pub mod prompt;
pub mod provider;
pub mod store;

pub use assistant::MemoryAssistant;
pub use self::core::{
    ChatMessage, ConversationId, ConversationTurn, LlmConfig, MemoryConfig, MemoryError,
    MemoryResult, MessageRole, RetentionPolicy, StorageBackend, StorageConfig, WindowConfig,
    decode_turns,
};
pub use prompt::build_conversation_prompt;
pub use provider::{ConversationGuard, MemoryProvider, latest_window};
pub use store::{InMemoryStore, MemoryStore, SqliteMemoryStore, StoreFuture};

use std::sync::Arc;

/// Open the store selected by the configuration.
///
/// # Errors
/// Returns an error if the `SQLite` database cannot be opened.
pub async fn open_store(config: &StorageConfig) -> MemoryResult<Arc<dyn MemoryStore>> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteMemoryStore::new(config).await?)),
        StorageBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}
