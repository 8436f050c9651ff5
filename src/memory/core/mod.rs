//! Core memory types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod message;
pub mod turn;

pub use config::{
    LlmConfig, MemoryConfig, RetentionPolicy, StorageBackend, StorageConfig, WindowConfig,
};
pub use errors::{MemoryError, MemoryResult};
pub use ids::ConversationId;
pub use message::{ChatMessage, MessageRole};
pub use turn::{ConversationTurn, decode_turns};
