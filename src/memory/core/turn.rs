//! Persisted conversation turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::ids::ConversationId;
use crate::memory::core::message::ChatMessage;

/// One stored message of a conversation.
///
/// Turns are ordered by `(created_at, id)`. `content` is an encoded
/// [`ChatMessage`] and is never interpreted by the store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Synthetic primary key assigned by the store.
    pub id: i64,
    /// Conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// Ordering key, monotonic per conversation.
    pub created_at: DateTime<Utc>,
    /// Encoded message payload.
    pub content: String,
}

impl ConversationTurn {
    /// Decode the payload back into a message.
    ///
    /// # Errors
    /// Returns an error if the stored payload is not a valid message.
    pub fn message(&self) -> MemoryResult<ChatMessage> {
        ChatMessage::from_json(&self.content)
    }
}

/// Decode every turn, failing on the first corrupt payload.
///
/// # Errors
/// Returns an error if any stored payload cannot be decoded.
pub fn decode_turns(turns: &[ConversationTurn]) -> MemoryResult<Vec<ChatMessage>> {
    turns.iter().map(ConversationTurn::message).collect()
}
