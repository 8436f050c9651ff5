//! Chat message model and its JSON wire form.
//!
//! A message is stored as a JSON document tagged by `"type"`:
//! `{"type":"USER","text":"hi"}`. The store never looks inside it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::memory::core::errors::MemoryResult;

/// Author of a chat message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageRole {
    /// End user.
    User,
    /// Model reply.
    Ai,
    /// Instruction injected ahead of the conversation.
    System,
}

impl MessageRole {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::System => "system",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message of a conversation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatMessage {
    /// Message written by the user.
    User {
        /// Message text.
        text: String,
    },
    /// Message produced by the model.
    Ai {
        /// Message text.
        text: String,
    },
    /// System instruction.
    System {
        /// Message text.
        text: String,
    },
}

impl ChatMessage {
    /// Build a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    /// Build a model reply.
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self::Ai { text: text.into() }
    }

    /// Build a system instruction.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Author of the message.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        match self {
            Self::User { .. } => MessageRole::User,
            Self::Ai { .. } => MessageRole::Ai,
            Self::System { .. } => MessageRole::System,
        }
    }

    /// Message text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::User { text } | Self::Ai { text } | Self::System { text } => text,
        }
    }

    /// Encode into the stored JSON form.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> MemoryResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the stored JSON form.
    ///
    /// # Errors
    /// Returns [`MemoryError::Serialization`](crate::memory::core::errors::MemoryError::Serialization)
    /// if the payload is not a valid message.
    pub fn from_json(payload: &str) -> MemoryResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}
