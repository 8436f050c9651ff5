//! Conversation identifier.
//!
//! Every layer (HTTP, provider, store) keys conversations by the same
//! [`ConversationId`]. The `SQLite` backend persists it as its decimal string
//! form so the `memory_id` column stays a plain `TEXT` key.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller-supplied key partitioning turns into conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl ConversationId {
    /// Wrap a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Extract the raw identifier.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Storage key used by the `memory_id` column.
    #[must_use]
    pub fn storage_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConversationId {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<ConversationId> for i64 {
    #[inline]
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

impl FromStr for ConversationId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
