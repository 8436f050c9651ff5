//! Error types for the conversation memory subsystem.

use thiserror::Error;

/// Memory subsystem error type.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Caller-supplied input was rejected before touching storage or the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A stored row could not be mapped back into a turn.
    #[error("corrupt turn record: {0}")]
    CorruptRecord(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// The model backend answered with something unusable.
    #[error("model error: {0}")]
    Model(String),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// Readiness probe against the model backend failed.
    #[error("probe error: {0}")]
    Probe(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl MemoryError {
    /// Whether the failure originated in the model backend rather than storage.
    #[must_use]
    pub const fn is_model_failure(&self) -> bool {
        matches!(
            self,
            Self::Model(_) | Self::HttpClient(_) | Self::Completion(_) | Self::Probe(_)
        )
    }
}

/// Convenience result alias for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
