//! Configuration for the conversation memory service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::memory::core::errors::{MemoryError, MemoryResult};

/// Environment variable overriding the `SQLite` path.
pub const SQLITE_PATH_ENV: &str = "CHAT_MEMORY_SQLITE_PATH";
/// Environment variable selecting the storage backend (`sqlite` or `memory`).
pub const STORAGE_BACKEND_ENV: &str = "CHAT_MEMORY_STORAGE";
/// Environment variable overriding the Ollama base URL.
pub const OLLAMA_URL_ENV: &str = "CHAT_MEMORY_OLLAMA_URL";
/// Environment variable overriding the completion model name.
pub const MODEL_ENV: &str = "CHAT_MEMORY_MODEL";
/// Environment variable overriding the window size.
pub const MAX_MESSAGES_ENV: &str = "CHAT_MEMORY_MAX_MESSAGES";
/// Environment variable enabling trim-on-write retention.
pub const TRIM_ON_WRITE_ENV: &str = "CHAT_MEMORY_TRIM_ON_WRITE";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
    /// Window and retention settings.
    pub window: WindowConfig,
}

impl MemoryConfig {
    /// Build the default configuration overlaid with `CHAT_MEMORY_*` variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> MemoryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> MemoryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(SQLITE_PATH_ENV) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(backend) = lookup(STORAGE_BACKEND_ENV) {
            config.storage.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "memory" => StorageBackend::Memory,
                other => {
                    return Err(MemoryError::InvalidConfig(format!(
                        "{STORAGE_BACKEND_ENV} must be `sqlite` or `memory`, got `{other}`"
                    )));
                }
            };
        }
        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            config.llm.model = model;
        }
        if let Some(raw) = lookup(MAX_MESSAGES_ENV) {
            config.window.max_messages = raw.trim().parse().map_err(|_| {
                MemoryError::InvalidConfig(format!("{MAX_MESSAGES_ENV} must be an integer"))
            })?;
        }
        if let Some(raw) = lookup(TRIM_ON_WRITE_ENV) {
            config.window.retention = if parse_flag(&raw)? {
                RetentionPolicy::TrimOnWrite
            } else {
                RetentionPolicy::TrimOnRead
            };
        }

        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.window.max_messages == 0 {
            return Err(MemoryError::InvalidConfig(
                "window.max_messages must be > 0".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(MemoryError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.llm.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MemoryError::InvalidConfig(format!(
                "llm.base_url must use http or https, got `{}`",
                url.scheme()
            )));
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> MemoryResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(MemoryError::InvalidConfig(format!(
            "{TRIM_ON_WRITE_ENV} must be a boolean, got `{other}`"
        ))),
    }
}

/// Which storage backend to use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Durable `SQLite` file.
    #[default]
    Sqlite,
    /// Process-local map, lost on restart.
    Memory,
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackend,
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Turn table name.
    pub turn_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            sqlite_path: PathBuf::from("chat_memory.sqlite"),
            turn_table: "chat_messages".to_string(),
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Ollama base URL.
    pub base_url: String,
    /// Temperature for generation.
    pub temperature: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional system instruction sent with every request.
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:1b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.4,
            max_tokens: None,
            system_prompt: None,
        }
    }
}

/// Where the window bound is enforced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep the full history; bound only what the model sees.
    #[default]
    TrimOnRead,
    /// Compact storage to the window after every write.
    TrimOnWrite,
}

/// Window settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Maximum number of turns exposed to the model.
    pub max_messages: usize,
    /// Retention policy.
    pub retention: RetentionPolicy,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_messages: 100,
            retention: RetentionPolicy::TrimOnRead,
        }
    }
}
