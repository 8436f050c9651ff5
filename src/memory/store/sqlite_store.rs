//! `SQLite` implementation of the turn log.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::memory::core::config::StorageConfig;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::ConversationId;
use crate::memory::core::turn::ConversationTurn;
use crate::memory::store::{MemoryStore, StoreFuture};

/// `SQLite`-backed memory store.
///
/// Schema: `id` (autoincrement key), `memory_id` (conversation key as text),
/// `content` (encoded message) and `created_at` (unix millis).
pub struct SqliteMemoryStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteMemoryStore {
    /// Open the database at the configured path and create the table.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the table name is invalid.
    pub async fn new(config: &StorageConfig) -> MemoryResult<Self> {
        let conn = Connection::open(&config.sqlite_path).await?;
        Self::from_connection(Arc::new(conn), &config.turn_table).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created.
    pub async fn in_memory() -> MemoryResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::from_connection(Arc::new(conn), &StorageConfig::default().turn_table).await
    }

    /// Use an existing connection and create the table if needed.
    ///
    /// # Errors
    /// Returns an error if the table name is invalid or schema creation fails.
    pub async fn from_connection(conn: Arc<Connection>, table: &str) -> MemoryResult<Self> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(MemoryError::InvalidConfig(format!(
                "invalid turn table name: {table:?}"
            )));
        }

        let table = table.to_string();
        let table_name = table.clone();
        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    memory_id TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_memory_created
                    ON {table_name} (memory_id, created_at, id);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl MemoryStore for SqliteMemoryStore {
    fn load(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<Vec<ConversationTurn>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = id.storage_key();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, created_at, content
                         FROM {table}
                         WHERE memory_id = ?1
                         ORDER BY created_at ASC, id ASC"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![key], |row| {
                            let row_id: i64 = row.get(0)?;
                            let ts: i64 = row.get(1)?;
                            let content: String = row.get(2)?;
                            Ok((row_id, ts, content))
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            let mut turns = Vec::with_capacity(rows.len());
            for (row_id, ts, content) in rows {
                let created_at = Utc.timestamp_millis_opt(ts).single().ok_or_else(|| {
                    MemoryError::CorruptRecord(format!("invalid timestamp on row {row_id}"))
                })?;
                turns.push(ConversationTurn {
                    id: row_id,
                    conversation_id: id,
                    created_at,
                    content,
                });
            }

            debug!(conversation = %id, turns = turns.len(), "loaded turns");
            Ok(turns)
        })
    }

    fn append(&self, id: ConversationId, payloads: Vec<String>) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move {
            if payloads.is_empty() {
                return Ok(());
            }

            let table = self.table.clone();
            let key = id.storage_key();
            let count = payloads.len();
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    {
                        // Clamp against the newest stored key so a clock step
                        // backwards cannot reorder the log.
                        let newest: Option<i64> = tx.query_row(
                            &format!("SELECT MAX(created_at) FROM {table} WHERE memory_id = ?1"),
                            rusqlite::params![key],
                            |row| row.get(0),
                        )?;
                        let now = Utc::now().timestamp_millis();
                        let ts = newest.map_or(now, |newest| now.max(newest));

                        let mut stmt = tx.prepare(&format!(
                            "INSERT INTO {table} (memory_id, content, created_at)
                             VALUES (?1, ?2, ?3)"
                        ))?;
                        for payload in payloads {
                            stmt.execute(rusqlite::params![key, payload, ts])?;
                        }
                    }
                    tx.commit()?;
                    Ok(())
                })
                .await?;

            debug!(conversation = %id, appended = count, "appended turns");
            Ok(())
        })
    }

    fn delete(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = id.storage_key();
            let removed = self
                .conn
                .call(move |conn| {
                    let removed = conn.execute(
                        &format!("DELETE FROM {table} WHERE memory_id = ?1"),
                        rusqlite::params![key],
                    )?;
                    Ok(removed)
                })
                .await?;
            debug!(conversation = %id, removed, "deleted conversation");
            Ok(())
        })
    }

    fn retain_latest(&self, id: ConversationId, keep: usize) -> StoreFuture<'_, MemoryResult<u64>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = id.storage_key();
            let keep = i64::try_from(keep)
                .map_err(|_| MemoryError::InvalidInput("keep exceeds i64".to_string()))?;
            let removed = self
                .conn
                .call(move |conn| {
                    let removed = conn.execute(
                        &format!(
                            "DELETE FROM {table}
                             WHERE memory_id = ?1
                               AND id NOT IN (
                                   SELECT id FROM {table}
                                   WHERE memory_id = ?1
                                   ORDER BY created_at DESC, id DESC
                                   LIMIT ?2
                               )"
                        ),
                        rusqlite::params![key, keep],
                    )?;
                    Ok(removed)
                })
                .await?;
            if removed > 0 {
                debug!(conversation = %id, removed, "compacted conversation");
            }
            Ok(u64::try_from(removed).unwrap_or(u64::MAX))
        })
    }

    fn count(&self, id: ConversationId) -> StoreFuture<'_, MemoryResult<u64>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = id.storage_key();
            let count = self
                .conn
                .call(move |conn| {
                    let count = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE memory_id = ?1"),
                        rusqlite::params![key],
                        |row| row.get::<_, i64>(0),
                    )?;
                    Ok(count)
                })
                .await?;
            u64::try_from(count)
                .map_err(|_| MemoryError::CorruptRecord("negative turn count".to_string()))
        })
    }
}
