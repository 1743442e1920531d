//! SQLite implementation of KeyValueRepository.
//!
//! The persistent storage surface: OAuth tokens, client registrations,
//! and per-server OAuth config live here across launches.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use mcplens_core::KeyValueRepository;
use rusqlite::params;
use tokio::sync::Mutex;

use crate::Database;

/// SQLite-backed key-value repository.
///
/// Stores values as key-value pairs with dot-notation namespacing.
///
/// # Example Keys
/// - `mcp-tokens.<server-id>` - persisted token set (JSON)
/// - `mcp-client.<server-id>` - dynamic client registration (JSON)
/// - `mcp-oauth-config.<server-id>` - scopes and cached metadata (JSON)
/// - `mcp-serverUrl.<server-name>` - legacy per-server URL
pub struct SqliteKeyValueRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteKeyValueRepository {
    /// Create a new key-value repository.
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueRepository for SqliteKeyValueRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let result = conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, String)>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let mut stmt = conn.prepare("SELECT key, value FROM kv_store ORDER BY key")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        // Use LIKE with escaped prefix for prefix matching
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));

        let mut stmt = conn
            .prepare("SELECT key, value FROM kv_store WHERE key LIKE ? ESCAPE '\\' ORDER BY key")?;

        let rows = stmt
            .query_map(params![pattern], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
