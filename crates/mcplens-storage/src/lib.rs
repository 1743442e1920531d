//! McpLens Storage Layer
//!
//! SQLite-backed persistence for the OAuth token store, plus the
//! session-scoped in-memory store for pending-flow markers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Application                       │
//! ├──────────────────────────────────────────────────────┤
//! │             KeyValueRepository trait                 │
//! │          (defined in mcplens-core)                   │
//! ├──────────────────────────────┬───────────────────────┤
//! │   SqliteKeyValueRepository   │  InMemorySessionStore │
//! │   (persistent, survives      │  (session-scoped,     │
//! │    restarts)                 │   gone on restart)    │
//! ├──────────────────────────────┴───────────────────────┤
//! │                     Database                         │
//! │                     (SQLite)                         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Values are plain JSON strings. Nothing here is encrypted: the store
//! must stay inspectable with any SQLite client, which is the point of
//! an inspector tool.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcplens_storage::{Database, SqliteKeyValueRepository, InMemorySessionStore};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let db = Database::open(&path)?;
//! let db = Arc::new(Mutex::new(db));
//!
//! let persistent = Arc::new(SqliteKeyValueRepository::new(db.clone()));
//! let session = Arc::new(InMemorySessionStore::new());
//! ```

mod database;
mod repositories;

pub use database::Database;
pub use repositories::*;

/// Default database file name.
pub const DATABASE_FILE: &str = "mcplens.db";

/// Get the default database path for the current platform.
pub fn default_database_path() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|p| p.join("mcplens").join(DATABASE_FILE))
}
