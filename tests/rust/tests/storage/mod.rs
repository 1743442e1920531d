//! Storage integration tests
//!
//! The SQLite key-value repository against real database files, the
//! schema migrations, and the session-scoped in-memory store.

mod session;
