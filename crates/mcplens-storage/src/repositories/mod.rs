//! Storage surface implementations.

mod kv_repository;
mod session_store;

pub use kv_repository::SqliteKeyValueRepository;
pub use session_store::InMemorySessionStore;
