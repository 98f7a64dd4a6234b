//! Key-value persistence adapters
//!
//! The adventure is stored as JSON strings under fixed keys. SQLite is the
//! durable backend; the in-memory store serves tests.

mod memory_store;
mod sqlite_store;

pub use memory_store::InMemoryKeyValueStore;
pub use sqlite_store::SqliteKeyValueStore;
