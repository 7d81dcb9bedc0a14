//! Highlight persistence
//!
//! `kv` holds the storage backends (in-memory and SQLite) behind one async
//! key-value trait; `adapter` implements the record-list operations on top of
//! it. Every mutation is a read-modify-write of the whole list, so concurrent
//! writers race with last-writer-wins semantics.

mod adapter;
mod kv;

pub use adapter::{HighlightStore, DEFAULT_COLOR_KEY, HIGHLIGHTS_KEY};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Color is not in the palette: {0}")]
    UnknownColor(String),
}
