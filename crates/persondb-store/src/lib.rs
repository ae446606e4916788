//! persondb-store
//!
//! SQLite-backed record store: the canonical copy of every person and the
//! source of truth for identity.
pub mod query;
pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteRecordStore, SqliteSession};
