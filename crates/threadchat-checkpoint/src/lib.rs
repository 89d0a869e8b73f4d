//! Thread checkpoint persistence.
//!
//! [`CheckpointStore`] is implemented by an in-process store, a single-file
//! SQLite store and a networked Postgres store with identical semantics.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{CheckpointError, CheckpointResult};
pub use memory::MemoryCheckpointStore;
pub use postgres::PostgresCheckpointStore;
pub use sqlite::SqliteCheckpointStore;
pub use store::{open_store, validate_thread_id, CheckpointStore, StoreConfig};
pub use types::Checkpoint;
