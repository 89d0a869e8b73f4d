use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use threadchat_core::Message;

use crate::error::{CheckpointError, CheckpointResult};
use crate::memory::MemoryCheckpointStore;
use crate::postgres::PostgresCheckpointStore;
use crate::sqlite::SqliteCheckpointStore;
use crate::types::Checkpoint;

/// Durable per-thread snapshots of the message log.
///
/// `save` replaces the thread's latest snapshot atomically: a concurrent
/// reader sees either the previous sequence or the new one, never a mix.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Create tables or directories. Idempotent.
    async fn init(&self) -> CheckpointResult<()> {
        Ok(())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint>;

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>>;

    /// Latest committed messages; empty for a thread that was never saved.
    async fn load(&self, thread_id: &str) -> CheckpointResult<Vec<Message>> {
        Ok(self
            .latest(thread_id)
            .await?
            .map(|checkpoint| checkpoint.messages)
            .unwrap_or_default())
    }

    /// Every thread with at least one checkpoint, without duplicates, oldest
    /// first commit first.
    async fn list_threads(&self) -> CheckpointResult<Vec<String>>;

    fn backend(&self) -> &'static str;
}

pub fn validate_thread_id(thread_id: &str) -> CheckpointResult<()> {
    if thread_id.trim().is_empty() {
        return Err(CheckpointError::InvalidThreadId(
            "thread id cannot be empty".to_string(),
        ));
    }
    if thread_id.chars().any(|c| c.is_control()) {
        return Err(CheckpointError::InvalidThreadId(format!(
            "thread id contains control characters: {thread_id:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Sqlite { path: PathBuf },
    Postgres { url: String, max_connections: u32 },
}

/// Build and initialize the configured backend.
pub async fn open_store(config: &StoreConfig) -> CheckpointResult<Arc<dyn CheckpointStore>> {
    let store: Arc<dyn CheckpointStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryCheckpointStore::new()),
        StoreConfig::Sqlite { path } => Arc::new(SqliteCheckpointStore::new(path)),
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            if url.trim().is_empty() {
                return Err(CheckpointError::Config(
                    "postgres connection url is empty".to_string(),
                ));
            }
            Arc::new(PostgresCheckpointStore::connect(url, *max_connections).await?)
        }
    };

    store.init().await?;
    log::info!("Checkpoint store ready: {}", store.backend());
    Ok(store)
}
