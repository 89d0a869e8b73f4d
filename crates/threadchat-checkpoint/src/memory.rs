use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use threadchat_core::Message;
use tokio::sync::RwLock;

use crate::error::CheckpointResult;
use crate::store::{validate_thread_id, CheckpointStore};
use crate::types::Checkpoint;

#[derive(Default)]
struct MemoryInner {
    /// Thread ids in first-commit order.
    order: Vec<String>,
    latest: HashMap<String, Checkpoint>,
}

/// In-process store for tests and local development.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint> {
        validate_thread_id(thread_id)?;

        let mut inner = self.inner.write().await;
        let step = match inner.latest.get(thread_id) {
            Some(previous) => previous.step + 1,
            None => {
                inner.order.push(thread_id.to_string());
                1
            }
        };

        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            step,
            messages: messages.to_vec(),
            created_at: Utc::now(),
        };
        inner
            .latest
            .insert(thread_id.to_string(), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        validate_thread_id(thread_id)?;
        Ok(self.inner.read().await.latest.get(thread_id).cloned())
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        Ok(self.inner.read().await.order.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
