use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadchat_core::Message;

/// Snapshot of a thread's full message sequence at a step boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub thread_id: String,
    /// Starts at 1 and increases by one on every save of the thread.
    pub step: u64,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}
