use serde::{Deserialize, Serialize};

use crate::tools::ToolResult;

/// Events emitted while a turn is running, in the order they happen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Token {
        content: String,
    },

    ToolStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    ToolComplete {
        tool_call_id: String,
        tool_name: String,
        result: ToolResult,
    },

    /// A step boundary was committed to the checkpoint store.
    CheckpointSaved {
        thread_id: String,
        step: u64,
        message_count: usize,
    },

    PersistenceError {
        message: String,
    },

    Complete {
        usage: TokenUsage,
    },

    Error {
        message: String,
    },
}

impl TurnEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Complete { .. } | TurnEvent::Error { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
