use async_trait::async_trait;
use thiserror::Error;

use crate::tools::{ToolCall, ToolResult, ToolSchema};

/// Recoverable tool failure. Never aborts a turn; it is handed back to the
/// model as an `{"error": ...}` tool result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

impl From<ToolError> for ToolResult {
    fn from(error: ToolError) -> Self {
        ToolResult::error(error.to_string())
    }
}

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
    fn list_tools(&self) -> Vec<ToolSchema>;
}

pub fn parse_tool_args(arguments: &str) -> Result<serde_json::Value> {
    let args_raw = arguments.trim();

    if args_raw.is_empty() {
        return Ok(serde_json::json!({}));
    }

    serde_json::from_str(args_raw)
        .map_err(|error| ToolError::InvalidArguments(format!("Invalid JSON arguments: {error}")))
}

/// Run `call` and fold any [`ToolError`] into an error result.
pub async fn execute_tool_call(call: &ToolCall, tools: &dyn ToolExecutor) -> ToolResult {
    match tools.execute(call).await {
        Ok(result) => result,
        Err(error) => {
            log::warn!("Tool '{}' failed: {}", call.function.name, error);
            error.into()
        }
    }
}
