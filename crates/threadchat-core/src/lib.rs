//! Shared types for threadchat: the tagged message log, turn events and the
//! tool contract used by the graph and the tools crate.

pub mod events;
pub mod message;
pub mod tools;

pub use events::{TokenUsage, TurnEvent};
pub use message::{Message, MessageBody, Role};
pub use tools::{
    execute_tool_call, parse_tool_args, ToolCall, ToolCallAccumulator, ToolCallDelta, ToolError,
    ToolExecutor, ToolResult, ToolSchema,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
