pub mod accumulator;
pub mod executor;
pub mod registry;
pub mod types;

pub use accumulator::{PartialToolCall, ToolCallAccumulator, ToolCallDelta};
pub use executor::{execute_tool_call, parse_tool_args, ToolError, ToolExecutor};
pub use registry::{RegistryError, SharedTool, Tool, ToolRegistry};
pub use types::{FunctionCall, FunctionSchema, ToolCall, ToolResult, ToolSchema};
