//! Built-in tools the model may call during a turn.

mod executor;
pub mod tools;

pub use executor::{BuiltinToolExecutor, BUILTIN_TOOL_NAMES};
pub use tools::{CalculatorTool, ToolRegistry, WebSearchTool};
