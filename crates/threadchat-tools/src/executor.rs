use async_trait::async_trait;
use threadchat_core::tools::{parse_tool_args, ToolCall, ToolError, ToolExecutor, ToolResult, ToolSchema};

use crate::tools::{CalculatorTool, ToolRegistry, WebSearchTool};

/// Names of the tools bound to the model when tools are enabled.
pub const BUILTIN_TOOL_NAMES: [&str; 2] = ["calculator", "duckduckgo_search"];

/// Built-in tool executor that uses ToolRegistry for dynamic dispatch
pub struct BuiltinToolExecutor {
    registry: ToolRegistry,
}

impl BuiltinToolExecutor {
    /// Creates a new executor with all built-in tools registered
    pub fn new() -> Self {
        let registry = ToolRegistry::new();
        Self::register_builtin_tools(&registry);
        Self { registry }
    }

    fn register_builtin_tools(registry: &ToolRegistry) {
        let _ = registry.register(CalculatorTool::new());
        let _ = registry.register(WebSearchTool::new());
    }
}

impl Default for BuiltinToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for BuiltinToolExecutor {
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let args = parse_tool_args(&call.function.arguments)?;

        let tool = self
            .registry
            .get(&call.function.name)
            .ok_or_else(|| ToolError::NotFound(call.function.name.clone()))?;

        log::debug!("Executing tool '{}' ({})", call.function.name, call.id);
        tool.execute(args).await
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.registry.list_tools()
    }
}
