use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

use crate::tools::{FunctionSchema, ToolError, ToolResult, ToolSchema};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError>;

    fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

pub type SharedTool = Arc<dyn Tool>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool with name '{0}' already registered")]
    DuplicateTool(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

pub struct ToolRegistry {
    tools: DashMap<String, SharedTool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register<T>(&self, tool: T) -> Result<(), RegistryError>
    where
        T: Tool + 'static,
    {
        let tool: SharedTool = Arc::new(tool);
        let name = tool.name().trim();

        if name.is_empty() {
            return Err(RegistryError::InvalidTool(
                "tool name cannot be empty".to_string(),
            ));
        }

        match self.tools.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateTool(name.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&tool));
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<SharedTool> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Schemas sorted by tool name so requests to the model are stable.
    pub fn list_tools(&self) -> Vec<ToolSchema> {
        let mut tools: Vec<ToolSchema> = self
            .tools
            .iter()
            .map(|entry| entry.value().to_schema())
            .collect();
        tools.sort_by(|left, right| left.function.name.cmp(&right.function.name));
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(json!({ "tool": self.0 })))
        }
    }

    #[test]
    fn register_rejects_duplicates_and_blank_names() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("calculator")).unwrap();

        assert_eq!(
            registry.register(NamedTool("calculator")),
            Err(RegistryError::DuplicateTool("calculator".to_string()))
        );
        assert!(matches!(
            registry.register(NamedTool("  ")),
            Err(RegistryError::InvalidTool(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_tools_is_sorted_by_name() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("web_search")).unwrap();
        registry.register(NamedTool("calculator")).unwrap();

        let names: Vec<String> = registry
            .list_tools()
            .into_iter()
            .map(|schema| schema.function.name)
            .collect();
        assert_eq!(names, vec!["calculator", "web_search"]);
    }

    #[tokio::test]
    async fn get_returns_registered_tool() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("calculator")).unwrap();

        let tool = registry.get("calculator").expect("tool");
        let result = tool.execute(json!({})).await.unwrap();
        assert_eq!(result.result["tool"], "calculator");
        assert!(registry.get("missing").is_none());
    }
}
