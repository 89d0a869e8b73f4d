//! Turn execution graph: a chat step that streams the model response, a
//! router that inspects it, and a tool step that feeds results back to chat.

pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod stream;

pub use config::GraphConfig;
pub use error::GraphError;
pub use graph::{ChatGraph, TurnOutcome};
pub use node::{route, GraphNode};

#[cfg(test)]
mod tests {
    use crate::config::GraphConfig;

    #[test]
    fn graph_config_default() {
        let config = GraphConfig::default();
        assert_eq!(config.max_steps, 25);
        assert!(config.system_prompt.is_none());
        assert!(config.tools_enabled);
        assert_eq!(config.max_output_tokens, Some(3000));
    }

    #[test]
    fn without_tools_keeps_other_defaults() {
        let config = GraphConfig::without_tools();
        assert!(!config.tools_enabled);
        assert_eq!(config.max_steps, 25);
    }
}
