/// Configuration for [`crate::ChatGraph`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Upper bound on chat and tool steps within one turn.
    pub max_steps: usize,
    /// Prepended to every model request; never persisted.
    pub system_prompt: Option<String>,
    /// When false the graph is entry -> chat -> exit and no tool schemas are sent.
    pub tools_enabled: bool,
    pub max_output_tokens: Option<u32>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            system_prompt: None,
            tools_enabled: true,
            max_output_tokens: Some(3000),
        }
    }
}

impl GraphConfig {
    pub fn without_tools() -> Self {
        Self {
            tools_enabled: false,
            ..Self::default()
        }
    }
}
