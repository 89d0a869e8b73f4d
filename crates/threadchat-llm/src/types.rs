use threadchat_core::{TokenUsage, ToolCallDelta};

/// One decoded unit of a streamed chat completion.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMChunk {
    Token(String),
    ToolCalls(Vec<ToolCallDelta>),
    Usage(TokenUsage),
    Done,
}
