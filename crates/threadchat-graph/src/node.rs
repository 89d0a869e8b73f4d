use serde_json::Value;
use threadchat_core::Message;

/// States of the turn execution graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    Entry,
    Chat,
    Route,
    Tool,
    Exit,
}

impl GraphNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphNode::Entry => "entry",
            GraphNode::Chat => "chat",
            GraphNode::Route => "route",
            GraphNode::Tool => "tool",
            GraphNode::Exit => "exit",
        }
    }
}

/// Decide where to go after a chat step, from the message it produced.
pub fn route(last: Option<&Message>) -> GraphNode {
    match last {
        Some(message) if message.has_tool_calls() => GraphNode::Tool,
        _ => GraphNode::Exit,
    }
}

/// Arguments as JSON for event payloads; raw text when the model produced
/// something unparseable.
pub(crate) fn arguments_for_event(raw: &str) -> Value {
    threadchat_core::parse_tool_args(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
