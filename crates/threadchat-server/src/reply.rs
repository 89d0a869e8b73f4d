use threadchat_core::TurnEvent;

pub const TOOL_FINISHED: &str = "Tool finished";

#[derive(Debug, Clone, PartialEq, Eq)]
enum TurnEnd {
    Completed,
    Failed(String),
}

/// Folds a turn's events into what the chat pane shows: the reply text so far
/// and a single transient tool status line that never enters the log.
#[derive(Debug, Default)]
pub struct ReplyAssembler {
    text: String,
    status: Option<String>,
    end: Option<TurnEnd>,
    persistence_failure: Option<String>,
}

impl ReplyAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &TurnEvent) {
        match event {
            TurnEvent::Token { content } => self.text.push_str(content),
            TurnEvent::ToolStart { tool_name, .. } => {
                self.status = Some(format!("Using `{tool_name}` …"));
            }
            TurnEvent::ToolComplete { .. } => {
                self.status = Some(TOOL_FINISHED.to_string());
            }
            TurnEvent::CheckpointSaved { .. } => {}
            TurnEvent::PersistenceError { message } => {
                self.persistence_failure = Some(message.clone());
            }
            TurnEvent::Complete { .. } => self.end = Some(TurnEnd::Completed),
            TurnEvent::Error { message } => self.end = Some(TurnEnd::Failed(message.clone())),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// The finished reply, only once the turn completed.
    pub fn completed_reply(&self) -> Option<&str> {
        match self.end {
            Some(TurnEnd::Completed) => Some(self.text.as_str()),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.end {
            Some(TurnEnd::Failed(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn persistence_failure(&self) -> Option<&str> {
        self.persistence_failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use threadchat_core::{TokenUsage, ToolResult};

    use super::*;

    fn token(text: &str) -> TurnEvent {
        TurnEvent::Token {
            content: text.to_string(),
        }
    }

    #[test]
    fn fragments_concatenate_in_arrival_order() {
        let mut reply = ReplyAssembler::new();
        for piece in ["Hel", "lo", " world"] {
            reply.apply(&token(piece));
        }
        assert_eq!(reply.text(), "Hello world");
        assert_eq!(reply.completed_reply(), None);

        reply.apply(&TurnEvent::Complete {
            usage: TokenUsage::default(),
        });
        assert_eq!(reply.completed_reply(), Some("Hello world"));
    }

    #[test]
    fn tool_status_is_transient_and_not_part_of_reply() {
        let mut reply = ReplyAssembler::new();
        reply.apply(&TurnEvent::ToolStart {
            tool_call_id: "call_1".to_string(),
            tool_name: "calculator".to_string(),
            arguments: serde_json::json!({}),
        });
        assert_eq!(reply.status(), Some("Using `calculator` …"));

        reply.apply(&TurnEvent::ToolComplete {
            tool_call_id: "call_1".to_string(),
            tool_name: "calculator".to_string(),
            result: ToolResult::ok(serde_json::json!({"result": 5.0})),
        });
        assert_eq!(reply.status(), Some(TOOL_FINISHED));

        reply.apply(&token("5"));
        assert_eq!(reply.text(), "5");
    }

    #[test]
    fn error_yields_no_reply() {
        let mut reply = ReplyAssembler::new();
        reply.apply(&token("partial"));
        reply.apply(&TurnEvent::PersistenceError {
            message: "disk full".to_string(),
        });
        reply.apply(&TurnEvent::Error {
            message: "disk full".to_string(),
        });

        assert!(reply.is_finished());
        assert_eq!(reply.completed_reply(), None);
        assert_eq!(reply.failure(), Some("disk full"));
        assert_eq!(reply.persistence_failure(), Some("disk full"));
    }

    #[test]
    fn completed_turn_reports_no_failure() {
        let mut reply = ReplyAssembler::new();
        reply.apply(&token("ok"));
        reply.apply(&TurnEvent::Complete {
            usage: TokenUsage::default(),
        });

        assert_eq!(reply.failure(), None);
        assert_eq!(reply.persistence_failure(), None);
        assert_eq!(reply.text(), "ok");
    }
}
