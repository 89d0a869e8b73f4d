use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::{FunctionCall, ToolCall};

/// A fragment of a tool call as it arrives in a streamed completion.
///
/// The first fragment for a given `index` usually carries the id and name,
/// later ones only append to `arguments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    parts: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, delta: ToolCallDelta) {
        let part = self.parts.entry(delta.index).or_default();

        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            part.id = id;
        }
        if let Some(name) = delta.name.filter(|name| !name.is_empty()) {
            part.name = name;
        }
        if let Some(arguments) = delta.arguments {
            part.arguments.push_str(&arguments);
        }
    }

    pub fn extend<I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = ToolCallDelta>,
    {
        for delta in deltas {
            self.update(delta);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Completed calls in stream order. Fragments that never received a name
    /// are dropped; missing ids are generated.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.parts
            .into_values()
            .filter(|part| !part.name.trim().is_empty())
            .map(|part| ToolCall {
                id: if part.id.is_empty() {
                    format!("call_{}", Uuid::new_v4())
                } else {
                    part.id
                },
                tool_type: "function".to_string(),
                function: FunctionCall {
                    name: part.name,
                    arguments: if part.arguments.trim().is_empty() {
                        "{}".to_string()
                    } else {
                        part.arguments
                    },
                },
            })
            .collect()
    }
}
