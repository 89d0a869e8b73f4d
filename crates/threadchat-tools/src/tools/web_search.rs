//! Web search backed by the DuckDuckGo instant-answer API.
//!
//! Failures (network, non-2xx, unparseable body) are returned as an
//! `{"error": ...}` result so the model can decide how to proceed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use threadchat_core::tools::{Tool, ToolError, ToolResult};

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics", default)]
        topics: Vec<RelatedTopic>,
    },
}

fn flatten_topics(topics: Vec<RelatedTopic>, out: &mut Vec<serde_json::Value>) {
    for topic in topics {
        if out.len() >= MAX_RESULTS {
            return;
        }
        match topic {
            RelatedTopic::Entry { text, first_url } => {
                out.push(json!({ "text": text, "url": first_url }));
            }
            RelatedTopic::Group { topics } => flatten_topics(topics, out),
        }
    }
}

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("threadchat/0.1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, query: &str) -> Result<serde_json::Value, String> {
        let url = url::Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| format!("Invalid search endpoint: {e}"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Search request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("Search failed with HTTP {}", response.status()));
        }

        // The API answers with `application/x-javascript`, so decode the body by hand.
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read search response: {e}"))?;
        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|e| format!("Failed to parse search response: {e}"))?;

        let mut results = Vec::new();
        if !answer.abstract_text.is_empty() {
            results.push(json!({
                "title": answer.heading,
                "text": answer.abstract_text,
                "url": answer.abstract_url,
            }));
        }
        flatten_topics(answer.related_topics, &mut results);

        Ok(json!({ "query": query, "results": results }))
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "duckduckgo_search"
    }

    fn description(&self) -> &str {
        "Search the web with DuckDuckGo. Input should be a search query."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: WebSearchArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments(
                "query cannot be empty".to_string(),
            ));
        }

        match self.search(query).await {
            Ok(value) => Ok(ToolResult::ok(value)),
            Err(message) => {
                log::warn!("duckduckgo_search failed for '{}': {}", query, message);
                Ok(ToolResult::error(message))
            }
        }
    }
}
