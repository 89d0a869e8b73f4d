use std::collections::HashMap;
use std::sync::Arc;

use actix_web::web::Bytes;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use threadchat_checkpoint::{open_store, CheckpointResult, CheckpointStore};
use threadchat_core::TurnEvent;
use threadchat_graph::ChatGraph;
use threadchat_llm::OpenAIProvider;
use threadchat_tools::BuiltinToolExecutor;

use crate::config::ServerConfig;
use crate::session::SessionContext;

#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<ChatGraph>,
    pub sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
    pub cancel_tokens: Arc<RwLock<HashMap<String, CancellationToken>>>,
}

impl AppState {
    pub fn new(graph: ChatGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cancel_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open the checkpoint store and wire the graph. A store that cannot be
    /// initialized is fatal.
    pub async fn from_config(config: &ServerConfig) -> CheckpointResult<Self> {
        let store = open_store(&config.store).await?;

        log::info!(
            "Creating LLM provider with base URL: {} and model: {}",
            config.llm.base_url,
            config.llm.model
        );
        if config.llm.api_key.trim().is_empty() {
            log::warn!("No LLM API key configured; turns will fail until one is set");
        }
        let llm = Arc::new(
            OpenAIProvider::new(config.llm.api_key.clone())
                .with_base_url(config.llm.base_url.clone())
                .with_model(config.llm.model.clone()),
        );

        let tools = Arc::new(BuiltinToolExecutor::new());
        log::info!(
            "Tools {}",
            if config.graph.tools_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(Self::new(ChatGraph::new(
            llm,
            tools,
            store,
            config.graph.clone(),
        )))
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        self.graph.store()
    }
}

/// Serialize events as SSE frames until the turn ends or the client leaves.
pub fn spawn_sse_sender(
    mut rx: mpsc::Receiver<TurnEvent>,
    tx: mpsc::Sender<Bytes>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let event_json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(_) => continue,
            };

            let sse_data = format!("data: {}\n\n", event_json);
            if tx.send(Bytes::from(sse_data)).await.is_err() {
                break;
            }

            if event.is_terminal() {
                break;
            }
        }
    })
}
