//! Per-browser view of the thread directory.
//!
//! Display names, the active thread and the rendered history live here and
//! nowhere else; only message logs are persisted, by the checkpoint store.

use std::collections::HashMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use threadchat_checkpoint::{CheckpointError, CheckpointStore};
use threadchat_core::{Message, MessageBody};

pub const UNTITLED_CHAT: &str = "Untitled Chat";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("A turn is already running for this session")]
    TurnInFlight,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Checkpoint store unavailable: {0}")]
    Store(#[from] CheckpointError),
}

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) | SessionError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::TurnInFlight => StatusCode::CONFLICT,
            SessionError::EmptyMessage => StatusCode::BAD_REQUEST,
            SessionError::Store(CheckpointError::InvalidThreadId(_)) => StatusCode::BAD_REQUEST,
            SessionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub role: DisplayRole,
    pub content: String,
}

impl DisplayMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: DisplayRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: DisplayRole::Assistant,
            content: content.into(),
        }
    }
}

/// Render a committed log for the chat pane. Tool results and tool-call-only
/// assistant messages are not shown.
pub fn display_messages(messages: &[Message]) -> Vec<DisplayMessage> {
    messages
        .iter()
        .filter_map(|message| match &message.body {
            MessageBody::User { content } => Some(DisplayMessage::user(content.clone())),
            MessageBody::Assistant { content, .. } if !content.trim().is_empty() => {
                Some(DisplayMessage::assistant(content.clone()))
            }
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedThread {
    pub thread_id: String,
    pub name: String,
    pub messages: Vec<DisplayMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub active_thread_id: String,
    pub threads: Vec<ThreadEntry>,
    pub messages: Vec<DisplayMessage>,
    /// Thread whose name is being edited in place.
    pub renaming: Option<String>,
    pub turn_in_flight: bool,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    id: String,
    active_thread_id: String,
    /// Creation order, oldest first.
    threads: Vec<String>,
    names: HashMap<String, String>,
    history: Vec<DisplayMessage>,
    renaming: Option<String>,
    turn_in_flight: bool,
}

impl SessionContext {
    /// Populate the directory from the store and open a fresh thread.
    ///
    /// Fails when the store cannot be listed; a partial directory is never
    /// shown.
    pub async fn bootstrap(
        session_id: impl Into<String>,
        store: &dyn CheckpointStore,
    ) -> Result<Self, SessionError> {
        let session_id = session_id.into();
        let existing = store.list_threads().await?;

        let names = existing
            .iter()
            .enumerate()
            .map(|(i, thread_id)| (thread_id.clone(), format!("Chat {}", i + 1)))
            .collect();

        let mut session = Self {
            id: session_id,
            active_thread_id: String::new(),
            threads: existing,
            names,
            history: Vec::new(),
            renaming: None,
            turn_in_flight: false,
        };
        session.open_thread();

        log::info!(
            "[{}] Session ready with {} stored threads",
            session.id,
            session.threads.len() - 1
        );
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn active_thread_id(&self) -> &str {
        &self.active_thread_id
    }

    pub fn history(&self) -> &[DisplayMessage] {
        &self.history
    }

    pub fn renaming(&self) -> Option<&str> {
        self.renaming.as_deref()
    }

    pub fn turn_in_flight(&self) -> bool {
        self.turn_in_flight
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        self.names.contains_key(thread_id)
    }

    /// Display name, or `Chat {id}` for a thread this session never named.
    pub fn name_of(&self, thread_id: &str) -> String {
        self.names
            .get(thread_id)
            .cloned()
            .unwrap_or_else(|| format!("Chat {thread_id}"))
    }

    /// Newest first.
    pub fn threads(&self) -> Vec<ThreadEntry> {
        self.threads
            .iter()
            .rev()
            .map(|id| ThreadEntry {
                id: id.clone(),
                name: self.name_of(id),
            })
            .collect()
    }

    pub fn create_thread(&mut self) -> Result<ThreadEntry, SessionError> {
        if self.turn_in_flight {
            return Err(SessionError::TurnInFlight);
        }
        Ok(self.open_thread())
    }

    fn open_thread(&mut self) -> ThreadEntry {
        let id = Uuid::new_v4().to_string();
        let name = format!("Chat {}", self.threads.len() + 1);

        self.threads.push(id.clone());
        self.names.insert(id.clone(), name.clone());
        self.active_thread_id = id.clone();
        self.history.clear();
        self.renaming = None;

        log::debug!("[{}] Opened thread {} ({})", self.id, id, name);
        ThreadEntry { id, name }
    }

    /// Blank names fall back to `Untitled Chat`.
    pub fn rename(&mut self, thread_id: &str, new_name: &str) -> Result<ThreadEntry, SessionError> {
        if !self.contains(thread_id) {
            return Err(SessionError::ThreadNotFound(thread_id.to_string()));
        }

        let name = match new_name.trim() {
            "" => UNTITLED_CHAT.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.names.insert(thread_id.to_string(), name.clone());
        if self.renaming.as_deref() == Some(thread_id) {
            self.renaming = None;
        }

        Ok(ThreadEntry {
            id: thread_id.to_string(),
            name,
        })
    }

    pub fn begin_rename(&mut self, thread_id: &str) -> Result<(), SessionError> {
        if !self.contains(thread_id) {
            return Err(SessionError::ThreadNotFound(thread_id.to_string()));
        }
        self.renaming = Some(thread_id.to_string());
        Ok(())
    }

    pub fn cancel_rename(&mut self) {
        self.renaming = None;
    }

    /// A thread can be made active when it belongs to this session and no
    /// turn is running.
    pub fn check_selectable(&self, thread_id: &str) -> Result<(), SessionError> {
        if !self.contains(thread_id) {
            return Err(SessionError::ThreadNotFound(thread_id.to_string()));
        }
        if self.turn_in_flight {
            return Err(SessionError::TurnInFlight);
        }
        Ok(())
    }

    /// Make `thread_id` active with its latest committed log. The log is read
    /// from the store on every selection, outside the session lock, so the
    /// checks run again here.
    pub fn apply_selection(
        &mut self,
        thread_id: &str,
        messages: &[Message],
    ) -> Result<SelectedThread, SessionError> {
        self.check_selectable(thread_id)?;
        self.active_thread_id = thread_id.to_string();
        self.history = display_messages(messages);

        Ok(SelectedThread {
            thread_id: thread_id.to_string(),
            name: self.name_of(thread_id),
            messages: self.history.clone(),
        })
    }

    /// Claim the session for a turn and show the user message right away.
    /// Returns the thread the turn runs against.
    pub fn begin_turn(&mut self, message: &str) -> Result<String, SessionError> {
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.turn_in_flight {
            return Err(SessionError::TurnInFlight);
        }

        self.turn_in_flight = true;
        self.history.push(DisplayMessage::user(message));
        Ok(self.active_thread_id.clone())
    }

    /// Release the session. `reply` is the finished assistant text of a
    /// completed turn; aborted turns pass `None`.
    pub fn finish_turn(&mut self, reply: Option<String>) {
        self.turn_in_flight = false;
        if let Some(reply) = reply.filter(|reply| !reply.is_empty()) {
            self.history.push(DisplayMessage::assistant(reply));
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            active_thread_id: self.active_thread_id.clone(),
            threads: self.threads(),
            messages: self.history.clone(),
            renaming: self.renaming.clone(),
            turn_in_flight: self.turn_in_flight,
        }
    }
}
