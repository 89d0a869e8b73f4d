use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::session::SessionError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: String,
}

pub async fn list(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SessionError> {
    let session_id = path.into_inner();
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or(SessionError::NotFound(session_id))?;

    Ok(HttpResponse::Ok().json(session.threads()))
}

/// "New chat": open an empty thread and make it active.
pub async fn create(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SessionError> {
    let session_id = path.into_inner();
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

    let entry = session.create_thread()?;
    log::info!("[{}] New thread {} ({})", session_id, entry.id, entry.name);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "thread_id": entry.id,
        "name": entry.name,
    })))
}

pub async fn select(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, SessionError> {
    let (session_id, thread_id) = path.into_inner();
    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?
        .check_selectable(&thread_id)?;

    // The store round-trip runs without any session lock held.
    let messages = state.store().load(&thread_id).await?;

    let selected = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        session.apply_selection(&thread_id, &messages)?
    };
    log::debug!(
        "[{}] Selected thread {} with {} messages",
        session_id,
        thread_id,
        selected.messages.len()
    );

    Ok(HttpResponse::Ok().json(selected))
}

pub async fn rename(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<RenameRequest>,
) -> Result<HttpResponse, SessionError> {
    let (session_id, thread_id) = path.into_inner();
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

    let entry = session.rename(&thread_id, &body.name)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "thread_id": entry.id,
        "name": entry.name,
    })))
}

pub async fn begin_rename(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, SessionError> {
    let (session_id, thread_id) = path.into_inner();
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

    session.begin_rename(&thread_id)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "renaming": thread_id,
        "name": session.name_of(&thread_id),
    })))
}

pub async fn cancel_rename(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, SessionError> {
    let (session_id, _thread_id) = path.into_inner();
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

    session.cancel_rename();
    Ok(HttpResponse::NoContent().finish())
}
