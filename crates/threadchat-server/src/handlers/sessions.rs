use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::session::{SessionContext, SessionError};
use crate::state::AppState;

/// Open a UI session over the current thread directory.
pub async fn create(state: web::Data<AppState>) -> Result<HttpResponse, SessionError> {
    let session_id = Uuid::new_v4().to_string();
    let session = SessionContext::bootstrap(session_id.clone(), state.store().as_ref())
        .await
        .map_err(|error| {
            log::error!("[{}] Failed to list threads: {}", session_id, error);
            error
        })?;

    let snapshot = session.snapshot();
    state.sessions.write().await.insert(session_id, session);

    Ok(HttpResponse::Created().json(snapshot))
}

pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SessionError> {
    let session_id = path.into_inner();
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or(SessionError::NotFound(session_id))?;

    Ok(HttpResponse::Ok().json(session.snapshot()))
}

/// Drop a session when its page goes away. A turn still running for it is
/// cancelled; the thread log itself stays in the store.
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SessionError> {
    let session_id = path.into_inner();
    if let Some(token) = state.cancel_tokens.write().await.remove(&session_id) {
        token.cancel();
    }
    state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

    log::info!("[{}] Session closed", session_id);
    Ok(HttpResponse::NoContent().finish())
}
