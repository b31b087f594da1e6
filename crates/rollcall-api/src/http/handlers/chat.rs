//! Session-scoped chat HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/sessions/{id}          - Session snapshot
//! - POST /api/v1/sessions/{id}/messages - Run one gated chat turn
//! - GET  /api/v1/sessions/{id}/messages - Role-tagged conversation so far
//! - POST /api/v1/sessions/{id}/reset    - Clear in-memory turns, keep quota
//! - POST /api/v1/sessions/{id}/logout   - Tear the session down

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use rollcall_types::chat::{Session, SessionStatus};
use rollcall_types::llm::Message;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Point-in-time view of a live session, as returned by login and the
/// session endpoints.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub student_id: String,
    pub quota_limit: u32,
    pub usage_count: u32,
    pub remaining: u32,
    pub status: SessionStatus,
    pub started_at: String,
    pub turn_count: usize,
}

impl SessionSnapshot {
    pub fn of(session: &Session) -> Self {
        Self {
            session_id: session.id,
            student_id: session.student_id.clone(),
            quota_limit: session.quota_limit,
            usage_count: session.usage_count,
            remaining: session.remaining(),
            status: session.status,
            started_at: session.started_at.to_rfc3339(),
            turn_count: session.turns.len(),
        }
    }
}

/// Send-message request body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// One answered turn plus the quota state after it.
#[derive(Debug, Serialize)]
pub struct TurnReply {
    pub question: String,
    pub answer: String,
    pub asked_at: String,
    pub usage_count: u32,
    pub remaining: u32,
    pub status: SessionStatus,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
pub(crate) fn parse_session_id(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid session id: {s}")))
}

/// Fetch a handle to a live session or fail with 404.
pub(crate) fn session_handle(
    state: &AppState,
    id: &Uuid,
) -> Result<Arc<Mutex<Session>>, AppError> {
    state.sessions.get(id).ok_or(AppError::SessionNotFound)
}

/// GET /api/v1/sessions/{id} - Get a session snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_session_id(&id)?;
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(SessionSnapshot::of(&session), request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{id}"))
        .with_link("messages", &format!("/api/v1/sessions/{id}/messages"))
        .with_link("export", &format!("/api/v1/sessions/{id}/export"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/messages - Run one gated chat turn.
///
/// Holding the session lock across the whole turn serializes turns within
/// a session; turns in other sessions proceed freely.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<TurnReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let id = parse_session_id(&id)?;
    let handle = session_handle(&state, &id)?;
    let mut session = handle.lock().await;

    let turn = state
        .chat_service
        .send_turn(&mut session, &payload.message)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let reply = TurnReply {
        question: turn.question,
        answer: turn.answer,
        asked_at: turn.asked_at,
        usage_count: session.usage_count,
        remaining: session.remaining(),
        status: session.status,
    };

    let resp = ApiResponse::success(reply, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{id}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{id}"));

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id}/messages - Get the conversation so far.
///
/// Returns role-tagged messages in provider order: the system instruction
/// first (when non-empty), then alternating user/assistant turns.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_session_id(&id)?;
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;

    let messages = state.chat_service.conversation(&session);

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{id}/messages"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/reset - Clear the in-memory conversation.
///
/// The durable usage counter is untouched; only the turn list empties.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_session_id(&id)?;
    let handle = session_handle(&state, &id)?;
    let mut session = handle.lock().await;

    session.clear_turns();
    tracing::debug!(session_id = %id, "conversation cleared");

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(SessionSnapshot::of(&session), request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{id}"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/logout - Destroy the session.
pub async fn logout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_session_id(&id)?;
    if !state.sessions.remove(&id) {
        return Err(AppError::SessionNotFound);
    }

    tracing::info!(session_id = %id, "session closed");

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({"logged_out": true}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}
