//! Login HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/login - Authenticate a student and open a session

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use rollcall_types::chat::Session;
use rollcall_types::roster::PromptCategory;

use crate::http::error::AppError;
use crate::http::handlers::chat::SessionSnapshot;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
    /// When given, the system prompt is built from the `by-subject`
    /// catalog entries for this subject instead of the `general` ones.
    #[serde(default)]
    pub subject: Option<String>,
}

/// POST /api/v1/login - Authenticate and open a session.
///
/// Login succeeds even for a student whose quota is already spent; the
/// first message is what gets rejected.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if payload.student_id.trim().is_empty() {
        return Err(AppError::Validation(
            "student_id must not be empty".to_string(),
        ));
    }

    let gate = state.chat_service.gate();
    let record = gate
        .authenticate(&payload.student_id, &payload.password)
        .await?;

    let category = match &payload.subject {
        Some(_) => PromptCategory::BySubject,
        None => PromptCategory::General,
    };
    let system_prompt = gate
        .build_system_prompt(&category, payload.subject.as_deref())
        .await?;

    let session = Session::new(
        record.student_id,
        record.quota_limit,
        record.usage_count,
        system_prompt,
    );
    let snapshot = SessionSnapshot::of(&session);
    let id = state.sessions.insert(session);

    tracing::info!(session_id = %id, "session opened");

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(snapshot, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{id}"))
        .with_link("messages", &format!("/api/v1/sessions/{id}/messages"));

    Ok(Json(resp))
}
