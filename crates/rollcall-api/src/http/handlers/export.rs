//! Transcript export HTTP handler.
//!
//! Endpoint:
//! - GET /api/v1/sessions/{id}/export - Download the transcript as .docx

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use rollcall_core::export::transcript::DEFAULT_EXPORT_FILE_STEM;
use rollcall_core::export::{Transcript, TranscriptExporter};

use crate::http::error::AppError;
use crate::http::handlers::chat::{parse_session_id, session_handle};
use crate::state::AppState;

/// GET /api/v1/sessions/{id}/export - Download the session transcript.
///
/// The document carries the assistant answers in turn order. A session
/// with no turns yet still exports: the body is simply empty.
pub async fn export_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_session_id(&id)?;
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;

    let transcript = Transcript::from_turns(&session.turns);
    let bytes = state.exporter.export(&transcript, &state.config.export)?;

    tracing::info!(
        session_id = %id,
        turns = session.turns.len(),
        bytes = bytes.len(),
        "transcript exported"
    );

    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        DEFAULT_EXPORT_FILE_STEM,
        state.exporter.file_extension()
    );
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                state.exporter.content_type().to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
