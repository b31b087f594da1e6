//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rollcall_types::error::{GateError, StoreError, TurnError};
use rollcall_types::export::ExportError;
use rollcall_types::llm::CompletionError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Gate rejections: bad credentials or spent quota.
    Gate(GateError),
    /// Completion provider failure (after retries).
    Completion(CompletionError),
    /// Transcript export failure.
    Export(ExportError),
    /// Roster store failure.
    Store(StoreError),
    /// Unknown or expired session id.
    SessionNotFound,
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        // Store failures surface as 503, not as a credential problem.
        match e {
            GateError::Store(inner) => AppError::Store(inner),
            other => AppError::Gate(other),
        }
    }
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::Gate(inner) => inner.into(),
            TurnError::Completion(inner) => AppError::Completion(inner),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Gate(GateError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid student id or password".to_string(),
            ),
            AppError::Gate(GateError::QuotaExceeded) => (
                StatusCode::FORBIDDEN,
                "QUOTA_EXCEEDED",
                "Usage quota exhausted".to_string(),
            ),
            AppError::Gate(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                e.to_string(),
            ),
            AppError::Completion(e) => (
                StatusCode::BAD_GATEWAY,
                "COMPLETION_FAILED",
                format!("Completion provider failed: {e}"),
            ),
            AppError::Export(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "EXPORT_FAILED",
                format!("Transcript export failed: {e}"),
            ),
            AppError::Store(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                format!("Roster store unavailable: {e}"),
            ),
            AppError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found; log in again".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg.clone()),
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_is_401() {
        let err: AppError = GateError::InvalidCredentials.into();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_quota_exceeded_is_403() {
        let err: AppError = GateError::QuotaExceeded.into();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_gate_store_failure_is_503() {
        // A store failure during login must not look like bad credentials.
        let err: AppError = GateError::Store(StoreError::Connection).into();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_turn_completion_failure_is_502() {
        let err: AppError = TurnError::Completion(CompletionError::RetriesExhausted {
            attempts: 3,
            last: "transport error: timed out".to_string(),
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_turn_gate_rejection_keeps_its_own_status() {
        let err: AppError = TurnError::Gate(GateError::QuotaExceeded).into();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_session_not_found_is_404() {
        assert_eq!(
            AppError::SessionNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_export_failure_is_500() {
        let err: AppError = ExportError::MissingPart("word/document.xml".to_string()).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
