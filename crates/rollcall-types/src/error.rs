use thiserror::Error;

/// Errors from roster store operations (used by trait definitions in rollcall-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("row not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from session gate operations.
///
/// `InvalidCredentials` deliberately collapses "unknown id" and "wrong
/// password" into one signal so callers cannot enumerate roster ids.
/// Store failures stay distinct: the gate fails closed on them rather
/// than reporting a credential problem that does not exist.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid student id or password")]
    InvalidCredentials,

    #[error("usage quota exhausted")]
    QuotaExceeded,

    #[error("roster store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from a full gated chat turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Completion(#[from] crate::llm::CompletionError),
}
