//! HTTP/REST API layer for Rollcall.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format and
//! CORS support. Sessions are held server-side and addressed by the
//! UUIDv7 handed out at login.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
