//! Gated chat turn orchestration.
//!
//! `ChatService` runs the full turn cycle: authorize against the quota,
//! obtain a completion (with bounded retry), then commit the answered
//! turn durably through the session gate.

pub mod service;

pub use service::ChatService;
