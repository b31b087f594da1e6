//! Session gate: authentication, quota enforcement, and usage logging.
//!
//! This module defines the `RosterRepository` trait that the infrastructure
//! layer implements, the `SessionGate` service deciding whether each chat
//! turn may proceed, and the in-process registry of live sessions.

pub mod repository;
pub mod service;
pub mod session;

pub use repository::{RosterRepository, TurnCommit};
pub use service::SessionGate;
pub use session::SessionStore;
