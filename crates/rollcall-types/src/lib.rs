//! Shared domain types for Rollcall.
//!
//! This crate defines all data shapes used across the Rollcall workspace:
//! roster records, sessions and turns, completion request/response types,
//! export options, configuration, and error enums. It contains no IO and
//! no business logic beyond small constructors and accessors.

pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod roster;
