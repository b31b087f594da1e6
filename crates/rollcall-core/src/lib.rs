//! Business logic and repository trait definitions for Rollcall.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements. It depends only on `rollcall-types` --
//! never on `rollcall-infra` or any database/IO crate.

pub mod chat;
pub mod export;
pub mod gate;
pub mod llm;
