//! Infrastructure layer for Rollcall.
//!
//! Contains implementations of the ports defined in `rollcall-core`:
//! SQLite storage for the roster store, the OpenAI completion provider,
//! and the DOCX transcript exporter.

pub mod config;
pub mod export;
pub mod llm;
pub mod sqlite;
