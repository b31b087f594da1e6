//! OpenAI completion provider implementation.
//!
//! This module provides the [`OpenAiProvider`] which implements the
//! [`CompletionProvider`](rollcall_core::llm::provider::CompletionProvider)
//! trait for the Chat Completions API, non-streaming only.

pub mod client;
pub mod types;

pub use client::OpenAiProvider;
