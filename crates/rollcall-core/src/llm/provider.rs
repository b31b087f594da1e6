//! CompletionProvider trait definition.
//!
//! The abstraction over hosted completion backends. The contract is a
//! single non-streaming exchange: one ordered conversation in, one reply
//! out. Retry on transient failure is layered on top (see `retry`), not
//! an obligation of implementations.

use rollcall_types::llm::{CompletionError, CompletionRequest, CompletionResponse};

/// Trait for completion provider backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in rollcall-infra (e.g., `OpenAiProvider`).
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a conversation and receive the full reply.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, CompletionError>> + Send;
}
