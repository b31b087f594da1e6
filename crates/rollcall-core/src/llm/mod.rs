//! Completion provider abstraction and retry policy.

pub mod provider;
pub mod retry;

pub use provider::CompletionProvider;
pub use retry::{RetryPolicy, complete_with_retry};
