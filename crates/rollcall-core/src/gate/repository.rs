//! RosterRepository trait definition.
//!
//! Provides lookup and mutation operations over the three durable tables:
//! student roster, prompt catalog, and chat log.

use rollcall_types::error::StoreError;
use rollcall_types::roster::{ChatLogEntry, PromptCategory, PromptRecord, StudentRecord};

/// Outcome of a durable turn commit.
///
/// Both arms carry the store's authoritative usage count so callers can
/// re-sync a stale session mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnCommit {
    /// Counter incremented and exactly one log row appended.
    Committed { usage_count: u32 },
    /// The durable counter was already at the quota limit; nothing was
    /// written.
    QuotaExhausted { usage_count: u32 },
}

/// Repository trait for the roster store.
///
/// Implementations live in rollcall-infra (e.g., `SqliteRosterRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait RosterRepository: Send + Sync {
    /// Look up a student by id. `Ok(None)` when no row matches.
    fn find_student(
        &self,
        student_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<StudentRecord>, StoreError>> + Send;

    /// Add a student to the roster. Fails with `Conflict` on a duplicate id.
    fn insert_student(
        &self,
        record: &StudentRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List the full roster, ordered by student id.
    fn list_students(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<StudentRecord>, StoreError>> + Send;

    /// Reset a student's usage counter to zero.
    fn reset_usage(
        &self,
        student_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List prompt catalog entries for a category, in store (insertion) order.
    fn list_prompts(
        &self,
        category: &PromptCategory,
    ) -> impl std::future::Future<Output = Result<Vec<PromptRecord>, StoreError>> + Send;

    /// Append an entry to the prompt catalog.
    fn insert_prompt(
        &self,
        category: &PromptCategory,
        subject: Option<&str>,
        prompt_text: &str,
    ) -> impl std::future::Future<Output = Result<PromptRecord, StoreError>> + Send;

    /// Durably commit one answered turn: increment the student's usage
    /// counter and append the log row in a single transaction.
    ///
    /// The increment is guarded (`usage_count < quota_limit`); when the
    /// counter is already at the limit the commit writes nothing and
    /// reports `QuotaExhausted` with the current count.
    fn commit_turn(
        &self,
        entry: &ChatLogEntry,
    ) -> impl std::future::Future<Output = Result<TurnCommit, StoreError>> + Send;

    /// Read back chat log rows, newest first, optionally filtered by
    /// student id.
    fn list_log(
        &self,
        student_id: Option<&str>,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatLogEntry>, StoreError>> + Send;

    /// Count chat log rows across all students.
    fn count_log(&self) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
