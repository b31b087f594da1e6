//! Session and turn types for Rollcall.
//!
//! A session is the ephemeral, process-local state created at login:
//! the authenticated student, a mirror of the durable usage counter, and
//! the in-memory conversation. Nothing here is ever persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Lifecycle status of a session.
///
/// `Exhausted` is terminal: once the quota is spent the session can only
/// be torn down; a fresh login is required for a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Exhausted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Exhausted => write!(f, "exhausted"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "exhausted" => Ok(SessionStatus::Exhausted),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// One question/answer exchange within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    /// Local-time string as it appears in the chat log.
    pub asked_at: String,
}

/// Ephemeral per-login conversation state.
///
/// Holds the authenticated student's identifier and a mirror of the
/// durable usage counter. The mirror is advanced only when a turn commits
/// durably, and re-synced from the store's authoritative count whenever
/// the two disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub student_id: String,
    pub quota_limit: u32,
    /// Mirror of the durable usage counter at last commit.
    pub usage_count: u32,
    pub status: SessionStatus,
    /// System instruction built from the prompt catalog at login.
    /// May legitimately be empty when no catalog entry matched.
    pub system_prompt: String,
    pub started_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

impl Session {
    /// Open a session for an authenticated student.
    pub fn new(
        student_id: impl Into<String>,
        quota_limit: u32,
        usage_count: u32,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            student_id: student_id.into(),
            quota_limit,
            usage_count,
            status: SessionStatus::Active,
            system_prompt: system_prompt.into(),
            started_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    /// Turns still available under the quota.
    pub fn remaining(&self) -> u32 {
        self.quota_limit.saturating_sub(self.usage_count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.status == SessionStatus::Exhausted
    }

    /// Drop the in-memory conversation without touching the usage counter.
    pub fn clear_turns(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in [SessionStatus::Active, SessionStatus::Exhausted] {
            let s = status.to_string();
            let parsed: SessionStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_session_status_serde() {
        let status = SessionStatus::Exhausted;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"exhausted\"");
        let parsed: SessionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SessionStatus::Exhausted);
    }

    #[test]
    fn test_session_status_default() {
        assert_eq!(SessionStatus::default(), SessionStatus::Active);
    }

    #[test]
    fn test_message_role_reexport() {
        // Verify MessageRole is accessible from the chat module.
        let role = MessageRole::User;
        assert_eq!(role.to_string(), "user");
    }

    #[test]
    fn test_new_session_starts_active_and_empty() {
        let session = Session::new("S001", 3, 0, "Be helpful.");
        assert_eq!(session.student_id, "S001");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.remaining(), 3);
        assert!(session.turns.is_empty());
    }

    #[test]
    fn test_session_remaining_saturates() {
        let mut session = Session::new("S001", 3, 3, "");
        assert_eq!(session.remaining(), 0);
        // A mirror past the limit (stale session, limit lowered) stays at zero.
        session.usage_count = 5;
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_clear_turns_keeps_usage() {
        let mut session = Session::new("S001", 3, 2, "");
        session.turns.push(Turn {
            question: "q".to_string(),
            answer: "a".to_string(),
            asked_at: "2025-08-10 14:02:33".to_string(),
        });
        session.clear_turns();
        assert!(session.turns.is_empty());
        assert_eq!(session.usage_count, 2);
    }
}
