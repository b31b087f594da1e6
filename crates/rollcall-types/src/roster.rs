//! Roster store record types for Rollcall.
//!
//! These types model the three durable tables behind the session gate:
//! the student roster, the prompt catalog, and the append-only chat log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A single row of the student roster.
///
/// The password is stored and compared in plaintext (the roster is an
/// operator-managed classroom list, not a public account system). It is
/// excluded from serialized output and redacted in `Debug` so it never
/// leaks through listings or logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Number of answered turns this student may consume in total.
    pub quota_limit: u32,
    /// Answered turns consumed so far. Monotonically non-decreasing.
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
}

impl StudentRecord {
    /// Turns still available under the quota.
    pub fn remaining(&self) -> u32 {
        self.quota_limit.saturating_sub(self.usage_count)
    }

    /// Whether the durable counter has reached the quota limit.
    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.quota_limit
    }
}

impl fmt::Debug for StudentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudentRecord")
            .field("student_id", &self.student_id)
            .field("password", &"<redacted>")
            .field("quota_limit", &self.quota_limit)
            .field("usage_count", &self.usage_count)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Category of a prompt catalog entry.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (category IN ('general', 'by-subject'))`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptCategory {
    /// Applies to every session regardless of subject.
    General,
    /// Applies only to sessions opened for a specific subject.
    BySubject,
}

impl fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptCategory::General => write!(f, "general"),
            PromptCategory::BySubject => write!(f, "by-subject"),
        }
    }
}

impl FromStr for PromptCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(PromptCategory::General),
            "by-subject" => Ok(PromptCategory::BySubject),
            other => Err(format!("invalid prompt category: '{other}'")),
        }
    }
}

impl Default for PromptCategory {
    fn default() -> Self {
        PromptCategory::General
    }
}

/// A single entry of the prompt catalog.
///
/// Multiple entries may share a category/subject pair; the gate joins all
/// matching prompt texts in store order to form one system instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: i64,
    pub category: PromptCategory,
    /// Present only for `by-subject` entries.
    pub subject: Option<String>,
    pub prompt_text: String,
}

/// One appended row of the chat log.
///
/// Append-only: rows are never updated or deleted. The timestamp is kept
/// as a pre-formatted local-time string, matching the log's presentation
/// contract rather than a machine timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub student_id: String,
    pub question: String,
    pub answer: String,
    pub logged_at: String,
}
