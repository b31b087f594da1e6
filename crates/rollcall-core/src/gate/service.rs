//! Session gate service: the decision point for every chat turn.
//!
//! `SessionGate` validates credentials against the roster, authorizes each
//! turn against the session's quota mirror, and commits answered turns
//! durably (counter increment + log append in one store transaction).

use rollcall_types::chat::{Session, SessionStatus, Turn};
use rollcall_types::error::GateError;
use rollcall_types::roster::{ChatLogEntry, PromptCategory, StudentRecord};
use tracing::{debug, info, warn};

use crate::gate::repository::{RosterRepository, TurnCommit};

/// Format of the local-time strings written to the chat log.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decides, for each inbound chat turn, whether it may proceed, and keeps
/// the durable usage counter consistent with the turns actually answered.
///
/// Generic over `RosterRepository` to maintain clean architecture
/// (rollcall-core never depends on rollcall-infra).
pub struct SessionGate<R: RosterRepository> {
    roster: R,
}

impl<R: RosterRepository> SessionGate<R> {
    /// Create a new gate over the given roster store.
    pub fn new(roster: R) -> Self {
        Self { roster }
    }

    /// Access the roster repository.
    pub fn roster(&self) -> &R {
        &self.roster
    }

    /// Authenticate a student id/password pair against the roster.
    ///
    /// Succeeds only on an exact match of both fields against a single
    /// row. Unknown id and wrong password produce the same
    /// `InvalidCredentials` outcome so callers cannot probe which ids
    /// exist. Store failures propagate distinctly and deny access.
    pub async fn authenticate(
        &self,
        student_id: &str,
        password: &str,
    ) -> Result<StudentRecord, GateError> {
        let record = self.roster.find_student(student_id).await?;
        match record {
            Some(record) if record.password == password => {
                debug!(student_id = %record.student_id, "student authenticated");
                Ok(record)
            }
            _ => {
                // Same signal for both causes; log the id at debug only.
                debug!(student_id, "authentication rejected");
                Err(GateError::InvalidCredentials)
            }
        }
    }

    /// Authorize the next turn against the session's quota mirror.
    ///
    /// `QuotaExceeded` is terminal: once returned, every later call for
    /// the same session returns it again until the session is torn down.
    pub fn authorize_turn(&self, session: &mut Session) -> Result<(), GateError> {
        if session.status == SessionStatus::Exhausted {
            return Err(GateError::QuotaExceeded);
        }
        if session.usage_count >= session.quota_limit {
            session.status = SessionStatus::Exhausted;
            debug!(
                student_id = %session.student_id,
                usage = session.usage_count,
                limit = session.quota_limit,
                "turn denied; quota exhausted"
            );
            return Err(GateError::QuotaExceeded);
        }
        Ok(())
    }

    /// Durably record one answered turn and advance the session.
    ///
    /// On commit the session mirror adopts the store's authoritative
    /// count and the turn joins the in-memory conversation. If another
    /// process consumed the last quota slot since this session's mirror
    /// was last synced, the store refuses the increment; the session is
    /// then marked exhausted and the turn is discarded (neither counter
    /// nor log row was written).
    pub async fn record_turn(
        &self,
        session: &mut Session,
        question: &str,
        answer: &str,
        asked_at: &str,
    ) -> Result<Turn, GateError> {
        let entry = ChatLogEntry {
            student_id: session.student_id.clone(),
            question: question.to_string(),
            answer: answer.to_string(),
            logged_at: asked_at.to_string(),
        };

        match self.roster.commit_turn(&entry).await? {
            TurnCommit::Committed { usage_count } => {
                session.usage_count = usage_count;
                let turn = Turn {
                    question: entry.question,
                    answer: entry.answer,
                    asked_at: entry.logged_at,
                };
                session.turns.push(turn.clone());
                info!(
                    student_id = %session.student_id,
                    usage = usage_count,
                    limit = session.quota_limit,
                    "turn committed"
                );
                Ok(turn)
            }
            TurnCommit::QuotaExhausted { usage_count } => {
                session.usage_count = usage_count;
                session.status = SessionStatus::Exhausted;
                warn!(
                    student_id = %session.student_id,
                    usage = usage_count,
                    "turn refused at commit; durable counter already at limit"
                );
                Err(GateError::QuotaExceeded)
            }
        }
    }

    /// Build the system instruction for a session from the prompt catalog.
    ///
    /// Joins all matching prompt texts with newlines, in store order. The
    /// subject filter applies only when a subject is given. No match is
    /// not an error: the result is simply the empty string.
    pub async fn build_system_prompt(
        &self,
        category: &PromptCategory,
        subject: Option<&str>,
    ) -> Result<String, GateError> {
        let mut records = self.roster.list_prompts(category).await?;
        if let Some(subject) = subject {
            records.retain(|record| record.subject.as_deref() == Some(subject));
        }
        let prompt = records
            .iter()
            .map(|record| record.prompt_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        debug!(
            category = %category,
            subject = subject.unwrap_or("-"),
            matched = records.len(),
            "system prompt assembled"
        );
        Ok(prompt)
    }
}
