//! SQLite roster repository implementation.
//!
//! Implements `RosterRepository` from `rollcall-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, mutations on the single-connection writer pool.
//!
//! The turn commit is the one multi-statement operation: a guarded counter
//! increment plus a log append inside a single writer transaction, so the
//! log never gains a row the counter does not cover.

use chrono::{DateTime, Utc};
use sqlx::Row;

use rollcall_core::gate::repository::{RosterRepository, TurnCommit};
use rollcall_types::error::StoreError;
use rollcall_types::roster::{ChatLogEntry, PromptCategory, PromptRecord, StudentRecord};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RosterRepository`.
pub struct SqliteRosterRepository {
    pool: DatabasePool,
}

impl SqliteRosterRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain StudentRecord.
struct StudentRow {
    student_id: String,
    password: String,
    quota_limit: i64,
    usage_count: i64,
    created_at: String,
}

impl StudentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            student_id: row.try_get("student_id")?,
            password: row.try_get("password")?,
            quota_limit: row.try_get("quota_limit")?,
            usage_count: row.try_get("usage_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<StudentRecord, StoreError> {
        let created_at = parse_datetime(&self.created_at)?;

        Ok(StudentRecord {
            student_id: self.student_id,
            password: self.password,
            quota_limit: self.quota_limit as u32,
            usage_count: self.usage_count as u32,
            created_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain PromptRecord.
struct PromptRow {
    id: i64,
    category: String,
    subject: Option<String>,
    prompt_text: String,
}

impl PromptRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            category: row.try_get("category")?,
            subject: row.try_get("subject")?,
            prompt_text: row.try_get("prompt_text")?,
        })
    }

    fn into_record(self) -> Result<PromptRecord, StoreError> {
        let category: PromptCategory = self
            .category
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;

        Ok(PromptRecord {
            id: self.id,
            category,
            subject: self.subject,
            prompt_text: self.prompt_text,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatLogEntry.
///
/// `logged_at` is a pre-formatted local-time string and is stored and read
/// back verbatim.
struct ChatLogRow {
    student_id: String,
    question: String,
    answer: String,
    logged_at: String,
}

impl ChatLogRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            student_id: row.try_get("student_id")?,
            question: row.try_get("question")?,
            answer: row.try_get("answer")?,
            logged_at: row.try_get("logged_at")?,
        })
    }

    fn into_entry(self) -> ChatLogEntry {
        ChatLogEntry {
            student_id: self.student_id,
            question: self.question,
            answer: self.answer,
            logged_at: self.logged_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// RosterRepository implementation
// ---------------------------------------------------------------------------

impl RosterRepository for SqliteRosterRepository {
    async fn find_student(&self, student_id: &str) -> Result<Option<StudentRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT student_id, password, quota_limit, usage_count, created_at FROM students WHERE student_id = ?",
        )
        .bind(student_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let student_row =
                    StudentRow::from_row(&row).map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(student_row.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_student(&self, record: &StudentRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO students (student_id, password, quota_limit, usage_count, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&record.student_id)
        .bind(&record.password)
        .bind(record.quota_limit as i64)
        .bind(record.usage_count as i64)
        .bind(format_datetime(&record.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("student '{}' already exists", record.student_id))
            }
            _ => StoreError::Query(e.to_string()),
        })?;

        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT student_id, password, quota_limit, usage_count, created_at FROM students ORDER BY student_id",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                StudentRow::from_row(row)
                    .map_err(|e| StoreError::Query(e.to_string()))?
                    .into_record()
            })
            .collect()
    }

    async fn reset_usage(&self, student_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE students SET usage_count = 0 WHERE student_id = ?")
            .bind(student_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_prompts(
        &self,
        category: &PromptCategory,
    ) -> Result<Vec<PromptRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, category, subject, prompt_text FROM prompts WHERE category = ? ORDER BY id",
        )
        .bind(category.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                PromptRow::from_row(row)
                    .map_err(|e| StoreError::Query(e.to_string()))?
                    .into_record()
            })
            .collect()
    }

    async fn insert_prompt(
        &self,
        category: &PromptCategory,
        subject: Option<&str>,
        prompt_text: &str,
    ) -> Result<PromptRecord, StoreError> {
        let result = sqlx::query(
            "INSERT INTO prompts (category, subject, prompt_text) VALUES (?, ?, ?)",
        )
        .bind(category.to_string())
        .bind(subject)
        .bind(prompt_text)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(PromptRecord {
            id: result.last_insert_rowid(),
            category: category.clone(),
            subject: subject.map(str::to_string),
            prompt_text: prompt_text.to_string(),
        })
    }

    async fn commit_turn(&self, entry: &ChatLogEntry) -> Result<TurnCommit, StoreError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        // Guarded increment: refuses when the counter is already at the limit.
        let updated = sqlx::query(
            r#"UPDATE students SET usage_count = usage_count + 1
               WHERE student_id = ? AND usage_count < quota_limit"#,
        )
        .bind(&entry.student_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if updated.rows_affected() == 0 {
            // Unknown student or exhausted quota. Read back to tell the
            // two apart, then write nothing.
            let row = sqlx::query("SELECT usage_count FROM students WHERE student_id = ?")
                .bind(&entry.student_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            tx.rollback()
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            return match row {
                Some(row) => {
                    let usage_count: i64 = row
                        .try_get("usage_count")
                        .map_err(|e| StoreError::Query(e.to_string()))?;
                    Ok(TurnCommit::QuotaExhausted {
                        usage_count: usage_count as u32,
                    })
                }
                None => Err(StoreError::NotFound),
            };
        }

        sqlx::query(
            "INSERT INTO chat_log (student_id, question, answer, logged_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.student_id)
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(&entry.logged_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT usage_count FROM students WHERE student_id = ?")
            .bind(&entry.student_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let usage_count: i64 = row
            .try_get("usage_count")
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(TurnCommit::Committed {
            usage_count: usage_count as u32,
        })
    }

    async fn list_log(
        &self,
        student_id: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ChatLogEntry>, StoreError> {
        let mut sql =
            String::from("SELECT student_id, question, answer, logged_at FROM chat_log");
        if student_id.is_some() {
            sql.push_str(" WHERE student_id = ?");
        }
        sql.push_str(" ORDER BY id DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(student_id) = student_id {
            query = query.bind(student_id);
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(ChatLogRow::from_row(row)
                    .map_err(|e| StoreError::Query(e.to_string()))?
                    .into_entry())
            })
            .collect()
    }

    async fn count_log(&self) -> Result<u64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_log")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.0 as u64)
    }
}
