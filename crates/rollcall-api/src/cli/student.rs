//! Student roster CLI commands: add, list, reset-usage.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;

use rollcall_core::gate::repository::RosterRepository;
use rollcall_types::error::StoreError;
use rollcall_types::roster::StudentRecord;

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum StudentCommand {
    /// Register a student in the roster.
    Add {
        /// Student identifier (e.g., a roll number).
        student_id: String,

        /// Total answered turns this student may consume.
        #[arg(long, default_value_t = 3)]
        quota: u32,

        /// Password (read from a confirmed hidden prompt when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// List the roster with quota usage.
    List,

    /// Reset a student's usage counter to zero.
    #[command(name = "reset-usage")]
    ResetUsage {
        /// Student identifier to reset.
        student_id: String,
    },
}

/// Register a student with a hidden, confirmed password prompt.
///
/// # Examples
///
/// ```bash
/// # Interactive prompt (recommended)
/// rollcall student add S001 --quota 3
///
/// # Script/automation mode
/// rollcall student add S001 --quota 3 --password pw123
/// ```
pub async fn add_student(
    state: &AppState,
    student_id: &str,
    quota: u32,
    password: Option<&str>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => Password::new()
            .with_prompt(format!("Password for {}", style(student_id).bold()))
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let record = StudentRecord {
        student_id: student_id.to_string(),
        password,
        quota_limit: quota,
        usage_count: 0,
        created_at: chrono::Utc::now(),
    };

    match state
        .chat_service
        .gate()
        .roster()
        .insert_student(&record)
        .await
    {
        Ok(()) => {}
        Err(StoreError::Conflict(id)) => {
            anyhow::bail!("student '{id}' is already registered");
        }
        Err(e) => return Err(e.into()),
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "added": true,
                "student_id": record.student_id,
                "quota_limit": record.quota_limit,
            })
        );
    } else {
        println!();
        println!(
            "  {} Student '{}' registered ({} turns)",
            style("✓").green().bold(),
            style(&record.student_id).cyan(),
            style(record.quota_limit).bold()
        );
        println!();
    }

    Ok(())
}

/// List all students in a rich colored table.
pub async fn list_students(state: &AppState, json: bool) -> Result<()> {
    let students = state.chat_service.gate().roster().list_students().await?;

    if json {
        // Passwords never serialize.
        println!("{}", serde_json::to_string_pretty(&students)?);
        return Ok(());
    }

    if students.is_empty() {
        println!();
        println!(
            "  {} No students registered. Add one with: {}",
            style("i").blue().bold(),
            style("rollcall student add <id>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Student").fg(Color::White),
        Cell::new("Quota").fg(Color::White),
        Cell::new("Used").fg(Color::White),
        Cell::new("Remaining").fg(Color::White),
        Cell::new("Registered").fg(Color::White),
    ]);

    for student in &students {
        let used_cell = if student.is_exhausted() {
            Cell::new(format!("{} (exhausted)", student.usage_count)).fg(Color::Red)
        } else {
            Cell::new(student.usage_count.to_string()).fg(Color::Green)
        };

        table.add_row(vec![
            Cell::new(&student.student_id).fg(Color::Cyan),
            Cell::new(student.quota_limit.to_string()),
            used_cell,
            Cell::new(student.remaining().to_string()),
            Cell::new(student.created_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} student{}",
        style(students.len()).bold(),
        if students.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Reset a student's durable usage counter to zero.
///
/// Live sessions are not touched: a session already marked exhausted
/// stays exhausted until the student logs in again.
pub async fn reset_usage(state: &AppState, student_id: &str, json: bool) -> Result<()> {
    match state
        .chat_service
        .gate()
        .roster()
        .reset_usage(student_id)
        .await
    {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            anyhow::bail!("no student with id '{student_id}'");
        }
        Err(e) => return Err(e.into()),
    }

    if json {
        println!(
            "{}",
            serde_json::json!({"reset": true, "student_id": student_id})
        );
    } else {
        println!();
        println!(
            "  {} Usage counter for '{}' reset to 0",
            style("✓").green().bold(),
            style(student_id).cyan()
        );
        println!();
    }

    Ok(())
}
