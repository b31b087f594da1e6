//! Chat log CLI commands: tail.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use rollcall_core::gate::repository::RosterRepository;

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum LogCommand {
    /// Show the newest chat log entries.
    Tail {
        /// Only entries for this student.
        #[arg(long)]
        student: Option<String>,

        /// Maximum entries to show.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

/// Show the newest chat log entries, newest first.
pub async fn tail(state: &AppState, student: Option<&str>, limit: i64, json: bool) -> Result<()> {
    let roster = state.chat_service.gate().roster();
    let entries = roster.list_log(student, Some(limit)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!("  {} Chat log is empty.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Student").fg(Color::White),
        Cell::new("Logged At").fg(Color::White),
        Cell::new("Question").fg(Color::White),
        Cell::new("Answer").fg(Color::White),
    ]);

    for entry in &entries {
        table.add_row(vec![
            Cell::new(&entry.student_id).fg(Color::Cyan),
            Cell::new(&entry.logged_at).fg(Color::DarkGrey),
            Cell::new(crate::cli::truncate(&entry.question.replace('\n', " "), 40)),
            Cell::new(crate::cli::truncate(&entry.answer.replace('\n', " "), 40)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    match student {
        Some(_) => {
            println!(
                "  {} entr{} shown",
                style(entries.len()).bold(),
                if entries.len() == 1 { "y" } else { "ies" }
            );
        }
        None => {
            let total = roster.count_log().await?;
            println!(
                "  {} of {} entr{} shown",
                style(entries.len()).bold(),
                style(total).bold(),
                if total == 1 { "y" } else { "ies" }
            );
        }
    }
    println!();

    Ok(())
}
