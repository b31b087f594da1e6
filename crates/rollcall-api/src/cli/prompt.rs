//! Prompt catalog CLI commands: add, list.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use rollcall_core::gate::repository::RosterRepository;
use rollcall_types::roster::{PromptCategory, PromptRecord};

use crate::state::AppState;

#[derive(clap::Subcommand)]
pub enum PromptCommand {
    /// Add a catalog entry.
    Add {
        /// Catalog category: general or by-subject.
        #[arg(long, default_value = "general")]
        category: String,

        /// Subject this entry applies to (by-subject entries only).
        #[arg(long)]
        subject: Option<String>,

        /// The prompt text itself.
        #[arg(long)]
        text: String,
    },

    /// List catalog entries.
    List {
        /// Only entries in this category.
        #[arg(long)]
        category: Option<String>,
    },
}

/// Add an entry to the system prompt catalog.
pub async fn add_prompt(
    state: &AppState,
    category: &str,
    subject: Option<&str>,
    text: &str,
    json: bool,
) -> Result<()> {
    let category = category
        .parse::<PromptCategory>()
        .map_err(|e| anyhow::anyhow!(e))?;

    let record = state
        .chat_service
        .gate()
        .roster()
        .insert_prompt(&category, subject, text)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!();
        println!(
            "  {} Prompt #{} added to the {} catalog{}",
            style("✓").green().bold(),
            style(record.id).bold(),
            style(&record.category).cyan(),
            match &record.subject {
                Some(subject) => format!(" (subject: {})", style(subject).cyan()),
                None => String::new(),
            }
        );
        println!();
    }

    Ok(())
}

/// List catalog entries, optionally filtered by category.
pub async fn list_prompts(state: &AppState, category: Option<&str>, json: bool) -> Result<()> {
    let roster = state.chat_service.gate().roster();

    let records: Vec<PromptRecord> = match category {
        Some(raw) => {
            let category = raw.parse::<PromptCategory>().map_err(|e| anyhow::anyhow!(e))?;
            roster.list_prompts(&category).await?
        }
        None => {
            let mut all = roster.list_prompts(&PromptCategory::General).await?;
            all.extend(roster.list_prompts(&PromptCategory::BySubject).await?);
            all
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No prompts in the catalog. Add one with: {}",
            style("i").blue().bold(),
            style("rollcall prompt add --text \"...\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Category").fg(Color::White),
        Cell::new("Subject").fg(Color::White),
        Cell::new("Prompt").fg(Color::White),
    ]);

    for record in &records {
        table.add_row(vec![
            Cell::new(record.id.to_string()).fg(Color::DarkGrey),
            Cell::new(record.category.to_string()).fg(Color::Cyan),
            Cell::new(record.subject.as_deref().unwrap_or("-")),
            Cell::new(crate::cli::truncate(
                &record.prompt_text.replace('\n', " "),
                60,
            )),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} prompt{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
