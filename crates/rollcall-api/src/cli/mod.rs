//! CLI command definitions and dispatch for the `rollcall` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (e.g., `rollcall student add`, `rollcall prompt list`).

pub mod log;
pub mod prompt;
pub mod student;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub use log::LogCommand;
pub use prompt::PromptCommand;
pub use student::StudentCommand;

/// Quota-gated classroom chat service.
#[derive(Parser)]
#[command(name = "rollcall", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the student roster (add, list, reset-usage).
    Student {
        #[command(subcommand)]
        action: StudentCommand,
    },

    /// Manage the system prompt catalog (add, list).
    Prompt {
        #[command(subcommand)]
        action: PromptCommand,
    },

    /// Inspect the chat log.
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Shorten text for a single table cell, on a character boundary.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_text_gets_ellipsis() {
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // Hangul is three bytes per char; byte slicing would panic here.
        assert_eq!(truncate("안녕하세요 반갑습니다", 8), "안녕하세요...");
    }
}
