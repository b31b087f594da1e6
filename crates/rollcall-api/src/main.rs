//! Rollcall CLI and REST API entry point.
//!
//! Binary name: `rollcall`
//!
//! Parses CLI arguments, initializes the roster store and services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, LogCommand, PromptCommand, StudentCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,rollcall_core=debug,rollcall_infra=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rollcall", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (config, store, provider)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Student { action } => match action {
            StudentCommand::Add {
                student_id,
                quota,
                password,
            } => {
                cli::student::add_student(&state, &student_id, quota, password.as_deref(), cli.json)
                    .await?;
            }
            StudentCommand::List => {
                cli::student::list_students(&state, cli.json).await?;
            }
            StudentCommand::ResetUsage { student_id } => {
                cli::student::reset_usage(&state, &student_id, cli.json).await?;
            }
        },

        Commands::Prompt { action } => match action {
            PromptCommand::Add {
                category,
                subject,
                text,
            } => {
                cli::prompt::add_prompt(&state, &category, subject.as_deref(), &text, cli.json)
                    .await?;
            }
            PromptCommand::List { category } => {
                cli::prompt::list_prompts(&state, category.as_deref(), cli.json).await?;
            }
        },

        Commands::Log { action } => match action {
            LogCommand::Tail { student, limit } => {
                cli::log::tail(&state, student.as_deref(), limit, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Rollcall API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {}",
                console::style(format!("data dir: {}", state.data_dir.display())).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
