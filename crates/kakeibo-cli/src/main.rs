//! Kakeibo CLI - Card statement ingestion for a household budget
//!
//! Usage:
//!   kakeibo formats                              List supported card formats
//!   kakeibo import --file CSV --format smbc      Parse and categorize a statement
//!   kakeibo classify "NETFLIX.COM" "ローソン"     Classify descriptions directly
//!   kakeibo backend                              Show the configured AI backend

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so `import --json` output stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Formats => commands::cmd_formats(),
        Commands::Import {
            file,
            format,
            no_classify,
            output,
            errors,
            json,
        } => {
            commands::cmd_import(
                &file,
                &format,
                no_classify,
                output.as_deref(),
                errors.as_deref(),
                json,
            )
            .await
        }
        Commands::Classify { descriptions } => commands::cmd_classify(&descriptions).await,
        Commands::Backend => commands::cmd_backend().await,
        Commands::Config => commands::cmd_config(),
    }
}
