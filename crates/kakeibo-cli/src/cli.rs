//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kakeibo - Household budget from card statements
#[derive(Parser)]
#[command(name = "kakeibo")]
#[command(about = "Import card statements and categorize spending", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported card statement formats
    Formats,

    /// Parse a card statement and categorize its transactions
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Statement format (see `kakeibo formats`)
        #[arg(long, default_value = "generic")]
        format: String,

        /// Skip AI classification (every transaction gets "Other")
        #[arg(long)]
        no_classify: bool,

        /// Write categorized transactions to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write rejected lines to this CSV file
        #[arg(long)]
        errors: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify transaction descriptions
    Classify {
        /// Descriptions to classify
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Show the configured AI backend and check its health
    Backend,

    /// Show the effective classifier configuration
    Config,
}
