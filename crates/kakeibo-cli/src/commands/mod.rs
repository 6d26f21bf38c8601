//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `formats` - Supported statement layouts
//! - `import` - Statement import with categorization and CSV export
//! - `classify` - Ad-hoc description classification
//! - `status` - Backend and configuration inspection

pub mod classify;
pub mod formats;
pub mod import;
pub mod status;

// Re-export command functions for main.rs
pub use classify::*;
pub use formats::*;
pub use import::*;
pub use status::*;

use anyhow::{Context, Result};
use kakeibo_core::{AIClient, CategoryClassifier, ClassifierConfig};

/// Build a classifier from the environment and the classifier config
///
/// Returns None when no AI backend is configured.
pub fn load_classifier() -> Result<Option<CategoryClassifier>> {
    let Some(ai) = AIClient::from_env() else {
        tracing::warn!("No AI backend configured (set OLLAMA_HOST or AI_BACKEND)");
        return Ok(None);
    };

    let (config, source) = ClassifierConfig::load().context("Failed to load classifier config")?;
    tracing::debug!(source = %source, "Loaded classifier config");

    let classifier =
        CategoryClassifier::new(ai, config).context("Failed to load classification prompt")?;
    Ok(Some(classifier))
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
