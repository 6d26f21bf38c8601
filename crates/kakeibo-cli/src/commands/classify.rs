//! Classify command implementation

use anyhow::{bail, Result};
use kakeibo_core::{CategoryClassifier, Category};

use super::load_classifier;

/// Classify descriptions given on the command line
pub async fn cmd_classify(descriptions: &[String]) -> Result<()> {
    let Some(classifier) = load_classifier()? else {
        bail!("No AI backend configured. Set OLLAMA_HOST, or AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST");
    };

    for (description, category) in classify_descriptions(&classifier, descriptions).await {
        println!("  \"{}\" → {}", description, category);
    }
    Ok(())
}

/// Classify with fallback, returning results in input order
pub async fn classify_descriptions(
    classifier: &CategoryClassifier,
    descriptions: &[String],
) -> Vec<(String, Category)> {
    let outcome = classifier.classify_or_default(descriptions).await;
    if let Some(ref reason) = outcome.fallback_reason {
        println!("⚠️  Classification failed, showing default category: {}", reason);
    }

    let default_category = classifier.config().default_category;
    descriptions
        .iter()
        .filter(|d| !d.trim().is_empty())
        .map(|d| {
            let category = outcome
                .assignment
                .get(d)
                .copied()
                .unwrap_or(default_category);
            (d.clone(), category)
        })
        .collect()
}
