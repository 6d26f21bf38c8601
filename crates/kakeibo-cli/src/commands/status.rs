//! Backend and configuration inspection commands

use anyhow::{Context, Result};
use kakeibo_core::{
    config::default_config_path,
    prompts::{default_prompts_dir, PromptId, PromptLibrary},
    AIBackend, AIClient, ClassifierConfig,
};

/// Show the configured AI backend and check that it responds
pub async fn cmd_backend() -> Result<()> {
    println!();
    println!("🤖 AI Backend");
    println!("   ─────────────────────────────────────────────────────────────");

    let selected = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());
    println!("   AI_BACKEND: {}", selected);

    let Some(client) = AIClient::from_env() else {
        println!("   ⚠️  Not configured");
        println!();
        println!("   To use Ollama:");
        println!("     export OLLAMA_HOST=http://localhost:11434");
        println!("   To use an OpenAI-compatible server:");
        println!("     export AI_BACKEND=openai_compatible");
        println!("     export OPENAI_COMPATIBLE_HOST=https://api.openai.com");
        return Ok(());
    };

    println!("   Backend: {}", client.kind());
    println!("   Model: {}", client.model());
    println!("   Host: {}", client.host());

    if client.health_check().await {
        println!("   ✅ Healthy");
    } else {
        println!("   ❌ Not responding");
    }

    Ok(())
}

/// Show the effective classifier configuration and prompt overrides
pub fn cmd_config() -> Result<()> {
    let (config, source) = ClassifierConfig::load().context("Failed to load classifier config")?;

    println!();
    println!("⚙️  Classifier Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);
    println!("   Batch size: {}", config.batch_size);
    println!("   Max concurrency: {}", config.max_concurrency);
    println!("   Default category: {}", config.default_category);
    println!(
        "   Override file: {}",
        default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    println!();
    println!("📝 Prompts");
    let mut library = PromptLibrary::new();
    for id in PromptId::all() {
        let prompt = library
            .get(*id)
            .with_context(|| format!("Failed to load prompt {}", id.as_str()))?;
        let origin = if prompt.is_override() {
            "✓ Custom"
        } else {
            "Default"
        };
        println!(
            "   {} v{} ({})",
            id.as_str(),
            prompt.metadata.version,
            origin
        );
    }
    println!(
        "   Override directory: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    Ok(())
}
