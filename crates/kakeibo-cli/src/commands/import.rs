//! Import command implementation

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use kakeibo_core::{
    ingest, write_errors_csv, write_transactions_csv, CategoryClassifier, CsvFormat, IngestReport,
};

use super::{load_classifier, truncate};

pub async fn cmd_import(
    file: &Path,
    format_str: &str,
    no_classify: bool,
    output: Option<&Path>,
    errors_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let format: CsvFormat = format_str.parse().with_context(|| {
        let known: Vec<&str> = CsvFormat::all().iter().map(|f| f.as_str()).collect();
        format!("Use --format with one of: {}", known.join(", "))
    })?;

    let classifier = if no_classify {
        None
    } else {
        load_classifier()?
    };

    let report = import_file(file, format, classifier.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(file, format, &report);
    }

    if let Some(path) = output {
        let out = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        write_transactions_csv(out, &report.transactions)
            .with_context(|| format!("Failed to write transactions to {}", path.display()))?;
        if !json {
            println!("💾 Transactions written to {}", path.display());
        }
    }

    if let Some(path) = errors_path {
        let out = File::create(path)
            .with_context(|| format!("Failed to create errors file: {}", path.display()))?;
        write_errors_csv(out, &report.errors)
            .with_context(|| format!("Failed to write errors to {}", path.display()))?;
        if !json {
            println!("💾 Rejected lines written to {}", path.display());
        }
    }

    Ok(())
}

/// Open a statement file and run the ingestion pipeline on it
pub async fn import_file(
    file: &Path,
    format: CsvFormat,
    classifier: Option<&CategoryClassifier>,
) -> Result<IngestReport> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    ingest(csv_file, format, classifier)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

/// Warning line shown when classification fell back to the default category
pub fn fallback_notice(report: &IngestReport) -> String {
    format!(
        "⚠️  Classification failed; every transaction was tagged {}",
        report.default_category
    )
}

fn print_report(file: &Path, format: CsvFormat, report: &IngestReport) {
    println!("📥 Imported {} ({})", file.display(), format);
    println!("   Transactions: {}", report.transactions.len());
    println!("   Total amount: ¥{}", report.total_amount());
    println!("   Rejected lines: {}", report.errors.len());

    if !report.transactions.is_empty() {
        println!();
        println!("🏷️  Categories:");
        for (category, count) in report.category_counts() {
            println!("   {:<15} {}", category.label(), count);
        }
    }

    if report.classification_fallback {
        println!();
        println!("{}", fallback_notice(report));
        if let Some(ref reason) = report.fallback_reason {
            println!("   Reason: {}", reason);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("❌ Rejected lines:");
        for err in &report.errors {
            println!("   line {}: {}", err.line_number, err.message);
            println!("      {}", truncate(&err.line_content, 70));
        }
    }
}
