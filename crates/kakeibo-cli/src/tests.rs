//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;

use clap::Parser;
use kakeibo_core::{
    ai::{AIClient, MockBackend},
    prompts::{PromptId, PromptLibrary},
    Category, CategoryClassifier, ClassifierConfig, CsvFormat,
};

use crate::cli::{Cli, Commands};
use crate::commands::{self, truncate};

const STATEMENT: &str = "利用日,利用店名,利用金額\n\
                         2024/1/6,NETFLIX.COM,1490\n\
                         2024/1/7,ローソン,540\n\
                         2024/1/8,NO AMOUNT,free\n";

fn write_statement(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("statement.csv");
    fs::write(&path, STATEMENT).unwrap();
    path
}

fn mock_classifier(mock: &MockBackend) -> CategoryClassifier {
    let prompt = PromptLibrary::embedded_only()
        .get(PromptId::ClassifyCategories)
        .unwrap()
        .clone();
    CategoryClassifier::with_prompt(
        AIClient::Mock(mock.clone()),
        ClassifierConfig::default(),
        prompt,
    )
    .unwrap()
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_import_args() {
    let cli = Cli::try_parse_from([
        "kakeibo",
        "--verbose",
        "import",
        "--file",
        "statement.csv",
        "--format",
        "rakuten",
        "--no-classify",
        "--output",
        "out.csv",
    ])
    .unwrap();

    assert!(cli.verbose);
    match cli.command {
        Commands::Import {
            file,
            format,
            no_classify,
            output,
            errors,
            json,
        } => {
            assert_eq!(file.to_str(), Some("statement.csv"));
            assert_eq!(format, "rakuten");
            assert!(no_classify);
            assert_eq!(output.unwrap().to_str(), Some("out.csv"));
            assert!(errors.is_none());
            assert!(!json);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_parse_import_default_format() {
    let cli = Cli::try_parse_from(["kakeibo", "import", "-f", "a.csv"]).unwrap();
    match cli.command {
        Commands::Import { format, .. } => assert_eq!(format, "generic"),
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_parse_classify_requires_descriptions() {
    assert!(Cli::try_parse_from(["kakeibo", "classify"]).is_err());

    let cli = Cli::try_parse_from(["kakeibo", "classify", "NETFLIX.COM", "ローソン"]).unwrap();
    match cli.command {
        Commands::Classify { descriptions } => {
            assert_eq!(descriptions, vec!["NETFLIX.COM", "ローソン"]);
        }
        _ => panic!("expected classify command"),
    }
}

// ========== Import Command Tests ==========

#[tokio::test]
async fn test_import_file_with_mock_classifier() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(&dir);
    let mock = MockBackend::new();

    let report = commands::import_file(&path, CsvFormat::Generic, Some(&mock_classifier(&mock)))
        .await
        .unwrap();

    assert_eq!(report.transactions.len(), 2);
    assert_eq!(report.transactions[0].category, Category::Subscription);
    assert_eq!(report.transactions[1].category, Category::Food);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line_number, 4);
}

#[tokio::test]
async fn test_fallback_notice_names_configured_category() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(&dir);
    let prompt = PromptLibrary::embedded_only()
        .get(PromptId::ClassifyCategories)
        .unwrap()
        .clone();
    let config = ClassifierConfig {
        default_category: Category::DailyGoods,
        ..ClassifierConfig::default()
    };
    let classifier = CategoryClassifier::with_prompt(
        AIClient::Mock(MockBackend::quota_exceeded()),
        config,
        prompt,
    )
    .unwrap();

    let report = commands::import_file(&path, CsvFormat::Generic, Some(&classifier))
        .await
        .unwrap();

    assert!(report.classification_fallback);
    let notice = commands::fallback_notice(&report);
    assert!(notice.ends_with("every transaction was tagged Daily Goods"));
}

#[tokio::test]
async fn test_import_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::import_file(&dir.path().join("missing.csv"), CsvFormat::Generic, None).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to open file"));
}

#[tokio::test]
async fn test_cmd_import_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(&dir);
    let output = dir.path().join("out.csv");
    let errors = dir.path().join("errors.csv");

    commands::cmd_import(&path, "generic", true, Some(output.as_path()), Some(errors.as_path()), false)
        .await
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "date,description,amount,category\n\
         2024-01-06,NETFLIX.COM,1490,Other\n\
         2024-01-07,ローソン,540,Other\n"
    );

    let rejected = fs::read_to_string(&errors).unwrap();
    assert!(rejected.starts_with("line,content,message\n"));
    assert!(rejected.contains("4,\"2024/1/8,NO AMOUNT,free\",no valid amount found"));
}

#[tokio::test]
async fn test_cmd_import_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(&dir);

    let err = commands::cmd_import(&path, "mufg", true, None, None, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Use --format with one of"));
}

#[tokio::test]
async fn test_cmd_import_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(&dir);
    let result = commands::cmd_import(&path, "generic", true, None, None, true).await;
    assert!(result.is_ok());
}

// ========== Classify Command Tests ==========

#[tokio::test]
async fn test_classify_descriptions_in_order() {
    let mock = MockBackend::new();
    let descriptions = vec![
        "JR EAST".to_string(),
        " ".to_string(),
        "UNIQLO".to_string(),
        "JR EAST".to_string(),
    ];

    let results = commands::classify_descriptions(&mock_classifier(&mock), &descriptions).await;
    assert_eq!(
        results,
        vec![
            ("JR EAST".to_string(), Category::Transport),
            ("UNIQLO".to_string(), Category::Clothing),
            ("JR EAST".to_string(), Category::Transport),
        ]
    );
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_classify_descriptions_fallback() {
    let mock = MockBackend::quota_exceeded();
    let descriptions = vec!["JR EAST".to_string(), "UNIQLO".to_string()];

    let results = commands::classify_descriptions(&mock_classifier(&mock), &descriptions).await;
    assert!(results.iter().all(|(_, c)| *c == Category::Other));
}

// ========== Other Commands ==========

#[test]
fn test_cmd_formats() {
    assert!(commands::cmd_formats().is_ok());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
    assert_eq!(truncate("ローソン東京駅八重洲口店", 6), "ローソ...");
}
