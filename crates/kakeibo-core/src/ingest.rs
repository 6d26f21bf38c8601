//! Ingestion pipeline: parse a statement, classify its rows, merge
//!
//! Parsing is partial-success per row and classification falls back to the
//! default category, so the only error that aborts an ingest is a failure of
//! the input stream itself (or an unusable format).

use std::io::Read;

use serde::Serialize;
use tracing::info;

use crate::classify::CategoryClassifier;
use crate::error::Result;
use crate::formats::CsvFormat;
use crate::import::parse_file;
use crate::models::{CategorizedTransaction, Category, ParseError};

/// Everything an ingest produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub transactions: Vec<CategorizedTransaction>,
    pub errors: Vec<ParseError>,
    /// True when classification failed and every row got the default category
    pub classification_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Category given to rows the classifier could not label
    pub default_category: Category,
}

impl IngestReport {
    /// Number of transactions per category, in category order
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        Category::all()
            .iter()
            .map(|category| {
                let count = self
                    .transactions
                    .iter()
                    .filter(|tx| tx.category == *category)
                    .count();
                (*category, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Sum of all imported amounts
    pub fn total_amount(&self) -> i64 {
        self.transactions
            .iter()
            .map(|tx| tx.transaction.amount())
            .sum()
    }
}

/// Parse `reader` as `format` and categorize the valid rows
///
/// With no classifier every row gets `Category::Other` and the report does
/// not count that as a fallback.
pub async fn ingest<R: Read>(
    reader: R,
    format: CsvFormat,
    classifier: Option<&CategoryClassifier>,
) -> Result<IngestReport> {
    let parsed = parse_file(reader, format)?;

    let Some(classifier) = classifier else {
        return Ok(IngestReport {
            transactions: parsed
                .valid_transactions
                .into_iter()
                .map(|transaction| CategorizedTransaction {
                    transaction,
                    category: Category::Other,
                })
                .collect(),
            errors: parsed.errors,
            ..IngestReport::default()
        });
    };

    let descriptions: Vec<&str> = parsed
        .valid_transactions
        .iter()
        .map(|tx| tx.description())
        .collect();
    let outcome = classifier.classify_or_default(&descriptions).await;
    let default_category = classifier.config().default_category;

    let transactions: Vec<CategorizedTransaction> = parsed
        .valid_transactions
        .into_iter()
        .map(|transaction| {
            let category = outcome
                .assignment
                .get(transaction.description())
                .copied()
                .unwrap_or(default_category);
            CategorizedTransaction {
                transaction,
                category,
            }
        })
        .collect();

    info!(
        format = %format,
        imported = transactions.len(),
        errors = parsed.errors.len(),
        fallback = outcome.is_fallback(),
        "Ingest complete"
    );

    Ok(IngestReport {
        transactions,
        errors: parsed.errors,
        classification_fallback: outcome.is_fallback(),
        fallback_reason: outcome.fallback_reason,
        default_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::config::ClassifierConfig;
    use crate::prompts::{PromptId, PromptLibrary};

    const STATEMENT: &str = "2024/1/6,NETFLIX.COM,1490,１,１,1490,\n\
                             2024/1/7,ローソン,540,１,１,540,\n\
                             2024/1/8,BROKEN ROW\n\
                             2024/1/9,JR EAST,220,１,１,220,\n";

    fn classifier(mock: &MockBackend) -> CategoryClassifier {
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

    #[tokio::test]
    async fn test_ingest_classifies_valid_rows() {
        let mock = MockBackend::new();
        let report = ingest(STATEMENT.as_bytes(), CsvFormat::Generic, Some(&classifier(&mock)))
            .await
            .unwrap();

        // Generic skips line 1 as a header
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line_number, 3);
        assert!(!report.classification_fallback);

        assert_eq!(report.transactions[0].transaction.description(), "ローソン");
        assert_eq!(report.transactions[0].category, Category::Food);
        assert_eq!(report.transactions[1].category, Category::Transport);
        assert_eq!(report.total_amount(), 760);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ingest_falls_back_on_service_error() {
        let mock = MockBackend::service_error();
        let report = ingest(
            STATEMENT.as_bytes(),
            CsvFormat::Generic,
            Some(&classifier(&mock)),
        )
        .await
        .unwrap();

        assert!(report.classification_fallback);
        assert!(report.fallback_reason.is_some());
        assert_eq!(report.transactions.len(), 2);
        assert!(report
            .transactions
            .iter()
            .all(|tx| tx.category == Category::Other));
        assert_eq!(report.category_counts(), vec![(Category::Other, 2)]);
    }

    #[tokio::test]
    async fn test_ingest_fallback_uses_configured_default() {
        let mock = MockBackend::service_error();
        let prompt = PromptLibrary::embedded_only()
            .get(PromptId::ClassifyCategories)
            .unwrap()
            .clone();
        let config = ClassifierConfig {
            default_category: Category::DailyGoods,
            ..ClassifierConfig::default()
        };
        let classifier =
            CategoryClassifier::with_prompt(AIClient::Mock(mock), config, prompt).unwrap();

        let report = ingest(STATEMENT.as_bytes(), CsvFormat::Generic, Some(&classifier))
            .await
            .unwrap();

        assert!(report.classification_fallback);
        assert_eq!(report.default_category, Category::DailyGoods);
        assert_eq!(report.category_counts(), vec![(Category::DailyGoods, 2)]);
    }

    #[tokio::test]
    async fn test_ingest_without_classifier() {
        let report = ingest(STATEMENT.as_bytes(), CsvFormat::Generic, None)
            .await
            .unwrap();
        assert!(!report.classification_fallback);
        assert_eq!(report.transactions.len(), 2);
        assert!(report
            .transactions
            .iter()
            .all(|tx| tx.category == Category::Other));
    }

    #[tokio::test]
    async fn test_ingest_report_serializes() {
        let report = ingest(STATEMENT.as_bytes(), CsvFormat::Generic, None)
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["transactions"][0]["description"], "ローソン");
        assert_eq!(json["transactions"][0]["category"], "Other");
        assert_eq!(json["errors"][0]["line_number"], 3);
        assert!(json.get("fallback_reason").is_none());
        assert_eq!(json["default_category"], "Other");
    }
}
