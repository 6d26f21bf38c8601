//! Kakeibo Core Library
//!
//! Card statement ingestion for a household budget:
//! - CSV import for several card issuers' export layouts
//! - Batch category classification through pluggable LLM backends
//!   (Ollama, OpenAI-compatible servers, mock)
//! - Prompt library for customizable AI prompts
//! - Classifier configuration with override files
//! - CSV export of categorized transactions and rejected lines

pub mod ai;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod import;
pub mod ingest;
pub mod models;
pub mod prompts;

/// Test utilities including a mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use classify::{CategoryAssignment, CategoryClassifier, ClassificationOutcome};
pub use config::{ClassifierConfig, ConfigSource, BATCH_SIZE};
pub use error::{Error, Result};
pub use export::{write_errors_csv, write_transactions_csv};
pub use formats::{CsvFormat, FormatDescriptor};
pub use import::{classify_line, parse_file, parse_row, parse_row_as_of, LineKind};
pub use ingest::{ingest, IngestReport};
pub use models::{
    CategorizedTransaction, Category, ParseError, ParseResult, ParsedTransaction, RowError,
};
pub use prompts::{Prompt, PromptId, PromptLibrary};
