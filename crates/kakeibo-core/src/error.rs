//! Error types for Kakeibo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported card format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Classification quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Classification service error: {0}")]
    Service(String),

    #[error("Invalid classification response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Whether this error is one a classification chunk can fail with.
    ///
    /// The ingestion pipeline only falls back to the default category for
    /// these; anything else is a programming or configuration problem.
    pub fn is_classification_failure(&self) -> bool {
        matches!(
            self,
            Error::QuotaExceeded(_)
                | Error::Service(_)
                | Error::InvalidResponse(_)
                | Error::Http(_)
                | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
