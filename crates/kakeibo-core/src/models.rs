//! Data models for Kakeibo

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spending categories
///
/// Closed set: the classification prompt lists exactly these labels and any
/// label outside the set resolves to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Food,
    #[serde(rename = "Daily Goods")]
    DailyGoods,
    Transport,
    Housing,
    Utilities,
    Communication,
    Entertainment,
    Medical,
    Clothing,
    Education,
    Insurance,
    Subscription,
    #[default]
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::DailyGoods => "Daily Goods",
            Self::Transport => "Transport",
            Self::Housing => "Housing",
            Self::Utilities => "Utilities",
            Self::Communication => "Communication",
            Self::Entertainment => "Entertainment",
            Self::Medical => "Medical",
            Self::Clothing => "Clothing",
            Self::Education => "Education",
            Self::Insurance => "Insurance",
            Self::Subscription => "Subscription",
            Self::Other => "Other",
        }
    }

    /// Get all categories in prompt order
    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::DailyGoods,
            Self::Transport,
            Self::Housing,
            Self::Utilities,
            Self::Communication,
            Self::Entertainment,
            Self::Medical,
            Self::Clothing,
            Self::Education,
            Self::Insurance,
            Self::Subscription,
            Self::Other,
        ]
    }

    /// Resolve a label returned by the classifier
    ///
    /// Matching ignores case and spaces, so the variant spelling
    /// `DailyGoods` resolves the same as the label `Daily Goods`.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        if wanted.is_empty() {
            return None;
        }
        Self::all().iter().copied().find(|c| {
            let known: String = c.label().chars().filter(|c| *c != ' ').collect();
            known.eq_ignore_ascii_case(&wanted)
        })
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Why a candidate transaction line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("insufficient columns: expected at least {expected}, found {found}")]
    InsufficientColumns { expected: usize, found: usize },

    #[error("date is empty")]
    EmptyDate,

    #[error("invalid date format: {0}")]
    InvalidDate(String),

    #[error("date is in the future: {0}")]
    FutureDate(NaiveDate),

    #[error("no valid amount found")]
    NoAmount,

    #[error("cannot determine description range (amount column {amount_column}, gap {gap})")]
    DescriptionRange { amount_column: usize, gap: usize },

    #[error("store name is empty")]
    EmptyDescription,

    #[error("amount must be positive: {0}")]
    NonPositiveAmount(i64),
}

/// A normalized transaction produced from one CSV row
///
/// Fields are private so every instance has passed `ParsedTransaction::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTransaction {
    description: String,
    date: NaiveDate,
    amount: i64,
}

impl ParsedTransaction {
    /// Build a transaction, enforcing the row invariants against `today`
    pub fn new(
        description: &str,
        date: NaiveDate,
        amount: i64,
        today: NaiveDate,
    ) -> std::result::Result<Self, RowError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(RowError::EmptyDescription);
        }
        if amount <= 0 {
            return Err(RowError::NonPositiveAmount(amount));
        }
        if date > today {
            return Err(RowError::FutureDate(date));
        }
        Ok(Self {
            description: description.to_string(),
            date,
            amount,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

/// A rejected line, reported back to the uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// 1-based physical line number (header and blank lines count)
    pub line_number: usize,
    /// Raw line content, trimmed
    pub line_content: String,
    /// Human-readable cause
    pub message: String,
}

impl ParseError {
    pub fn new(line_number: usize, line_content: &str, reason: &RowError) -> Self {
        Self {
            line_number,
            line_content: line_content.to_string(),
            message: reason.to_string(),
        }
    }
}

/// Outcome of parsing one file: good rows and bad rows side by side
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResult {
    pub valid_transactions: Vec<ParsedTransaction>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Number of candidate transaction lines seen
    pub fn candidate_lines(&self) -> usize {
        self.valid_transactions.len() + self.errors.len()
    }
}

/// A parsed transaction with its assigned category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub transaction: ParsedTransaction,
    pub category: Category,
}
