//! CSV import for card statement exports
//!
//! Store names may contain the delimiter, so column boundaries are inferred
//! per row: the amount is located first by scanning for a positive integer,
//! and the description is everything between the description column and the
//! fixed columns preceding the amount.
//!
//! Rows are parsed independently. A malformed row becomes a `ParseError` in
//! the result and parsing carries on; only a failure of the underlying stream
//! aborts the file.

use std::io::{BufRead, BufReader, Read};
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use encoding_rs_io::DecodeReaderBytesBuilder;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::formats::{CsvFormat, FormatDescriptor, DELIMITER};
use crate::models::{ParseError, ParseResult, ParsedTransaction, RowError};

/// Outcome of parsing a single candidate line
pub type RowOutcome = std::result::Result<ParsedTransaction, ParseError>;

/// What a physical line is, as far as the file parser is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Header,
    /// Issuer preamble carrying a masked card number
    CardInfo,
    Transaction,
}

fn strict_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("valid date regex"))
}

fn masked_card_pattern() -> &'static Regex {
    // e.g. 4980-00**-****-****, trailing text allowed
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}\*\*-\*{4}-\*{4}").expect("valid card number regex")
    })
}

/// Classify one trimmed physical line
///
/// The header check only ever applies to line 1, and only when the format
/// declares a header.
pub fn classify_line(line: &str, line_number: usize, format: &FormatDescriptor) -> LineKind {
    if line_number == 1 && format.skip_header_line {
        return LineKind::Header;
    }
    if line.is_empty() {
        return LineKind::Blank;
    }
    if is_card_info_line(line) {
        return LineKind::CardInfo;
    }
    LineKind::Transaction
}

/// Detect a card-info preamble line such as `TestUser,4980-00**-****-****,GoldVisa`
pub fn is_card_info_line(line: &str) -> bool {
    let mut columns = line.split(DELIMITER);
    let first = columns.next().map(str::trim).unwrap_or("");
    let second = columns.next().map(str::trim).unwrap_or("");

    !first.is_empty()
        && !strict_date_pattern().is_match(first)
        && masked_card_pattern().is_match(second)
}

/// Parse one candidate line, checking dates against the local calendar day
pub fn parse_row(line: &str, line_number: usize, format: &FormatDescriptor) -> RowOutcome {
    parse_row_as_of(line, line_number, format, Local::now().date_naive())
}

/// Parse one candidate line with an explicit "today" for the future-date check
pub fn parse_row_as_of(
    line: &str,
    line_number: usize,
    format: &FormatDescriptor,
    today: NaiveDate,
) -> RowOutcome {
    let line = line.trim();
    parse_columns(line, format, today).map_err(|reason| ParseError::new(line_number, line, &reason))
}

fn parse_columns(
    line: &str,
    format: &FormatDescriptor,
    today: NaiveDate,
) -> std::result::Result<ParsedTransaction, RowError> {
    // Unlike a CSV reader, keep every field verbatim (empty trailing ones too)
    let columns: Vec<&str> = line.split(DELIMITER).collect();

    if columns.len() < format.min_column_count {
        return Err(RowError::InsufficientColumns {
            expected: format.min_column_count,
            found: columns.len(),
        });
    }

    let raw_date = columns
        .get(format.date_column)
        .ok_or(RowError::InsufficientColumns {
            expected: format.date_column + 1,
            found: columns.len(),
        })?;
    let date = parse_date(raw_date)?;

    let (amount_column, amount) = match find_amount(&columns, format.amount_start_column) {
        Some(found) => found,
        None => {
            warn!(columns = ?columns, "No valid amount found in row");
            return Err(RowError::NoAmount);
        }
    };

    let description = reconstruct_description(&columns, format, amount_column)?;

    ParsedTransaction::new(&description, date, amount, today)
}

/// Parse a `yyyy/M/d` date (month and day take one or two digits)
fn parse_date(raw: &str) -> std::result::Result<NaiveDate, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RowError::EmptyDate);
    }
    if !strict_date_pattern().is_match(raw) {
        return Err(RowError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y/%m/%d").map_err(|_| RowError::InvalidDate(raw.to_string()))
}

/// Scan left to right from `start` for the first column holding a positive amount
fn find_amount(columns: &[&str], start: usize) -> Option<(usize, i64)> {
    columns
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(index, column)| parse_amount(column).map(|amount| (index, amount)))
}

/// Strip everything but ASCII digits and '-', then take the absolute value
///
/// Currency markers and thousands separators disappear with the strip.
/// Full-width digits are stripped too, so "１０００" yields nothing.
fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    let value = cleaned.parse::<i64>().ok()?.checked_abs()?;
    (value > 0).then_some(value)
}

/// Re-join the description columns that precede the amount's fixed columns
fn reconstruct_description(
    columns: &[&str],
    format: &FormatDescriptor,
    amount_column: usize,
) -> std::result::Result<String, RowError> {
    let range_error = RowError::DescriptionRange {
        amount_column,
        gap: format.gap_columns,
    };

    let end = amount_column
        .checked_sub(format.gap_columns + 1)
        .ok_or_else(|| range_error.clone())?;
    if end < format.description_column {
        return Err(range_error);
    }

    let separator = DELIMITER.to_string();
    let description = columns[format.description_column..=end].join(&separator);
    let description = description.trim();
    if description.is_empty() {
        return Err(RowError::EmptyDescription);
    }
    Ok(description.to_string())
}

/// Parse a card export using a registered format
pub fn parse_file<R: Read>(reader: R, format: CsvFormat) -> Result<ParseResult> {
    parse_with_descriptor(reader, format.descriptor())
}

/// Parse a card export with an explicit descriptor
///
/// Single pass over the stream, decoded with the descriptor's encoding.
pub fn parse_with_descriptor<R: Read>(
    reader: R,
    format: &FormatDescriptor,
) -> Result<ParseResult> {
    format.validate()?;
    let encoding = format.encoding()?;
    let today = Local::now().date_naive();

    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(reader);
    let lines = BufReader::new(decoder).lines();

    let mut result = ParseResult::default();
    let mut skipped_card_info = 0;

    for (index, line) in lines.enumerate() {
        let line_number = index + 1;
        let raw = line?;
        let line = raw.trim();

        match classify_line(line, line_number, format) {
            LineKind::Blank => continue,
            LineKind::Header => {
                debug!(line_number, "Skipping header line");
                continue;
            }
            LineKind::CardInfo => {
                debug!(line_number, "Skipping card info line");
                skipped_card_info += 1;
                continue;
            }
            LineKind::Transaction => {}
        }

        match parse_row_as_of(line, line_number, format, today) {
            Ok(transaction) => result.valid_transactions.push(transaction),
            Err(error) => {
                debug!(line_number, reason = %error.message, "Rejected row");
                result.errors.push(error);
            }
        }
    }

    info!(
        "Parsed {} transactions ({} errors, {} card info lines skipped)",
        result.valid_transactions.len(),
        result.errors.len(),
        skipped_card_info
    );
    Ok(result)
}
