//! CSV export for ingested transactions and rejected lines
//!
//! Both writers emit a header row and let the `csv` crate quote fields, so
//! store names containing commas survive a round trip.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::models::{CategorizedTransaction, ParseError};

/// One exported transaction row
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    date: String,
    description: &'a str,
    amount: i64,
    category: &'static str,
}

/// One exported error row
#[derive(Debug, Serialize)]
struct ErrorRow<'a> {
    line: usize,
    content: &'a str,
    message: &'a str,
}

/// Write transactions as `date,description,amount,category`
pub fn write_transactions_csv<W: Write>(
    writer: W,
    transactions: &[CategorizedTransaction],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for tx in transactions {
        csv_writer.serialize(TransactionRow {
            date: tx.transaction.date().format("%Y-%m-%d").to_string(),
            description: tx.transaction.description(),
            amount: tx.transaction.amount(),
            category: tx.category.label(),
        })?;
    }
    if transactions.is_empty() {
        csv_writer.write_record(["date", "description", "amount", "category"])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rejected lines as `line,content,message`
pub fn write_errors_csv<W: Write>(writer: W, errors: &[ParseError]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for err in errors {
        csv_writer.serialize(ErrorRow {
            line: err.line_number,
            content: &err.line_content,
            message: &err.message,
        })?;
    }
    if errors.is_empty() {
        csv_writer.write_record(["line", "content", "message"])?;
    }
    csv_writer.flush()?;
    Ok(())
}
