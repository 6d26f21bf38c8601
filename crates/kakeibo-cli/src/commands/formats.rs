//! Format listing command

use anyhow::Result;
use kakeibo_core::CsvFormat;

/// List supported statement formats and their column layouts
pub fn cmd_formats() -> Result<()> {
    println!("Supported Formats:\n");
    println!(
        "{:<12} {:>4} {:>5} {:>7} {:>8} {:>4}  {:<7} {}",
        "FORMAT", "DATE", "DESC", "AMOUNT", "MIN COLS", "GAP", "HEADER", "ENCODING"
    );
    println!("{}", "-".repeat(70));

    for format in CsvFormat::all() {
        let d = format.descriptor();
        println!(
            "{:<12} {:>4} {:>5} {:>7} {:>8} {:>4}  {:<7} {}",
            format.as_str(),
            d.date_column,
            d.description_column,
            d.amount_start_column,
            d.min_column_count,
            d.gap_columns,
            if d.skip_header_line { "yes" } else { "no" },
            d.encoding
        );
    }

    println!();
    println!("Columns are zero-based. AMOUNT is where the amount search starts;");
    println!("GAP is the number of fixed columns between the store name and the amount.");

    Ok(())
}
