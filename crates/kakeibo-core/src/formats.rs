//! Card export layouts
//!
//! Each supported issuer/layout is one static `FormatDescriptor`. There is no
//! per-format parser: the shared row parser in `import` reads everything it
//! needs from the descriptor.

use encoding_rs::Encoding;
use serde::Serialize;

use crate::error::{Error, Result};

/// Column separator used by every supported export
pub const DELIMITER: char = ',';

/// Static description of one vendor's CSV layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Zero-based column holding the usage date
    pub date_column: usize,
    /// Column where the free-text description begins
    pub description_column: usize,
    /// Column where the left-to-right amount search begins
    pub amount_start_column: usize,
    /// Rows with fewer columns are rejected outright
    pub min_column_count: usize,
    /// Fixed columns between the end of the description and the amount
    pub gap_columns: usize,
    /// Whether the first physical line is a header
    pub skip_header_line: bool,
    /// WHATWG encoding label, e.g. "Shift_JIS"
    pub encoding: &'static str,
}

impl FormatDescriptor {
    /// Resolve the declared encoding label
    pub fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.as_bytes())
            .ok_or_else(|| Error::UnsupportedEncoding(self.encoding.to_string()))
    }

    /// Check the column layout is usable by the row parser
    ///
    /// Columns must run date, description, amount, and every row accepted by
    /// `min_column_count` must reach the amount start column.
    pub fn validate(&self) -> Result<()> {
        if self.description_column < self.date_column {
            return Err(Error::Config(format!(
                "description column {} precedes date column {}",
                self.description_column, self.date_column
            )));
        }
        if self.amount_start_column <= self.description_column {
            return Err(Error::Config(format!(
                "amount start column {} must follow description column {}",
                self.amount_start_column, self.description_column
            )));
        }
        if self.min_column_count <= self.amount_start_column {
            return Err(Error::Config(format!(
                "min_column_count {} does not cover amount start column {}",
                self.min_column_count, self.amount_start_column
            )));
        }
        Ok(())
    }
}

const SMBC: FormatDescriptor = FormatDescriptor {
    date_column: 0,
    description_column: 1,
    amount_start_column: 2,
    min_column_count: 3,
    gap_columns: 0,
    skip_header_line: false,
    encoding: "Shift_JIS",
};

// Legacy SMBC rows: date, store, amount, installment count, installment
// number, monthly payment, note.
const SMBC_LEGACY: FormatDescriptor = FormatDescriptor {
    date_column: 0,
    description_column: 1,
    amount_start_column: 2,
    min_column_count: 7,
    gap_columns: 0,
    skip_header_line: false,
    encoding: "Shift_JIS",
};

// Date, store, user, payment method, amount, fee, total, ...
const RAKUTEN: FormatDescriptor = FormatDescriptor {
    date_column: 0,
    description_column: 1,
    amount_start_column: 4,
    min_column_count: 5,
    gap_columns: 2,
    skip_header_line: true,
    encoding: "UTF-8",
};

// Kind, date, store, amount, ...
const EPOS: FormatDescriptor = FormatDescriptor {
    date_column: 1,
    description_column: 2,
    amount_start_column: 3,
    min_column_count: 4,
    gap_columns: 0,
    skip_header_line: true,
    encoding: "Shift_JIS",
};

const GENERIC: FormatDescriptor = FormatDescriptor {
    date_column: 0,
    description_column: 1,
    amount_start_column: 2,
    min_column_count: 3,
    gap_columns: 0,
    skip_header_line: true,
    encoding: "UTF-8",
};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvFormat {
    Smbc,
    SmbcLegacy,
    Rakuten,
    Epos,
    Generic,
}

impl CsvFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smbc => "smbc",
            Self::SmbcLegacy => "smbc_legacy",
            Self::Rakuten => "rakuten",
            Self::Epos => "epos",
            Self::Generic => "generic",
        }
    }

    pub fn all() -> &'static [CsvFormat] {
        &[
            Self::Smbc,
            Self::SmbcLegacy,
            Self::Rakuten,
            Self::Epos,
            Self::Generic,
        ]
    }

    pub fn descriptor(&self) -> &'static FormatDescriptor {
        match self {
            Self::Smbc => &SMBC,
            Self::SmbcLegacy => &SMBC_LEGACY,
            Self::Rakuten => &RAKUTEN,
            Self::Epos => &EPOS,
            Self::Generic => &GENERIC,
        }
    }
}

impl std::str::FromStr for CsvFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "smbc" | "vpass" => Ok(Self::Smbc),
            "smbc_legacy" | "smbc_old" => Ok(Self::SmbcLegacy),
            "rakuten" => Ok(Self::Rakuten),
            "epos" => Ok(Self::Epos),
            "generic" => Ok(Self::Generic),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_column_order() {
        for format in CsvFormat::all() {
            let d = format.descriptor();
            assert!(d.validate().is_ok(), "{}", format);
            assert!(
                d.amount_start_column > d.description_column,
                "{} amount column must follow description",
                format
            );
            assert!(d.description_column >= d.date_column, "{}", format);
            assert!(d.min_column_count > d.amount_start_column, "{}", format);
        }
    }

    #[test]
    fn test_encodings_resolve() {
        for format in CsvFormat::all() {
            assert!(format.descriptor().encoding().is_ok(), "{}", format);
        }
        assert_eq!(
            CsvFormat::Smbc.descriptor().encoding().unwrap(),
            encoding_rs::SHIFT_JIS
        );
        assert_eq!(
            CsvFormat::Rakuten.descriptor().encoding().unwrap(),
            encoding_rs::UTF_8
        );
    }

    #[test]
    fn test_validate_rejects_short_min_column_count() {
        let descriptor = FormatDescriptor {
            date_column: 1,
            description_column: 1,
            amount_start_column: 2,
            min_column_count: 1,
            ..GENERIC
        };
        assert!(matches!(descriptor.validate(), Err(Error::Config(_))));

        let reversed = FormatDescriptor {
            date_column: 2,
            description_column: 1,
            ..GENERIC
        };
        assert!(matches!(reversed.validate(), Err(Error::Config(_))));

        let amount_first = FormatDescriptor {
            amount_start_column: 1,
            ..GENERIC
        };
        assert!(matches!(amount_first.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_encoding() {
        let descriptor = FormatDescriptor {
            encoding: "EBCDIC-FOO",
            ..GENERIC
        };
        assert!(matches!(
            descriptor.encoding(),
            Err(Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_parse_format_key() {
        assert_eq!("smbc".parse::<CsvFormat>().unwrap(), CsvFormat::Smbc);
        assert_eq!("SMBC-Legacy".parse::<CsvFormat>().unwrap(), CsvFormat::SmbcLegacy);
        assert_eq!("rakuten".parse::<CsvFormat>().unwrap(), CsvFormat::Rakuten);
        assert!(matches!(
            "visa".parse::<CsvFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_key_round_trip() {
        for format in CsvFormat::all() {
            assert_eq!(format.as_str().parse::<CsvFormat>().unwrap(), *format);
        }
    }
}
