//! Book CSV parser
//!
//! Layout: one header line (ignored), then `id,title,author,isbn,stock` per
//! line. No quoting, so fields cannot contain commas.

use std::path::Path;

use thiserror::Error;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{book::NewBook, import_report::RowFailure},
};

/// Number of comma-separated fields in a data row
pub const FIELD_COUNT: usize = 5;

/// Why a single row was skipped
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("id '{0}' is not a number")]
    InvalidId(String),

    #[error("stock '{0}' is not a number")]
    InvalidStock(String),

    #[error("stock {0} is negative")]
    NegativeStock(i32),

    #[error("id {local_id} overflows when offset by {offset}")]
    IdOverflow { local_id: i32, offset: i32 },

    #[error("invalid book: {0}")]
    Invalid(String),
}

/// A data row as written in the file, before ID mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvBookRow<'a> {
    pub local_id: i32,
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: &'a str,
    pub stock: i32,
}

impl CsvBookRow<'_> {
    /// Map the local ID into the catalog's ID space and validate the result
    pub fn into_book(self, id_offset: i32) -> Result<NewBook, RowParseError> {
        let id = self
            .local_id
            .checked_add(id_offset)
            .ok_or(RowParseError::IdOverflow {
                local_id: self.local_id,
                offset: id_offset,
            })?;

        let book = NewBook {
            id,
            title: self.title.to_string(),
            author: self.author.to_string(),
            isbn: self.isbn.to_string(),
            stock: self.stock,
        };
        book.validate()
            .map_err(|e| RowParseError::Invalid(e.to_string()))?;

        Ok(book)
    }
}

/// Books that parsed cleanly and rows that did not
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// (line number, book)
    pub books: Vec<(usize, NewBook)>,
    pub failures: Vec<RowFailure>,
}

/// Reject anything that is not a `.csv` file name
pub fn check_format(filename: &str) -> AppResult<()> {
    let is_csv = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Ok(())
    } else {
        Err(AppError::UnsupportedFormat(format!(
            "'{}' is not a .csv file",
            filename
        )))
    }
}

/// Data lines with their 1-based line numbers. Skips the header and blank lines.
pub fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
}

/// Parse one data line
pub fn parse_row(line: &str) -> Result<CsvBookRow<'_>, RowParseError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(RowParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let local_id = fields[0]
        .parse::<i32>()
        .map_err(|_| RowParseError::InvalidId(fields[0].to_string()))?;
    let stock = fields[4]
        .parse::<i32>()
        .map_err(|_| RowParseError::InvalidStock(fields[4].to_string()))?;
    if stock < 0 {
        return Err(RowParseError::NegativeStock(stock));
    }

    Ok(CsvBookRow {
        local_id,
        title: fields[1],
        author: fields[2],
        isbn: fields[3],
        stock,
    })
}

/// Parse a whole file into books ready to insert, collecting bad rows instead
/// of stopping at them
pub fn parse_books(content: &str, id_offset: i32) -> ParsedBatch {
    data_lines(content)
        .map(|(line, text)| (line, parse_row(text).and_then(|row| row.into_book(id_offset))))
        .fold(ParsedBatch::default(), |mut batch, (line, parsed)| {
            match parsed {
                Ok(book) => batch.books.push((line, book)),
                Err(e) => batch.failures.push(RowFailure {
                    line,
                    reason: e.to_string(),
                }),
            }
            batch
        })
}
