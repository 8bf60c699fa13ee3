//! Bulk import file handling

pub mod parser;

pub use parser::{check_format, parse_books, ParsedBatch, RowParseError};
