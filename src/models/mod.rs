//! Data models for Shelfmark

pub mod book;
pub mod import_report;
pub mod lend;
pub mod user;

// Re-export commonly used types
pub use book::{Book, NewBook, UpdateBook};
pub use import_report::{ImportSummary, RowFailure};
pub use lend::{Lend, LendReceipt, StockChange};
pub use user::{NewUser, UpdateUser, User};
