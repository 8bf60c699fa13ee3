//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Available physical copies, never negative
    pub stock: i32,
}

/// Insert payload. The ID is assigned by the caller, not the store.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewBook {
    pub id: i32,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "isbn is required"))]
    pub isbn: String,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: i32,
}

/// Full replacement of a book's editable fields
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "isbn is required"))]
    pub isbn: String,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: i32,
}

impl From<NewBook> for Book {
    fn from(book: NewBook) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            stock: book.stock,
        }
    }
}

impl Book {
    pub fn apply(&mut self, update: UpdateBook) {
        self.title = update.title;
        self.author = update.author;
        self.isbn = update.isbn;
        self.stock = update.stock;
    }
}
