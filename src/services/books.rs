//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, NewBook, UpdateBook},
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn CatalogStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.store.get_book(id).await
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.store.list_books().await
    }

    /// Create a book with a caller-assigned ID
    pub async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.store.insert_book(&book).await?;
        tracing::info!(id = created.id, "Book created");
        Ok(created)
    }

    /// Replace a book's fields.
    ///
    /// This sets stock directly and is not serialized against concurrent lends.
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.store.update_book(id, &book).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.store.delete_book(id).await?;
        tracing::info!(id, "Book deleted");
        Ok(())
    }
}
