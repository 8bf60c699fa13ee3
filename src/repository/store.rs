//! Catalog store contract shared by the Postgres and in-memory backends

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Book, Lend, NewBook, NewUser, UpdateBook, UpdateUser, User},
};

/// Which lends to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendFilter {
    User(i32),
    Book(i32),
}

/// Persistence operations the services depend on.
///
/// Plain reads and CRUD writes autocommit. Stock-changing writes go through
/// [`CatalogStore::begin`] so the lend insert and the stock update commit or
/// roll back together.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    async fn get_book(&self, id: i32) -> AppResult<Book>;
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn insert_book(&self, book: &NewBook) -> AppResult<Book>;
    async fn update_book(&self, id: i32, book: &UpdateBook) -> AppResult<Book>;
    async fn delete_book(&self, id: i32) -> AppResult<()>;
    async fn book_exists(&self, id: i32) -> AppResult<bool>;

    /// Committed stock of a book, `None` if the book does not exist
    async fn get_book_stock(&self, id: i32) -> AppResult<Option<i32>>;

    async fn get_user(&self, id: i32) -> AppResult<User>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;
    async fn update_user(&self, id: i32, user: &UpdateUser) -> AppResult<User>;
    async fn delete_user(&self, id: i32) -> AppResult<()>;
    async fn user_exists(&self, id: i32) -> AppResult<bool>;

    async fn list_lends(&self, filter: LendFilter) -> AppResult<Vec<Lend>>;

    /// Open a transaction for a stock change
    async fn begin(&self) -> AppResult<Box<dyn StockTransaction>>;
}

/// A unit of work around one stock change.
///
/// Dropping a transaction without calling [`StockTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait StockTransaction: Send {
    /// Read a book's stock and hold it exclusively until the transaction ends.
    /// Returns `None` if the book does not exist.
    async fn lock_book_stock(&mut self, book_id: i32) -> AppResult<Option<i32>>;

    async fn insert_lend(&mut self, user_id: i32, book_id: i32) -> AppResult<Lend>;

    async fn update_book_stock(&mut self, book_id: i32, new_stock: i32) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
