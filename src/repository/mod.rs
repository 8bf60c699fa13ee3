//! Repository layer for database operations

pub mod books;
pub mod lends;
pub mod memory;
pub mod store;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, Lend, NewBook, NewUser, UpdateBook, UpdateUser, User},
};

pub use memory::InMemoryCatalogStore;
pub use store::{CatalogStore, LendFilter, StockTransaction};

/// Postgres-backed catalog store holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub lends: lends::LendsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>, lock_timeout_ms: u64) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            lends: lends::LendsRepository::new(pool.clone(), lock_timeout_ms),
            pool,
        }
    }
}

#[async_trait]
impl CatalogStore for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        self.books.create(book).await
    }

    async fn update_book(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        self.books.update(id, book).await
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.books.delete(id).await
    }

    async fn book_exists(&self, id: i32) -> AppResult<bool> {
        self.books.exists(id).await
    }

    async fn get_book_stock(&self, id: i32) -> AppResult<Option<i32>> {
        self.books.stock(id).await
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.users.get_by_id(id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        self.users.create(user).await
    }

    async fn update_user(&self, id: i32, user: &UpdateUser) -> AppResult<User> {
        self.users.update(id, user).await
    }

    async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.users.delete(id).await
    }

    async fn user_exists(&self, id: i32) -> AppResult<bool> {
        self.users.exists(id).await
    }

    async fn list_lends(&self, filter: LendFilter) -> AppResult<Vec<Lend>> {
        self.lends.list(filter).await
    }

    async fn begin(&self) -> AppResult<Box<dyn StockTransaction>> {
        Ok(Box::new(self.lends.begin().await?))
    }
}
