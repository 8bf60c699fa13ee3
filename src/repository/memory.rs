//! In-memory catalog store
//!
//! Intended for tests and local development. One mutex guards the whole
//! catalog; a stock transaction holds it from `begin` until it ends, so
//! transactions are fully serialized.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{AppError, AppResult},
    models::{Book, Lend, NewBook, NewUser, UpdateBook, UpdateUser, User},
};

use super::store::{CatalogStore, LendFilter, StockTransaction};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    books: BTreeMap<i32, Book>,
    users: BTreeMap<i32, User>,
    lends: Vec<Lend>,
    next_lend_id: i64,
}

/// Switches that make transactional writes fail, to exercise rollback paths
#[derive(Debug, Default)]
struct Faults {
    lend_insert: AtomicBool,
    stock_update: AtomicBool,
    commit: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    state: Arc<Mutex<CatalogState>>,
    faults: Arc<Faults>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `insert_lend` fail inside transactions
    pub fn fail_lend_inserts(&self, fail: bool) {
        self.faults.lend_insert.store(fail, Ordering::SeqCst);
    }

    /// Make `update_book_stock` fail inside transactions
    pub fn fail_stock_updates(&self, fail: bool) {
        self.faults.stock_update.store(fail, Ordering::SeqCst);
    }

    /// Make `commit` fail
    pub fn fail_commits(&self, fail: bool) {
        self.faults.commit.store(fail, Ordering::SeqCst);
    }

    /// Number of lend records currently visible
    pub async fn lend_count(&self) -> usize {
        self.state.lock().await.lends.len()
    }
}

fn book_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

fn user_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let state = self.state.lock().await;
        state.books.get(&id).cloned().ok_or_else(|| book_not_found(id))
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        if state.books.contains_key(&book.id) {
            return Err(AppError::Conflict(format!("Book with id {} already exists", book.id)));
        }
        let created = Book::from(book.clone());
        state.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_book(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        let existing = state.books.get_mut(&id).ok_or_else(|| book_not_found(id))?;
        existing.apply(book.clone());
        Ok(existing.clone())
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.books.remove(&id).map(|_| ()).ok_or_else(|| book_not_found(id))
    }

    async fn book_exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.state.lock().await.books.contains_key(&id))
    }

    async fn get_book_stock(&self, id: i32) -> AppResult<Option<i32>> {
        Ok(self.state.lock().await.books.get(&id).map(|b| b.stock))
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        let state = self.state.lock().await;
        state.users.get(&id).cloned().ok_or_else(|| user_not_found(id))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("User with id {} already exists", user.id)));
        }
        let created = User {
            id: user.id,
            name: user.name.clone(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i32, user: &UpdateUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let existing = state.users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        existing.name = user.name.clone();
        Ok(existing.clone())
    }

    async fn delete_user(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.users.remove(&id).map(|_| ()).ok_or_else(|| user_not_found(id))
    }

    async fn user_exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.state.lock().await.users.contains_key(&id))
    }

    async fn list_lends(&self, filter: LendFilter) -> AppResult<Vec<Lend>> {
        let state = self.state.lock().await;
        let lends = state
            .lends
            .iter()
            .filter(|lend| match filter {
                LendFilter::User(id) => lend.user_id == id,
                LendFilter::Book(id) => lend.book_id == id,
            })
            .cloned()
            .collect();
        Ok(lends)
    }

    async fn begin(&self) -> AppResult<Box<dyn StockTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            snapshot: Some(snapshot),
            faults: self.faults.clone(),
        }))
    }
}

/// Writes go straight to the guarded state; the snapshot taken at `begin` is
/// restored unless the transaction commits.
struct InMemoryTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    snapshot: Option<CatalogState>,
    faults: Arc<Faults>,
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StockTransaction for InMemoryTransaction {
    async fn lock_book_stock(&mut self, book_id: i32) -> AppResult<Option<i32>> {
        // Let other tasks run between the read and the write; they must
        // still be queued on the mutex.
        tokio::task::yield_now().await;
        Ok(self.guard.books.get(&book_id).map(|b| b.stock))
    }

    async fn insert_lend(&mut self, user_id: i32, book_id: i32) -> AppResult<Lend> {
        if self.faults.lend_insert.load(Ordering::SeqCst) {
            return Err(AppError::StorageFailure("injected lend insert failure".to_string()));
        }
        self.guard.next_lend_id += 1;
        let lend = Lend {
            id: self.guard.next_lend_id,
            user_id,
            book_id,
            lent_at: Utc::now(),
        };
        self.guard.lends.push(lend.clone());
        Ok(lend)
    }

    async fn update_book_stock(&mut self, book_id: i32, new_stock: i32) -> AppResult<()> {
        if self.faults.stock_update.load(Ordering::SeqCst) {
            return Err(AppError::StorageFailure("injected stock update failure".to_string()));
        }
        let book = self
            .guard
            .books
            .get_mut(&book_id)
            .ok_or_else(|| book_not_found(book_id))?;
        book.stock = new_stock;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        if self.faults.commit.load(Ordering::SeqCst) {
            return Err(AppError::StorageFailure("injected commit failure".to_string()));
        }
        let mut committed = self;
        committed.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        drop(self);
        Ok(())
    }
}
