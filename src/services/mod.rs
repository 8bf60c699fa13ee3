//! Business logic services

pub mod books;
pub mod import;
pub mod ledger;
pub mod lending;
pub mod users;

use std::sync::Arc;

use crate::{config::ImportConfig, error::AppResult, repository::CatalogStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub lending: lending::LendingService,
    pub import: import::ImportService,
    store: Arc<dyn CatalogStore>,
}

impl Services {
    /// Create all services on top of one catalog store
    pub fn new(store: Arc<dyn CatalogStore>, import_config: &ImportConfig) -> Self {
        Self {
            books: books::BooksService::new(store.clone()),
            users: users::UsersService::new(store.clone()),
            lending: lending::LendingService::new(store.clone()),
            import: import::ImportService::new(store.clone(), import_config),
            store,
        }
    }

    /// Check that the catalog store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
