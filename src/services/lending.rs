//! Lending workflow service

use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::lend::{Lend, LendReceipt},
    repository::{CatalogStore, LendFilter},
};

use super::ledger::{LendStage, StockLedger};

#[derive(Clone)]
pub struct LendingService {
    store: Arc<dyn CatalogStore>,
    ledger: StockLedger,
}

impl LendingService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            ledger: StockLedger::new(),
        }
    }

    /// Lend one copy of a book to a user.
    ///
    /// The lend record and the stock decrement commit together or not at all.
    #[tracing::instrument(skip(self))]
    pub async fn lend(&self, book_id: i32, user_id: i32) -> AppResult<LendReceipt> {
        let started = Instant::now();

        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        if !self.store.book_exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let mut tx = self.store.begin().await?;
        let mut stage = LendStage::Received;

        let outcome = self
            .ledger
            .decrement(tx.as_mut(), book_id, user_id, 1, &mut stage)
            .await;

        let (lend, change) = match outcome {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(
                    %stage,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Lend aborted, rolling back"
                );
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            tracing::warn!(
                %stage,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Lend commit failed"
            );
            return Err(AppError::StorageFailure(format!("commit failed: {}", e)));
        }
        stage = LendStage::Committed;

        tracing::info!(
            %stage,
            lend_id = lend.id,
            remaining = change.new_stock,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Book lent"
        );

        Ok(LendReceipt {
            lend,
            remaining_stock: change.new_stock,
        })
    }

    /// Committed stock of a book
    pub async fn book_stock(&self, book_id: i32) -> AppResult<i32> {
        self.store
            .get_book_stock(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))
    }

    /// Lends recorded for a user
    pub async fn lends_for_user(&self, user_id: i32) -> AppResult<Vec<Lend>> {
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        self.store.list_lends(LendFilter::User(user_id)).await
    }

    /// Lends recorded for a book
    pub async fn lends_for_book(&self, book_id: i32) -> AppResult<Vec<Lend>> {
        if !self.store.book_exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }
        self.store.list_lends(LendFilter::Book(book_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::MockCatalogStore;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_unknown_user_never_opens_transaction() {
        let mut store = MockCatalogStore::new();
        store.expect_user_exists().with(eq(7)).returning(|_| Ok(false));
        store.expect_book_exists().never();
        store.expect_begin().never();

        let service = LendingService::new(Arc::new(store));
        let err = service.lend(1, 7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("User")));
    }

    #[tokio::test]
    async fn test_unknown_book_never_opens_transaction() {
        let mut store = MockCatalogStore::new();
        store.expect_user_exists().returning(|_| Ok(true));
        store.expect_book_exists().with(eq(42)).returning(|_| Ok(false));
        store.expect_begin().never();

        let service = LendingService::new(Arc::new(store));
        let err = service.lend(42, 7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("Book")));
    }

    #[tokio::test]
    async fn test_storage_failure_on_lookup_propagates() {
        let mut store = MockCatalogStore::new();
        store
            .expect_user_exists()
            .returning(|_| Err(AppError::StorageFailure("connection refused".to_string())));
        store.expect_begin().never();

        let service = LendingService::new(Arc::new(store));
        let err = service.lend(1, 7).await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    async fn store_with_book_and_user() -> crate::repository::InMemoryCatalogStore {
        use crate::models::{NewBook, NewUser};

        let store = crate::repository::InMemoryCatalogStore::new();
        store
            .insert_book(&NewBook {
                id: 1,
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                isbn: "ISBN1".to_string(),
                stock: 2,
            })
            .await
            .unwrap();
        store
            .insert_user(&NewUser {
                id: 7,
                name: "Ada".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_failure_logs_carry_stage_and_elapsed_time() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = store_with_book_and_user().await;
        let service = LendingService::new(Arc::new(store.clone()));

        store.fail_stock_updates(true);
        assert!(service.lend(1, 7).await.is_err());
        store.fail_stock_updates(false);

        store.fail_commits(true);
        assert!(service.lend(1, 7).await.is_err());

        let text = logs.text();
        let aborted = text
            .lines()
            .find(|l| l.contains("Lend aborted"))
            .expect("abort was not logged");
        assert!(aborted.contains("stage=lend_recorded"));
        assert!(aborted.contains("elapsed_ms="));

        let commit = text
            .lines()
            .find(|l| l.contains("Lend commit failed"))
            .expect("commit failure was not logged");
        assert!(commit.contains("stage=stock_updated"));
        assert!(commit.contains("elapsed_ms="));
    }
}
