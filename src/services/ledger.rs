//! Stock ledger
//!
//! Every lend-driven stock decrement goes through [`StockLedger::decrement`],
//! which runs read → insert lend → write inside the caller's transaction. The
//! read is a locking read, so two decrements on the same book can never both
//! start from the same stock value.

use std::fmt;

use crate::{
    error::{AppError, AppResult},
    models::lend::{Lend, StockChange},
    repository::StockTransaction,
};

/// Progress of a lend request. A failure leaves the stage at the last step
/// that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendStage {
    Received,
    StockChecked,
    LendRecorded,
    StockUpdated,
    Committed,
}

impl fmt::Display for LendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LendStage::Received => "received",
            LendStage::StockChecked => "stock_checked",
            LendStage::LendRecorded => "lend_recorded",
            LendStage::StockUpdated => "stock_updated",
            LendStage::Committed => "committed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StockLedger;

impl StockLedger {
    pub fn new() -> Self {
        Self
    }

    /// Stock left after taking `quantity` copies, or `InsufficientStock`
    pub fn remaining(book_id: i32, stock: i32, quantity: i32) -> AppResult<i32> {
        match stock.checked_sub(quantity) {
            Some(new_stock) if new_stock >= 0 => Ok(new_stock),
            _ => Err(AppError::InsufficientStock {
                book_id,
                available: stock,
                requested: quantity,
            }),
        }
    }

    /// Take `quantity` copies of a book for a user and record the lend.
    ///
    /// Nothing is committed here; the caller commits or rolls back `tx`.
    pub async fn decrement(
        &self,
        tx: &mut dyn StockTransaction,
        book_id: i32,
        user_id: i32,
        quantity: i32,
        stage: &mut LendStage,
    ) -> AppResult<(Lend, StockChange)> {
        if quantity < 1 {
            return Err(AppError::Validation(format!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }

        let stock = tx
            .lock_book_stock(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        let new_stock = Self::remaining(book_id, stock, quantity)?;
        *stage = LendStage::StockChecked;

        let lend = tx.insert_lend(user_id, book_id).await?;
        *stage = LendStage::LendRecorded;

        tx.update_book_stock(book_id, new_stock).await?;
        *stage = LendStage::StockUpdated;

        tracing::debug!(book_id, previous = stock, new_stock, "Stock decremented");

        Ok((
            lend,
            StockChange {
                book_id,
                previous_stock: stock,
                new_stock,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::NewBook;
    use crate::repository::{CatalogStore, InMemoryCatalogStore};

    async fn store_with_book(stock: i32) -> InMemoryCatalogStore {
        let store = InMemoryCatalogStore::new();
        store
            .insert_book(&NewBook {
                id: 1,
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                isbn: "ISBN1".to_string(),
                stock,
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_remaining() {
        assert_eq!(StockLedger::remaining(1, 3, 1).unwrap(), 2);
        assert_eq!(StockLedger::remaining(1, 1, 1).unwrap(), 0);
        assert!(matches!(
            StockLedger::remaining(1, 0, 1),
            Err(AppError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert!(StockLedger::remaining(1, i32::MIN, 1).is_err());
    }

    #[tokio::test]
    async fn test_decrement_reaches_stock_updated() {
        let store = store_with_book(2).await;
        let mut tx = store.begin().await.unwrap();
        let mut stage = LendStage::Received;

        let (lend, change) = StockLedger::new()
            .decrement(tx.as_mut(), 1, 5, 1, &mut stage)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(stage, LendStage::StockUpdated);
        assert_eq!(lend.user_id, 5);
        assert_eq!(change.previous_stock, 2);
        assert_eq!(change.new_stock, 1);
        assert_eq!(store.get_book_stock(1).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let store = store_with_book(0).await;
        let mut tx = store.begin().await.unwrap();
        let mut stage = LendStage::Received;

        let err = StockLedger::new()
            .decrement(tx.as_mut(), 1, 5, 1, &mut stage)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(stage, LendStage::Received);
        drop(tx);
        assert_eq!(store.lend_count().await, 0);
    }

    #[tokio::test]
    async fn test_stage_reports_failed_step() {
        let store = store_with_book(4).await;
        store.fail_stock_updates(true);
        let mut tx = store.begin().await.unwrap();
        let mut stage = LendStage::Received;

        let err = StockLedger::new()
            .decrement(tx.as_mut(), 1, 5, 1, &mut stage)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StorageFailure(_)));
        assert_eq!(stage, LendStage::LendRecorded);
    }

    #[tokio::test]
    async fn test_rejects_zero_quantity_and_missing_book() {
        let store = store_with_book(4).await;
        let mut tx = store.begin().await.unwrap();
        let mut stage = LendStage::Received;
        let ledger = StockLedger::new();

        assert!(matches!(
            ledger.decrement(tx.as_mut(), 1, 5, 0, &mut stage).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ledger.decrement(tx.as_mut(), 99, 5, 1, &mut stage).await,
            Err(AppError::NotFound(_))
        ));
    }
}
