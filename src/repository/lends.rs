//! Lends repository and the Postgres stock transaction

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::lend::Lend,
};

use super::store::{LendFilter, StockTransaction};

#[derive(Clone)]
pub struct LendsRepository {
    pool: Pool<Postgres>,
    lock_timeout_ms: u64,
}

impl LendsRepository {
    pub fn new(pool: Pool<Postgres>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    /// List lends for a user or a book, oldest first
    pub async fn list(&self, filter: LendFilter) -> AppResult<Vec<Lend>> {
        let (column, id) = match filter {
            LendFilter::User(id) => ("user_id", id),
            LendFilter::Book(id) => ("book_id", id),
        };

        let query = format!(
            "SELECT id, user_id, book_id, lent_at FROM lends WHERE {} = $1 ORDER BY lent_at, id",
            column
        );

        let lends = sqlx::query_as::<_, Lend>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lends)
    }

    /// Open a transaction with a bounded wait on row locks
    pub async fn begin(&self) -> AppResult<PgStockTransaction> {
        let mut tx = self.pool.begin().await?;

        // SET does not accept bind parameters; the value is an integer from config.
        let set_timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
        sqlx::query(&set_timeout).execute(&mut *tx).await?;

        Ok(PgStockTransaction { tx })
    }
}

/// Stock transaction backed by a Postgres transaction.
///
/// `lock_book_stock` takes a `FOR UPDATE` row lock, so a concurrent lend on the
/// same book waits here until this transaction commits or rolls back and then
/// reads the committed stock.
pub struct PgStockTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTransaction for PgStockTransaction {
    async fn lock_book_stock(&mut self, book_id: i32) -> AppResult<Option<i32>> {
        let stock: Option<i32> =
            sqlx::query_scalar("SELECT stock FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(stock)
    }

    async fn insert_lend(&mut self, user_id: i32, book_id: i32) -> AppResult<Lend> {
        let lend = sqlx::query_as::<_, Lend>(
            r#"
            INSERT INTO lends (user_id, book_id, lent_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, lent_at
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(lend)
    }

    async fn update_book_stock(&mut self, book_id: i32, new_stock: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET stock = $1 WHERE id = $2")
            .bind(new_stock)
            .bind(book_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
