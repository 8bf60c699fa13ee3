//! Lend (checkout) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A checkout of one copy of a book by a user. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lend {
    pub id: i64,
    pub user_id: i32,
    pub book_id: i32,
    pub lent_at: DateTime<Utc>,
}

/// Stock movement applied by a successful decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockChange {
    pub book_id: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
}

/// Result of a successful lend
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LendReceipt {
    pub lend: Lend,
    /// Copies left after this lend
    pub remaining_stock: i32,
}
