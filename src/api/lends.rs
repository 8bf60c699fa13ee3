//! Lending endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::lend::Lend, AppState};

/// Lend request
#[derive(Deserialize, ToSchema)]
pub struct LendRequest {
    pub book_id: i32,
    pub user_id: i32,
}

/// Lend acknowledgment
#[derive(Serialize, ToSchema)]
pub struct LendResponse {
    pub status: String,
    pub message: String,
    pub lend: Lend,
    /// Copies of the book left after this lend
    pub remaining_stock: i32,
}

#[derive(Serialize, ToSchema)]
pub struct StockResponse {
    pub book_id: i32,
    pub stock: i32,
}

/// Lend a book to a user
#[utoipa::path(
    post,
    path = "/lends",
    tag = "lends",
    request_body = LendRequest,
    responses(
        (status = 201, description = "Book lent", body = LendResponse),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies left"),
        (status = 503, description = "Storage failure; nothing was recorded")
    )
)]
pub async fn create_lend(
    State(state): State<AppState>,
    Json(request): Json<LendRequest>,
) -> AppResult<(StatusCode, Json<LendResponse>)> {
    let receipt = state
        .services
        .lending
        .lend(request.book_id, request.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LendResponse {
            status: "success".to_string(),
            message: "Book lent successfully".to_string(),
            lend: receipt.lend,
            remaining_stock: receipt.remaining_stock,
        }),
    ))
}

/// Current stock of a book
#[utoipa::path(
    get,
    path = "/books/{id}/stock",
    tag = "lends",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Committed stock", body = StockResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_stock(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<StockResponse>> {
    let stock = state.services.lending.book_stock(book_id).await?;
    Ok(Json(StockResponse { book_id, stock }))
}

/// Lends recorded for a book
#[utoipa::path(
    get,
    path = "/books/{id}/lends",
    tag = "lends",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Lends of the book", body = Vec<Lend>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_lends(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<Lend>>> {
    let lends = state.services.lending.lends_for_book(book_id).await?;
    Ok(Json(lends))
}

/// Lends recorded for a user
#[utoipa::path(
    get,
    path = "/users/{id}/lends",
    tag = "lends",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Lends of the user", body = Vec<Lend>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_lends(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<Lend>>> {
    let lends = state.services.lending.lends_for_user(user_id).await?;
    Ok(Json(lends))
}
