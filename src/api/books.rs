//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, NewBook, UpdateBook},
        import_report::ImportSummary,
    },
    AppState,
};

/// Multipart form field carrying the import file
pub const IMPORT_FIELD: &str = "books";

/// Multipart body of an import request
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImportUpload {
    /// CSV file: header line, then `id,title,author,isbn,stock` rows
    #[schema(value_type = String, format = Binary)]
    books: Vec<u8>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list_books().await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Book ID already exists")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(book): Json<NewBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.books.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book, stock included
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state.services.books.update_book(id, book).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Import books from a CSV file
#[utoipa::path(
    post,
    path = "/books/import",
    tag = "books",
    request_body(content = ImportUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File processed; rows that failed are listed", body = ImportSummary),
        (status = 400, description = "Missing or unreadable upload"),
        (status = 415, description = "File is not a CSV text file")
    )
)]
pub async fn import_books(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Upload has no file name".to_string()))?;
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let summary = state.services.import.import_books(&content, &filename).await?;
        return Ok(Json(summary));
    }

    Err(AppError::BadRequest(format!(
        "Missing '{}' file field",
        IMPORT_FIELD
    )))
}
