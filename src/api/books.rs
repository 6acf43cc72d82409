//! Book endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPayload},
    AppState,
};

/// Book list envelope
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub success: bool,
    /// Number of books in `data`
    pub count: usize,
    pub data: Vec<Book>,
}

/// Single book envelope
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub success: bool,
    pub message: String,
    pub data: Book,
}

impl BookResponse {
    fn new(message: &str, data: Book) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
        }
    }
}

/// List all books, newest first
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = BookListResponse),
        (status = 500, description = "Storage error", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<BookListResponse>> {
    let books = state.services.books.list_books().await?;
    Ok(Json(BookListResponse {
        success: true,
        count: books.len(),
        data: books,
    }))
}

/// Add a book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Missing or invalid field, or duplicate ISBN", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage error", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let book = state.services.books.add_book(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse::new("Book added successfully", book)),
    ))
}

/// Delete a book by ID
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID (24 hex characters)")),
    responses(
        (status = 200, description = "Book deleted", body = BookResponse),
        (status = 400, description = "Malformed book ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage error", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.remove_book(&id).await?;
    Ok(Json(BookResponse::new("Book deleted successfully", book)))
}
