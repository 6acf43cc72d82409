//! Repository layer for book storage

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::book::{Book, InvalidBookId, ValidatedBook};

pub use memory::InMemoryBookRepository;
pub use postgres::PgBookRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("a book with ISBN {0} already exists")]
    DuplicateKey(String),

    #[error("book {0} not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidBookId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Book storage.
///
/// Implementations must enforce ISBN uniqueness atomically with the insert so
/// that two concurrent creates with the same ISBN cannot both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Persist a new book, assigning its id and timestamps
    async fn create(&self, book: ValidatedBook) -> RepositoryResult<Book>;

    /// All books, newest first
    async fn list_all(&self) -> RepositoryResult<Vec<Book>>;

    /// Remove a book by id and return it
    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Book>;

    /// Cheap connectivity probe
    async fn ping(&self) -> RepositoryResult<()>;

    /// Release the underlying connection handle
    async fn close(&self);
}
