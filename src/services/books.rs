//! Book catalog service.
//!
//! The only place where validation and persistence meet. Every repository
//! call is bounded by the configured storage timeout; nothing is retried.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{Datelike, Utc};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPayload},
    repository::{BookRepository, RepositoryError, RepositoryResult},
    validation,
};

#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
    timeout: Duration,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>, timeout: Duration) -> Self {
        Self { repository, timeout }
    }

    async fn bounded<T>(
        &self,
        message: &'static str,
        call: impl Future<Output = RepositoryResult<T>>,
    ) -> AppResult<RepositoryResult<T>> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AppError::StorageTimeout {
                message,
                after_secs: self.timeout.as_secs(),
            })
    }

    /// Validate and store a new book
    pub async fn add_book(&self, payload: &BookPayload) -> AppResult<Book> {
        const FAILED: &str = "Failed to add book";

        let input = validation::validate(payload, Utc::now().year()).map_err(|e| {
            tracing::info!(reason = %e, "Rejected book");
            AppError::from(e)
        })?;

        match self.bounded(FAILED, self.repository.create(input)).await? {
            Ok(book) => {
                tracing::info!(id = %book.id, isbn = %book.isbn, "Book added");
                Ok(book)
            }
            Err(RepositoryError::DuplicateKey(isbn)) => {
                tracing::warn!(%isbn, "Duplicate ISBN rejected");
                Err(AppError::DuplicateKey(
                    "A book with this ISBN already exists".to_string(),
                ))
            }
            Err(source) => Err(AppError::Storage { message: FAILED, source }),
        }
    }

    /// All books, newest first
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        const FAILED: &str = "Failed to retrieve books";

        self.bounded(FAILED, self.repository.list_all())
            .await?
            .map_err(|source| AppError::Storage { message: FAILED, source })
    }

    /// Delete a book and return the removed record
    pub async fn remove_book(&self, id: &str) -> AppResult<Book> {
        const FAILED: &str = "Failed to delete book";

        match self.bounded(FAILED, self.repository.delete_by_id(id)).await? {
            Ok(book) => {
                tracing::info!(id = %book.id, "Book deleted");
                Ok(book)
            }
            Err(RepositoryError::NotFound(_)) => Err(AppError::NotFound("Book not found".to_string())),
            Err(RepositoryError::InvalidIdentifier(_)) => Err(AppError::InvalidIdentifier(
                "Invalid book ID format".to_string(),
            )),
            Err(source) => Err(AppError::Storage { message: FAILED, source }),
        }
    }

    /// Check that storage answers
    pub async fn check_ready(&self) -> AppResult<()> {
        const FAILED: &str = "Storage is not reachable";

        self.bounded(FAILED, self.repository.ping())
            .await?
            .map_err(|source| AppError::Storage { message: FAILED, source })
    }

    /// Release the storage handle
    pub async fn shutdown(&self) {
        self.repository.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::book::ValidatedBook,
        repository::{InMemoryBookRepository, MockBookRepository},
        validation::ValidationError,
    };
    use serde_json::json;

    fn service() -> BookService {
        BookService::new(Arc::new(InMemoryBookRepository::new()), Duration::from_secs(5))
    }

    fn payload(title: &str, author: &str, isbn: &str, year: serde_json::Value) -> BookPayload {
        BookPayload {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            isbn: Some(isbn.to_string()),
            year: Some(year),
        }
    }

    fn dune() -> BookPayload {
        payload("Dune", "Frank Herbert", "978-0-441-01359-3", json!(1965))
    }

    #[tokio::test]
    async fn test_add_then_list_returns_trimmed_fields() {
        let service = service();
        let added = service
            .add_book(&payload(" Dune ", "Frank Herbert ", " 978-0-441-01359-3", json!("1965")))
            .await
            .unwrap();

        let books = service.list_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0], added);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].author, "Frank Herbert");
        assert_eq!(books[0].isbn, "978-0-441-01359-3");
        assert_eq!(books[0].year, 1965);
    }

    #[tokio::test]
    async fn test_invalid_payloads_are_not_persisted() {
        let service = service();
        let next_year = Utc::now().year() + 1;
        let cases = [
            BookPayload { isbn: None, ..dune() },
            payload("Dune", "Frank Herbert 2nd", "978", json!(1965)),
            payload("Dune", "Frank Herbert", "978 0441", json!(1965)),
            payload("Dune", "Frank Herbert", "978", json!(999)),
            payload("Dune", "Frank Herbert", "978", json!(next_year)),
        ];

        for case in &cases {
            let err = service.add_book(case).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{err:?}");
        }
        assert!(service.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_category_is_preserved() {
        let service = service();
        let err = service
            .add_book(&BookPayload { year: None, ..dune() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingField(ref fields)) if fields == &vec!["year"]
        ));
    }

    #[tokio::test]
    async fn test_duplicate_isbn() {
        let service = service();
        service.add_book(&dune()).await.unwrap();

        let err = service
            .add_book(&payload("Dune Messiah", "Frank Herbert", "978-0-441-01359-3", json!(1969)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey(ref msg) if msg == "A book with this ISBN already exists"));

        let books = service.list_books().await.unwrap();
        assert_eq!(books.iter().filter(|b| b.isbn == "978-0-441-01359-3").count(), 1);
    }

    #[tokio::test]
    async fn test_remove_book_outcomes() {
        let service = service();
        let added = service.add_book(&dune()).await.unwrap();

        let removed = service.remove_book(added.id.as_str()).await.unwrap();
        assert_eq!(removed, added);
        assert!(service.list_books().await.unwrap().is_empty());

        assert!(matches!(
            service.remove_book("65a1f0c2e4b0a1b2c3d4e5f6").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.remove_book("12345").await,
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_failures_are_surfaced() {
        let mut repo = MockBookRepository::new();
        repo.expect_list_all()
            .times(1)
            .returning(|| Err(RepositoryError::Unavailable("down".into())));
        repo.expect_create()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("down".into())));
        repo.expect_delete_by_id()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("down".into())));

        let service = BookService::new(Arc::new(repo), Duration::from_secs(5));

        assert!(matches!(
            service.list_books().await,
            Err(AppError::Storage { message: "Failed to retrieve books", .. })
        ));
        assert!(matches!(
            service.add_book(&dune()).await,
            Err(AppError::Storage { message: "Failed to add book", .. })
        ));
        assert!(matches!(
            service.remove_book("65a1f0c2e4b0a1b2c3d4e5f6").await,
            Err(AppError::Storage { message: "Failed to delete book", .. })
        ));
    }

    #[tokio::test]
    async fn test_repository_receives_validated_input() {
        let mut repo = MockBookRepository::new();
        repo.expect_create()
            .withf(|book: &ValidatedBook| {
                book.title == "Dune" && book.author == "Frank Herbert" && book.year == 1965
            })
            .times(1)
            .returning(|book| Ok(Book::from_validated(book)));

        let service = BookService::new(Arc::new(repo), Duration::from_secs(5));
        let added = service
            .add_book(&payload("  Dune", "Frank Herbert", "978-0-441-01359-3", json!(1965)))
            .await
            .unwrap();
        assert_eq!(added.title, "Dune");
    }

    /// Store whose calls never complete
    struct HangingRepository;

    #[async_trait::async_trait]
    impl BookRepository for HangingRepository {
        async fn create(&self, _book: ValidatedBook) -> RepositoryResult<Book> {
            std::future::pending().await
        }
        async fn list_all(&self) -> RepositoryResult<Vec<Book>> {
            std::future::pending().await
        }
        async fn delete_by_id(&self, _id: &str) -> RepositoryResult<Book> {
            std::future::pending().await
        }
        async fn ping(&self) -> RepositoryResult<()> {
            std::future::pending().await
        }
        async fn close(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_storage_times_out() {
        let service = BookService::new(Arc::new(HangingRepository), Duration::from_secs(2));

        assert!(matches!(
            service.list_books().await,
            Err(AppError::StorageTimeout { message: "Failed to retrieve books", after_secs: 2 })
        ));
        assert!(matches!(
            service.add_book(&dune()).await,
            Err(AppError::StorageTimeout { .. })
        ));
        assert!(matches!(service.check_ready().await, Err(AppError::StorageTimeout { .. })));
    }

    #[tokio::test]
    async fn test_shutdown_closes_storage() {
        let service = service();
        service.check_ready().await.unwrap();
        service.shutdown().await;
        assert!(matches!(service.check_ready().await, Err(AppError::Storage { .. })));
    }
}
