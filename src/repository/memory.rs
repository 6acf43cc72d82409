//! In-memory book storage.
//!
//! Intended for tests and local development. The ISBN index is checked and
//! updated under the same write lock as the insert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookRepository, RepositoryError, RepositoryResult};
use crate::models::book::{Book, BookId, ValidatedBook};

#[derive(Debug, Default)]
struct Collection {
    books: HashMap<BookId, Book>,
    /// isbn -> id
    isbn_index: HashMap<String, BookId>,
}

#[derive(Debug, Default)]
pub struct InMemoryBookRepository {
    collection: RwLock<Collection>,
    closed: AtomicBool,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> RepositoryResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepositoryError::Unavailable("store is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn create(&self, book: ValidatedBook) -> RepositoryResult<Book> {
        self.ensure_open()?;
        let book = Book::from_validated(book);

        let mut collection = self.collection.write().await;
        if collection.isbn_index.contains_key(&book.isbn) {
            return Err(RepositoryError::DuplicateKey(book.isbn));
        }
        collection.isbn_index.insert(book.isbn.clone(), book.id.clone());
        collection.books.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Book>> {
        self.ensure_open()?;
        let collection = self.collection.read().await;
        let mut books: Vec<Book> = collection.books.values().cloned().collect();
        books.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(books)
    }

    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Book> {
        self.ensure_open()?;
        let id: BookId = id.parse()?;

        let mut collection = self.collection.write().await;
        let book = collection
            .books
            .remove(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        collection.isbn_index.remove(&book.isbn);
        Ok(book)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.ensure_open()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
