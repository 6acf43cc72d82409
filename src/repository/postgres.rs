//! PostgreSQL book storage

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use super::{BookRepository, RepositoryError, RepositoryResult};
use crate::{
    config::DatabaseConfig,
    models::book::{Book, BookId, ValidatedBook},
};

/// Name of the unique constraint on `books.isbn` (see migrations)
const ISBN_UNIQUE_CONSTRAINT: &str = "books_isbn_unique";

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connect to the database and bring the schema up to date
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.timeout())
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Database migrations completed");

        Ok(Self::new(pool))
    }
}

/// Map an insert failure, recognising the ISBN unique constraint
fn map_insert_error(err: sqlx::Error, isbn: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db_err.constraint() == Some(ISBN_UNIQUE_CONSTRAINT)
        {
            return RepositoryError::DuplicateKey(isbn.to_string());
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn create(&self, book: ValidatedBook) -> RepositoryResult<Book> {
        let book = Book::from_validated(book);
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, isbn, year, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.year)
        .bind(book.created_at)
        .bind(book.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &book.isbn))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Book> {
        let id: BookId = id.parse()?;
        sqlx::query_as::<_, Book>("DELETE FROM books WHERE id = $1 RETURNING *")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
