//! Business logic services

pub mod books;

use std::{sync::Arc, time::Duration};

use crate::repository::BookRepository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BookService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Arc<dyn BookRepository>, storage_timeout: Duration) -> Self {
        Self {
            books: books::BookService::new(repository, storage_timeout),
        }
    }
}
