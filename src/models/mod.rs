//! Data models for Bookshelf

pub mod book;

pub use book::{Book, BookId, BookPayload, ValidatedBook};
