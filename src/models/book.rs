//! Book model

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

/// Random bytes identifying this process inside generated ids
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random::<[u8; 5]>);

/// Per-process id counter, seeded randomly
static ID_COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>()));

/// Length of the hexadecimal form of a book identifier
pub const BOOK_ID_LEN: usize = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid book identifier: {0}")]
pub struct InvalidBookId(pub String);

/// Book identifier: 12 bytes rendered as 24 lowercase hex characters.
///
/// Layout is 4 bytes of big-endian seconds since the epoch, 5 process-random
/// bytes, then a 3-byte counter, so ids generated by one process sort by
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BookId(String);

impl BookId {
    /// Generate a fresh identifier stamped with the current time
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    fn generate_at(now: DateTime<Utc>) -> Self {
        let seconds = now.timestamp() as u32;
        let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BookId {
    type Err = InvalidBookId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == BOOK_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(InvalidBookId(s.to_string()))
        }
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Book record as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    #[schema(value_type = String, example = "65a1f0c2e4b0a1b2c3d4e5f6")]
    pub id: BookId,
    #[schema(example = "Dune")]
    pub title: String,
    #[schema(example = "Frank Herbert")]
    pub author: String,
    #[schema(example = "978-0-441-01359-3")]
    pub isbn: String,
    #[schema(example = 1965)]
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a new record from validated input, stamping id and timestamps
    pub fn from_validated(input: ValidatedBook) -> Self {
        let now = Utc::now();
        Self {
            id: BookId::generate_at(now),
            title: input.title,
            author: input.author,
            isbn: input.isbn,
            year: input.year,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create book request, exactly as received.
///
/// Every field is optional so that missing values are reported by the
/// validation rules rather than by the JSON extractor. Text fields also accept
/// JSON numbers (an ISBN sent as `9780441013593`), and `year` accepts either a
/// number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookPayload {
    #[serde(default, deserialize_with = "text_or_number")]
    #[schema(example = "Dune")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    #[schema(example = "Frank Herbert")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    #[schema(example = "978-0-441-01359-3")]
    pub isbn: Option<String>,
    #[schema(value_type = Option<i32>, example = 1965)]
    pub year: Option<serde_json::Value>,
}

/// Read a string field, rendering numbers in their decimal form
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "invalid type: expected a string or number, found {}",
            other
        ))),
    }
}

/// Book input that passed validation: trimmed strings and a parsed year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub year: i32,
}
