//! Field validation for incoming books.
//!
//! Rules run in a fixed order (presence, author, ISBN, year) and the first
//! failure is reported.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::book::{BookPayload, ValidatedBook};

static AUTHOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("author pattern is valid"));

static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("isbn pattern is valid"));

pub const MIN_YEAR: i32 = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide all required fields: title, author, isbn, year (missing: {})", .0.join(", "))]
    MissingField(Vec<&'static str>),

    #[error("{0}")]
    InvalidFormat(&'static str),

    #[error("{0}")]
    InvalidRange(&'static str),
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn year_is_blank(year: Option<&Value>) -> bool {
    match year {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Check that title, author, isbn and year are all present and non-empty
pub fn validate_presence(payload: &BookPayload) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if is_blank(payload.title.as_deref()) {
        missing.push("title");
    }
    if is_blank(payload.author.as_deref()) {
        missing.push("author");
    }
    if is_blank(payload.isbn.as_deref()) {
        missing.push("isbn");
    }
    if year_is_blank(payload.year.as_ref()) {
        missing.push("year");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingField(missing))
    }
}

/// Author names are letters and whitespace only
pub fn validate_author(author: &str) -> Result<(), ValidationError> {
    if AUTHOR_PATTERN.is_match(author.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat(
            "Author name should only contain alphabets and spaces.",
        ))
    }
}

/// ISBNs are letters, digits and hyphens; no checksum is verified
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if ISBN_PATTERN.is_match(isbn.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat(
            "ISBN should only contain letters, numbers, and hyphens.",
        ))
    }
}

/// Parse the year and check it lies in `[MIN_YEAR, current_year]`
pub fn validate_year(year: &Value, current_year: i32) -> Result<i32, ValidationError> {
    let not_whole = ValidationError::InvalidRange("Year must be a whole number");

    let parsed = match year {
        Value::Number(n) => match n.as_i64() {
            Some(v) => v,
            // Floats with no fractional part still count as whole years
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
                _ => return Err(not_whole),
            },
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_whole.clone())?,
        _ => return Err(not_whole),
    };

    if parsed < i64::from(MIN_YEAR) {
        return Err(ValidationError::InvalidRange(
            "Year must be a valid 4-digit number",
        ));
    }
    if parsed > i64::from(current_year) {
        return Err(ValidationError::InvalidRange("Year cannot be in the future"));
    }
    Ok(parsed as i32)
}

/// Run every rule in order and return the trimmed, typed book
pub fn validate(payload: &BookPayload, current_year: i32) -> Result<ValidatedBook, ValidationError> {
    validate_presence(payload)?;

    let title = payload.title.as_deref().unwrap_or_default().trim();
    let author = payload.author.as_deref().unwrap_or_default().trim();
    let isbn = payload.isbn.as_deref().unwrap_or_default().trim();

    validate_author(author)?;
    validate_isbn(isbn)?;
    let year = validate_year(payload.year.as_ref().unwrap_or(&Value::Null), current_year)?;

    Ok(ValidatedBook {
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        year,
    })
}
