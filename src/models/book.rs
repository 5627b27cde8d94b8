//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::loan::Loan;
use crate::error::{AppError, AppResult};

/// Book record from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book entry in a catalogue listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// True when no loan of this book is in progress
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl BookShort {
    pub fn new(book: Book, available: bool) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            available,
            created_at: book.created_at,
        }
    }
}

/// Book with its loan history, for the detail view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub available: bool,
    /// Number of loans ever recorded for this book
    pub loan_count: i64,
    /// Most recent loans first, at most 10
    pub recent_loans: Vec<Loan>,
}

/// Create / update book payload.
///
/// All three fields are required; they are optional here so that a missing
/// field is reported as such instead of as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200))]
    pub author: Option<String>,
    #[validate(length(max = 13))]
    pub isbn: Option<String>,
}

/// Validated book fields, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MissingField(format!("{} is required", name))),
    }
}

impl TryFrom<BookInput> for NewBook {
    type Error = AppError;

    fn try_from(input: BookInput) -> AppResult<Self> {
        let title = required(input.title, "title")?;
        let author = required(input.author, "author")?;
        let isbn = required(input.isbn, "isbn")?;

        let trimmed = BookInput {
            title: Some(title),
            author: Some(author),
            isbn: Some(isbn),
        };
        trimmed.validate()?;

        Ok(NewBook {
            title: trimmed.title.unwrap_or_default(),
            author: trimmed.author.unwrap_or_default(),
            isbn: trimmed.isbn.unwrap_or_default(),
        })
    }
}
