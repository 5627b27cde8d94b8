//! Repository layer: record stores for books and loans.
//!
//! Services only see the [`BookRepository`] and [`LoanRepository`] traits.
//! Two backends implement them: PostgreSQL through sqlx (`books`, `loans`)
//! and an in-process store (`memory`) used for demos and tests. Both keep the
//! same invariants: ISBNs are unique and deleting a book deletes its loans.

pub mod books;
pub mod loans;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, Loan, LoanDetails, LoanFilter, NewBook, NewLoan},
};

/// Persistence of book records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: String) -> AppResult<Option<Book>>;

    /// Number of books matching `search` (all books when `None`)
    async fn count(&self, search: Option<String>) -> AppResult<i64>;

    /// Books matching `search` on title, author or ISBN, newest first
    async fn search(&self, search: Option<String>, limit: i64, offset: i64) -> AppResult<Vec<Book>>;

    async fn list_ids(&self) -> AppResult<Vec<i32>>;

    async fn create(&self, book: NewBook) -> AppResult<Book>;

    /// Overwrite title, author and ISBN. `None` when the book does not exist.
    async fn update(&self, id: i32, book: NewBook) -> AppResult<Option<Book>>;

    /// Delete a book and its loans. `false` when the book does not exist.
    async fn delete(&self, id: i32) -> AppResult<bool>;

    async fn delete_all(&self) -> AppResult<u64>;
}

/// Persistence of loan records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>>;

    async fn find_details(&self, id: i32) -> AppResult<Option<LoanDetails>>;

    /// Most recent loans of a book first
    async fn find_by_book(&self, book_id: i32, limit: i64) -> AppResult<Vec<Loan>>;

    async fn count_by_book(&self, book_id: i32) -> AppResult<i64>;

    async fn find_open_for_books(&self, book_ids: Vec<i32>) -> AppResult<Vec<Loan>>;

    async fn find_all_open(&self) -> AppResult<Vec<Loan>>;

    async fn count(&self, filter: LoanFilter) -> AppResult<i64>;

    /// Loans matching `filter`, most recent loan date first
    async fn list(&self, filter: LoanFilter, limit: i64, offset: i64) -> AppResult<Vec<LoanDetails>>;

    async fn create(&self, loan: NewLoan) -> AppResult<Loan>;

    /// `None` when the loan does not exist
    async fn set_return_date(&self, id: i32, return_date: NaiveDate) -> AppResult<Option<Loan>>;

    async fn delete(&self, id: i32) -> AppResult<bool>;

    async fn delete_all(&self) -> AppResult<u64>;
}

/// Main repository struct holding both record stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
    pub loans: Arc<dyn LoanRepository>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBookRepository::new(pool.clone())),
            loans: Arc::new(loans::PgLoanRepository::new(pool)),
        }
    }

    /// Create a repository backed by a fresh in-process store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            books: Arc::new(store.clone()),
            loans: Arc::new(store),
        }
    }

    pub fn from_parts(books: Arc<dyn BookRepository>, loans: Arc<dyn LoanRepository>) -> Self {
        Self { books, loans }
    }
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards escaped
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
