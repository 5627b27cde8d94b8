//! In-process record store.
//!
//! Holds books and loans behind a single lock so every call behaves like one
//! storage statement. Enforces the same constraints as the SQL schema: unique
//! ISBN, loans must reference an existing book, book deletion cascades.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use super::{BookRepository, LoanRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookRef, Loan, LoanDetails, LoanFilter, NewBook, NewLoan},
};

#[derive(Default)]
struct MemoryState {
    books: BTreeMap<i32, Book>,
    loans: BTreeMap<i32, Loan>,
    last_book_id: i32,
    last_loan_id: i32,
}

impl MemoryState {
    fn isbn_taken(&self, isbn: &str, except: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }

    fn matching_books(&self, search: Option<&str>) -> Vec<&Book> {
        let needle = search.map(str::to_lowercase);
        let mut books: Vec<&Book> = self
            .books
            .values()
            .filter(|b| match &needle {
                Some(n) => {
                    b.title.to_lowercase().contains(n.as_str())
                        || b.author.to_lowercase().contains(n.as_str())
                        || b.isbn.to_lowercase().contains(n.as_str())
                }
                None => true,
            })
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        books
    }

    fn matching_loans(&self, filter: LoanFilter) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self.loans.values().filter(|l| filter.matches(l)).collect();
        loans.sort_by(|a, b| b.loan_date.cmp(&a.loan_date).then(b.id.cmp(&a.id)));
        loans
    }

    fn details(&self, loan: &Loan) -> Option<LoanDetails> {
        self.books.get(&loan.book_id).map(|book| {
            LoanDetails::new(
                loan.clone(),
                BookRef {
                    id: book.id,
                    title: book.title.clone(),
                    author: book.author.clone(),
                },
            )
        })
    }
}

fn window<T: Clone>(items: Vec<&T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

/// Book and loan store kept in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: String) -> AppResult<Option<Book>> {
        let state = self.state.read().await;
        Ok(state.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn count(&self, search: Option<String>) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.matching_books(search.as_deref()).len() as i64)
    }

    async fn search(&self, search: Option<String>, limit: i64, offset: i64) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(window(state.matching_books(search.as_deref()), limit, offset))
    }

    async fn list_ids(&self) -> AppResult<Vec<i32>> {
        Ok(self.state.read().await.books.keys().copied().collect())
    }

    async fn create(&self, book: NewBook) -> AppResult<Book> {
        let mut state = self.state.write().await;
        if state.isbn_taken(&book.isbn, None) {
            return Err(AppError::DuplicateIsbn(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        state.last_book_id += 1;
        let now = Utc::now();
        let created = Book {
            id: state.last_book_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            created_at: now,
            updated_at: now,
        };
        state.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, book: NewBook) -> AppResult<Option<Book>> {
        let mut state = self.state.write().await;
        if !state.books.contains_key(&id) {
            return Ok(None);
        }
        if state.isbn_taken(&book.isbn, Some(id)) {
            return Err(AppError::DuplicateIsbn(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        let updated = state.books.get_mut(&id).map(|existing| {
            existing.title = book.title;
            existing.author = book.author;
            existing.isbn = book.isbn;
            existing.updated_at = Utc::now();
            existing.clone()
        });
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.books.remove(&id).is_none() {
            return Ok(false);
        }
        state.loans.retain(|_, loan| loan.book_id != id);
        Ok(true)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let removed = state.books.len() as u64;
        state.books.clear();
        state.loans.clear();
        Ok(removed)
    }
}

#[async_trait]
impl LoanRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        Ok(self.state.read().await.loans.get(&id).cloned())
    }

    async fn find_details(&self, id: i32) -> AppResult<Option<LoanDetails>> {
        let state = self.state.read().await;
        Ok(state.loans.get(&id).and_then(|loan| state.details(loan)))
    }

    async fn find_by_book(&self, book_id: i32, limit: i64) -> AppResult<Vec<Loan>> {
        let state = self.state.read().await;
        let loans: Vec<&Loan> = state
            .matching_loans(LoanFilter::All)
            .into_iter()
            .filter(|l| l.book_id == book_id)
            .collect();
        Ok(window(loans, limit, 0))
    }

    async fn count_by_book(&self, book_id: i32) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.loans.values().filter(|l| l.book_id == book_id).count() as i64)
    }

    async fn find_open_for_books(&self, book_ids: Vec<i32>) -> AppResult<Vec<Loan>> {
        let state = self.state.read().await;
        Ok(state
            .loans
            .values()
            .filter(|l| l.is_open() && book_ids.contains(&l.book_id))
            .cloned()
            .collect())
    }

    async fn find_all_open(&self) -> AppResult<Vec<Loan>> {
        let state = self.state.read().await;
        Ok(state.loans.values().filter(|l| l.is_open()).cloned().collect())
    }

    async fn count(&self, filter: LoanFilter) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.matching_loans(filter).len() as i64)
    }

    async fn list(&self, filter: LoanFilter, limit: i64, offset: i64) -> AppResult<Vec<LoanDetails>> {
        let state = self.state.read().await;
        Ok(window(state.matching_loans(filter), limit, offset)
            .iter()
            .filter_map(|loan| state.details(loan))
            .collect())
    }

    async fn create(&self, loan: NewLoan) -> AppResult<Loan> {
        let mut state = self.state.write().await;
        if !state.books.contains_key(&loan.book_id) {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                loan.book_id
            )));
        }

        state.last_loan_id += 1;
        let now = Utc::now();
        let created = Loan {
            id: state.last_loan_id,
            book_id: loan.book_id,
            loan_date: loan.loan_date,
            return_date: loan.return_date,
            created_at: now,
            updated_at: now,
        };
        state.loans.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_return_date(&self, id: i32, return_date: NaiveDate) -> AppResult<Option<Loan>> {
        let mut state = self.state.write().await;
        Ok(state.loans.get_mut(&id).map(|loan| {
            loan.return_date = Some(return_date);
            loan.updated_at = Utc::now();
            loan.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.state.write().await.loans.remove(&id).is_some())
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let removed = state.loans.len() as u64;
        state.loans.clear();
        Ok(removed)
    }
}
