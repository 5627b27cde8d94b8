//! Book availability, derived from loan records.
//!
//! Availability is never stored. A book is available exactly when none of its
//! loans is open; every caller that needs the answer goes through here.

use std::collections::HashSet;

use crate::models::{Book, Loan};

/// Whether `book` can be lent, given loans that may include other books' loans
pub fn is_available(book: &Book, loans: &[Loan]) -> bool {
    !loans
        .iter()
        .any(|loan| loan.book_id == book.id && loan.is_open())
}

/// Ids of the books that have at least one open loan
pub fn borrowed_book_ids(loans: &[Loan]) -> HashSet<i32> {
    loans
        .iter()
        .filter(|loan| loan.is_open())
        .map(|loan| loan.book_id)
        .collect()
}

/// Number of books in `book_ids` that are available
pub fn count_available(book_ids: &[i32], loans: &[Loan]) -> i64 {
    let borrowed = borrowed_book_ids(loans);
    book_ids.iter().filter(|id| !borrowed.contains(id)).count() as i64
}
