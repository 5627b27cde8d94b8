//! Data models for the catalogue

pub mod book;
pub mod loan;
pub mod page;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookInput, BookShort, NewBook};
pub use loan::{BookRef, Loan, LoanDetails, LoanFilter, NewLoan};
pub use page::{Page, PageWindow};
