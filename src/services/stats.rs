//! Catalogue summary statistics

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::LoanFilter,
    repository::Repository,
    services::availability,
};

/// Counts shown on the summary view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogueSummary {
    /// Number of books in the catalogue
    pub total_books: i64,
    /// Books with no loan in progress
    pub available_books: i64,
    /// Books with a loan in progress
    pub borrowed_books: i64,
    /// Loans without a return date
    pub open_loans: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn count_books(&self) -> AppResult<i64> {
        self.repository.books.count(None).await
    }

    pub async fn count_open_loans(&self) -> AppResult<i64> {
        self.repository.loans.count(LoanFilter::Open).await
    }

    /// Books for which the availability rule holds
    pub async fn count_available_books(&self) -> AppResult<i64> {
        let book_ids = self.repository.books.list_ids().await?;
        let open_loans = self.repository.loans.find_all_open().await?;
        Ok(availability::count_available(&book_ids, &open_loans))
    }

    pub async fn summary(&self) -> AppResult<CatalogueSummary> {
        let book_ids = self.repository.books.list_ids().await?;
        let open_loans = self.repository.loans.find_all_open().await?;

        let total_books = book_ids.len() as i64;
        let available_books = availability::count_available(&book_ids, &open_loans);

        Ok(CatalogueSummary {
            total_books,
            available_books,
            borrowed_books: total_books - available_books,
            open_loans: open_loans.len() as i64,
        })
    }
}
