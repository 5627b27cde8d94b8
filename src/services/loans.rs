//! Loan management service

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanDetails, LoanFilter, NewLoan, Page, PageWindow},
    repository::Repository,
    services::{availability, catalog::book_not_found},
};

/// Loans per page in loan listings
pub const LOANS_PAGE_SIZE: i64 = 15;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List loans, most recent loan date first
    pub async fn list_loans(&self, filter: LoanFilter, page: i64) -> AppResult<Page<LoanDetails>> {
        let total = self.repository.loans.count(filter).await?;
        let window = PageWindow::clamp(page, LOANS_PAGE_SIZE, total);

        let items = self
            .repository
            .loans
            .list(filter, window.limit(), window.offset())
            .await?;

        Ok(window.into_page(items))
    }

    pub async fn get_loan(&self, id: i32) -> AppResult<LoanDetails> {
        self.repository
            .loans
            .find_details(id)
            .await?
            .ok_or_else(|| loan_not_found(id))
    }

    /// Lend a book.
    ///
    /// Availability is checked at call time and the loan is inserted
    /// afterwards, as two separate storage calls: two concurrent requests for
    /// the same book can both succeed.
    pub async fn create_loan(&self, book_id: i32, loan_date: Option<NaiveDate>) -> AppResult<Loan> {
        let book = self
            .repository
            .books
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| book_not_found(book_id))?;

        let open_loans = self
            .repository
            .loans
            .find_open_for_books(vec![book_id])
            .await?;
        if !availability::is_available(&book, &open_loans) {
            tracing::warn!("Loan refused: book id={} is already on loan", book_id);
            return Err(AppError::BookUnavailable(format!(
                "Book \"{}\" is already on loan",
                book.title
            )));
        }

        let loan = self
            .repository
            .loans
            .create(NewLoan {
                book_id,
                loan_date: loan_date.unwrap_or_else(|| Utc::now().date_naive()),
                return_date: None,
            })
            .await?;

        tracing::info!("Loan created: id={} book_id={} date={}", loan.id, book_id, loan.loan_date);
        Ok(loan)
    }

    /// Record the return of a loan.
    ///
    /// Submitting again for an already returned loan overwrites the date.
    pub async fn return_loan(&self, id: i32, return_date: Option<NaiveDate>) -> AppResult<Loan> {
        let return_date = return_date
            .ok_or_else(|| AppError::MissingField("return_date is required".to_string()))?;

        let loan = self
            .repository
            .loans
            .set_return_date(id, return_date)
            .await?
            .ok_or_else(|| loan_not_found(id))?;

        tracing::info!("Loan returned: id={} book_id={} date={}", id, loan.book_id, return_date);
        Ok(loan)
    }

    pub async fn delete_loan(&self, id: i32) -> AppResult<()> {
        if !self.repository.loans.delete(id).await? {
            return Err(loan_not_found(id));
        }
        tracing::info!("Loan deleted: id={}", id);
        Ok(())
    }
}

fn loan_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Loan with id {} not found", id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::Book,
        repository::{MockBookRepository, MockLoanRepository},
    };

    fn book(id: i32) -> Book {
        let now = Utc::now();
        Book {
            id,
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            isbn: "9780451524935".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn open_loan(book_id: i32) -> Loan {
        let now = Utc::now();
        Loan {
            id: 9,
            book_id,
            loan_date: now.date_naive(),
            return_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn unavailable_book_is_refused_without_insert() {
        let mut books = MockBookRepository::new();
        books.expect_find_by_id().returning(|id| Ok(Some(book(id))));
        let mut loans = MockLoanRepository::new();
        loans
            .expect_find_open_for_books()
            .withf(|ids| ids == &vec![1])
            .returning(|_| Ok(vec![open_loan(1)]));
        loans.expect_create().never();

        let service = LoansService::new(Repository::from_parts(Arc::new(books), Arc::new(loans)));
        let err = service.create_loan(1, None).await.unwrap_err();
        assert!(matches!(err, AppError::BookUnavailable(_)));
    }

    #[tokio::test]
    async fn loan_date_defaults_to_today() {
        let mut books = MockBookRepository::new();
        books.expect_find_by_id().returning(|id| Ok(Some(book(id))));
        let mut loans = MockLoanRepository::new();
        loans.expect_find_open_for_books().returning(|_| Ok(vec![]));
        loans
            .expect_create()
            .withf(|new| new.loan_date == Utc::now().date_naive() && new.return_date.is_none())
            .times(1)
            .returning(|new| {
                let mut loan = open_loan(new.book_id);
                loan.loan_date = new.loan_date;
                Ok(loan)
            });

        let service = LoansService::new(Repository::from_parts(Arc::new(books), Arc::new(loans)));
        let loan = service.create_loan(1, None).await.unwrap();
        assert!(loan.is_open());
    }

    #[tokio::test]
    async fn return_without_date_is_missing_field() {
        let mut loans = MockLoanRepository::new();
        loans.expect_set_return_date().never();

        let service = LoansService::new(Repository::from_parts(
            Arc::new(MockBookRepository::new()),
            Arc::new(loans),
        ));
        let err = service.return_loan(1, None).await.unwrap_err();
        assert!(matches!(err, AppError::MissingField(_)));
    }
}
