//! Loans repository for PostgreSQL

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use super::LoanRepository;
use crate::{
    error::AppResult,
    models::{loan::LoanDetailsRow, Loan, LoanDetails, LoanFilter, NewLoan},
};

const LOAN_COLUMNS: &str = "id, book_id, loan_date, return_date, created_at, updated_at";

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.book_id, l.loan_date, l.return_date, l.created_at, l.updated_at,
           b.title AS book_title, b.author AS book_author
    FROM loans l
    JOIN books b ON b.id = l.book_id
"#;

fn filter_condition(filter: LoanFilter) -> &'static str {
    match filter {
        LoanFilter::All => "TRUE",
        LoanFilter::Open => "l.return_date IS NULL",
        LoanFilter::Closed => "l.return_date IS NOT NULL",
    }
}

#[derive(Clone)]
pub struct PgLoanRepository {
    pool: Pool<Postgres>,
}

impl PgLoanRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepository for PgLoanRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE id = $1",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    async fn find_details(&self, id: i32) -> AppResult<Option<LoanDetails>> {
        let row = sqlx::query_as::<_, LoanDetailsRow>(&format!("{} WHERE l.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LoanDetails::from))
    }

    async fn find_by_book(&self, book_id: i32, limit: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {}
            FROM loans
            WHERE book_id = $1
            ORDER BY loan_date DESC, id DESC
            LIMIT $2
            "#,
            LOAN_COLUMNS
        ))
        .bind(book_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    async fn count_by_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_open_for_books(&self, book_ids: Vec<i32>) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE book_id = ANY($1) AND return_date IS NULL",
            LOAN_COLUMNS
        ))
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    async fn find_all_open(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE return_date IS NULL",
            LOAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    async fn count(&self, filter: LoanFilter) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM loans l WHERE {}",
            filter_condition(filter)
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list(&self, filter: LoanFilter, limit: i64, offset: i64) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&format!(
            r#"
            {}
            WHERE {}
            ORDER BY l.loan_date DESC, l.id DESC
            LIMIT $1 OFFSET $2
            "#,
            DETAILS_SELECT,
            filter_condition(filter)
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    async fn create(&self, loan: NewLoan) -> AppResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (book_id, loan_date, return_date, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan.book_id)
        .bind(loan.loan_date)
        .bind(loan.return_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_return_date(&self, id: i32, return_date: NaiveDate) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans
            SET return_date = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(return_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM loans")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
