//! Loan model and related types

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Loan record from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    /// Unset while the loan is in progress
    pub return_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// A loan is open until a return date has been recorded
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Minimal book reference embedded in loan listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookRef {
    pub id: i32,
    pub title: String,
    pub author: String,
}

/// Loan with its book, for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book: BookRef,
    pub loan_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanDetails {
    pub fn new(loan: Loan, book: BookRef) -> Self {
        Self {
            id: loan.id,
            book,
            loan_date: loan.loan_date,
            is_open: loan.is_open(),
            return_date: loan.return_date,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }
}

/// Flat row of a loan joined with its book
#[derive(Debug, FromRow)]
pub struct LoanDetailsRow {
    pub id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
}

impl From<LoanDetailsRow> for LoanDetails {
    fn from(row: LoanDetailsRow) -> Self {
        let book = BookRef {
            id: row.book_id,
            title: row.book_title,
            author: row.book_author,
        };
        LoanDetails {
            id: row.id,
            book,
            loan_date: row.loan_date,
            is_open: row.return_date.is_none(),
            return_date: row.return_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Loan to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// Restriction applied to loan listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanFilter {
    #[default]
    All,
    /// Loans without a return date
    Open,
    /// Loans with a return date
    Closed,
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        match self {
            LoanFilter::All => true,
            LoanFilter::Open => loan.is_open(),
            LoanFilter::Closed => !loan.is_open(),
        }
    }
}

impl FromStr for LoanFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(LoanFilter::All),
            "open" => Ok(LoanFilter::Open),
            "closed" => Ok(LoanFilter::Closed),
            other => Err(AppError::InvalidField(format!(
                "Unknown loan filter '{}' (expected all, open or closed)",
                other
            ))),
        }
    }
}
