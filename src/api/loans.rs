//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{page::parse_page_number, Loan, LoanDetails, LoanFilter, Page},
    AppState,
};

/// Query parameters for the loan list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanListQuery {
    /// `all` (default), `open` or `closed`
    pub filter: Option<String>,
    /// Page number (default: 1, clamped to the valid range)
    pub page: Option<String>,
}

/// One page of loans
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoanListResponse {
    pub items: Vec<LoanDetails>,
    pub filter: LoanFilter,
    /// Current page number
    pub page: i64,
    /// Loans per page
    pub page_size: i64,
    pub total_pages: i64,
    /// Number of loans matching the filter
    pub total_count: i64,
}

impl LoanListResponse {
    fn new(filter: LoanFilter, page: Page<LoanDetails>) -> Self {
        Self {
            items: page.items,
            filter,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_count: page.total_count,
        }
    }
}

/// Create loan request
#[derive(Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Book to lend
    pub book_id: Option<i32>,
    /// Loan date (YYYY-MM-DD, default: today)
    pub loan_date: Option<NaiveDate>,
}

/// Return loan request
#[derive(Deserialize, ToSchema)]
pub struct ReturnLoanRequest {
    /// Return date (YYYY-MM-DD)
    pub return_date: Option<NaiveDate>,
}

/// List loans with filter and pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanListQuery),
    responses(
        (status = 200, description = "One page of loans, most recent first", body = LoanListResponse),
        (status = 400, description = "Unknown filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<LoanListQuery>,
) -> AppResult<Json<LoanListResponse>> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<LoanFilter>()?,
        None => LoanFilter::All,
    };

    let page = state
        .services
        .loans
        .list_loans(filter, parse_page_number(query.page.as_deref()))
        .await?;
    Ok(Json(LoanListResponse::new(filter, page)))
}

/// Get a loan with its book
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Lend a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Missing book", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let book_id = request
        .book_id
        .ok_or_else(|| AppError::MissingField("book_id is required".to_string()))?;

    let loan = state
        .services
        .loans
        .create_loan(book_id, request.loan_date)
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Record the return of a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnLoanRequest,
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 400, description = "Missing return date", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ReturnLoanRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .return_loan(id, request.return_date)
        .await?;
    Ok(Json(loan))
}

/// Delete a loan
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.loans.delete_loan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
