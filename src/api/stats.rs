//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::CatalogueSummary, AppState};

/// Catalogue summary: books, available books, open loans
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Catalogue summary", body = CatalogueSummary)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<CatalogueSummary>> {
    let summary = state.services.stats.summary().await?;
    Ok(Json(summary))
}
