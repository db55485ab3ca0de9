use axum::{extract::State, Json};
use tracing::info;

use crate::{
    models::{WageDraft, WageRecord},
    ApiResponse, ApiResult, AppState,
};

pub async fn list_wages(State(state): State<AppState>) -> ApiResult<Vec<WageRecord>> {
    let wages = state.ledger.list_wages().await?;
    Ok(Json(ApiResponse::success(wages)))
}

/// Creates or replaces the hourly rate of one person.
pub async fn upsert_wage(
    State(state): State<AppState>,
    Json(draft): Json<WageDraft>,
) -> ApiResult<WageRecord> {
    let wage = draft.parse()?;
    state.ledger.upsert_wage(&wage).await?;
    info!(person = %wage.person, "Wage saved via API");

    Ok(Json(
        ApiResponse::success(wage).with_message("Salario guardado correctamente"),
    ))
}
