use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::{
    errors::ServiceError,
    models::{ProductionRecord, ProductionRecordDraft},
    ApiResponse, ApiResult, AppState,
};

/// Parses a submitted draft and stores it.
///
/// An invalid draft is answered with 400 before the store is contacted.
pub async fn create_production_record(
    State(state): State<AppState>,
    Json(draft): Json<ProductionRecordDraft>,
) -> Result<(StatusCode, Json<ApiResponse<ProductionRecord>>), ServiceError> {
    let record = draft.parse()?;
    state.ledger.insert_record(&record).await?;
    info!(order_id = %record.order_id, "Production record created via API");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record).with_message("Registro guardado correctamente")),
    ))
}

/// Every production record, newest date first.
pub async fn list_production_records(
    State(state): State<AppState>,
) -> ApiResult<Vec<ProductionRecord>> {
    let records = state.ledger.list_records().await?;
    Ok(Json(ApiResponse::success(records)))
}

/// Distinct people named in production records, sorted.
pub async fn list_persons(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let persons = state.ledger.list_persons().await?;
    Ok(Json(ApiResponse::success(persons)))
}
