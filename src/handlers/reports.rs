use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::non_blank;
use crate::{
    errors::ServiceError,
    models::YearMonth,
    reports::{CostSummary, FilterOptions, GroupingMode},
    services::{MachineTimeQuery, MachineTimeReport},
    ApiResponse, ApiResult, AppState,
};

/// Raw query string of the machine-time report. Values arrive as text so
/// blank form fields can be ignored instead of rejected.
#[derive(Debug, Default, Deserialize)]
pub struct MachineTimeParams {
    pub group_by: Option<String>,
    pub order_id: Option<String>,
    pub month: Option<String>,
}

impl MachineTimeParams {
    /// Parses the parameters, keeping only the filter that belongs to the
    /// chosen grouping.
    pub fn into_query(self) -> Result<MachineTimeQuery, ServiceError> {
        let mode = match non_blank(self.group_by) {
            Some(raw) => raw.parse::<GroupingMode>().map_err(|_| {
                ServiceError::InvalidInput(format!(
                    "group_by must be `order` or `month`, got `{}`",
                    raw
                ))
            })?,
            None => GroupingMode::default(),
        };

        let query = match mode {
            GroupingMode::ByOrder => MachineTimeQuery {
                mode,
                order_id: non_blank(self.order_id),
                month: None,
            },
            GroupingMode::ByMonth => MachineTimeQuery {
                mode,
                order_id: None,
                month: non_blank(self.month)
                    .map(|raw| raw.parse::<YearMonth>())
                    .transpose()
                    .map_err(|e| ServiceError::InvalidInput(e.to_string()))?,
            },
        };
        Ok(query)
    }
}

/// Machine minutes grouped by order or month, with the matching chart.
pub async fn machine_time_report(
    State(state): State<AppState>,
    Query(params): Query<MachineTimeParams>,
) -> ApiResult<MachineTimeReport> {
    let query = params.into_query()?;
    let report = state.ledger.machine_time_report(&query).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Per-order labor cost, rounded to cents.
pub async fn order_cost_report(State(state): State<AppState>) -> ApiResult<CostSummary> {
    let summary = state.ledger.order_cost_report().await?;
    Ok(Json(ApiResponse::success(summary.display_rounded())))
}

/// Orders and months available to the report filters.
pub async fn filter_options(State(state): State<AppState>) -> ApiResult<FilterOptions> {
    let options = state.ledger.filter_options().await?;
    Ok(Json(ApiResponse::success(options)))
}
