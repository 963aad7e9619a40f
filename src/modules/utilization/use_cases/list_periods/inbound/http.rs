use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::shared::core::periods::{PeriodCatalog, PeriodOption};
use crate::shared::core::primitives::Granularity;
use crate::shell::http::error_response;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct AvailablePeriodsParams {
    pub granularity: Option<String>,
}

#[derive(Serialize)]
pub struct AvailablePeriodsResponse {
    pub granularity: Granularity,
    pub year: i32,
    pub default: String,
    pub base_capacity_hours: f64,
    pub periods: Vec<PeriodOption>,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<AvailablePeriodsParams>,
) -> impl IntoResponse {
    let granularity = match params.granularity.as_deref() {
        None => Granularity::Monthly,
        Some(raw) => match raw.parse::<Granularity>() {
            Ok(granularity) => granularity,
            Err(error) => return error_response(StatusCode::BAD_REQUEST, error.to_string()),
        },
    };

    Json(AvailablePeriodsResponse {
        granularity,
        year: state.periods.year(),
        default: state.periods.default_value(granularity),
        base_capacity_hours: PeriodCatalog::base_capacity_hours(granularity),
        periods: state.periods.periods(granularity),
    })
    .into_response()
}
