use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::modules::utilization::use_cases::company_rollup::handler::CompanyRollup;
use crate::shell::http::{resolve_period, split_pools};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct CompanyRollupParams {
    pub granularity: Option<String>,
    pub period: Option<String>,
    pub pools: Option<String>,
}

#[derive(Serialize)]
pub struct CompanyRollupResponse {
    pub period_substituted: bool,
    #[serde(flatten)]
    pub rollup: CompanyRollup,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<CompanyRollupParams>,
) -> impl IntoResponse {
    let resolution = match resolve_period(
        &state.periods,
        params.granularity.as_deref(),
        params.period.as_deref(),
    ) {
        Ok(resolution) => resolution,
        Err(response) => return response,
    };
    let pools = split_pools(params.pools.as_deref());
    let rollup = state.company_rollup.handle(&resolution.key, &pools).await;

    Json(CompanyRollupResponse {
        period_substituted: resolution.substituted,
        rollup,
    })
    .into_response()
}
