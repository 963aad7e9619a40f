use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::modules::utilization::core::metrics::DerivedMetricSet;
use crate::modules::utilization::core::pool_filter::{
    DatasetKind, FilteredRecords, PoolSelection, filter_pool,
};
use crate::shared::core::primitives::{CacheKey, PeriodKey};
use crate::shell::http::{error_response, require_entity, resolve_period, split_pools};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct PoolFilterParams {
    pub entity: Option<String>,
    pub granularity: Option<String>,
    pub period: Option<String>,
    pub dataset: Option<String>,
    pub pools: Option<String>,
}

#[derive(Serialize)]
pub struct PoolFilterResponse {
    pub period_key: PeriodKey,
    pub selection: String,
    pub count: usize,
    pub metrics: DerivedMetricSet,
    pub filtered: FilteredRecords,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<PoolFilterParams>,
) -> impl IntoResponse {
    let entity = match require_entity(&state.entities, params.entity.as_deref()) {
        Ok(entity) => entity,
        Err(response) => return response,
    };
    let kind = match params
        .dataset
        .as_deref()
        .unwrap_or("employees")
        .parse::<DatasetKind>()
    {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, error.to_string()),
    };
    let resolution = match resolve_period(
        &state.periods,
        params.granularity.as_deref(),
        params.period.as_deref(),
    ) {
        Ok(resolution) => resolution,
        Err(response) => return response,
    };

    let key = CacheKey::new(entity, &resolution.key);
    let snapshot = match state.coordinator.get_snapshot(&key).await {
        Ok(snapshot) => snapshot,
        Err(error) => return error_response(StatusCode::BAD_GATEWAY, error.to_string()),
    };

    let selection = PoolSelection::from_pools(kind, &split_pools(params.pools.as_deref()));
    let filtered = filter_pool(&snapshot, kind, &selection);
    Json(PoolFilterResponse {
        period_key: resolution.key,
        selection: selection.label(),
        count: filtered.len(),
        metrics: snapshot.metrics_for(&selection),
        filtered,
    })
    .into_response()
}
