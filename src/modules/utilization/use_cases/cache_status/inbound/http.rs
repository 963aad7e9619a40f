use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::modules::utilization::use_cases::get_snapshot::handler::CacheStatusRow;
use crate::shared::core::primitives::CacheKey;
use crate::shell::http::{require_entity, resolve_period};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct CacheClearParams {
    pub entity: Option<String>,
    pub granularity: Option<String>,
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct CacheStatusResponse {
    pub entries: Vec<CacheStatusRow>,
}

pub async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(CacheStatusResponse {
        entries: state.coordinator.cache_status().await,
    })
}

/// Without an entity every cached snapshot is dropped, with one only that entity's
/// snapshot for the resolved period.
pub async fn handle_clear(
    State(state): State<AppState>,
    Query(params): Query<CacheClearParams>,
) -> impl IntoResponse {
    if params.entity.is_none() {
        state.coordinator.clear().await;
        return StatusCode::NO_CONTENT.into_response();
    }
    let entity = match require_entity(&state.entities, params.entity.as_deref()) {
        Ok(entity) => entity,
        Err(response) => return response,
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
    state.coordinator.invalidate(&key).await;
    StatusCode::NO_CONTENT.into_response()
}
