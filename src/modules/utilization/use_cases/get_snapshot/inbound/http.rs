use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::modules::utilization::core::fetch_state::FetchState;
use crate::modules::utilization::core::snapshot::Snapshot;
use crate::shared::core::primitives::{CacheKey, PeriodKey, now_millis};
use crate::shell::http::{error_response, require_entity, resolve_period};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct SnapshotParams {
    pub entity: Option<String>,
    pub granularity: Option<String>,
    pub period: Option<String>,
    pub wait: Option<bool>,
}

#[derive(Serialize)]
pub struct SnapshotResponse<'a> {
    pub period_substituted: bool,
    pub age_ms: i64,
    pub state: FetchState,
    pub snapshot: &'a Snapshot,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub key: CacheKey,
    pub period_key: PeriodKey,
    pub period_substituted: bool,
    pub state: FetchState,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<SnapshotParams>,
) -> impl IntoResponse {
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
    state.coordinator.observe(Some(key.clone())).await;

    if !params.wait.unwrap_or(true) {
        let outcome = state.coordinator.request(&key).await;
        return match outcome.snapshot {
            Some(snapshot) => Json(SnapshotResponse {
                period_substituted: resolution.substituted,
                age_ms: snapshot.age_ms(now_millis()),
                state: outcome.state,
                snapshot: &snapshot,
            })
            .into_response(),
            None => (
                StatusCode::ACCEPTED,
                Json(PendingResponse {
                    key,
                    period_key: resolution.key,
                    period_substituted: resolution.substituted,
                    state: outcome.state,
                }),
            )
                .into_response(),
        };
    }

    match state.coordinator.get_snapshot(&key).await {
        Ok(snapshot) => Json(SnapshotResponse {
            period_substituted: resolution.substituted,
            age_ms: snapshot.age_ms(now_millis()),
            state: state.coordinator.fetch_state(&key).await,
            snapshot: &snapshot,
        })
        .into_response(),
        Err(error) => error_response(StatusCode::BAD_GATEWAY, error.to_string()),
    }
}
