use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::utilization::use_cases::refresh_snapshot::handler::RefreshOutcome;
use crate::shared::core::primitives::{CacheKey, PeriodKey};
use crate::shell::http::{require_entity, resolve_period};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct RefreshBody {
    pub entity: Option<String>,
    pub granularity: Option<String>,
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct RefreshResult {
    pub key: CacheKey,
    pub refresh_failed: bool,
    pub error: Option<String>,
    pub fetch_id: Option<Uuid>,
    pub fetched_at: Option<i64>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub period_key: PeriodKey,
    pub period_substituted: bool,
    pub results: Vec<RefreshResult>,
}

impl From<RefreshOutcome> for RefreshResult {
    fn from(outcome: RefreshOutcome) -> Self {
        Self {
            refresh_failed: !outcome.is_success(),
            error: outcome.error.map(|e| e.to_string()),
            fetch_id: outcome.snapshot.as_ref().map(|s| s.fetch_id),
            fetched_at: outcome.snapshot.as_ref().map(|s| s.fetched_at),
            key: outcome.key,
        }
    }
}

/// No entity refreshes every configured entity of the period. A failed refresh that
/// still has a snapshot to serve is a 200 flagged `refresh_failed`; a 502 means no
/// requested entity has any snapshot left.
pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<RefreshBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    let resolution = match resolve_period(
        &state.periods,
        body.granularity.as_deref(),
        body.period.as_deref(),
    ) {
        Ok(resolution) => resolution,
        Err(response) => return response,
    };

    let requested = body
        .entity
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let outcomes = match requested {
        Some(raw) => {
            let entity = match require_entity(&state.entities, Some(raw)) {
                Ok(entity) => entity,
                Err(response) => return response,
            };
            let key = CacheKey::new(entity, &resolution.key);
            vec![state.refresh_controller.refresh(&key).await]
        }
        None => {
            state
                .refresh_controller
                .refresh_all(&state.entities, &resolution.key)
                .await
        }
    };

    let status = if !outcomes.is_empty() && outcomes.iter().all(|o| o.snapshot.is_none()) {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(RefreshResponse {
            period_key: resolution.key,
            period_substituted: resolution.substituted,
            results: outcomes.into_iter().map(RefreshResult::from).collect(),
        }),
    )
        .into_response()
}
