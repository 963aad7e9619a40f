use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::utilization::core::records::tag_key;
use crate::modules::utilization::use_cases::cache_status::inbound::http as cache_http;
use crate::modules::utilization::use_cases::company_rollup::inbound::http as rollup_http;
use crate::modules::utilization::use_cases::filter_pool::inbound::http as filter_http;
use crate::modules::utilization::use_cases::get_snapshot::inbound::http as snapshot_http;
use crate::modules::utilization::use_cases::list_periods::inbound::http as periods_http;
use crate::modules::utilization::use_cases::refresh_snapshot::inbound::http as refresh_http;
use crate::shared::core::periods::{PeriodCatalog, PeriodResolution};
use crate::shared::core::primitives::Granularity;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(snapshot_http::handle))
        .route("/refresh", post(refresh_http::handle))
        .route("/pools/filter", get(filter_http::handle))
        .route("/company-rollup", get(rollup_http::handle))
        .route("/available-periods", get(periods_http::handle))
        .route("/cache-status", get(cache_http::handle_status))
        .route("/cache", delete(cache_http::handle_clear))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Granularity defaults to monthly. An unknown granularity is a 400, an unknown period
/// is substituted.
pub fn resolve_period(
    periods: &PeriodCatalog,
    granularity: Option<&str>,
    period: Option<&str>,
) -> Result<PeriodResolution, Response> {
    let granularity = match granularity.map(str::trim).filter(|g| !g.is_empty()) {
        None => Granularity::Monthly,
        Some(raw) => raw
            .parse::<Granularity>()
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?,
    };
    Ok(periods.resolve(granularity, period))
}

/// Maps the requested entity onto its configured spelling. A blank entity is a 400,
/// one that is not configured a 404.
pub fn require_entity(entities: &[String], entity: Option<&str>) -> Result<String, Response> {
    let requested = entity
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "missing entity"))?;
    let wanted = tag_key(requested);
    match entities.iter().find(|e| tag_key(e) == wanted) {
        Some(configured) => Ok(configured.clone()),
        None => {
            let message = format!("unknown entity: {requested}");
            Err(error_response(StatusCode::NOT_FOUND, message))
        }
    }
}

/// `KSA, UAE` -> ["KSA", "UAE"]
pub fn split_pools(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
