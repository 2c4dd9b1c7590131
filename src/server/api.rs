//! Front-end API gateway for a single cache group.
//!
//! - GET /api?key=K    the value for K as octet-stream
//! - GET /api/stats    group counters and local cache usage

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::group::cache_group::{Group, GroupStats};
use crate::peers::protocol::OCTET_STREAM;

/// Build the gateway router serving `group`.
pub fn build_router(group: Arc<Group>) -> Router {
    Router::new()
        .route("/api", get(get_value))
        .route("/api/stats", get(group_stats))
        .with_state(group)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    #[serde(default)]
    pub key: String,
}

/// Group statistics response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub group: String,
    pub cached_entries: usize,
    pub cached_bytes: u64,
    pub stats: GroupStats,
}

async fn get_value(State(group): State<Arc<Group>>, Query(query): Query<ValueQuery>) -> Response {
    let request_id = Uuid::new_v4();
    info!(%request_id, group = group.name(), key = %query.key, "API request");

    match group.get(&query.key).await {
        Ok(value) => ([(header::CONTENT_TYPE, OCTET_STREAM)], value.to_bytes()).into_response(),
        Err(e) => {
            warn!(%request_id, error = %e, "API request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn group_stats(State(group): State<Arc<Group>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        group: group.name().to_string(),
        cached_entries: group.cached_entries(),
        cached_bytes: group.cached_bytes(),
        stats: group.stats(),
    })
}
