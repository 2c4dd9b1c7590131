//! Inbound peer requests: `GET {base_path}{group}/{key}`.
//!
//! Status mapping:
//! - 200: the value, encoded in the deployment's wire format
//! - 400: path outside the base path, or not `{group}/{key}`, or empty key
//! - 404: unknown group
//! - 405: any method other than GET
//! - 500: the origin loader failed

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::group::cache_group::GroupError;
use crate::group::registry::GroupRegistry;
use crate::peers::protocol::WireFormat;

/// Shared state of the peer router.
#[derive(Debug, Clone)]
pub struct PeerRouteState {
    pub registry: Arc<GroupRegistry>,
    pub self_addr: String,
    pub base_path: String,
    pub wire_format: WireFormat,
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Path outside base path: {0}")]
    ProtocolViolation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    #[error(transparent)]
    Group(#[from] GroupError),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::ProtocolViolation(_) | RouteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouteError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::Group(GroupError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            RouteError::Group(GroupError::UnknownGroup(_)) => StatusCode::NOT_FOUND,
            RouteError::Group(GroupError::OriginLoadFailed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "Peer request rejected");
        (status, self.to_string()).into_response()
    }
}

/// Build the router answering peer fetches for every group in the registry.
pub fn build_router(state: PeerRouteState) -> Router {
    Router::new()
        .fallback(serve_peer_request)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

async fn serve_peer_request(
    State(state): State<Arc<PeerRouteState>>,
    method: Method,
    uri: Uri,
) -> Result<Response, RouteError> {
    let path = uri.path();
    info!(node = %state.self_addr, %method, path, "Peer request");

    if method != Method::GET {
        return Err(RouteError::MethodNotAllowed(method));
    }

    let (group_name, key) = parse_path(&state.base_path, path)?;
    let group = state.registry.get(&group_name)?;
    let value = group.get(&key).await?;

    let body = state.wire_format.encode(value.to_bytes());
    Ok(([(header::CONTENT_TYPE, state.wire_format.content_type())], body).into_response())
}

/// Split `{base_path}{group}/{key}` into its percent-decoded group and key.
///
/// Only the first `/` after the group separates; the key may contain more.
pub fn parse_path(base_path: &str, path: &str) -> Result<(String, String), RouteError> {
    let rest = path
        .strip_prefix(base_path)
        .ok_or_else(|| RouteError::ProtocolViolation(path.to_string()))?;
    let (group, key) = rest
        .split_once('/')
        .ok_or_else(|| RouteError::BadRequest(format!("expected {base_path}<group>/<key>, got {path}")))?;
    Ok((decode(group)?, decode(key)?))
}

fn decode(segment: &str) -> Result<String, RouteError> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| RouteError::BadRequest(e.to_string()))
}
