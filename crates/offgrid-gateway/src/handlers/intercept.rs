//! Fallback handler routing every request through the interceptor.

use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use offgrid_core::{AssetRequest, AssetResponse};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SOURCE_HEADER: HeaderName = HeaderName::from_static("x-offgrid-source");

pub async fn intercept(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response();
        }
    };

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = match state.origin_url.join(target) {
        Ok(url) => url,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("Invalid request target: {}", e))
                .into_response();
        }
    };

    let mut asset = AssetRequest::new(parts.method, url).with_body(body);
    asset.headers = parts.headers;

    let response = state.interceptor.on_intercept(asset).await;
    debug!(status = %response.status, source = response.source.as_str(), "Request served");
    into_http_response(response)
}

fn into_http_response(asset: AssetResponse) -> Response {
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = asset.status;
    *response.headers_mut() = asset.headers;
    response
        .headers_mut()
        .insert(SOURCE_HEADER, HeaderValue::from_static(asset.source.as_str()));
    response
}
