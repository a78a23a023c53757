use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use super::{read_body, relay};
use crate::error::GatewayError;
use crate::metrics::{REQUEST_TOTAL, UPSTREAM_LATENCY};
use crate::state::AppState;

const UNAVAILABLE: &str = "User service unavailable";

// Forward the body to the user service as is
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, GatewayError> {
    REQUEST_TOTAL.inc();

    let body = read_body(body, state.max_body_bytes).await?;
    let content_type = headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let start = Instant::now();
    let res = state
        .client
        .post(state.upstream.create_user_url())
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "user service call failed");
            GatewayError::BadGateway(UNAVAILABLE)
        })?;
    UPSTREAM_LATENCY
        .with_label_values(&["user"])
        .observe(start.elapsed().as_secs_f64());

    relay(res, UNAVAILABLE).await
}
