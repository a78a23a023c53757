mod health;
mod metrics;
mod listings;
mod users;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use listings::{create_listing_handler, get_listings_handler};
pub use users::create_user_handler;

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, header::CONTENT_TYPE},
    response::Response,
};

use crate::error::GatewayError;

// Read an inbound body, anything that can't be buffered is the caller's fault
async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| GatewayError::BadRequest("Invalid body"))
}

// Relay a collaborator reply: same status, same body
async fn relay(res: reqwest::Response, unavailable: &'static str) -> Result<Response, GatewayError> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let body = res.bytes().await.map_err(|e| {
        tracing::warn!(error = %e, "collaborator reply cut off");
        GatewayError::BadGateway(unavailable)
    })?;

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|_| GatewayError::Internal("Failed to build response"))
}
