use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::metrics::RATE_STORE_ERRORS;

/// Failure talking to the rate counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("counter store timed out")]
    Timeout,
    #[error("counter store command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// Errors surfaced to public callers. Enrichment failures never end up here.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    BadGateway(&'static str),
    #[error("{0}")]
    Internal(&'static str),
    #[error("rate limiter error: {0}")]
    RateStore(#[from] StoreError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::RateStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(m) | Self::BadGateway(m) | Self::Internal(m) => m,
            Self::RateStore(_) => "Rate limiter error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let Self::RateStore(e) = &self {
            RATE_STORE_ERRORS.inc();
            tracing::warn!(error = %e, "rate counter store failed, request not admitted");
        }
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}
