use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GatewayError, StoreError};
use crate::metrics::RATE_LIMITED;
use crate::state::AppState;
use crate::store::CounterStore;

// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { count: u64 },
    Rejected { count: u64 },
}

/// Fixed window limiter keyed by client address.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u64, // max requests per window
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    pub fn key(address: &str) -> String {
        format!("ratelimit:{}", address)
    }

    pub async fn check(&self, address: &str) -> Result<Admission, StoreError> {
        let count = self
            .store
            .incr_window(&Self::key(address), self.window)
            .await?;

        if count > self.limit {
            Ok(Admission::Rejected { count })
        } else {
            Ok(Admission::Allowed { count })
        }
    }
}

// Client address: first X-Forwarded-For hop, then X-Real-IP, then the peer socket
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let address = client_address(req.headers(), peer);

    match state.rate_limiter.check(&address).await {
        Ok(Admission::Allowed { count }) => {
            tracing::trace!(client = %address, count, "request admitted");
            next.run(req).await
        }
        Ok(Admission::Rejected { count }) => {
            RATE_LIMITED.inc();
            tracing::info!(client = %address, count, "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": "Rate limit exceeded" })),
            )
                .into_response()
        }
        Err(e) => GatewayError::from(e).into_response(),
    }
}
