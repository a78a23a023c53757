// Helpers shared by handler and router tests

use axum::{Router, response::Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::rate_limit::RateLimiter;
use crate::routes::router;
use crate::state::{AppState, EnrichSettings};
use crate::store::{CounterStore, MemoryCounterStore};
use crate::upstream::{Upstream, build_client};

// Serve a fake collaborator on an ephemeral port, returns its base url
pub async fn spawn_collaborator(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn gateway_with_store(
    store: Arc<dyn CounterStore>,
    limit: u64,
    user_service: &str,
    listing_service: &str,
) -> Router {
    let state = Arc::new(AppState {
        client: build_client(Duration::from_secs(5)).unwrap(),
        upstream: Upstream::new(user_service, listing_service),
        rate_limiter: RateLimiter::new(store, limit, Duration::from_secs(60)),
        enrich: EnrichSettings {
            timeout: Duration::from_secs(2),
            concurrency: 4,
        },
        max_body_bytes: 64 * 1024,
    });
    router(state)
}

// Gateway with a limit no test will reach
pub fn gateway(user_service: &str, listing_service: &str) -> Router {
    gateway_with_store(
        Arc::new(MemoryCounterStore::new()),
        u64::MAX,
        user_service,
        listing_service,
    )
}

pub async fn body_json(res: Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
