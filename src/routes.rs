use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::handlers::{
    create_listing_handler, create_user_handler, get_listings_handler, health_handler,
    metrics_handler,
};
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    // only the public surface is throttled
    let public = Router::new()
        .route("/public-api/users", post(create_user_handler))
        .route(
            "/public-api/listings",
            post(create_listing_handler).get(get_listings_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
