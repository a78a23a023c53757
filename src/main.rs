mod config;
mod enrich;
mod error;
mod form;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod routes;
mod state;
mod store;
mod upstream;

#[cfg(test)]
mod test_support;

use clap::Parser; // for cli
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, RateStoreKind};
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, EnrichSettings};
use crate::store::{CounterStore, MemoryCounterStore, RedisCounterStore, sweeper};
use crate::upstream::{Upstream, build_client};

// this is main async function with tokio
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();
    if let Err(e) = args.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    let store: Arc<dyn CounterStore> = match args.rate_store {
        RateStoreKind::Redis => match RedisCounterStore::new(&args.redis_url(), args.store_timeout()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "cannot set up redis counter store");
                return ExitCode::FAILURE;
            }
        },
        RateStoreKind::Memory => {
            let store = Arc::new(MemoryCounterStore::new());
            tokio::spawn(sweeper(Arc::clone(&store), args.rate_window()));
            store as Arc<dyn CounterStore>
        }
    };

    let client = match build_client(args.upstream_timeout()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "cannot build http client");
            return ExitCode::FAILURE;
        }
    };

    // creating shared state
    let state = Arc::new(AppState {
        client,
        upstream: Upstream::new(&args.user_service_url, &args.listing_service_url),
        rate_limiter: RateLimiter::new(store, args.rate_limit, args.rate_window()),
        enrich: EnrichSettings {
            timeout: args.enrich_timeout(),
            concurrency: args.enrich_concurrency,
        },
        max_body_bytes: args.max_body_bytes,
    });

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "cannot bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "gateway listening");
    tracing::info!(
        store = ?args.rate_store,
        limit = args.rate_limit,
        window = ?Duration::from_secs(args.rate_window),
        "rate limiting enabled"
    );

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
