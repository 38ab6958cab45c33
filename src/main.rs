mod config;
mod handlers;
mod metrics;
mod middleware;
mod rate_limit;
mod state;
mod sweeper;

use axum::{
    Router,
    routing::get,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::handlers::{health_handler, metrics_handler, proxy_handler};
use crate::middleware::{attach_identity, enforce_rate_limit};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::sweeper::window_sweeper;

#[tokio::main]
async fn main() {
    // parse cli arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // creating shared state
    let state = Arc::new(AppState {
        client: reqwest::Client::new(),
        backend: args.backend.trim_end_matches('/').to_string(),
        limiter: RateLimiter::new(args.requests_per_minute, args.requests_per_hour),
    });

    // spawn the background eviction sweep
    let sweep_state = Arc::clone(&state);
    tokio::spawn(async move {
        window_sweeper(sweep_state, Duration::from_secs(args.sweep_interval)).await;
    });

    // creating the router; identity attach runs first, then admission
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(proxy_handler)
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            enforce_rate_limit,
        ))
        .layer(axum::middleware::from_fn(attach_identity))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!(port = args.port, "gateway running");
    info!(backend = %args.backend, "forwarding to ticket API");
    info!(
        requests_per_minute = args.requests_per_minute,
        requests_per_hour = args.requests_per_hour,
        "rate limits"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
