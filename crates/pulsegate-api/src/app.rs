//! Application builder: wires router, middleware, and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use pulsegate_auth::{HttpAuthUpstream, TokenGate};
use pulsegate_core::config::AppConfig;
use pulsegate_core::result::AppResult;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Runs the PulseGate server until Ctrl-C.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!(upstream = %config.gate.profile_url(), "Initializing token gate...");
    let upstream = HttpAuthUpstream::new(&config.gate)?;
    let gate = TokenGate::new(&config.gate, Arc::new(upstream));
    let state = AppState::new(config, gate);

    let sweeper = spawn_cache_sweeper(Arc::clone(&state.gate));

    let addr = state.config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "PulseGate listening");

    let served = axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    info!("PulseGate stopped");
    Ok(served?)
}

/// Periodically drops stale verdicts so idle tokens do not hold cache slots.
fn spawn_cache_sweeper(gate: Arc<TokenGate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = gate.cache().ttl().max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = gate.cache().evict_stale();
            if removed > 0 {
                debug!(removed, "Evicted stale token verdicts");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
