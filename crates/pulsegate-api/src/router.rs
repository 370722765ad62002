//! Route definitions for the PulseGate HTTP API.
//!
//! Protected routes are mounted under `/api` behind the token gate
//! middleware; `/health` is public.

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and per-route middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(protected_routes(&state));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Routes that require a token admitted by the gate.
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/verify", get(handlers::auth::verify))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_valid_token,
        ))
}
