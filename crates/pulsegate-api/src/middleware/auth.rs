//! Token gate middleware for protected routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use pulsegate_core::error::AppError;
use pulsegate_core::types::Token;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects requests whose bearer token the gate does not admit.
///
/// A missing, non-bearer or malformed `Authorization` header is refused
/// before the gate, without an upstream call. On success the
/// [`GateDecision`](pulsegate_auth::GateDecision) is stored in the request
/// extensions.
pub async fn require_valid_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let token = match Token::from_authorization_header(header) {
        Ok(token) => token,
        Err(e) => {
            debug!(error = %e, "Request denied before token gate");
            return Err(AppError::authentication("Invalid or expired token").into());
        }
    };

    let decision = state.gate.validate_detailed(token.as_str()).await;
    if !decision.is_allowed() {
        debug!(decision = decision.as_str(), "Request denied by token gate");
        return Err(AppError::authentication("Invalid or expired token").into());
    }

    request.extensions_mut().insert(decision);
    Ok(next.run(request).await)
}
