//! `GateVerdict` extractor: the decision recorded by the token gate middleware.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use pulsegate_auth::GateDecision;
use pulsegate_core::error::AppError;

use crate::error::ApiError;

/// The gate decision that admitted this request.
///
/// Only available on routes behind
/// [`require_valid_token`](crate::middleware::auth::require_valid_token).
#[derive(Debug, Clone, Copy)]
pub struct GateVerdict(pub GateDecision);

impl<S: Send + Sync> FromRequestParts<S> for GateVerdict {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GateDecision>()
            .copied()
            .map(GateVerdict)
            .ok_or_else(|| AppError::internal("Route is not behind the token gate").into())
    }
}
