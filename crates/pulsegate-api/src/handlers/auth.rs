//! Token verification handler.

use axum::Json;

use crate::dto::response::{ApiResponse, VerifyResponse};
use crate::extractors::GateVerdict;

/// GET /api/auth/verify
///
/// Reaching the handler means the gate admitted the token.
pub async fn verify(GateVerdict(decision): GateVerdict) -> Json<ApiResponse<VerifyResponse>> {
    Json(ApiResponse::ok(VerifyResponse {
        valid: decision.is_allowed(),
        decision: decision.as_str().to_string(),
    }))
}
