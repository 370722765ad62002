//! Upstream authentication service seam.

pub mod http;

pub use http::HttpAuthUpstream;

use async_trait::async_trait;

use pulsegate_core::result::AppResult;
use pulsegate_core::types::Token;

/// A definitive answer from the authentication service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamVerdict {
    /// The service accepted the token.
    Accepted,
    /// The service explicitly refused the token.
    Rejected,
}

/// Validates a bearer token against the authentication service.
///
/// Implementations return `Ok` only for definitive answers. Anything that
/// prevents an answer (unreachable host, timeout, 5xx) must come back as a
/// transient [`AppError`](pulsegate_core::AppError) so the gate can apply
/// its availability policy.
#[async_trait]
pub trait AuthUpstream: Send + Sync + std::fmt::Debug + 'static {
    /// Ask the service whether `token` is valid.
    async fn validate(&self, token: &Token) -> AppResult<UpstreamVerdict>;
}
