//! HTTP validation against the authentication service's profile endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use pulsegate_core::config::GateConfig;
use pulsegate_core::error::AppError;
use pulsegate_core::result::AppResult;
use pulsegate_core::types::Token;

use super::{AuthUpstream, UpstreamVerdict};

/// Body of the profile endpoint. Only the success flag matters here.
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    success: bool,
}

/// Calls `GET {upstream}/api/auth/profile` with the token as a bearer credential.
#[derive(Debug, Clone)]
pub struct HttpAuthUpstream {
    client: reqwest::Client,
    profile_url: String,
}

impl HttpAuthUpstream {
    /// Creates the client from gate configuration. The client-level timeout
    /// matches the gate's upstream timeout.
    pub fn new(config: &GateConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config.profile_url()))
    }

    /// Creates an upstream from an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client, profile_url: impl Into<String>) -> Self {
        Self {
            client,
            profile_url: profile_url.into(),
        }
    }
}

/// Maps a status code to a verdict, or to a transient error when the
/// service could not give one.
fn classify_status(status: StatusCode) -> AppResult<Option<UpstreamVerdict>> {
    if status.is_success() {
        return Ok(None);
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::service_unavailable(format!(
            "Authentication service returned {status}"
        )));
    }
    Ok(Some(UpstreamVerdict::Rejected))
}

#[async_trait]
impl AuthUpstream for HttpAuthUpstream {
    async fn validate(&self, token: &Token) -> AppResult<UpstreamVerdict> {
        let response = self
            .client
            .get(&self.profile_url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        if let Some(verdict) = classify_status(status)? {
            debug!(%status, "Authentication service refused token");
            return Ok(verdict);
        }

        // A 2xx without an explicit success flag is not an acceptance.
        match response.json::<ProfileResponse>().await {
            Ok(body) if body.success => Ok(UpstreamVerdict::Accepted),
            Ok(_) => Ok(UpstreamVerdict::Rejected),
            Err(e) => {
                debug!(error = %e, "Unreadable profile response, treating as rejection");
                Ok(UpstreamVerdict::Rejected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsegate_core::error::ErrorKind;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK).unwrap(), None);
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED).unwrap(),
            Some(UpstreamVerdict::Rejected)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN).unwrap(),
            Some(UpstreamVerdict::Rejected)
        );

        let err = classify_status(StatusCode::BAD_GATEWAY).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transient() {
        let config = GateConfig {
            // Port 9 (discard) on localhost is refused on any sane test host.
            upstream_url: "http://127.0.0.1:9".to_string(),
            upstream_timeout_ms: 500,
            ..GateConfig::default()
        };
        let upstream = HttpAuthUpstream::new(&config).unwrap();
        let token = Token::parse("a.b.c").unwrap();

        let err = upstream.validate(&token).await.unwrap_err();
        assert!(err.is_transient(), "unexpected kind {:?}", err.kind);
    }
}
