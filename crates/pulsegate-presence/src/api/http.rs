//! reqwest implementation of the session API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

use pulsegate_core::config::{PresenceConfig, SessionEndpoints};
use pulsegate_core::error::AppError;
use pulsegate_core::result::AppResult;
use pulsegate_core::types::{PresenceStatus, SessionRecord};

use super::{CsrfTokenCache, SessionApi};

/// Header carrying the CSRF token on mutating calls.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

const NO_ACTIVE_SESSION: &str = "NO_ACTIVE_SESSION";
const AUTH_REQUIRED: &str = "AUTH_REQUIRED";

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    csrf_token: String,
}

/// Error body returned by the session service. Only the code is inspected.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

/// Session API client over HTTP.
///
/// Cloning is cheap and clones share the connection pool and CSRF token.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: reqwest::Client,
    config: Arc<PresenceConfig>,
    bearer: Option<String>,
    csrf: Arc<CsrfTokenCache>,
}

impl HttpSessionApi {
    /// Create a client from presence configuration. Each request is bounded
    /// by the configured request timeout.
    pub fn new(config: &PresenceConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config.clone()))
    }

    /// Create a client around an existing reqwest client.
    pub fn with_client(client: reqwest::Client, config: PresenceConfig) -> Self {
        let csrf = Arc::new(CsrfTokenCache::new(config.csrf_ttl()));
        Self {
            client,
            config: Arc::new(config),
            bearer: None,
            csrf,
        }
    }

    /// Send `token` as a bearer credential on every call.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// The CSRF token cache.
    pub fn csrf(&self) -> &CsrfTokenCache {
        &self.csrf
    }

    fn endpoints(&self) -> &SessionEndpoints {
        &self.config.endpoints
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.config.url(path));
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn csrf_token(&self) -> AppResult<String> {
        if let Some(token) = self.csrf.get() {
            return Ok(token);
        }

        let response = self
            .request(Method::GET, &self.endpoints().csrf)
            .send()
            .await?;
        let body: CsrfResponse = check(response).await?.json().await?;

        debug!("Fetched CSRF token");
        self.csrf.put(body.csrf_token.clone());
        Ok(body.csrf_token)
    }

    async fn send_mutation(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> AppResult<Response> {
        let token = self.csrf_token().await?;
        let mut request = self.request(method.clone(), path).header(CSRF_HEADER, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Perform a CSRF-protected call. A refused token is dropped and the
    /// call is retried once with a fresh one.
    async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> AppResult<()> {
        let mut response = self.send_mutation(&method, path, body.as_ref()).await?;
        if response.status() == StatusCode::FORBIDDEN {
            debug!(path, "CSRF token refused, refetching");
            self.csrf.invalidate();
            response = self.send_mutation(&method, path, body.as_ref()).await?;
            if response.status() == StatusCode::FORBIDDEN {
                self.csrf.invalidate();
            }
        }

        check(response).await.map(|_| ())
    }
}

/// Pass a successful response through, or classify a failed one.
async fn check(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let code = serde_json::from_str::<ErrorBody>(&body)
        .unwrap_or_default()
        .code;
    Err(classify(status, code.as_deref()))
}

/// Map a failed response onto the error taxonomy: `Authentication` when
/// the caller must sign in again, `Session` when no session exists, and a
/// transient kind otherwise.
fn classify(status: StatusCode, code: Option<&str>) -> AppError {
    match (status, code) {
        (_, Some(NO_ACTIVE_SESSION)) | (StatusCode::NOT_FOUND, _) => {
            AppError::session(format!("No active session ({status})"))
        }
        (_, Some(AUTH_REQUIRED)) | (StatusCode::UNAUTHORIZED, _) => {
            AppError::authentication(format!("Authentication required ({status})"))
        }
        _ if status.is_server_error() => {
            AppError::service_unavailable(format!("Session service returned {status}"))
        }
        _ => AppError::external_service(format!("Session service returned {status}")),
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn current_session(&self) -> AppResult<SessionRecord> {
        let response = self
            .request(Method::GET, &self.endpoints().current)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn heartbeat(&self) -> AppResult<()> {
        self.mutate(Method::POST, &self.endpoints().heartbeat, None)
            .await
    }

    async fn update_status(&self, status: PresenceStatus) -> AppResult<()> {
        self.mutate(
            Method::PUT,
            &self.endpoints().status,
            Some(json!({ "status": status })),
        )
        .await
    }

    fn send_offline_beacon(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, offline beacon skipped");
            return;
        };

        let mut request = self.request(Method::POST, &self.endpoints().offline);
        if let Some(token) = self.csrf.get() {
            request = request.header(CSRF_HEADER, token);
        }

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) => trace!(status = %response.status(), "Offline beacon delivered"),
                Err(e) => trace!(error = %e, "Offline beacon failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::{get, post, put};
    use pulsegate_core::error::ErrorKind;

    #[derive(Debug, Default)]
    struct ServerState {
        issued: usize,
        /// The token the server currently accepts.
        valid_token: String,
        heartbeats: usize,
        statuses: Vec<String>,
        offline: usize,
        bearer: Option<String>,
        refuse_csrf: bool,
        session_code: Option<(u16, &'static str)>,
    }

    type Shared = Arc<Mutex<ServerState>>;

    fn csrf_ok(state: &ServerState, headers: &HeaderMap) -> bool {
        !state.refuse_csrf
            && headers
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == state.valid_token)
    }

    async fn csrf(State(state): State<Shared>) -> impl IntoResponse {
        let mut state = state.lock().unwrap();
        state.issued += 1;
        state.valid_token = format!("csrf-{}", state.issued);
        Json(json!({ "csrf_token": state.valid_token }))
    }

    async fn current(State(state): State<Shared>, headers: HeaderMap) -> axum::response::Response {
        let mut state = state.lock().unwrap();
        state.bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some((code, text)) = state.session_code {
            let status = axum::http::StatusCode::from_u16(code).unwrap();
            return (status, Json(json!({ "code": text }))).into_response();
        }
        Json(json!({
            "id": "sess-1",
            "device": "Laptop",
            "browser": "Firefox",
            "status": "online",
            "is_current": true
        }))
        .into_response()
    }

    async fn heartbeat(State(state): State<Shared>, headers: HeaderMap) -> axum::http::StatusCode {
        let mut state = state.lock().unwrap();
        if !csrf_ok(&state, &headers) {
            return axum::http::StatusCode::FORBIDDEN;
        }
        state.heartbeats += 1;
        axum::http::StatusCode::NO_CONTENT
    }

    async fn status(
        State(state): State<Shared>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> axum::http::StatusCode {
        let mut state = state.lock().unwrap();
        if !csrf_ok(&state, &headers) {
            return axum::http::StatusCode::FORBIDDEN;
        }
        state
            .statuses
            .push(body["status"].as_str().unwrap_or_default().to_string());
        axum::http::StatusCode::OK
    }

    async fn offline(State(state): State<Shared>) -> axum::http::StatusCode {
        state.lock().unwrap().offline += 1;
        axum::http::StatusCode::NO_CONTENT
    }

    async fn serve() -> (HttpSessionApi, Shared) {
        let state = Shared::default();
        let router = Router::new()
            .route("/api/csrf-token", get(csrf))
            .route("/api/sessions/current", get(current))
            .route("/api/sessions/heartbeat", post(heartbeat))
            .route("/api/sessions/status", put(status))
            .route("/api/sessions/offline", post(offline))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = PresenceConfig {
            api_base_url: format!("http://{addr}"),
            ..PresenceConfig::default()
        };
        (HttpSessionApi::new(&config).unwrap(), state)
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, None).kind,
            ErrorKind::Authentication
        );
        assert_eq!(classify(StatusCode::NOT_FOUND, None).kind, ErrorKind::Session);
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, Some("NO_ACTIVE_SESSION")).kind,
            ErrorKind::Session
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, Some("AUTH_REQUIRED")).kind,
            ErrorKind::Authentication
        );
        assert!(classify(StatusCode::BAD_GATEWAY, None).is_transient());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, None).is_transient());
        assert!(classify(StatusCode::FORBIDDEN, None).is_transient());
    }

    #[tokio::test]
    async fn test_current_session_sends_bearer() {
        let (api, state) = serve().await;
        let api = api.with_bearer("a.b.c");

        let session = api.current_session().await.unwrap();
        assert_eq!(session.id.0, "sess-1");
        assert_eq!(session.status, PresenceStatus::Online);
        assert!(session.is_current);
        assert_eq!(state.lock().unwrap().bearer.as_deref(), Some("Bearer a.b.c"));
    }

    #[tokio::test]
    async fn test_missing_session_is_classified() {
        let (api, state) = serve().await;

        state.lock().unwrap().session_code = Some((404, "NOT_FOUND"));
        let err = api.current_session().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Session);

        state.lock().unwrap().session_code = Some((400, "NO_ACTIVE_SESSION"));
        let err = api.current_session().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Session);

        state.lock().unwrap().session_code = Some((401, "UNAUTHORIZED"));
        let err = api.current_session().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_csrf_token_fetched_once_and_reused() {
        let (api, state) = serve().await;

        api.heartbeat().await.unwrap();
        api.heartbeat().await.unwrap();
        api.update_status(PresenceStatus::Away).await.unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.issued, 1);
        assert_eq!(state.heartbeats, 2);
        assert_eq!(state.statuses, vec!["away".to_string()]);
    }

    #[tokio::test]
    async fn test_refused_csrf_token_is_refetched() {
        let (api, state) = serve().await;
        api.heartbeat().await.unwrap();

        // Server-side rotation: the cached token is refused once, then
        // replaced by a fresh one.
        state.lock().unwrap().valid_token = "rotated".to_string();
        api.heartbeat().await.unwrap();
        {
            let state = state.lock().unwrap();
            assert_eq!(state.issued, 2);
            assert_eq!(state.heartbeats, 2);
        }

        state.lock().unwrap().refuse_csrf = true;
        let err = api.heartbeat().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(api.csrf().get(), None);
    }

    #[tokio::test]
    async fn test_offline_beacon_is_fire_and_forget() {
        let (api, state) = serve().await;

        api.send_offline_beacon();
        for _ in 0..50 {
            if state.lock().unwrap().offline == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(state.lock().unwrap().offline, 1);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transient() {
        let config = PresenceConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            ..PresenceConfig::default()
        };
        let api = HttpSessionApi::new(&config).unwrap();
        let err = api.heartbeat().await.unwrap_err();
        assert!(err.is_transient(), "unexpected kind {:?}", err.kind);
    }
}
