//! Shared application state handed to every handler.

use std::sync::Arc;

use pulsegate_auth::TokenGate;
use pulsegate_core::config::AppConfig;

/// State shared by the router. Cloned per request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Token gate guarding protected routes.
    pub gate: Arc<TokenGate>,
}

impl AppState {
    pub fn new(config: AppConfig, gate: TokenGate) -> Self {
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
        }
    }
}
