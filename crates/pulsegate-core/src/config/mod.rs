//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default, so an empty or missing
//! file yields the reference tunables.

pub mod app;
pub mod gate;
pub mod logging;
pub mod presence;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::gate::GateConfig;
pub use self::logging::LoggingConfig;
pub use self::presence::{PresenceConfig, SessionEndpoints};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token validation gate settings.
    #[serde(default)]
    pub gate: GateConfig,
    /// Client presence tracker settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `PULSEGATE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PULSEGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        tracing::debug!(env, "Configuration loaded");
        Ok(loaded)
    }

    /// Parse configuration from a TOML string (used by tests and tooling).
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject tunables that cannot drive a timer or a bound.
    pub fn validate(&self) -> Result<(), AppError> {
        self.gate.validate()?;
        self.presence.validate()
    }
}
