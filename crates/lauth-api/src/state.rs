//! # Application State & Configuration
//!
//! [`AppState`] is shared by every handler: the admin service over the
//! license registry, the server configuration, and the Prometheus handle
//! used to render `/metrics`.
//!
//! [`AppConfig`] is read from the environment at startup:
//!
//! | Variable            | Default   | Meaning                                   |
//! |---------------------|-----------|-------------------------------------------|
//! | `LAUTH_HOST`        | `0.0.0.0` | Address to bind                           |
//! | `LAUTH_PORT`        | `8080`    | Port to bind                              |
//! | `LAUTH_ADMIN_TOKEN` | unset     | Bearer token for `/v1/*` (auth off if unset) |
//! | `LAUTH_STATE_PATH`  | unset     | JSON snapshot file (in-memory if unset)   |
//! | `LAUTH_LOG_FORMAT`  | `text`    | `text` or `json`                          |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use lauth_crypto::SecretToken;
use lauth_registry::{AdminService, LicenseRegistry};

// ─── Configuration ───────────────────────────────────────────────────

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Invalid configuration value.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Static bearer token for the admin API. `None` disables auth.
    pub admin_token: Option<SecretToken>,
    /// Where the license snapshot is persisted. `None` keeps licenses in memory.
    pub state_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            admin_token: None,
            state_path: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("LAUTH_HOST") {
            config.host = value
                .trim()
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid("LAUTH_HOST", &value, e))?;
        }
        if let Some(value) = lookup("LAUTH_PORT") {
            config.port = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid("LAUTH_PORT", &value, e))?;
        }
        if let Some(value) = lookup("LAUTH_ADMIN_TOKEN") {
            if value.trim().is_empty() {
                return Err(invalid("LAUTH_ADMIN_TOKEN", "", "must not be empty"));
            }
            config.admin_token = Some(SecretToken::new(value.trim()));
        }
        if let Some(value) = lookup("LAUTH_STATE_PATH") {
            if !value.trim().is_empty() {
                config.state_path = Some(PathBuf::from(value.trim()));
            }
        }
        if let Some(value) = lookup("LAUTH_LOG_FORMAT") {
            config.log_format = match value.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(invalid("LAUTH_LOG_FORMAT", &value, "expected text or json")),
            };
        }

        Ok(config)
    }

    /// The socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn invalid(var: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// ─── Application State ───────────────────────────────────────────────

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub admin: AdminService,
    pub config: AppConfig,
    /// Handle to the installed Prometheus recorder. `None` when no recorder
    /// is installed (tests, or installation failed).
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State over an empty in-memory registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// State over an empty in-memory registry.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_registry(LicenseRegistry::in_memory(), config)
    }

    /// State over an existing registry.
    pub fn with_registry(registry: LicenseRegistry, config: AppConfig) -> Self {
        Self {
            admin: AdminService::new(Arc::new(registry)),
            config,
            metrics: None,
        }
    }

    /// Attach the Prometheus handle used by `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("admin", &self.admin)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
