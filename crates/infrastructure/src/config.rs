//! Client settings.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional TOML file (`backoffice.toml` unless another path is given)
//! 3. `BACKOFFICE__*` environment variables, `__` separating nested keys
//!    (`BACKOFFICE__IDENTITY__BASE_URL`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use backoffice_application::GatewayConfig;
use config::{Config, Environment, File};
use reqwest::Url;
use serde::Deserialize;

use crate::auth::IdentityEndpoints;

/// Default settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "backoffice.toml";

const ENV_PREFIX: &str = "BACKOFFICE";

/// Errors raised while loading or interpreting settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the settings shape.
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A URL setting did not parse.
    #[error("Invalid URL in '{field}': {message}")]
    InvalidUrl {
        /// Settings key holding the bad value.
        field: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Where the identity provider lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Base URL of the identity provider. Falls back to the API base.
    pub base_url: Option<String>,
    /// Refresh endpoint path.
    pub refresh_path: String,
    /// Login endpoint path.
    pub login_path: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            refresh_path: "/auth/refresh".to_string(),
            login_path: "/auth/login".to_string(),
        }
    }
}

/// Everything the client needs to reach the back office.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL relative request paths resolve against.
    pub api_base_url: String,
    /// Identity provider location.
    pub identity: IdentitySettings,
    /// Where the user is sent when the session ends.
    pub login_url: String,
    /// Credentials file. Credentials stay in memory when unset.
    pub credentials_file: Option<PathBuf>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Refresh timeout in milliseconds. Unset waits indefinitely.
    pub refresh_timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            identity: IdentitySettings::default(),
            login_url: "/login".to_string(),
            credentials_file: None,
            request_timeout_ms: 30_000,
            refresh_timeout_ms: None,
        }
    }
}

impl Settings {
    /// Loads settings from `file` (or [`DEFAULT_SETTINGS_FILE`]) and the
    /// process environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(file, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed.
    pub fn load_from(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

        let settings = Config::builder()
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Parsed API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base_url` is not a URL.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        parse_url("api_base_url", &self.api_base_url)
    }

    /// Identity endpoints, built on the identity base URL or the API base.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL or path does not parse.
    pub fn identity_endpoints(&self) -> Result<IdentityEndpoints, ConfigError> {
        let base = match &self.identity.base_url {
            Some(url) => parse_url("identity.base_url", url)?,
            None => self.api_base_url()?,
        };

        IdentityEndpoints::new(&base, &self.identity.refresh_path, &self.identity.login_path)
            .map_err(|e| ConfigError::InvalidUrl {
                field: "identity",
                message: e.to_string(),
            })
    }

    /// Default per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Gateway behaviour derived from these settings.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        match self.refresh_timeout_ms {
            Some(ms) => GatewayConfig::new().with_refresh_timeout(Duration::from_millis(ms)),
            None => GatewayConfig::new(),
        }
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        message: format!("{e}: {value}"),
    })
}
