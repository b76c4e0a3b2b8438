//! Server configuration loaded from `.env` and `INSPECTOR_*` variables.

use inspector::InspectorConfig;
use inspector_core::form::DEFAULT_MULTIPART_MAX_MEMORY;
use serde::Deserialize;
use std::fmt;

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "INSPECTOR_";

/// Error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Envy(#[from] envy::Error),
}

/// Deployment profile, read from `INSPECTOR_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Custom(String),
}

impl Environment {
    /// Map a profile name; unset means development.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Self::Production,
            Some("development") | Some("dev") | None => Self::Development,
            Some(other) => Self::Custom(other.to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production | Self::Custom(_) => "info",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_endpoint() -> String {
    inspector::DEFAULT_ENDPOINT.to_string()
}

fn default_multipart_max_memory() -> usize {
    DEFAULT_MULTIPART_MAX_MEMORY
}

/// Settings for the demo server.
///
/// | Variable | Default |
/// |----------|---------|
/// | `INSPECTOR_ADDR` | `127.0.0.1:8080` |
/// | `INSPECTOR_ENDPOINT` | `/inspector` |
/// | `INSPECTOR_MULTIPART_MAX_MEMORY` | 32MB |
/// | `INSPECTOR_SENSITIVE_KEYS` | none (comma separated) |
/// | `INSPECTOR_MAX_ENTRIES` | unbounded |
/// | `INSPECTOR_ENV` | `development` |
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_multipart_max_memory")]
    pub multipart_max_memory: usize,
    #[serde(default)]
    pub sensitive_keys: Vec<String>,
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub env: Option<String>,
}

impl ServerConfig {
    /// Read the process environment; call [`load_dotenv`] first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Self>()?)
    }

    /// Read configuration from explicit `(name, value)` pairs.
    #[cfg(test)]
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Self>(vars)?)
    }

    pub fn environment(&self) -> Environment {
        Environment::from_name(self.env.as_deref())
    }

    /// Recorder configuration derived from these settings.
    pub fn inspector_config(&self) -> InspectorConfig {
        InspectorConfig::new()
            .endpoint(self.endpoint.clone())
            .multipart_max_memory(self.multipart_max_memory)
            .sensitive_keys(self.sensitive_keys.iter().map(|k| k.trim()))
            .max_entries(self.max_entries)
    }
}

/// Load environment variables from a `.env` file, if one exists.
///
/// A missing file is not an error. Runs before logging is set up, so the
/// caller reports the error once a subscriber exists.
pub fn load_dotenv() -> Result<(), dotenvy::Error> {
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => Err(err),
        _ => Ok(()),
    }
}
