//! Configuration loader and validator for the bin monitor.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::poller::DEFAULT_PERIOD;
use crate::threshold::DEFAULT_CRITICAL_PERCENT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub api: Api,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub alerts: Alerts,
    #[serde(default)]
    pub auth: Option<Auth>,
}

/// Backend location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PERIOD.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alerts {
    pub critical_percent: f64,
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            critical_percent: DEFAULT_CRITICAL_PERCENT,
        }
    }
}

/// Administrator credentials used to open a backend session.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Base URL with a trailing slash so relative joins keep any path prefix.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.api.base_url.trim();
        let raw = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&raw).map_err(|_| ConfigError::Invalid("api.base_url must be a valid URL"))
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poller.interval_ms)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    let url = cfg.base_url()?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("api.base_url must be http or https"));
    }

    if cfg.poller.interval_ms == 0 {
        return Err(ConfigError::Invalid("poller.interval_ms must be > 0"));
    }

    let pct = cfg.alerts.critical_percent;
    if !(pct > 0.0 && pct <= 100.0) {
        return Err(ConfigError::Invalid("alerts.critical_percent must be in (0, 100]"));
    }

    if let Some(auth) = &cfg.auth {
        if auth.email.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.email must be non-empty"));
        }
        if auth.password.is_empty() {
            return Err(ConfigError::Invalid("auth.password must be non-empty"));
        }
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:5000/"

poller:
  interval_ms: 10000

alerts:
  critical_percent: 80

auth:
  email: "admin@example.com"
  password: "change-me"
"#
}
