use std::net::SocketAddr;
use std::path::PathBuf;

use crate::advice::latency::{LatencyParseError, LatencyRange};

/// Application-level constants
pub const APP_NAME: &str = "HealthEcho";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_BIND: &str = "HEALTHECHO_BIND";
pub const ENV_ADVICE_URL: &str = "HEALTHECHO_ADVICE_URL";
pub const ENV_LATENCY_MS: &str = "HEALTHECHO_LATENCY_MS";

const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "healthecho=info,healthecho_lib=info,tower_http=info"
}

/// Get the application data directory
/// ~/HealthEcho/ when a home directory exists, else the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// File backing the cached session.
pub fn session_store_path() -> PathBuf {
    app_data_dir().join("session.json")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HEALTHECHO_BIND value '{0}'")]
    Bind(String),
    #[error("Invalid HEALTHECHO_LATENCY_MS: {0}")]
    Latency(#[from] LatencyParseError),
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Remote advice endpoint; `None` selects the keyword table.
    pub advice_url: Option<String>,
    pub latency: LatencyRange,
    pub session_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            advice_url: None,
            latency: LatencyRange::default(),
            session_path: session_store_path(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Bind(bind.clone()))?;

        let latency = match get(ENV_LATENCY_MS) {
            Some(raw) => raw.parse()?,
            None => LatencyRange::default(),
        };

        Ok(Self {
            bind_addr,
            advice_url: get(ENV_ADVICE_URL).map(|u| u.trim().to_string()),
            latency,
            session_path: session_store_path(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("HealthEcho"));
        assert!(session_store_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8787".parse::<SocketAddr>().unwrap());
        assert!(config.advice_url.is_none());
        assert_eq!(config.latency, LatencyRange::default());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_ADVICE_URL, " http://advice.local/v1 "),
            (ENV_LATENCY_MS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.advice_url.as_deref(), Some("http://advice.local/v1"));
        assert!(config.latency.is_disabled());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_ADVICE_URL, "  ")])).unwrap();
        assert!(config.advice_url.is_none());
    }

    #[test]
    fn fixed_latency_value() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_LATENCY_MS, "300")])).unwrap();
        assert_eq!(config.latency.min(), Duration::from_millis(300));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_BIND, "nowhere")])),
            Err(ConfigError::Bind(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_LATENCY_MS, "fast")])),
            Err(ConfigError::Latency(_))
        ));
    }

    #[test]
    fn app_name_is_healthecho() {
        assert_eq!(APP_NAME, "HealthEcho");
    }
}
