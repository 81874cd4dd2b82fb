//! Application-level configuration loading, including the session gap threshold.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::kob::DEFAULT_MAX_GAP;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KOB_TRACKER_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    session_gap: Duration,
}

impl AppConfig {
    /// Build a configuration with an explicit session gap.
    pub fn with_session_gap(session_gap: Duration) -> Self {
        Self { session_gap }
    }

    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        session_gap_secs = app_config.session_gap.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON configuration document.
    fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(raw.into())
    }

    /// Largest gap between two consecutive games of the same session.
    pub fn session_gap(&self) -> Duration {
        self.session_gap
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_gap: DEFAULT_MAX_GAP,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    session_gap_minutes: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        match value.session_gap_minutes {
            Some(0) => {
                warn!("session_gap_minutes must be positive; using default");
                Self::default()
            }
            Some(minutes) => Self {
                session_gap: Duration::from_secs(minutes.saturating_mul(60)),
            },
            None => Self::default(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gap_is_two_hours() {
        assert_eq!(AppConfig::default().session_gap(), Duration::from_secs(7_200));
    }

    #[test]
    fn parses_custom_gap() {
        let config = AppConfig::parse(r#"{"session_gap_minutes": 45}"#).unwrap();
        assert_eq!(config.session_gap(), Duration::from_secs(45 * 60));
    }

    #[test]
    fn missing_or_zero_gap_falls_back_to_default() {
        assert_eq!(AppConfig::parse("{}").unwrap(), AppConfig::default());
        assert_eq!(
            AppConfig::parse(r#"{"session_gap_minutes": 0}"#).unwrap(),
            AppConfig::default()
        );
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::parse(r#"{"session_gap_minutes": "soon"}"#).is_err());
    }
}
