//! Client configuration and where it is read from.
//!
//! Config location:
//! - Linux: ~/.config/lifeview/config.json
//! - Windows: %APPDATA%\lifeview\config.json
//! - MacOS: ~/Library/Application Support/lifeview/config.json
//!
//! Every field is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controller::{ControllerOptions, ErrorClearPolicy, ResponseOrdering, DEFAULT_INTERVAL_MS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme, host and port of the simulation service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Whole-request timeout. Unset means wait as long as the service takes.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_interval_ms")]
    pub initial_interval_ms: u32,
    #[serde(default)]
    pub error_clear: ErrorClearPolicy,
    #[serde(default)]
    pub response_ordering: ResponseOrdering,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_path() -> String {
    "/grid".to_string()
}

fn default_interval_ms() -> u32 {
    DEFAULT_INTERVAL_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
            timeout_ms: None,
            initial_interval_ms: default_interval_ms(),
            error_clear: ErrorClearPolicy::default(),
            response_ordering: ResponseOrdering::default(),
        }
    }
}

impl ClientConfig {
    /// Full URL of the grid endpoint.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            initial_interval_ms: self.initial_interval_ms,
            error_clear: self.error_clear,
            ordering: self.response_ordering,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the config file if present, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Cross-platform application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self {
            config_dir: base.join("lifeview"),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lifeview-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_point_at_local_service() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.endpoint(), "http://localhost:8000/grid");
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.controller_options(), ControllerOptions::default());
    }

    #[test]
    fn endpoint_joins_slashes_once() {
        let cfg = ClientConfig {
            base_url: "http://sim.local:9000/".to_string(),
            path: "grid".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(cfg.endpoint(), "http://sim.local:9000/grid");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ClientConfig = serde_json::from_str(
            r#"{ "timeout_ms": 1500, "error_clear": "on_start", "response_ordering": "last_completed_wins" }"#,
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert_eq!(cfg.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.error_clear, ErrorClearPolicy::OnStart);
        assert_eq!(cfg.response_ordering, ResponseOrdering::LastCompletedWins);
        assert_eq!(cfg.initial_interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn load_reads_file_and_reports_parse_errors() {
        let good = scratch_file("good.json", r#"{ "base_url": "http://10.0.0.2:8000" }"#);
        let cfg = ClientConfig::load(&good).unwrap();
        assert_eq!(cfg.endpoint(), "http://10.0.0.2:8000/grid");

        let bad = scratch_file("bad.json", "{ not json");
        assert!(matches!(ClientConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("lifeview-config-definitely-missing.json");
        assert_eq!(ClientConfig::load_or_default(&path).unwrap(), ClientConfig::default());
        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::Read { .. })));
    }
}
