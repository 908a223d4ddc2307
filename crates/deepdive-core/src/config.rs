use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::DEFAULT_API_URL;
use crate::connectivity::DEFAULT_PROBE_INTERVAL;
use crate::error::ConfigError;

/// Environment variable that overrides `api_url`
pub const API_URL_ENV: &str = "DEEPDIVE_API_URL";

const DEFAULT_MODES: &[&str] = &["auto", "fast", "deep"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub probe_interval_secs: u64,
    /// Values offered by the mode selector, sent verbatim as `mode`
    pub modes: Vec<String>,
    pub default_mode: Option<String>,
    /// No timeout when unset: a hung request keeps the client busy
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL.as_secs(),
            modes: DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
            default_mode: None,
            request_timeout_secs: None,
        }
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&config_content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validated()
    }

    /// Apply the `DEEPDIVE_API_URL` override if it is set and non-empty
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
        self
    }

    /// Normalize the mode list and reject values the client cannot run with
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".to_string()));
        }
        if self.probe_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        self.modes.retain(|m| !m.trim().is_empty());
        if self.modes.is_empty() {
            self.modes = Self::new().modes;
        }
        if let Some(mode) = &self.default_mode {
            if !self.modes.contains(mode) {
                self.modes.insert(0, mode.clone());
            }
        }
        Ok(self)
    }

    /// The mode selected at startup
    pub fn initial_mode(&self) -> &str {
        self.default_mode
            .as_deref()
            .or_else(|| self.modes.first().map(String::as_str))
            .unwrap_or(DEFAULT_MODES[0])
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("deepdive"))
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::new());
        assert_eq!(config.api_url, "http://127.0.0.1:8765/api");
        assert_eq!(config.probe_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.initial_mode(), "auto");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config(r#"{ "api_url": "http://10.0.0.2:9000/api" }"#);
        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.api_url, "http://10.0.0.2:9000/api");
        assert_eq!(config.probe_interval_secs, 30);
        assert_eq!(config.modes, vec!["auto", "fast", "deep"]);
    }

    #[test]
    fn test_default_mode_is_added_to_modes() {
        let file = write_config(r#"{ "modes": ["quick", "careful"], "default_mode": "study" }"#);
        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.modes, vec!["study", "quick", "careful"]);
        assert_eq!(config.initial_mode(), "study");
    }

    #[test]
    fn test_empty_modes_fall_back() {
        let file = write_config(r#"{ "modes": ["", "  "] }"#);
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.modes, vec!["auto", "fast", "deep"]);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let file = write_config(r#"{ "probe_interval_secs": 0 }"#);
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_file_is_parse_error() {
        let file = write_config("api_url = nope");
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
