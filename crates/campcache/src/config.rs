//! Application configuration management.
//!
//! This module handles loading the application configuration,
//! which includes the NPS API key, an optional API base URL override, the
//! cache location and whether to start in offline mode.
//!
//! Configuration is stored at `~/.config/campcache/config.json`. The
//! `NPS_API_KEY` and `CAMPCACHE_BASE_URL` environment variables (or a
//! `.env` file) take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "campcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the NPS API key
pub const API_KEY_VAR: &str = "NPS_API_KEY";

/// Environment variable overriding the API base URL
pub const BASE_URL_VAR: &str = "CAMPCACHE_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub offline_mode: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply environment overrides on top of the file values
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_var(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty_var(BASE_URL_VAR) {
            self.api_base_url = Some(url);
        }
        self
    }

    /// API key, required for any online sync
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No NPS API key configured. Set {} or add \"api_key\" to {}",
                    API_KEY_VAR,
                    CONFIG_FILE
                )
            })
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("absent.json")).unwrap();
        assert!(config.api_key.is_none());
        assert!(!config.offline_mode);
    }

    #[test]
    fn test_load_written_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("campcache").join(CONFIG_FILE);
        let config = Config {
            api_key: Some("abc".to_string()),
            api_base_url: None,
            cache_dir: Some(tmp.path().join("cache")),
            offline_mode: true,
        };
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("abc"));
        assert_eq!(loaded.cache_dir().unwrap(), tmp.path().join("cache"));
        assert!(loaded.offline_mode);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_key": "k"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_key().unwrap(), "k");
        assert!(!config.offline_mode);
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "api_key = 'toml?'").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.api_key().is_err());
    }
}
