use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Overrides `api_url` from the config file when set
pub const API_URL_ENV: &str = "RAYBAND_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Transport-level timeout for each request. None means wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Replace `api_url` with an override value, ignoring blank values.
    pub fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist a new service URL, keeping the rest of the stored config.
    pub fn save_api_url(url: &str) -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        Self::save_api_url_to(&path, url)?;
        Ok(path)
    }

    /// Store a new service URL in `path`. An unreadable file is an error,
    /// not something to overwrite.
    pub fn save_api_url_to(path: &Path, url: &str) -> Result<()> {
        let mut config = Self::load_from(path)?;
        config.api_url = url.to_string();
        config.save_to(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rayband").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: "https://example.test".to_string(),
            request_timeout_secs: Some(30),
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"request_timeout_secs": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, Some(5));
    }

    #[test]
    fn test_api_url_override() {
        let mut config = Config::new();

        config.apply_api_url_override(None);
        assert_eq!(config.api_url, DEFAULT_API_URL);

        config.apply_api_url_override(Some("   ".to_string()));
        assert_eq!(config.api_url, DEFAULT_API_URL);

        config.apply_api_url_override(Some("https://rayband.test".to_string()));
        assert_eq!(config.api_url, "https://rayband.test");
    }

    #[test]
    fn test_save_api_url_keeps_other_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: Some(15),
        }
        .save_to(&path)
        .unwrap();

        Config::save_api_url_to(&path, "https://rayband.test").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://rayband.test");
        assert_eq!(config.request_timeout_secs, Some(15));
    }

    #[test]
    fn test_save_api_url_refuses_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::save_api_url_to(&path, "https://rayband.test").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
