//! Configuration Management
//!
//! Handles persistent configuration storage for the Beatport client:
//! API credentials, the access token pair and connection settings.

use crate::api::client::{DEFAULT_API_VERSION, DEFAULT_HOST};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "BEATPORT_API_KEY";
pub const ENV_API_SECRET: &str = "BEATPORT_API_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "BEATPORT_ACCESS_TOKEN";
pub const ENV_ACCESS_SECRET: &str = "BEATPORT_ACCESS_SECRET";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_use_ssl() -> bool {
    true
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// OAuth1 consumer key
    #[serde(default)]
    pub api_key: Option<String>,
    /// OAuth1 consumer secret
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Access token obtained by `authorize`
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_secret: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            access_token: None,
            access_secret: None,
            host: default_host(),
            use_ssl: default_use_ssl(),
            api_version: default_api_version(),
            headers: HashMap::new(),
        }
    }
}

/// Non-empty environment value, else the configured one
fn env_or(var: &str, configured: &Option<String>) -> Option<String> {
    pick(std::env::var(var).ok(), configured)
}

fn pick(env: Option<String>, configured: &Option<String>) -> Option<String> {
    env.filter(|v| !v.is_empty()).or_else(|| configured.clone())
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("beatport").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file, falling back to defaults when it is
    /// missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective API key (env > config)
    pub fn effective_api_key(&self) -> Option<String> {
        env_or(ENV_API_KEY, &self.api_key)
    }

    /// Get effective API secret (env > config)
    pub fn effective_api_secret(&self) -> Option<String> {
        env_or(ENV_API_SECRET, &self.api_secret)
    }

    /// Get effective access token (env > config)
    pub fn effective_access_token(&self) -> Option<String> {
        env_or(ENV_ACCESS_TOKEN, &self.access_token)
    }

    /// Get effective access secret (env > config)
    pub fn effective_access_secret(&self) -> Option<String> {
        env_or(ENV_ACCESS_SECRET, &self.access_secret)
    }

    /// Copy with one-off connection overrides applied; `self` is left as
    /// loaded so saving it never persists them
    pub fn with_overrides(&self, host: Option<&str>, insecure: bool) -> Self {
        let mut config = self.clone();
        if let Some(host) = host {
            config.host = host.to_string();
        }
        if insecure {
            config.use_ssl = false;
        }
        config
    }

    /// Store the access token pair and save
    pub fn set_access(&mut self, token: &str, secret: &str) -> Result<()> {
        self.access_token = Some(token.to_string());
        self.access_secret = Some(secret.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("beatport-test-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.host, "oauth-api.beatport.com");
        assert!(config.use_ssl);
        assert_eq!(config.api_version, "3");
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        assert_eq!(Config::load_from(&temp_path()), Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_path();
        let mut config = Config::default();
        config.api_key = Some("key".to_string());
        config.access_token = Some("tok".to_string());
        config.headers.insert("X-Test".to_string(), "1".to_string());

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"api_key": "k", "use_ssl": false}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert!(!config.use_ssl);
        assert_eq!(config.host, "oauth-api.beatport.com");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_overrides_are_not_persisted() {
        let path = temp_path();
        let mut config = Config::default();
        config.api_key = Some("key".to_string());

        let effective = config.with_overrides(Some("127.0.0.1:8080"), true);
        assert_eq!(effective.host, "127.0.0.1:8080");
        assert!(!effective.use_ssl);
        assert_eq!(effective.api_key.as_deref(), Some("key"));

        config.access_token = Some("tok".to_string());
        config.access_secret = Some("sec".to_string());
        config.save_to(&path).unwrap();

        let saved = Config::load_from(&path);
        assert_eq!(saved.host, "oauth-api.beatport.com");
        assert!(saved.use_ssl);
        assert_eq!(saved.access_token.as_deref(), Some("tok"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let config = Config::default();
        assert_eq!(config.with_overrides(None, false), config);
    }

    #[test]
    fn test_env_takes_precedence() {
        let configured = Some("from-file".to_string());
        assert_eq!(pick(Some("from-env".to_string()), &configured).as_deref(), Some("from-env"));
        assert_eq!(pick(Some(String::new()), &configured).as_deref(), Some("from-file"));
        assert_eq!(pick(None, &configured).as_deref(), Some("from-file"));
        assert_eq!(pick(None, &None), None);
    }
}
