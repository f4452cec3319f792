//! Configuration module for Penchant

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

use crate::paths;

/// Environment variable overriding the project URL
pub const URL_ENV: &str = "PENCHANT_SUPABASE_URL";

/// Environment variable overriding the anon key
pub const ANON_KEY_ENV: &str = "PENCHANT_SUPABASE_ANON_KEY";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Supabase project URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,

    /// Supabase anon (public) key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_anon_key: Option<String>,

    /// Table holding product listings
    #[serde(default = "default_products_table")]
    pub products_table: String,

    /// Storage bucket for product images
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,

    /// Category used when none is given
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Maximum number of products printed by the feed command
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
}

/// Where to reach the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL
    pub url: String,
    /// Anon key
    pub anon_key: String,
}

fn default_products_table() -> String {
    crate::store::PRODUCTS_TABLE.to_string()
}

fn default_storage_bucket() -> String {
    "products".to_string()
}

fn default_category() -> String {
    "shoes".to_string()
}

fn default_feed_limit() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            products_table: default_products_table(),
            storage_bucket: default_storage_bucket(),
            default_category: default_category(),
            feed_limit: default_feed_limit(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Override connection settings from environment lookups
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        if let Some(url) = non_empty(URL_ENV) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = non_empty(ANON_KEY_ENV) {
            self.supabase_anon_key = Some(key);
        }
    }

    /// Connection settings, or an error naming where to set them
    pub fn backend(&self) -> Result<BackendConfig> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(anon_key)) => Ok(BackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key: anon_key.clone(),
            }),
            _ => Err(anyhow::anyhow!(
                "Supabase URL and anon key missing\nSet {URL_ENV} and {ANON_KEY_ENV}, or supabase_url and supabase_anon_key in ~/.config/penchant/config.toml"
            )),
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_bucket, "products");
        assert_eq!(config.default_category, "shoes");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "supabase_url = \"https://abc.supabase.co\"\nfeed_limit = 10\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.feed_limit, 10);
        assert_eq!(config.products_table, "products");
        assert!(config.backend().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            supabase_url: Some("https://abc.supabase.co".into()),
            supabase_anon_key: Some("anon".into()),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            supabase_url: Some("https://file.supabase.co".into()),
            ..Config::default()
        };

        config.apply_env(|key| match key {
            URL_ENV => Some("https://env.supabase.co/".into()),
            ANON_KEY_ENV => Some("env-key".into()),
            _ => None,
        });

        let backend = config.backend().unwrap();
        assert_eq!(backend.url, "https://env.supabase.co");
        assert_eq!(backend.anon_key, "env-key");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".into()));
        assert_eq!(config.supabase_url, None);
    }
}
