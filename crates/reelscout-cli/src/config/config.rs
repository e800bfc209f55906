//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reelscout_api::tmdb::CacheConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB endpoint settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// TMDB endpoint configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// Base URL override (default: `https://api.themoviedb.org/3/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Response cache configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
    /// Maximum number of cached responses.
    pub max_entries: usize,
    /// Background sweep period in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            ttl_secs: defaults.ttl.as_secs(),
            max_entries: defaults.max_entries,
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Serializes the config as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config to TOML")
    }

    /// Parses the configured base URL, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if `tmdb.base_url` is not a valid URL.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.tmdb
            .base_url
            .as_deref()
            .map(|raw| {
                // `Url::join` drops the last segment unless the base ends with '/'
                let normalized = if raw.ends_with('/') {
                    String::from(raw)
                } else {
                    format!("{raw}/")
                };
                Url::parse(&normalized).with_context(|| format!("invalid tmdb.base_url: {raw}"))
            })
            .transpose()
    }

    /// Converts the cache section into the client's `CacheConfig`.
    ///
    /// A zero sweep interval is raised to one second.
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache.ttl_secs),
            max_entries: self.cache.max_entries,
            sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.tmdb.base_url.is_none());
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.cache.sweep_interval_secs, 300);
        assert_eq!(config.cache_config(), CacheConfig::default());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        // Arrange
        let config = AppConfig {
            tmdb: TmdbConfig {
                base_url: Some(String::from("http://localhost:8080/3/")),
            },
            cache: CacheSettings {
                ttl_secs: 60,
                max_entries: 20,
                sweep_interval_secs: 30,
            },
        };

        // Act
        let toml_str = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        // Assert
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            tmdb: TmdbConfig::default(),
            cache: CacheSettings {
                ttl_secs: 120,
                ..CacheSettings::default()
            },
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nmax_entries = 5\n").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.cache.max_entries, 5);
        assert_eq!(config.cache.ttl_secs, 600);
        assert!(config.tmdb.base_url.is_none());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("failed to parse"));
    }

    #[test]
    fn test_base_url_adds_trailing_slash() {
        // Arrange
        let config = AppConfig {
            tmdb: TmdbConfig {
                base_url: Some(String::from("http://127.0.0.1:9000/3")),
            },
            ..AppConfig::default()
        };

        // Act
        let url = config.base_url().unwrap().unwrap();

        // Assert
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/3/");
    }

    #[test]
    fn test_base_url_invalid() {
        // Arrange
        let config = AppConfig {
            tmdb: TmdbConfig {
                base_url: Some(String::from("not a url")),
            },
            ..AppConfig::default()
        };

        // Act & Assert
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_zero_sweep_interval_is_raised() {
        // Arrange
        let config = AppConfig {
            cache: CacheSettings {
                sweep_interval_secs: 0,
                ..CacheSettings::default()
            },
            ..AppConfig::default()
        };

        // Act & Assert
        assert_eq!(config.cache_config().sweep_interval, Duration::from_secs(1));
    }
}
