//! Configuration types for the mock engine

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::category::Category;
use crate::replay::DEFAULT_MAX_SEQUENCE_LEN;
use crate::{MockError, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the record logs
    pub storage_dir: PathBuf,
    /// Categories with a file-backed store
    #[serde(default)]
    pub stores: Vec<Category>,
    /// Cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,
    /// Resource limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Result codec settings
    #[serde(default)]
    pub codec: CodecConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Feed the result cache from saves, so same-process replays skip the store
    #[serde(default = "default_true")]
    pub record_to_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            record_to_cache: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum persisted size of one item in bytes
    pub max_payload_size: usize,
    /// Maximum items cached per record id
    pub max_sequence_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 16 * 1024 * 1024, // 16 MB
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
        }
    }
}

/// Result codec configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// zlib compression level (0-9)
    pub compression_level: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MockError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MockError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if !self.storage_dir.is_dir() {
            return Err(MockError::ConfigError(format!(
                "Storage directory does not exist: {}",
                self.storage_dir.display()
            )));
        }

        if self.stores.is_empty() {
            return Err(MockError::ConfigError(
                "At least one store must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &self.stores {
            if !seen.insert(category) {
                return Err(MockError::ConfigError(format!(
                    "Store for category '{}' configured twice",
                    category.name()
                )));
            }
        }

        if self.limits.max_payload_size == 0 {
            return Err(MockError::ConfigError(
                "max_payload_size must be > 0".to_string(),
            ));
        }

        if self.limits.max_sequence_len == 0 {
            return Err(MockError::ConfigError(
                "max_sequence_len must be > 0".to_string(),
            ));
        }

        if self.codec.compression_level > 9 {
            return Err(MockError::ConfigError(format!(
                "compression_level must be 0-9, got {}",
                self.codec.compression_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            storage_dir = "/tmp"
            stores = ["http", "config_version"]

            [limits]
            max_payload_size = 1024
            max_sequence_len = 8
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.stores, vec![Category::Http, Category::ConfigVersion]);
        assert_eq!(config.limits.max_sequence_len, 8);
        assert!(config.cache.record_to_cache);
        assert_eq!(config.codec.compression_level, 6);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = format!(
            r#"
            storage_dir = "{}"
            stores = ["database"]

            [cache]
            record_to_cache = false
        "#,
            dir.path().display()
        );
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.stores, vec![Category::Database]);
        assert!(!config.cache.record_to_cache);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let config_toml = r#"
            storage_dir = "/tmp"
            stores = ["smtp"]
        "#;

        assert!(toml::from_str::<Config>(config_toml).is_err());
    }

    #[test]
    fn test_invalid_config_no_stores() {
        let config_toml = r#"
            storage_dir = "/tmp"
            stores = []
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_duplicate_store() {
        let config_toml = r#"
            storage_dir = "/tmp"
            stores = ["http", "http"]
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_compression_level() {
        let config_toml = r#"
            storage_dir = "/tmp"
            stores = ["http"]

            [codec]
            compression_level = 12
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert!(config.validate().is_err());
    }
}
