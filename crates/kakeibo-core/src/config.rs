//! Classifier configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/kakeibo/config/classifier.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Missing keys keep their defaults, so an override file only needs the
//! values it changes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Category;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/classifier.toml");

/// Descriptions sent per classification request
pub const BATCH_SIZE: usize = 10;

/// Classification requests in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Category batch classifier settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Maximum descriptions per chunk
    pub batch_size: usize,
    /// Worker pool size for multi-chunk batches
    pub max_concurrency: usize,
    /// Category for unknown labels and for the all-or-nothing fallback
    pub default_category: Category,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_category: Category::Other,
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded defaults"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl ClassifierConfig {
    /// Load from the override location, falling back to the embedded default
    pub fn load() -> Result<(Self, ConfigSource)> {
        if let Some(path) = default_config_path() {
            if path.exists() {
                let config = Self::load_from(&path)?;
                return Ok((config, ConfigSource::File(path)));
            }
        }
        Ok((Self::from_toml(DEFAULT_CONFIG)?, ConfigSource::Embedded))
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();
        if let Some(classifier) = raw.classifier {
            if let Some(batch_size) = classifier.batch_size {
                config.batch_size = batch_size;
            }
            if let Some(max_concurrency) = classifier.max_concurrency {
                config.max_concurrency = max_concurrency;
            }
            if let Some(label) = classifier.default_category {
                config.default_category = Category::from_label(&label).ok_or_else(|| {
                    Error::Config(format!("Unknown default_category: {}", label))
                })?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the classifier cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("kakeibo").join("config").join("classifier.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    classifier: Option<RawClassifier>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    batch_size: Option<usize>,
    max_concurrency: Option<usize>,
    default_category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = ClassifierConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, ClassifierConfig::default());
        assert_eq!(config.batch_size, BATCH_SIZE);
    }

    #[test]
    fn test_partial_override() {
        let config = ClassifierConfig::from_toml("[classifier]\nmax_concurrency = 2\n").unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.default_category, Category::Other);

        let empty = ClassifierConfig::from_toml("").unwrap();
        assert_eq!(empty, ClassifierConfig::default());
    }

    #[test]
    fn test_default_category_label() {
        let config =
            ClassifierConfig::from_toml("[classifier]\ndefault_category = \"daily goods\"\n")
                .unwrap();
        assert_eq!(config.default_category, Category::DailyGoods);

        let err = ClassifierConfig::from_toml("[classifier]\ndefault_category = \"Misc\"\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(ClassifierConfig::from_toml("[classifier]\nbatch_size = 0\n").is_err());
        assert!(ClassifierConfig::from_toml("[classifier]\nmax_concurrency = 0\n").is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClassifierConfig::from_toml("[classifier\nbatch_size = 3").unwrap_err();
        assert!(err.to_string().contains("Invalid config TOML"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.toml");
        std::fs::write(&path, "[classifier]\nbatch_size = 25\n").unwrap();

        let config = ClassifierConfig::load_from(&path).unwrap();
        assert_eq!(config.batch_size, 25);

        let missing = ClassifierConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Embedded.to_string(), "embedded defaults");
        let source = ConfigSource::File(PathBuf::from("/tmp/classifier.toml"));
        assert_eq!(source.to_string(), "/tmp/classifier.toml");
    }
}
