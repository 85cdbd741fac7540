//! Configuration for glutenscout-runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use glutenscout_core::config::read_config_file;
use glutenscout_core::{ClassifierConfig, ConfigError, ScoringConfig, DEFAULT_MENU_RESCAN_TTL};

/// Runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Recommendation scoring constants
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Menu classifier constants
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Menu scan scheduling
    #[serde(default)]
    pub scan: ScanConfig,

    /// Analysis cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Determinism configuration
    #[serde(default)]
    pub determinism: DeterminismConfig,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_config_file(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.classifier.validate()?;

        if self.scan.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "scan.timeout must be greater than zero".to_string(),
            ));
        }
        if self.scan.max_concurrent == 0 {
            return Err(ConfigError::ValidationError(
                "scan.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be at least 1 when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Menu scan scheduling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Menus older than this are scanned again
    #[serde(with = "humantime_serde", default = "default_rescan_ttl")]
    pub ttl: Duration,

    /// Timeout for a single menu fetch
    #[serde(with = "humantime_serde", default = "default_fetch_timeout")]
    pub timeout: Duration,

    /// Maximum scans in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_rescan_ttl() -> Duration {
    DEFAULT_MENU_RESCAN_TTL
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_MENU_RESCAN_TTL,
            timeout: Duration::from_secs(15),
            max_concurrent: 4,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache TTL
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub ttl: Duration,

    /// Maximum cache entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> Duration {
    DEFAULT_MENU_RESCAN_TTL
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_MENU_RESCAN_TTL,
            max_entries: 1000,
        }
    }
}

/// Determinism configuration for reproducible runs.
///
/// ```yaml
/// determinism:
///   evaluated_at: "2025-06-01T12:00:00Z"
/// ```
///
/// When `evaluated_at` is None (default), the current system time is used
/// for analysis timestamps and re-scan checks.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DeterminismConfig {
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl DeterminismConfig {
    /// The pinned timestamp, or the current time.
    pub fn now(&self) -> DateTime<Utc> {
        self.evaluated_at.unwrap_or_else(Utc::now)
    }
}

// Custom serialization for Duration using humantime format
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
