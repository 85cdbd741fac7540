//! Tuning parameters for scoring and classification.
//!
//! Every threshold the engine and the classifier use lives here so that
//! product tuning never requires touching the algorithms. Defaults carry the
//! shipped values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Constants for the additive recommendation score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Starting score before any signal
    pub base_score: f64,

    pub favorite_safe_bonus: f64,
    pub favorite_try_bonus: f64,
    /// Magnitude subtracted for "avoid"
    pub favorite_avoid_penalty: f64,

    /// Bonus when only the name heuristic fired
    pub gf_heuristic_bonus: f64,
    /// Bonus for a non-empty confirmed gluten-free menu
    pub gf_menu_bonus: f64,
    /// Extra bonus per confirmed item beyond the first
    pub gf_menu_per_item_bonus: f64,
    /// Cap on the whole gluten-free signal
    pub gf_max_bonus: f64,

    /// Bonus at zero distance
    pub distance_max_bonus: f64,
    /// Distance at which the bonus reaches zero
    pub distance_far_meters: f64,
    /// Largest penalty applied beyond the far threshold
    pub distance_max_penalty: f64,
    /// Distance at or under which NEARBY is attached
    pub near_threshold_meters: f64,

    /// Rating that earns no adjustment
    pub rating_midpoint: f64,
    /// Points per star away from the midpoint
    pub rating_points_per_star: f64,
    /// Rating at or above which HIGHLY_RATED is attached
    pub highly_rated_threshold: f64,

    pub open_now_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            favorite_safe_bonus: 40.0,
            favorite_try_bonus: 15.0,
            favorite_avoid_penalty: 40.0,
            gf_heuristic_bonus: 10.0,
            gf_menu_bonus: 15.0,
            gf_menu_per_item_bonus: 1.0,
            gf_max_bonus: 20.0,
            distance_max_bonus: 15.0,
            distance_far_meters: 5000.0,
            distance_max_penalty: 5.0,
            near_threshold_meters: 1000.0,
            rating_midpoint: 3.0,
            rating_points_per_star: 5.0,
            highly_rated_threshold: 4.5,
            open_now_bonus: 5.0,
        }
    }
}

impl ScoringConfig {
    /// Check the relationships the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.base_score) {
            return Err(ConfigError::ValidationError(format!(
                "base_score must be within [0, 100], got {}",
                self.base_score
            )));
        }

        let magnitudes = [
            ("favorite_safe_bonus", self.favorite_safe_bonus),
            ("favorite_try_bonus", self.favorite_try_bonus),
            ("favorite_avoid_penalty", self.favorite_avoid_penalty),
            ("gf_heuristic_bonus", self.gf_heuristic_bonus),
            ("gf_menu_bonus", self.gf_menu_bonus),
            ("gf_menu_per_item_bonus", self.gf_menu_per_item_bonus),
            ("gf_max_bonus", self.gf_max_bonus),
            ("distance_max_bonus", self.distance_max_bonus),
            ("distance_max_penalty", self.distance_max_penalty),
            ("near_threshold_meters", self.near_threshold_meters),
            ("rating_points_per_star", self.rating_points_per_star),
            ("open_now_bonus", self.open_now_bonus),
        ];
        for (name, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.favorite_try_bonus >= self.favorite_safe_bonus {
            return Err(ConfigError::ValidationError(
                "favorite_try_bonus must be lower than favorite_safe_bonus".to_string(),
            ));
        }

        if self.gf_heuristic_bonus > self.gf_menu_bonus {
            return Err(ConfigError::ValidationError(
                "gf_heuristic_bonus must not exceed gf_menu_bonus".to_string(),
            ));
        }

        if !(self.distance_far_meters.is_finite() && self.distance_far_meters > 0.0) {
            return Err(ConfigError::ValidationError(
                "distance_far_meters must be positive".to_string(),
            ));
        }

        if !(0.0..=5.0).contains(&self.rating_midpoint) {
            return Err(ConfigError::ValidationError(format!(
                "rating_midpoint must be within [0, 5], got {}",
                self.rating_midpoint
            )));
        }

        Ok(())
    }
}

/// Constants for menu segmentation, item classification and aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Shortest separator-less line kept as an item
    pub min_line_length: usize,
    /// Longest separator-less line kept as an item
    pub max_line_length: usize,
    /// Item names longer than this are rejected as malformed
    pub max_name_length: usize,

    pub thresholds: ClassificationThresholds,

    /// Total keyword score that maps to full confidence
    pub confidence_divisor: f64,
    /// Confidence when no keyword matched
    pub default_confidence: f64,

    pub tiers: SafetyTiers,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_line_length: 5,
            max_line_length: 100,
            max_name_length: 100,
            thresholds: ClassificationThresholds::default(),
            confidence_divisor: 10.0,
            default_confidence: 0.3,
            tiers: SafetyTiers::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_line_length > self.max_line_length {
            return Err(ConfigError::ValidationError(
                "min_line_length must not exceed max_line_length".to_string(),
            ));
        }

        if !(self.confidence_divisor.is_finite() && self.confidence_divisor > 0.0) {
            return Err(ConfigError::ValidationError(
                "confidence_divisor must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::ValidationError(
                "default_confidence must be within [0, 1]".to_string(),
            ));
        }

        self.tiers.validate()
    }
}

/// Keyword-score thresholds for the per-item decision table.
///
/// Rows are evaluated in declaration order; the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// GF_SAFE: gluten-free score at least this, with no warnings
    pub safe_min_gf: u32,
    /// LIKELY_GF: gluten-free score at least this ...
    pub likely_min_gf: u32,
    /// ... and warning score at most this
    pub likely_max_warning: u32,
    /// MAY_CONTAIN_GLUTEN: warning score at least this ...
    pub caution_min_warning: u32,
    /// ... or gluten score at least this
    pub caution_min_gluten: u32,
    /// NOT_GF: gluten score at least this
    pub not_gf_min_gluten: u32,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            safe_min_gf: 3,
            likely_min_gf: 2,
            likely_max_warning: 1,
            caution_min_warning: 2,
            caution_min_gluten: 2,
            not_gf_min_gluten: 3,
        }
    }
}

/// Safe-share cut-offs for the restaurant-level verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyTiers {
    pub excellent: f64,
    pub good: f64,
    pub limited: f64,
    pub poor: f64,
}

impl Default for SafetyTiers {
    fn default() -> Self {
        Self {
            excellent: 0.8,
            good: 0.6,
            limited: 0.3,
            poor: 0.1,
        }
    }
}

impl SafetyTiers {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.excellent >= self.good
            && self.good >= self.limited
            && self.limited >= self.poor
            && self.poor >= 0.0
            && self.excellent <= 1.0;
        if !ordered {
            return Err(ConfigError::ValidationError(
                "tiers must satisfy 1 >= excellent >= good >= limited >= poor >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a config section from YAML and validate it.
pub fn scoring_from_yaml(yaml: &str) -> Result<ScoringConfig, ConfigError> {
    let config: ScoringConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Parse a classifier config section from YAML and validate it.
pub fn classifier_from_yaml(yaml: &str) -> Result<ClassifierConfig, ConfigError> {
    let config: ClassifierConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Read a file to a string, mapping I/O failures into `ConfigError`.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    Ok(fs::read_to_string(path)?)
}
