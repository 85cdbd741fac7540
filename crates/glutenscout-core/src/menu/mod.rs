//! Menu text classifier.
//!
//! Pipeline: preprocess → segment → classify each item → aggregate.
//!
//! Analysis is gated on a readiness check for the text-analysis resources
//! (for example translation models). An unready analyzer reports
//! [`AnalysisError::NotReady`]; malformed or empty text is never an error and
//! produces an `UNKNOWN` verdict with zero items.

pub mod aggregate;
pub mod classifier;
pub mod preprocess;
pub mod rules;

pub use aggregate::ClassificationCounts;
pub use preprocess::MenuSegment;
pub use rules::{KeywordCategory, KeywordMatches, KeywordRule, KeywordTable, DEFAULT_RULES};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ClassifierConfig;
use crate::types::{MenuAnalysisResult, SourceType};

/// Errors that can occur during menu analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Analysis resources not ready: {resource}")]
    NotReady { resource: String },
}

/// Reports whether the resources the analyzer depends on are available.
pub trait ResourceReadiness: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Name used in [`AnalysisError::NotReady`].
    fn resource_name(&self) -> &str {
        "menu analysis resources"
    }
}

/// Readiness for deployments with no external resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl ResourceReadiness for AlwaysReady {
    fn is_ready(&self) -> bool {
        true
    }
}

/// Rule-based gluten-free menu analyzer.
#[derive(Clone)]
pub struct MenuAnalyzer {
    config: ClassifierConfig,
    table: KeywordTable,
    readiness: Arc<dyn ResourceReadiness>,
}

impl MenuAnalyzer {
    pub fn new(config: ClassifierConfig, table: KeywordTable) -> Self {
        Self {
            config,
            table,
            readiness: Arc::new(AlwaysReady),
        }
    }

    /// Gate analysis on an external readiness signal.
    pub fn with_readiness(mut self, readiness: Arc<dyn ResourceReadiness>) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Fail with [`AnalysisError::NotReady`] unless resources are available.
    pub fn ensure_ready(&self) -> Result<(), AnalysisError> {
        if self.readiness.is_ready() {
            Ok(())
        } else {
            Err(AnalysisError::NotReady {
                resource: self.readiness.resource_name().to_string(),
            })
        }
    }

    /// Analyze menu text, timestamped with the current time.
    ///
    /// For reproducible output use [`analyze_at`](Self::analyze_at).
    pub fn analyze(
        &self,
        menu_text: &str,
        restaurant_name: &str,
        source: SourceType,
    ) -> Result<MenuAnalysisResult, AnalysisError> {
        self.analyze_at(menu_text, restaurant_name, source, Utc::now())
    }

    /// Analyze menu text with an explicit timestamp.
    ///
    /// Same inputs always produce the same result.
    pub fn analyze_at(
        &self,
        menu_text: &str,
        restaurant_name: &str,
        source: SourceType,
        analyzed_at: DateTime<Utc>,
    ) -> Result<MenuAnalysisResult, AnalysisError> {
        self.ensure_ready()?;

        let cleaned = preprocess::preprocess(menu_text);
        let items: Vec<_> = preprocess::segment(&cleaned, &self.config)
            .iter()
            .map(|segment| classifier::classify_item(segment, &self.table, &self.config))
            .collect();

        let counts = ClassificationCounts::from_items(&items);
        let safety_level = aggregate::safety_level(&counts, &self.config.tiers);

        Ok(MenuAnalysisResult {
            restaurant_name: restaurant_name.to_string(),
            confidence: aggregate::mean_confidence(&items),
            reasoning: aggregate::summarize(restaurant_name, &counts, safety_level),
            items,
            safety_level,
            source,
            analyzed_at,
        })
    }
}

impl Default for MenuAnalyzer {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), KeywordTable::default())
    }
}
