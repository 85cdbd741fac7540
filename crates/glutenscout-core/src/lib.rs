//! # glutenscout-core
//!
//! Deterministic restaurant recommendation and gluten-free menu analysis.
//!
//! This crate answers two questions for a gluten-free diner:
//! - Which nearby restaurants should I look at first, and why?
//! - How safe does this restaurant's menu look?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: Callers supply snapshots and menu text
//! 3. **Explainable**: Every score carries reason tags and per-signal deltas
//! 4. **Bounded**: Scores stay in [0, 100], confidences in [0, 1]
//!
//! ## Example
//!
//! ```rust,ignore
//! use glutenscout_core::{analyze_menu, recommend, FavoriteLookup, SourceType};
//!
//! let ranked = recommend(&restaurants, &FavoriteLookup::new(), 5);
//! for r in &ranked {
//!     println!("{} {:.0} {:?}", r.restaurant.name, r.score, r.reasons);
//! }
//!
//! let analysis = analyze_menu(&menu_text, "Luna", SourceType::Website)?;
//! println!("{:?}: {}", analysis.safety_level, analysis.reasoning);
//! ```

pub mod config;
pub mod menu;
pub mod recommendation;
pub mod scan;
pub mod types;

// Re-export main types at crate root
pub use config::{
    ClassificationThresholds, ClassifierConfig, ConfigError, SafetyTiers, ScoringConfig,
};
pub use menu::{AlwaysReady, AnalysisError, MenuAnalyzer, ResourceReadiness};
pub use recommendation::{
    DefaultRecommendationRepository, RecommendationRepository, Signal, MAX_SCORE, MIN_SCORE,
};
pub use scan::{haversine_meters, DEFAULT_MENU_RESCAN_TTL};
pub use types::{
    favorite_for, name_suggests_gluten_free, AnalyzedMenuItem, FavoriteLookup, FavoriteStatus,
    GfClassification, GfSafetyLevel, Location, MenuAnalysisResult, MenuScan, MenuScanState,
    OpenStatus, ReasonTag, RecommendedRestaurant, Restaurant, SignalContribution, SignalKind,
    SourceType,
};

use chrono::{DateTime, Utc};

/// Rank restaurants with the default scoring configuration.
///
/// Returns at most `limit` entries, best first.
pub fn recommend(
    restaurants: &[Restaurant],
    favorites: &FavoriteLookup,
    limit: usize,
) -> Vec<RecommendedRestaurant> {
    DefaultRecommendationRepository::default().top_n(restaurants, favorites, limit)
}

/// Analyze menu text with the default keyword table and classifier settings.
///
/// # Determinism
///
/// This function uses the current system time for `analyzed_at`.
/// For reproducible results use [`analyze_menu_at`].
pub fn analyze_menu(
    menu_text: &str,
    restaurant_name: &str,
    source: SourceType,
) -> Result<MenuAnalysisResult, AnalysisError> {
    analyze_menu_at(menu_text, restaurant_name, source, Utc::now())
}

/// Analyze menu text with an explicit timestamp.
pub fn analyze_menu_at(
    menu_text: &str,
    restaurant_name: &str,
    source: SourceType,
    analyzed_at: DateTime<Utc>,
) -> Result<MenuAnalysisResult, AnalysisError> {
    MenuAnalyzer::default().analyze_at(menu_text, restaurant_name, source, analyzed_at)
}
