//! Recommendation engine.
//!
//! Combines independent signals into a bounded score per restaurant, attaches
//! reason tags, and ranks the result.
//!
//! ## Guarantees
//!
//! - One output per input restaurant, score clamped to [0, 100]
//! - Sorted by score descending; ties keep input order
//! - Pure: no I/O, inputs are never mutated, same input gives same output

pub mod signals;

pub use signals::{
    default_signals, DistanceSignal, FavoriteSignal, GlutenFreeSignal, OpenNowSignal,
    RatingSignal, Signal,
};

use crate::config::{ConfigError, ScoringConfig};
use crate::types::{favorite_for, FavoriteLookup, RecommendedRestaurant, Restaurant};

/// Lower and upper bounds of a recommendation score.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Produces ranked recommendations from restaurant snapshots.
pub trait RecommendationRepository {
    /// Score every restaurant and sort by score descending.
    fn score(
        &self,
        restaurants: &[Restaurant],
        favorites: &FavoriteLookup,
    ) -> Vec<RecommendedRestaurant>;

    /// The first `limit` entries of [`score`](Self::score).
    fn top_n(
        &self,
        restaurants: &[Restaurant],
        favorites: &FavoriteLookup,
        limit: usize,
    ) -> Vec<RecommendedRestaurant> {
        let mut ranked = self.score(restaurants, favorites);
        ranked.truncate(limit);
        ranked
    }
}

/// Additive signal model over [`ScoringConfig`].
pub struct DefaultRecommendationRepository {
    config: ScoringConfig,
    signals: Vec<Box<dyn Signal>>,
}

impl DefaultRecommendationRepository {
    /// Build an engine over `config`, rejecting configs that fail
    /// [`ScoringConfig::validate`].
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            signals: default_signals(),
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a single restaurant without ranking.
    pub fn score_one(
        &self,
        restaurant: &Restaurant,
        favorites: &FavoriteLookup,
    ) -> RecommendedRestaurant {
        let favorite = favorite_for(restaurant, favorites);

        let contributions: Vec<_> = self
            .signals
            .iter()
            .map(|signal| signal.evaluate(restaurant, favorite, &self.config))
            .collect();

        let total = self.config.base_score + contributions.iter().map(|c| c.delta).sum::<f64>();
        let reasons = contributions.iter().filter_map(|c| c.reason).collect();

        RecommendedRestaurant {
            restaurant: restaurant.clone(),
            score: total.clamp(MIN_SCORE, MAX_SCORE),
            reasons,
            contributions,
        }
    }
}

impl Default for DefaultRecommendationRepository {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
            signals: default_signals(),
        }
    }
}

impl RecommendationRepository for DefaultRecommendationRepository {
    fn score(
        &self,
        restaurants: &[Restaurant],
        favorites: &FavoriteLookup,
    ) -> Vec<RecommendedRestaurant> {
        let mut ranked: Vec<_> = restaurants
            .iter()
            .map(|r| self.score_one(r, favorites))
            .collect();

        // sort_by is stable, so equal scores keep input order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}
