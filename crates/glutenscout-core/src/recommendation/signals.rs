//! The scoring signals.
//!
//! Each signal looks at one aspect of a restaurant, returns a capped score
//! delta and, when the aspect is notable, a reason tag. Signals never see each
//! other's output; the engine sums them.
//!
//! | Signal | Delta range (defaults) | Tag |
//! |--------|------------------------|-----|
//! | Gluten-free evidence | 0 … +20 | `HIGH_GF_OPTIONS` |
//! | Distance | −5 … +15 | `NEARBY` (≤ 1000 m) |
//! | Rating | −15 … +10 | `HIGHLY_RATED` (≥ 4.5) |
//! | Open now | 0 … +5 | `OPEN_NOW` |
//! | Favorite | −40 … +40 | `USER_FAVORITE` (safe) |

use crate::config::ScoringConfig;
use crate::types::{
    FavoriteStatus, OpenStatus, ReasonTag, Restaurant, SignalContribution, SignalKind,
};

/// Trait implemented by every scoring signal.
pub trait Signal: Send + Sync {
    fn kind(&self) -> SignalKind;

    /// Compute this signal's contribution for one restaurant.
    ///
    /// `favorite` is the already-resolved favorite status, if any.
    fn evaluate(
        &self,
        restaurant: &Restaurant,
        favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution;
}

/// Rewards gluten-free evidence; a confirmed menu outweighs the name heuristic.
pub struct GlutenFreeSignal;

impl Signal for GlutenFreeSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::GlutenFreeEvidence
    }

    fn evaluate(
        &self,
        restaurant: &Restaurant,
        _favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution {
        if !restaurant.has_gluten_free_options() {
            return SignalContribution::none(self.kind());
        }

        let delta = if restaurant.has_confirmed_gf_menu() {
            let extra_items = restaurant.gf_menu_items.len().saturating_sub(1) as f64;
            config.gf_menu_bonus + extra_items * config.gf_menu_per_item_bonus
        } else {
            config.gf_heuristic_bonus
        };

        SignalContribution {
            signal: self.kind(),
            delta: delta.min(config.gf_max_bonus),
            reason: Some(ReasonTag::HighGfOptions),
        }
    }
}

/// Linear falloff from `distance_max_bonus` at 0 m to zero at the far
/// threshold, continuing into a bounded penalty.
pub struct DistanceSignal;

impl Signal for DistanceSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Distance
    }

    fn evaluate(
        &self,
        restaurant: &Restaurant,
        _favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution {
        let meters = match restaurant.distance_meters {
            Some(d) if d.is_finite() => d.max(0.0),
            _ => return SignalContribution::none(self.kind()),
        };

        let raw = config.distance_max_bonus * (1.0 - meters / config.distance_far_meters);
        let delta = raw.clamp(-config.distance_max_penalty, config.distance_max_bonus);

        SignalContribution {
            signal: self.kind(),
            delta,
            reason: (meters <= config.near_threshold_meters).then_some(ReasonTag::Nearby),
        }
    }
}

/// Proportional to how far the rating sits from the midpoint.
pub struct RatingSignal;

impl Signal for RatingSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Rating
    }

    fn evaluate(
        &self,
        restaurant: &Restaurant,
        _favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution {
        let rating = match restaurant.rating {
            Some(r) if r.is_finite() => r.clamp(0.0, 5.0),
            _ => return SignalContribution::none(self.kind()),
        };

        SignalContribution {
            signal: self.kind(),
            delta: (rating - config.rating_midpoint) * config.rating_points_per_star,
            reason: (rating >= config.highly_rated_threshold).then_some(ReasonTag::HighlyRated),
        }
    }
}

/// Small bonus when explicitly open. Closed is treated like unknown so stale
/// hours data is not punished twice.
pub struct OpenNowSignal;

impl Signal for OpenNowSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::OpenNow
    }

    fn evaluate(
        &self,
        restaurant: &Restaurant,
        _favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution {
        match restaurant.open_now {
            OpenStatus::Open => SignalContribution {
                signal: self.kind(),
                delta: config.open_now_bonus,
                reason: Some(ReasonTag::OpenNow),
            },
            OpenStatus::Closed | OpenStatus::Unknown => SignalContribution::none(self.kind()),
        }
    }
}

/// The user's own verdict on the restaurant.
pub struct FavoriteSignal;

impl Signal for FavoriteSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Favorite
    }

    fn evaluate(
        &self,
        _restaurant: &Restaurant,
        favorite: Option<FavoriteStatus>,
        config: &ScoringConfig,
    ) -> SignalContribution {
        let (delta, reason) = match favorite {
            Some(FavoriteStatus::Safe) => (config.favorite_safe_bonus, Some(ReasonTag::UserFavorite)),
            Some(FavoriteStatus::Try) => (config.favorite_try_bonus, None),
            Some(FavoriteStatus::Avoid) => (-config.favorite_avoid_penalty, None),
            None => (0.0, None),
        };

        SignalContribution {
            signal: self.kind(),
            delta,
            reason,
        }
    }
}

/// All signals in evaluation order. Reason tags follow this order.
pub fn default_signals() -> Vec<Box<dyn Signal>> {
    vec![
        Box::new(GlutenFreeSignal),
        Box::new(DistanceSignal),
        Box::new(RatingSignal),
        Box::new(OpenNowSignal),
        Box::new(FavoriteSignal),
    ]
}
