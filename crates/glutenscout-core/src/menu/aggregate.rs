//! Aggregation of item classifications into a restaurant verdict.
//!
//! The verdict is driven by the share of items that are GF_SAFE or LIKELY_GF:
//! 1. share ≥ excellent and no warning items → EXCELLENT
//! 2. share ≥ good → GOOD
//! 3. share ≥ limited → LIMITED
//! 4. share ≥ poor → POOR
//! 5. otherwise, including an empty menu → UNKNOWN

use crate::config::SafetyTiers;
use crate::types::{AnalyzedMenuItem, GfClassification, GfSafetyLevel};

/// Per-classification counts for one menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationCounts {
    pub gf_safe: usize,
    pub likely_gf: usize,
    pub may_contain_gluten: usize,
    pub not_gf: usize,
    pub unclear: usize,
}

impl ClassificationCounts {
    pub fn from_items(items: &[AnalyzedMenuItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            match item.classification {
                GfClassification::GfSafe => counts.gf_safe += 1,
                GfClassification::LikelyGf => counts.likely_gf += 1,
                GfClassification::MayContainGluten => counts.may_contain_gluten += 1,
                GfClassification::NotGf => counts.not_gf += 1,
                GfClassification::Unclear => counts.unclear += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.gf_safe + self.likely_gf + self.may_contain_gluten + self.not_gf + self.unclear
    }

    pub fn friendly(&self) -> usize {
        self.gf_safe + self.likely_gf
    }

    pub fn warnings(&self) -> usize {
        self.may_contain_gluten + self.not_gf
    }

    /// Share of GF_SAFE + LIKELY_GF items; 0 for an empty menu.
    pub fn safe_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.friendly() as f64 / total as f64,
        }
    }
}

/// Map counts to a restaurant-level safety level.
pub fn safety_level(counts: &ClassificationCounts, tiers: &SafetyTiers) -> GfSafetyLevel {
    if counts.total() == 0 {
        return GfSafetyLevel::Unknown;
    }

    let share = counts.safe_percentage();
    if share >= tiers.excellent && counts.warnings() == 0 {
        GfSafetyLevel::Excellent
    } else if share >= tiers.good {
        GfSafetyLevel::Good
    } else if share >= tiers.limited {
        GfSafetyLevel::Limited
    } else if share >= tiers.poor {
        GfSafetyLevel::Poor
    } else {
        GfSafetyLevel::Unknown
    }
}

/// Arithmetic mean of item confidences; 0 for an empty menu.
pub fn mean_confidence(items: &[AnalyzedMenuItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|item| item.confidence).sum::<f64>() / items.len() as f64
}

/// Human-readable summary of a menu analysis.
pub fn summarize(restaurant_name: &str, counts: &ClassificationCounts, level: GfSafetyLevel) -> String {
    if counts.total() == 0 {
        return format!(
            "{}: no menu items could be identified in the provided text.",
            restaurant_name
        );
    }

    format!(
        "{}: {} of {} menu items look gluten-free friendly ({} gluten-free, {} likely gluten-free); \
         {} may contain gluten, {} not gluten-free, {} unclear. {}.",
        restaurant_name,
        counts.friendly(),
        counts.total(),
        counts.gf_safe,
        counts.likely_gf,
        counts.may_contain_gluten,
        counts.not_gf,
        counts.unclear,
        level.description(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(safe: usize, likely: usize, caution: usize, not_gf: usize, unclear: usize) -> ClassificationCounts {
        ClassificationCounts {
            gf_safe: safe,
            likely_gf: likely,
            may_contain_gluten: caution,
            not_gf,
            unclear,
        }
    }

    fn item(classification: GfClassification, confidence: f64) -> AnalyzedMenuItem {
        AnalyzedMenuItem {
            name: "item".into(),
            description: String::new(),
            classification,
            confidence,
            gf_keywords: vec![],
            warning_keywords: vec![],
            gluten_keywords: vec![],
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_empty_is_unknown() {
        let tiers = SafetyTiers::default();
        assert_eq!(safety_level(&ClassificationCounts::default(), &tiers), GfSafetyLevel::Unknown);
        assert_eq!(ClassificationCounts::default().safe_percentage(), 0.0);
    }

    #[test]
    fn test_excellent_requires_no_warnings() {
        let tiers = SafetyTiers::default();
        assert_eq!(safety_level(&counts(4, 1, 0, 0, 0), &tiers), GfSafetyLevel::Excellent);
        assert_eq!(safety_level(&counts(4, 0, 0, 0, 1), &tiers), GfSafetyLevel::Excellent);
        // 80% safe but warning items drop it to GOOD
        assert_eq!(safety_level(&counts(4, 4, 2, 0, 0), &tiers), GfSafetyLevel::Good);
    }

    #[test]
    fn test_tiers() {
        let tiers = SafetyTiers::default();
        assert_eq!(safety_level(&counts(3, 0, 2, 0, 0), &tiers), GfSafetyLevel::Good);
        assert_eq!(safety_level(&counts(1, 2, 0, 0, 7), &tiers), GfSafetyLevel::Limited);
        assert_eq!(safety_level(&counts(1, 0, 4, 0, 5), &tiers), GfSafetyLevel::Poor);
        assert_eq!(safety_level(&counts(0, 0, 3, 0, 8), &tiers), GfSafetyLevel::Unknown);
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(&[]), 0.0);
        let items = vec![
            item(GfClassification::GfSafe, 0.5),
            item(GfClassification::Unclear, 0.3),
            item(GfClassification::MayContainGluten, 0.4),
        ];
        assert!((mean_confidence(&items) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_counts_from_items() {
        let items = vec![
            item(GfClassification::GfSafe, 0.5),
            item(GfClassification::LikelyGf, 0.2),
            item(GfClassification::NotGf, 0.3),
            item(GfClassification::Unclear, 0.3),
        ];
        let c = ClassificationCounts::from_items(&items);
        assert_eq!(c, counts(1, 1, 0, 1, 1));
        assert_eq!(c.friendly(), 2);
        assert_eq!(c.warnings(), 1);
        assert_eq!(c.safe_percentage(), 0.5);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let text = summarize("Luna", &counts(2, 1, 1, 0, 0), GfSafetyLevel::Good);
        assert!(text.starts_with("Luna: 3 of 4 menu items"));
        assert!(text.contains("2 gluten-free, 1 likely gluten-free"));
        assert!(text.contains("1 may contain gluten"));

        let empty = summarize("Luna", &ClassificationCounts::default(), GfSafetyLevel::Unknown);
        assert!(empty.contains("no menu items"));
    }
}
