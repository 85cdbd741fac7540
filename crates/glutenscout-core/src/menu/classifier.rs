//! Per-item gluten-free classification.
//!
//! ## Decision table
//!
//! Rows are checked top to bottom; the first match wins.
//!
//! | Classification | Condition (defaults) |
//! |----------------|----------------------|
//! | `GF_SAFE` | gf ≥ 3 and warning = 0 |
//! | `LIKELY_GF` | gf ≥ 2 and warning ≤ 1 |
//! | `MAY_CONTAIN_GLUTEN` | warning ≥ 2 or gluten ≥ 2 |
//! | `NOT_GF` | gluten ≥ 3 |
//! | `UNCLEAR` | otherwise |
//!
//! With the default weights every gluten keyword scores 3, so the third row
//! absorbs what the fourth would catch. `NOT_GF` is reached only when
//! `caution_min_gluten` is tuned above `not_gf_min_gluten`.

use crate::config::{ClassificationThresholds, ClassifierConfig};
use crate::types::{AnalyzedMenuItem, GfClassification};

use super::preprocess::MenuSegment;
use super::rules::{KeywordMatches, KeywordTable};

/// Apply the decision table to keyword scores.
pub fn decide(matches: &KeywordMatches, thresholds: &ClassificationThresholds) -> GfClassification {
    let gf = matches.gf_score;
    let warning = matches.warning_score;
    let gluten = matches.gluten_score;

    if gf >= thresholds.safe_min_gf && warning == 0 {
        GfClassification::GfSafe
    } else if gf >= thresholds.likely_min_gf && warning <= thresholds.likely_max_warning {
        GfClassification::LikelyGf
    } else if warning >= thresholds.caution_min_warning || gluten >= thresholds.caution_min_gluten {
        GfClassification::MayContainGluten
    } else if gluten >= thresholds.not_gf_min_gluten {
        GfClassification::NotGf
    } else {
        GfClassification::Unclear
    }
}

/// Confidence from the total keyword score, or the configured default when
/// nothing matched.
pub fn confidence(matches: &KeywordMatches, config: &ClassifierConfig) -> f64 {
    if matches.is_empty() {
        return config.default_confidence;
    }
    (f64::from(matches.total_score()) / config.confidence_divisor).min(1.0)
}

/// Classify one segmented menu item.
pub fn classify_item(
    segment: &MenuSegment,
    table: &KeywordTable,
    config: &ClassifierConfig,
) -> AnalyzedMenuItem {
    let text = format!("{} {}", segment.name, segment.description).to_lowercase();
    let matches = table.score(&text);
    let classification = decide(&matches, &config.thresholds);

    AnalyzedMenuItem {
        name: segment.name.clone(),
        description: segment.description.clone(),
        classification,
        confidence: confidence(&matches, config),
        reasoning: item_reasoning(classification, &matches),
        gf_keywords: matches.gf_keywords,
        warning_keywords: matches.warning_keywords,
        gluten_keywords: matches.gluten_keywords,
    }
}

fn item_reasoning(classification: GfClassification, matches: &KeywordMatches) -> String {
    let mut parts = Vec::new();
    if !matches.gf_keywords.is_empty() {
        parts.push(format!("gluten-free indicators: {}", matches.gf_keywords.join(", ")));
    }
    if !matches.warning_keywords.is_empty() {
        parts.push(format!("warnings: {}", matches.warning_keywords.join(", ")));
    }
    if !matches.gluten_keywords.is_empty() {
        parts.push(format!(
            "gluten ingredients: {}",
            matches.gluten_keywords.join(", ")
        ));
    }

    let verdict = match classification {
        GfClassification::GfSafe => "Explicitly gluten-free",
        GfClassification::LikelyGf => "Likely gluten-free",
        GfClassification::MayContainGluten => "May contain gluten",
        GfClassification::NotGf => "Contains gluten",
        GfClassification::Unclear => "No gluten information",
    };

    if parts.is_empty() {
        verdict.to_string()
    } else {
        format!("{} ({})", verdict, parts.join("; "))
    }
}
