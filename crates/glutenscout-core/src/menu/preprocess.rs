//! Menu text normalization and segmentation into candidate items.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ClassifierConfig;

lazy_static! {
    /// Em dash or horizontal bar, with any surrounding spaces; always a separator
    static ref WIDE_DASH: Regex = Regex::new(r"[^\S\n]*[\u{2014}\u{2015}][^\S\n]*").unwrap();

    /// Figure dash, en dash, minus sign
    static ref DASH_VARIANTS: Regex = Regex::new(r"[\u{2012}\u{2013}\u{2212}]").unwrap();

    /// Anything outside word characters, whitespace and common menu punctuation
    static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^\w\s.,;:()&%\-]").unwrap();

    /// Whitespace runs that do not contain a line break
    static ref INLINE_WHITESPACE: Regex = Regex::new(r"[^\S\n]+").unwrap();

    /// A period that ends a sentence (not a decimal point)
    static ref SENTENCE_BREAK: Regex = Regex::new(r"\.(?:\s+|$)").unwrap();

    /// " - " (after dash normalization) or a colon
    static ref NAME_SEPARATOR: Regex = Regex::new(r"\s+-\s+|\s*:\s*").unwrap();
}

/// A candidate menu item before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSegment {
    pub name: String,
    pub description: String,
}

/// Normalize raw menu text.
///
/// Em dashes become " - " even when written tight against words, other dash
/// variants become "-", disallowed characters are removed, whitespace
/// runs collapse to one space within each line, and blank lines are dropped.
/// Line breaks survive so segmentation can still split on them.
pub fn preprocess(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let separated = WIDE_DASH.replace_all(&unified, " - ");
    let dashed = DASH_VARIANTS.replace_all(&separated, "-");
    let stripped = DISALLOWED_CHARS.replace_all(&dashed, "");
    let collapsed = INLINE_WHITESPACE.replace_all(&stripped, " ");

    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split preprocessed text into candidate items.
pub fn segment(text: &str, config: &ClassifierConfig) -> Vec<MenuSegment> {
    text.lines()
        .flat_map(|line| SENTENCE_BREAK.split(line))
        .filter_map(|candidate| split_candidate(candidate.trim(), config))
        .collect()
}

fn split_candidate(candidate: &str, config: &ClassifierConfig) -> Option<MenuSegment> {
    if candidate.is_empty() {
        return None;
    }

    if let Some(separator) = NAME_SEPARATOR.find(candidate) {
        let name = candidate[..separator.start()].trim();
        let description = candidate[separator.end()..].trim();
        if name.is_empty() || name.chars().count() > config.max_name_length {
            return None;
        }
        return Some(MenuSegment {
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    let length = candidate.chars().count();
    if (config.min_line_length..=config.max_line_length).contains(&length) {
        Some(MenuSegment {
            name: candidate.to_string(),
            description: String::new(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(raw: &str) -> Vec<MenuSegment> {
        segment(&preprocess(raw), &ClassifierConfig::default())
    }

    #[test]
    fn test_preprocess_collapses_and_strips() {
        let cleaned = preprocess("  Fish   &  Chips!!  \t $12 \n\n  Salad * (GF)  ");
        assert_eq!(cleaned, "Fish & Chips 12\nSalad (GF)");
    }

    #[test]
    fn test_preprocess_keeps_menu_punctuation() {
        let cleaned = preprocess("Soup: lentil, carrot; 100% vegan. (v) - new");
        assert_eq!(cleaned, "Soup: lentil, carrot; 100% vegan. (v) - new");
    }

    #[test]
    fn test_preprocess_normalizes_dashes() {
        assert_eq!(preprocess("Tacos \u{2014} corn tortillas"), "Tacos - corn tortillas");
        assert_eq!(preprocess("Tacos \u{2013} corn"), "Tacos - corn");
        assert_eq!(preprocess("Tacos\u{2014}corn tortillas"), "Tacos - corn tortillas");
        // A tight en dash is a range or compound, not a separator
        assert_eq!(preprocess("Open 10\u{2013}12"), "Open 10-12");
    }

    #[test]
    fn test_segment_tight_em_dash() {
        let s = segments("Tacos\u{2014}corn tortillas, gluten-free");
        assert_eq!(
            s,
            vec![MenuSegment {
                name: "Tacos".into(),
                description: "corn tortillas, gluten-free".into(),
            }]
        );
    }

    #[test]
    fn test_preprocess_empty() {
        assert_eq!(preprocess(""), "");
        assert_eq!(preprocess(" \n\t\n "), "");
        assert_eq!(preprocess("$$$ *** !!!"), "");
    }

    #[test]
    fn test_segment_name_description() {
        let s = segments("Margherita Pizza - tomato, mozzarella, basil");
        assert_eq!(
            s,
            vec![MenuSegment {
                name: "Margherita Pizza".into(),
                description: "tomato, mozzarella, basil".into(),
            }]
        );
    }

    #[test]
    fn test_segment_colon_and_em_dash() {
        let s = segments("Pad Thai: rice noodles\nRisotto \u{2014} arborio rice, parmesan");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].name, "Pad Thai");
        assert_eq!(s[0].description, "rice noodles");
        assert_eq!(s[1].name, "Risotto");
        assert_eq!(s[1].description, "arborio rice, parmesan");
    }

    #[test]
    fn test_segment_splits_sentences_not_decimals() {
        let s = segments("Steak frites 24.50. Grilled salmon with herbs.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].name, "Steak frites 24.50");
        assert_eq!(s[1].name, "Grilled salmon with herbs");
    }

    #[test]
    fn test_segment_length_band() {
        let long = "x".repeat(101);
        let s = segments(&format!("Tea\nSoup of the day\n{}", long));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].name, "Soup of the day");
    }

    #[test]
    fn test_segment_rejects_long_names() {
        let name = "n".repeat(101);
        assert!(segments(&format!("{} - description", name)).is_empty());
        let ok = "n".repeat(100);
        assert_eq!(segments(&format!("{} - description", ok)).len(), 1);
    }

    #[test]
    fn test_segment_rejects_empty_name() {
        assert!(segments(": just a description").is_empty());
    }

    #[test]
    fn test_hyphenated_words_are_not_separators() {
        let s = segments("Gluten-free brownie");
        assert_eq!(s[0].name, "Gluten-free brownie");
        assert!(s[0].description.is_empty());
    }
}
