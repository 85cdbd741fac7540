//! Declarative keyword table for menu classification.
//!
//! The table is data, not branching: each row is `(keyword, weight, category)`.
//! Matching is case-insensitive on word boundaries, so "wheat" does not fire on
//! "buckwheat" and "bread" does not fire on "breaded".

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which score a keyword feeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    /// Positive gluten-free evidence
    GlutenFree,
    /// Cross-contact or uncertainty language
    Warning,
    /// Gluten-containing ingredient
    Gluten,
}

/// One row of the keyword table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub weight: u32,
    pub category: KeywordCategory,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, weight: u32, category: KeywordCategory) -> Self {
        Self {
            keyword: keyword.into(),
            weight,
            category,
        }
    }
}

use KeywordCategory::{Gluten, GlutenFree, Warning};

/// The shipped rule table.
pub static DEFAULT_RULES: &[(&str, u32, KeywordCategory)] = &[
    // Strong gluten-free phrases
    ("dedicated gluten-free", 3, GlutenFree),
    ("dedicated gluten free", 3, GlutenFree),
    ("100% gluten-free", 3, GlutenFree),
    ("100% gluten free", 3, GlutenFree),
    ("certified gluten-free", 3, GlutenFree),
    ("certified gluten free", 3, GlutenFree),
    // Gluten-free indicators
    ("gluten-free", 2, GlutenFree),
    ("gluten free", 2, GlutenFree),
    ("gf", 2, GlutenFree),
    ("celiac", 2, GlutenFree),
    ("coeliac", 2, GlutenFree),
    ("no gluten", 2, GlutenFree),
    ("without gluten", 2, GlutenFree),
    ("sin gluten", 2, GlutenFree),
    ("sans gluten", 2, GlutenFree),
    ("dedicated fryer", 2, GlutenFree),
    // Cross-contact warnings
    ("may contain", 2, Warning),
    ("shared kitchen", 2, Warning),
    ("shared fryer", 2, Warning),
    ("shared equipment", 2, Warning),
    ("cross-contamination", 2, Warning),
    ("cross contamination", 2, Warning),
    ("cross-contact", 2, Warning),
    ("traces of", 2, Warning),
    ("same facility", 2, Warning),
    ("not celiac safe", 2, Warning),
    ("not gluten-free", 2, Warning),
    ("not gluten free", 2, Warning),
    // Gluten-containing ingredients
    ("wheat", 3, Gluten),
    ("barley", 3, Gluten),
    ("rye", 3, Gluten),
    ("malt", 3, Gluten),
    ("panko", 3, Gluten),
    ("seitan", 3, Gluten),
    ("semolina", 3, Gluten),
    ("spelt", 3, Gluten),
    ("farro", 3, Gluten),
    ("bulgur", 3, Gluten),
    ("couscous", 3, Gluten),
    ("durum", 3, Gluten),
    ("breaded", 3, Gluten),
    ("breadcrumbs", 3, Gluten),
    ("bread", 3, Gluten),
    ("croutons", 3, Gluten),
    ("flour tortilla", 3, Gluten),
    ("pasta", 3, Gluten),
    ("soy sauce", 3, Gluten),
    ("beer-battered", 3, Gluten),
    ("tempura", 3, Gluten),
    ("brioche", 3, Gluten),
];

lazy_static! {
    static ref DEFAULT_TABLE: KeywordTable = KeywordTable::new(
        DEFAULT_RULES
            .iter()
            .map(|(keyword, weight, category)| KeywordRule::new(*keyword, *weight, *category))
            .collect()
    )
    .unwrap();
}

/// Keyword scores and the keywords behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMatches {
    pub gf_score: u32,
    pub warning_score: u32,
    pub gluten_score: u32,
    pub gf_keywords: Vec<String>,
    pub warning_keywords: Vec<String>,
    pub gluten_keywords: Vec<String>,
}

impl KeywordMatches {
    pub fn total_score(&self) -> u32 {
        self.gf_score + self.warning_score + self.gluten_score
    }

    pub fn is_empty(&self) -> bool {
        self.gf_keywords.is_empty()
            && self.warning_keywords.is_empty()
            && self.gluten_keywords.is_empty()
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: KeywordRule,
    pattern: Regex,
}

/// A compiled keyword table.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    rules: Vec<CompiledRule>,
}

impl KeywordTable {
    /// Compile a rule table. Keywords are matched literally.
    pub fn new(rules: Vec<KeywordRule>) -> Result<Self, regex::Error> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let pattern = Regex::new(&boundary_pattern(&rule.keyword))?;
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = &KeywordRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Score `text` against every rule. Each rule counts at most once.
    pub fn score(&self, text: &str) -> KeywordMatches {
        let mut matches = KeywordMatches::default();

        for compiled in &self.rules {
            if !compiled.pattern.is_match(text) {
                continue;
            }
            let rule = &compiled.rule;
            let (score, keywords) = match rule.category {
                KeywordCategory::GlutenFree => (&mut matches.gf_score, &mut matches.gf_keywords),
                KeywordCategory::Warning => {
                    (&mut matches.warning_score, &mut matches.warning_keywords)
                }
                KeywordCategory::Gluten => {
                    (&mut matches.gluten_score, &mut matches.gluten_keywords)
                }
            };
            *score += rule.weight;
            keywords.push(rule.keyword.clone());
        }

        matches
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

/// Case-insensitive literal pattern with word boundaries on alphanumeric ends.
fn boundary_pattern(keyword: &str) -> String {
    let starts_word = keyword.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = keyword.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(keyword),
        if ends_word { r"\b" } else { "" },
    )
}
