//! Core types for GlutenScout.
//!
//! These are the snapshots handed to the recommendation engine and the
//! results produced by the menu classifier. Nothing here performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name fragments that suggest a restaurant caters to gluten-free diners.
static GF_NAME_INDICATORS: &[&str] = &[
    "gluten",
    "celiac",
    "coeliac",
    "gf ",
    "allergy",
    "sin tacc",
];

/// Whether a restaurant name alone hints at gluten-free options.
///
/// This is the weak heuristic that seeds `gf_name_heuristic`; menu evidence
/// from a scan is the stronger signal.
pub fn name_suggests_gluten_free(name: &str) -> bool {
    // Trailing space lets "GF" match at the end of a name as well.
    let lowered = format!("{} ", name.to_lowercase());
    GF_NAME_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
}

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Open-now status as reported by the listing provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenStatus {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl From<Option<bool>> for OpenStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => OpenStatus::Open,
            Some(false) => OpenStatus::Closed,
            None => OpenStatus::Unknown,
        }
    }
}

/// Lifecycle of a menu scan for one restaurant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuScanState {
    #[default]
    NotStarted,
    Fetching,
    Success,
    NoWebsite,
    Failed,
}

/// Menu scan bookkeeping carried on the restaurant snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MenuScan {
    #[serde(default)]
    pub state: MenuScanState,

    /// Epoch milliseconds of the last scan transition (fetch start while fetching)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned_at_ms: Option<i64>,
}

/// Immutable restaurant snapshot used as scoring input.
///
/// Deserialized snapshots always carry the name heuristic: the flag is set
/// when the stored value is true or the name matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RestaurantRecord")]
pub struct Restaurant {
    /// Stable external place identifier; absent for ad-hoc entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub location: Location,

    /// Distance from the user in meters, populated by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,

    /// Name-based gluten-free heuristic
    #[serde(default)]
    pub gf_name_heuristic: bool,

    /// Confirmed gluten-free menu item names (order-insignificant)
    #[serde(default)]
    pub gf_menu_items: Vec<String>,

    /// Rating on a 0.0-5.0 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default)]
    pub open_now: OpenStatus,

    #[serde(default)]
    pub menu_scan: MenuScan,
}

/// Wire form of [`Restaurant`] before the name heuristic is applied.
#[derive(Deserialize)]
struct RestaurantRecord {
    #[serde(default)]
    place_id: Option<String>,
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    location: Location,
    #[serde(default)]
    distance_meters: Option<f64>,
    #[serde(default)]
    gf_name_heuristic: bool,
    #[serde(default)]
    gf_menu_items: Vec<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    open_now: OpenStatus,
    #[serde(default)]
    menu_scan: MenuScan,
}

impl From<RestaurantRecord> for Restaurant {
    fn from(record: RestaurantRecord) -> Self {
        Self {
            gf_name_heuristic: record.gf_name_heuristic
                || name_suggests_gluten_free(&record.name),
            place_id: record.place_id,
            name: record.name,
            address: record.address,
            location: record.location,
            distance_meters: record.distance_meters,
            gf_menu_items: record.gf_menu_items,
            rating: record.rating,
            open_now: record.open_now,
            menu_scan: record.menu_scan,
        }
    }
}

impl Restaurant {
    /// Create a restaurant snapshot, seeding the name heuristic from `name`.
    pub fn new(
        place_id: Option<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        location: Location,
    ) -> Self {
        let name = name.into();
        Self {
            place_id,
            gf_name_heuristic: name_suggests_gluten_free(&name),
            name,
            address: address.into(),
            location,
            distance_meters: None,
            gf_menu_items: Vec::new(),
            rating: None,
            open_now: OpenStatus::Unknown,
            menu_scan: MenuScan::default(),
        }
    }

    /// True iff the name heuristic fired OR a scan confirmed at least one item.
    pub fn has_gluten_free_options(&self) -> bool {
        self.gf_name_heuristic || !self.gf_menu_items.is_empty()
    }

    /// True when a scan produced a non-empty confirmed item list.
    pub fn has_confirmed_gf_menu(&self) -> bool {
        !self.gf_menu_items.is_empty()
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance_meters = Some(meters);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_open_now(mut self, open_now: OpenStatus) -> Self {
        self.open_now = open_now;
        self
    }

    pub fn with_gf_name_heuristic(mut self, flag: bool) -> Self {
        self.gf_name_heuristic = flag;
        self
    }

    pub fn with_gf_menu_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gf_menu_items = items.into_iter().map(Into::into).collect();
        self
    }
}

/// User-assigned personal classification of a restaurant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteStatus {
    Safe,
    Try,
    Avoid,
}

impl FavoriteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteStatus::Safe => "safe",
            FavoriteStatus::Try => "try",
            FavoriteStatus::Avoid => "avoid",
        }
    }
}

impl fmt::Display for FavoriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown favorite status: {0}")]
pub struct UnknownFavoriteStatus(pub String);

impl FromStr for FavoriteStatus {
    type Err = UnknownFavoriteStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(FavoriteStatus::Safe),
            "try" => Ok(FavoriteStatus::Try),
            "avoid" => Ok(FavoriteStatus::Avoid),
            other => Err(UnknownFavoriteStatus(other.to_string())),
        }
    }
}

/// Fully materialized favorite-status lookup keyed by place id.
pub type FavoriteLookup = HashMap<String, FavoriteStatus>;

/// Resolve the favorite status for a restaurant; ad-hoc entries never have one.
pub fn favorite_for(restaurant: &Restaurant, favorites: &FavoriteLookup) -> Option<FavoriteStatus> {
    restaurant
        .place_id
        .as_ref()
        .and_then(|id| favorites.get(id))
        .copied()
}

/// Why a restaurant received its recommendation score.
///
/// Declaration order matches the order tags are attached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonTag {
    HighGfOptions,
    Nearby,
    HighlyRated,
    OpenNow,
    UserFavorite,
}

impl ReasonTag {
    /// Short chip label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ReasonTag::HighGfOptions => "Gluten-free options",
            ReasonTag::Nearby => "Nearby",
            ReasonTag::HighlyRated => "Highly rated",
            ReasonTag::OpenNow => "Open now",
            ReasonTag::UserFavorite => "Your safe spot",
        }
    }
}

/// The scoring signals, in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    GlutenFreeEvidence,
    Distance,
    Rating,
    OpenNow,
    Favorite,
}

/// What one signal added to (or removed from) a restaurant's score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalContribution {
    pub signal: SignalKind,

    /// Signed score delta, already capped by the signal
    pub delta: f64,

    /// Tag attached when the signal crossed its notable threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonTag>,
}

impl SignalContribution {
    pub fn none(signal: SignalKind) -> Self {
        Self {
            signal,
            delta: 0.0,
            reason: None,
        }
    }
}

/// A restaurant with its clamped score and reason tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedRestaurant {
    pub restaurant: Restaurant,

    /// Total score clamped to [0, 100]
    pub score: f64,

    /// Reason tags in signal evaluation order
    pub reasons: Vec<ReasonTag>,

    /// Per-signal breakdown
    #[serde(default)]
    pub contributions: Vec<SignalContribution>,
}

/// Gluten-free safety classification of a single menu item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GfClassification {
    GfSafe,
    LikelyGf,
    MayContainGluten,
    NotGf,
    Unclear,
}

impl GfClassification {
    /// GF_SAFE and LIKELY_GF both count toward the safe share of a menu.
    pub fn is_gf_friendly(&self) -> bool {
        matches!(self, GfClassification::GfSafe | GfClassification::LikelyGf)
    }

    /// Items that carry a gluten warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            GfClassification::MayContainGluten | GfClassification::NotGf
        )
    }
}

/// A classified menu item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedMenuItem {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub classification: GfClassification,

    /// Confidence in [0, 1]
    pub confidence: f64,

    #[serde(default)]
    pub gf_keywords: Vec<String>,

    #[serde(default)]
    pub warning_keywords: Vec<String>,

    #[serde(default)]
    pub gluten_keywords: Vec<String>,

    pub reasoning: String,
}

/// Restaurant-level gluten-free safety verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GfSafetyLevel {
    Excellent,
    Good,
    Limited,
    Poor,
    Unknown,
}

impl GfSafetyLevel {
    pub fn description(&self) -> &'static str {
        match self {
            GfSafetyLevel::Excellent => "Most of the menu is gluten-free with no warnings",
            GfSafetyLevel::Good => "Many gluten-free choices",
            GfSafetyLevel::Limited => "Some gluten-free choices",
            GfSafetyLevel::Poor => "Very few gluten-free choices",
            GfSafetyLevel::Unknown => "Not enough information",
        }
    }
}

/// Where the menu text came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Website,
    Photo,
    Manual,
    Cached,
}

/// Result of analyzing one restaurant's menu text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuAnalysisResult {
    pub restaurant_name: String,

    pub items: Vec<AnalyzedMenuItem>,

    pub safety_level: GfSafetyLevel,

    /// Mean of item confidences, 0 when there are no items
    pub confidence: f64,

    pub reasoning: String,

    pub source: SourceType,

    pub analyzed_at: DateTime<Utc>,
}

impl MenuAnalysisResult {
    /// Names of items classified GF_SAFE or LIKELY_GF, in menu order.
    pub fn gf_item_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.classification.is_gf_friendly())
            .map(|item| item.name.clone())
            .collect()
    }

    pub fn count(&self, classification: GfClassification) -> usize {
        self.items
            .iter()
            .filter(|item| item.classification == classification)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_gf_options_is_logical_or() {
        let base = Restaurant::new(Some("p1".into()), "Corner Diner", "", Location::default());
        assert!(!base.has_gluten_free_options());

        let heuristic_only = base.clone().with_gf_name_heuristic(true);
        assert!(heuristic_only.has_gluten_free_options());

        // Menu evidence counts even when the name heuristic missed
        let menu_only = base.clone().with_gf_menu_items(["GF Pizza"]);
        assert!(!menu_only.gf_name_heuristic);
        assert!(menu_only.has_gluten_free_options());
    }

    #[test]
    fn test_name_heuristic() {
        assert!(name_suggests_gluten_free("The Gluten Free Bakery"));
        assert!(name_suggests_gluten_free("Celiac Corner"));
        assert!(name_suggests_gluten_free("Cafe GF"));
        assert!(!name_suggests_gluten_free("Golden Dragon"));
        // "gf" must be a separate token
        assert!(!name_suggests_gluten_free("Bigfoot Grill"));
    }

    #[test]
    fn test_new_seeds_heuristic() {
        let r = Restaurant::new(None, "Gluten-Free Kitchen", "1 Main St", Location::default());
        assert!(r.gf_name_heuristic);
        assert_eq!(r.open_now, OpenStatus::Unknown);
        assert_eq!(r.menu_scan.state, MenuScanState::NotStarted);
    }

    #[test]
    fn test_favorite_status_parse() {
        assert_eq!("safe".parse::<FavoriteStatus>(), Ok(FavoriteStatus::Safe));
        assert_eq!(" Try ".parse::<FavoriteStatus>(), Ok(FavoriteStatus::Try));
        assert_eq!("AVOID".parse::<FavoriteStatus>(), Ok(FavoriteStatus::Avoid));
        assert!("maybe".parse::<FavoriteStatus>().is_err());
    }

    #[test]
    fn test_favorite_for_requires_place_id() {
        let mut favorites = FavoriteLookup::new();
        favorites.insert("p1".to_string(), FavoriteStatus::Safe);

        let known = Restaurant::new(Some("p1".into()), "A", "", Location::default());
        let ad_hoc = Restaurant::new(None, "A", "", Location::default());

        assert_eq!(favorite_for(&known, &favorites), Some(FavoriteStatus::Safe));
        assert_eq!(favorite_for(&ad_hoc, &favorites), None);
    }

    #[test]
    fn test_restaurant_json_defaults() {
        let json = r#"{ "place_id": "abc", "name": "Pho House" }"#;
        let r: Restaurant = serde_json::from_str(json).unwrap();
        assert_eq!(r.place_id.as_deref(), Some("abc"));
        assert!(r.rating.is_none());
        assert!(r.distance_meters.is_none());
        assert!(r.gf_menu_items.is_empty());
        assert_eq!(r.open_now, OpenStatus::Unknown);
    }

    #[test]
    fn test_deserialized_restaurant_gets_name_heuristic() {
        let json = r#"{ "place_id": "a", "name": "The Gluten Free Bakery" }"#;
        let r: Restaurant = serde_json::from_str(json).unwrap();
        assert!(r.gf_name_heuristic);
        assert!(r.has_gluten_free_options());

        // A stored flag is kept even when the name does not match
        let json = r#"{ "name": "Corner Diner", "gf_name_heuristic": true }"#;
        let r: Restaurant = serde_json::from_str(json).unwrap();
        assert!(r.gf_name_heuristic);

        let json = r#"{ "name": "Corner Diner" }"#;
        let r: Restaurant = serde_json::from_str(json).unwrap();
        assert!(!r.gf_name_heuristic);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&GfClassification::MayContainGluten).unwrap(),
            "\"MAY_CONTAIN_GLUTEN\""
        );
        assert_eq!(
            serde_json::to_string(&ReasonTag::HighGfOptions).unwrap(),
            "\"HIGH_GF_OPTIONS\""
        );
        assert_eq!(
            serde_json::to_string(&MenuScanState::NoWebsite).unwrap(),
            "\"NO_WEBSITE\""
        );
        assert_eq!(serde_json::to_string(&FavoriteStatus::Try).unwrap(), "\"try\"");
    }

    #[test]
    fn test_open_status_from_option() {
        assert_eq!(OpenStatus::from(Some(true)), OpenStatus::Open);
        assert_eq!(OpenStatus::from(Some(false)), OpenStatus::Closed);
        assert_eq!(OpenStatus::from(None), OpenStatus::Unknown);
    }
}
