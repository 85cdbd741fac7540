//! Menu scan lifecycle on restaurant snapshots.
//!
//! Snapshots are immutable values; every transition returns a new snapshot.

use std::time::Duration;

use crate::types::{Location, MenuAnalysisResult, MenuScan, MenuScanState, Restaurant};

/// Menus older than this are scanned again.
pub const DEFAULT_MENU_RESCAN_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

impl MenuScan {
    /// Whether a restaurant with this scan record is due for a (re)scan.
    ///
    /// Never-scanned and failed restaurants are always due. Any other scan,
    /// including one still marked in flight, is due once its stamp is older
    /// than `ttl`; a fetch stuck that long is treated as abandoned.
    pub fn needs_rescan(&self, now_ms: i64, ttl: Duration) -> bool {
        match self.state {
            MenuScanState::NotStarted | MenuScanState::Failed => true,
            MenuScanState::Fetching | MenuScanState::Success | MenuScanState::NoWebsite => {
                match self.last_scanned_at_ms {
                    None => true,
                    Some(at) => {
                        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                        now_ms.saturating_sub(at) >= ttl_ms
                    }
                }
            }
        }
    }
}

impl Restaurant {
    /// Record a scan state transition stamped at `at_ms`.
    ///
    /// For `Fetching` the stamp marks when the fetch started.
    pub fn with_scan_state(mut self, state: MenuScanState, at_ms: i64) -> Self {
        self.menu_scan.state = state;
        self.menu_scan.last_scanned_at_ms = Some(at_ms);
        self
    }

    /// Apply a successful menu analysis.
    ///
    /// The confirmed item list is replaced with the sorted, de-duplicated
    /// names of GF_SAFE and LIKELY_GF items.
    pub fn with_menu_analysis(self, analysis: &MenuAnalysisResult, at_ms: i64) -> Self {
        let mut names = analysis.gf_item_names();
        names.sort();
        names.dedup();

        let mut updated = self.with_scan_state(MenuScanState::Success, at_ms);
        updated.gf_menu_items = names;
        updated
    }

    /// Populate `distance_meters` from the user's position.
    pub fn with_distance_from(self, user: Location) -> Self {
        let meters = haversine_meters(user, self.location);
        self.with_distance(meters)
    }
}

/// Great-circle distance between two points.
pub fn haversine_meters(a: Location, b: Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
