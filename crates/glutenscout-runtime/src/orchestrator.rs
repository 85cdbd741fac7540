//! Menu scan orchestrator.
//!
//! Drives the scan lifecycle for restaurant snapshots:
//! - Skips restaurants whose last scan is still fresh
//! - Serves repeat scans from the analysis cache
//! - Fetches menu text through a [`MenuSource`] under a timeout
//! - Runs the classifier on the blocking pool and applies the result
//!
//! A fetch failure or timeout never fails the call; it is recorded on the
//! returned snapshot as a FAILED scan. Only an unready analyzer is an error.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use glutenscout_core::menu::KeywordTable;
use glutenscout_core::{
    AnalysisError, ConfigError, GfSafetyLevel, MenuAnalysisResult, MenuAnalyzer, MenuScanState,
    ResourceReadiness, Restaurant, SourceType,
};

use crate::cache::AnalysisCache;
use crate::config::RuntimeConfig;

/// Errors from the scan orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Analyzer not ready: {0}")]
    NotReady(#[from] AnalysisError),

    #[error("Menu source failed: {0}")]
    SourceFailed(#[from] SourceError),

    #[error("Menu fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Menu source not configured")]
    SourceNotConfigured,

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}

/// Errors reported by a [`MenuSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Menu content unreadable: {0}")]
    Unreadable(String),
}

/// What a menu source found for a restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuFetch {
    /// Menu text and where it came from
    Text { text: String, source: SourceType },

    /// The restaurant has no website to scan
    NoWebsite,
}

/// Provides raw menu text for restaurants.
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menu(&self, restaurant: &Restaurant) -> Result<MenuFetch, SourceError>;

    fn name(&self) -> &str;
}

/// What happened to one restaurant during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    /// Last scan is still fresh
    Skipped,

    /// Served from the analysis cache
    Cached { safety_level: GfSafetyLevel },

    /// Fetched and analyzed
    Analyzed { safety_level: GfSafetyLevel },

    NoWebsite,

    Failed { reason: String },
}

/// Updated snapshot and outcome for one restaurant.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub restaurant: Restaurant,
    pub outcome: ScanOutcome,

    /// The analysis applied to the snapshot, if any
    pub analysis: Option<MenuAnalysisResult>,
}

impl ScanReport {
    fn unchanged(restaurant: &Restaurant) -> Self {
        Self {
            restaurant: restaurant.clone(),
            outcome: ScanOutcome::Skipped,
            analysis: None,
        }
    }
}

/// The scan orchestrator.
pub struct MenuScanOrchestrator {
    source: Arc<dyn MenuSource>,
    analyzer: Arc<MenuAnalyzer>,
    config: RuntimeConfig,
    cache: AnalysisCache,
}

impl MenuScanOrchestrator {
    /// Create an orchestrator with the default keyword table.
    pub fn new(source: Arc<dyn MenuSource>, config: RuntimeConfig) -> Self {
        let analyzer = MenuAnalyzer::new(config.classifier.clone(), KeywordTable::default());
        Self::with_analyzer(source, analyzer, config)
    }

    pub fn with_analyzer(
        source: Arc<dyn MenuSource>,
        analyzer: MenuAnalyzer,
        config: RuntimeConfig,
    ) -> Self {
        let cache = AnalysisCache::from_config(&config.cache);
        Self {
            source,
            analyzer: Arc::new(analyzer),
            config,
            cache,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Scan one restaurant and return its updated snapshot.
    pub async fn scan(&self, restaurant: &Restaurant) -> Result<ScanReport, RuntimeError> {
        self.analyzer.ensure_ready()?;

        let now = self.config.determinism.now();
        let now_ms = now.timestamp_millis();

        if !restaurant
            .menu_scan
            .needs_rescan(now_ms, self.config.scan.ttl)
        {
            tracing::debug!(place_id = ?restaurant.place_id, "Menu scan still fresh, skipping");
            return Ok(ScanReport::unchanged(restaurant));
        }

        if let Some(cached) = self.cached_analysis(restaurant).await {
            return Ok(ScanReport {
                restaurant: restaurant.clone().with_menu_analysis(&cached, now_ms),
                outcome: ScanOutcome::Cached {
                    safety_level: cached.safety_level,
                },
                analysis: Some(cached),
            });
        }

        match self.fetch_and_analyze(restaurant, now).await {
            Ok(Some(analysis)) => {
                if self.config.cache.enabled {
                    if let Some(place_id) = &restaurant.place_id {
                        self.cache.insert(place_id.clone(), analysis.clone()).await;
                    }
                }
                Ok(ScanReport {
                    restaurant: restaurant.clone().with_menu_analysis(&analysis, now_ms),
                    outcome: ScanOutcome::Analyzed {
                        safety_level: analysis.safety_level,
                    },
                    analysis: Some(analysis),
                })
            }
            Ok(None) => Ok(ScanReport {
                restaurant: restaurant
                    .clone()
                    .with_scan_state(MenuScanState::NoWebsite, now_ms),
                outcome: ScanOutcome::NoWebsite,
                analysis: None,
            }),
            Err(e @ RuntimeError::NotReady(_)) => Err(e),
            Err(e) => {
                tracing::warn!(place_id = ?restaurant.place_id, error = %e, "Menu scan failed");
                Ok(ScanReport {
                    restaurant: restaurant
                        .clone()
                        .with_scan_state(MenuScanState::Failed, now_ms),
                    outcome: ScanOutcome::Failed {
                        reason: e.to_string(),
                    },
                    analysis: None,
                })
            }
        }
    }

    /// Scan many restaurants concurrently.
    ///
    /// At most `scan.max_concurrent` scans run at once; reports come back in
    /// input order.
    pub async fn scan_all(
        &self,
        restaurants: &[Restaurant],
    ) -> Result<Vec<ScanReport>, RuntimeError> {
        let reports: Vec<Result<ScanReport, RuntimeError>> =
            stream::iter(restaurants.iter().map(|restaurant| self.scan(restaurant)))
                .buffered(self.config.scan.max_concurrent.max(1))
                .collect()
                .await;
        let reports = reports.into_iter().collect::<Result<Vec<_>, _>>()?;

        let analyzed = reports
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    ScanOutcome::Analyzed { .. } | ScanOutcome::Cached { .. }
                )
            })
            .count();
        let failed = reports
            .iter()
            .filter(|r| matches!(r.outcome, ScanOutcome::Failed { .. }))
            .count();
        tracing::info!(
            source = self.source.name(),
            total = reports.len(),
            analyzed,
            failed,
            "Menu scan complete"
        );

        Ok(reports)
    }

    async fn cached_analysis(&self, restaurant: &Restaurant) -> Option<MenuAnalysisResult> {
        if !self.config.cache.enabled {
            return None;
        }
        let place_id = restaurant.place_id.as_deref()?;

        match self.cache.get(place_id).await {
            Some(analysis) => {
                tracing::debug!(place_id, "Cache hit");
                Some(analysis)
            }
            None => {
                tracing::debug!(place_id, "Cache miss");
                None
            }
        }
    }

    /// Fetch menu text and classify it. `None` means the restaurant has no website.
    async fn fetch_and_analyze(
        &self,
        restaurant: &Restaurant,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<MenuAnalysisResult>, RuntimeError> {
        let timeout = self.config.scan.timeout;
        let fetched = match tokio::time::timeout(timeout, self.source.fetch_menu(restaurant)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(RuntimeError::Timeout(timeout)),
        };

        let (text, source) = match fetched {
            MenuFetch::Text { text, source } => (text, source),
            MenuFetch::NoWebsite => return Ok(None),
        };

        let analyzer = Arc::clone(&self.analyzer);
        let name = restaurant.name.clone();
        let analysis =
            tokio::task::spawn_blocking(move || analyzer.analyze_at(&text, &name, source, now))
                .await
                .map_err(|e| RuntimeError::TaskFailed(e.to_string()))??;

        Ok(Some(analysis))
    }
}

/// Builder for MenuScanOrchestrator.
pub struct MenuScanOrchestratorBuilder {
    source: Option<Arc<dyn MenuSource>>,
    config: RuntimeConfig,
    table: Option<KeywordTable>,
    readiness: Option<Arc<dyn ResourceReadiness>>,
}

impl MenuScanOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            config: RuntimeConfig::default(),
            table: None,
            readiness: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn MenuSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the shipped keyword table.
    pub fn keyword_table(mut self, table: KeywordTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Gate scans on an external readiness signal.
    pub fn readiness(mut self, readiness: Arc<dyn ResourceReadiness>) -> Self {
        self.readiness = Some(readiness);
        self
    }

    /// Validate the configuration and build the orchestrator.
    pub fn build(self) -> Result<MenuScanOrchestrator, RuntimeError> {
        let source = self.source.ok_or(RuntimeError::SourceNotConfigured)?;
        self.config.validate()?;

        let mut analyzer = MenuAnalyzer::new(
            self.config.classifier.clone(),
            self.table.unwrap_or_default(),
        );
        if let Some(readiness) = self.readiness {
            analyzer = analyzer.with_readiness(readiness);
        }

        Ok(MenuScanOrchestrator::with_analyzer(
            source,
            analyzer,
            self.config,
        ))
    }
}

impl Default for MenuScanOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use glutenscout_core::{Location, MenuScan};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MENU: &str = "Tacos - corn tortillas (GF)\nBrownie - 100% gluten-free\nBurger - brioche bun";

    // Mock source serving fixed menus by place id
    struct MockSource {
        menus: HashMap<String, MenuFetch>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl MockSource {
        fn new(menus: Vec<(&str, MenuFetch)>) -> Self {
            Self {
                menus: menus
                    .into_iter()
                    .map(|(id, fetch)| (id.to_string(), fetch))
                    .collect(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl MenuSource for MockSource {
        async fn fetch_menu(&self, restaurant: &Restaurant) -> Result<MenuFetch, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let id = restaurant.place_id.clone().unwrap_or_default();
            self.menus
                .get(&id)
                .cloned()
                .ok_or_else(|| SourceError::Fetch(format!("no menu for {}", id)))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct NeverReady;

    impl ResourceReadiness for NeverReady {
        fn is_ready(&self) -> bool {
            false
        }

        fn resource_name(&self) -> &str {
            "translation model"
        }
    }

    fn pinned_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.determinism.evaluated_at = Some(Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap());
        config
    }

    fn now_ms() -> i64 {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn place(id: &str) -> Restaurant {
        Restaurant::new(Some(id.into()), format!("Place {}", id), "", Location::new(40.0, -74.0))
    }

    fn website(text: &str) -> MenuFetch {
        MenuFetch::Text {
            text: text.to_string(),
            source: SourceType::Website,
        }
    }

    fn orchestrator(source: Arc<MockSource>, config: RuntimeConfig) -> MenuScanOrchestrator {
        MenuScanOrchestratorBuilder::new()
            .source(source)
            .config(config)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_scan_applies_analysis() {
        let source = Arc::new(MockSource::new(vec![("p1", website(MENU))]));
        let orch = orchestrator(source.clone(), pinned_config());

        let report = orch.scan(&place("p1")).await.unwrap();

        assert!(matches!(report.outcome, ScanOutcome::Analyzed { .. }));
        assert_eq!(report.restaurant.gf_menu_items, vec!["Brownie", "Tacos"]);
        assert_eq!(report.restaurant.menu_scan.state, MenuScanState::Success);
        assert_eq!(report.restaurant.menu_scan.last_scanned_at_ms, Some(now_ms()));
        assert_eq!(report.analysis.unwrap().items.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_scan_is_skipped() {
        let source = Arc::new(MockSource::new(vec![("p1", website(MENU))]));
        let orch = orchestrator(source.clone(), pinned_config());

        let scanned = orch.scan(&place("p1")).await.unwrap().restaurant;
        let again = orch.scan(&scanned).await.unwrap();

        assert_eq!(again.outcome, ScanOutcome::Skipped);
        assert_eq!(again.restaurant, scanned);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_scans() {
        let source = Arc::new(MockSource::new(vec![("p1", website(MENU))]));
        let orch = orchestrator(source.clone(), pinned_config());

        orch.scan(&place("p1")).await.unwrap();
        let report = orch.scan(&place("p1")).await.unwrap();

        assert!(matches!(report.outcome, ScanOutcome::Cached { .. }));
        assert_eq!(report.restaurant.gf_menu_items, vec!["Brownie", "Tacos"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_refetches() {
        let source = Arc::new(MockSource::new(vec![("p1", website(MENU))]));
        let mut config = pinned_config();
        config.cache.enabled = false;
        let orch = orchestrator(source.clone(), config);

        orch.scan(&place("p1")).await.unwrap();
        let report = orch.scan(&place("p1")).await.unwrap();

        assert!(matches!(report.outcome, ScanOutcome::Analyzed { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_website() {
        let source = Arc::new(MockSource::new(vec![("p1", MenuFetch::NoWebsite)]));
        let orch = orchestrator(source, pinned_config());

        let report = orch.scan(&place("p1")).await.unwrap();
        assert_eq!(report.outcome, ScanOutcome::NoWebsite);
        assert_eq!(report.restaurant.menu_scan.state, MenuScanState::NoWebsite);
        assert!(report.restaurant.gf_menu_items.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_marks_failed() {
        let source = Arc::new(MockSource::new(vec![]));
        let orch = orchestrator(source, pinned_config());

        let mut restaurant = place("p1");
        restaurant.gf_menu_items = vec!["Old Item".into()];
        let report = orch.scan(&restaurant).await.unwrap();

        assert!(matches!(report.outcome, ScanOutcome::Failed { .. }));
        assert_eq!(report.restaurant.menu_scan.state, MenuScanState::Failed);
        // Previously confirmed items are kept
        assert_eq!(report.restaurant.gf_menu_items, vec!["Old Item"]);
    }

    #[tokio::test]
    async fn test_timeout_marks_failed() {
        let source = Arc::new(
            MockSource::new(vec![("p1", website(MENU))]).with_delay(Duration::from_secs(5)),
        );
        let mut config = pinned_config();
        config.scan.timeout = Duration::from_millis(20);
        let orch = orchestrator(source, config);

        let report = orch.scan(&place("p1")).await.unwrap();
        match report.outcome {
            ScanOutcome::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_ready_is_an_error() {
        let source = Arc::new(MockSource::new(vec![("p1", website(MENU))]));
        let orch = MenuScanOrchestratorBuilder::new()
            .source(source.clone())
            .config(pinned_config())
            .readiness(Arc::new(NeverReady))
            .build()
            .unwrap();

        let result = orch.scan(&place("p1")).await;
        assert!(matches!(result, Err(RuntimeError::NotReady(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scan_all_keeps_order_and_bounds_concurrency() {
        let source = Arc::new(
            MockSource::new(vec![
                ("p1", website(MENU)),
                ("p2", MenuFetch::NoWebsite),
                ("p3", website("Pad Thai (GF)")),
                ("p4", website(MENU)),
                ("p5", website(MENU)),
            ])
            .with_delay(Duration::from_millis(10)),
        );
        let mut config = pinned_config();
        config.scan.max_concurrent = 2;
        let orch = orchestrator(source.clone(), config);

        let mut fresh = place("p6");
        fresh.menu_scan = MenuScan {
            state: MenuScanState::Success,
            last_scanned_at_ms: Some(now_ms()),
        };
        let restaurants = vec![
            place("p1"),
            place("p2"),
            place("p3"),
            place("p4"),
            place("p5"),
            fresh,
        ];

        let reports = orch.scan_all(&restaurants).await.unwrap();
        let ids: Vec<_> = reports
            .iter()
            .map(|r| r.restaurant.place_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5", "p6"]);
        assert_eq!(reports[1].outcome, ScanOutcome::NoWebsite);
        assert_eq!(reports[5].outcome, ScanOutcome::Skipped);
        assert_eq!(reports[2].restaurant.gf_menu_items, vec!["Pad Thai (GF)"]);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_builder_requires_source() {
        let result = MenuScanOrchestratorBuilder::new().build();
        assert!(matches!(result, Err(RuntimeError::SourceNotConfigured)));
    }

    #[tokio::test]
    async fn test_builder_validates_config() {
        let mut config = RuntimeConfig::default();
        config.scan.max_concurrent = 0;
        let result = MenuScanOrchestratorBuilder::new()
            .source(Arc::new(MockSource::new(vec![])))
            .config(config)
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
