//! In-memory cache of menu analyses keyed by place id.

use moka::future::Cache;
use std::time::Duration;

use glutenscout_core::MenuAnalysisResult;

use crate::config::CacheConfig;

/// Async TTL cache for menu analyses.
///
/// Entries expire `ttl` after insertion. Capacity is bounded; when full the
/// cache evicts by recency and frequency of use.
#[derive(Clone)]
pub struct AnalysisCache {
    inner: Cache<String, MenuAnalysisResult>,
}

impl AnalysisCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries.max(1))
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries as u64, config.ttl)
    }

    /// Fetch a live entry.
    pub async fn get(&self, place_id: &str) -> Option<MenuAnalysisResult> {
        self.inner.get(place_id).await
    }

    pub async fn insert(&self, place_id: impl Into<String>, analysis: MenuAnalysisResult) {
        self.inner.insert(place_id.into(), analysis).await;
    }

    pub async fn invalidate(&self, place_id: &str) {
        self.inner.invalidate(place_id).await;
    }

    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    /// Number of live entries, after pending evictions have been applied.
    pub async fn len(&self) -> usize {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count() as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use glutenscout_core::{GfSafetyLevel, SourceType};

    fn analysis(name: &str) -> MenuAnalysisResult {
        MenuAnalysisResult {
            restaurant_name: name.to_string(),
            items: vec![],
            safety_level: GfSafetyLevel::Unknown,
            confidence: 0.0,
            reasoning: String::new(),
            source: SourceType::Website,
            analyzed_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = AnalysisCache::new(10, Duration::from_secs(60));
        assert!(cache.get("p1").await.is_none());

        cache.insert("p1", analysis("Luna")).await;
        let hit = cache.get("p1").await.unwrap();
        assert_eq!(hit.restaurant_name, "Luna");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = AnalysisCache::new(10, Duration::from_millis(20));
        cache.insert("p1", analysis("Luna")).await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cache.get("p1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache = AnalysisCache::new(2, Duration::from_secs(60));
        for i in 0..10 {
            cache.insert(format!("p{}", i), analysis("Any")).await;
        }

        assert!(cache.len().await <= 2);
    }

    #[tokio::test]
    async fn test_replacing_key_keeps_one_entry() {
        let cache = AnalysisCache::new(10, Duration::from_secs(60));
        cache.insert("p1", analysis("One")).await;
        cache.insert("p2", analysis("Two")).await;
        cache.insert("p2", analysis("Two again")).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("p2").await.unwrap().restaurant_name, "Two again");
        assert!(cache.get("p1").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = AnalysisCache::new(10, Duration::from_secs(60));
        cache.insert("p1", analysis("One")).await;
        cache.insert("p2", analysis("Two")).await;

        cache.invalidate("p1").await;
        assert!(cache.get("p1").await.is_none());
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
