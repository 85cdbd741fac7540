//! # glutenscout-runtime
//!
//! Async menu scanning on top of `glutenscout-core`.
//!
//! The core crate is pure; this crate adds the moving parts around it:
//! a pluggable [`MenuSource`], fetch timeouts, bounded concurrency, an
//! analysis cache and file-based configuration.

pub mod cache;
pub mod config;
pub mod orchestrator;

pub use cache::AnalysisCache;
pub use config::{CacheConfig, DeterminismConfig, RuntimeConfig, ScanConfig};
pub use orchestrator::{
    MenuFetch, MenuScanOrchestrator, MenuScanOrchestratorBuilder, MenuSource, RuntimeError,
    ScanOutcome, ScanReport, SourceError,
};
