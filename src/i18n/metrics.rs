//! Resolver metrics and observability module.
//!
//! Counts bundle cache hits and misses, content store round-trips and
//! language maps built, so callers can confirm the memoization guarantees
//! hold in production.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by one resolver instance.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    /// Bundle lookups answered from the cache (valid or memoized error)
    bundle_hits: AtomicUsize,

    /// Bundle lookups that had to consult the registry and store
    bundle_misses: AtomicUsize,

    /// Calls made to the content store
    store_fetches: AtomicUsize,

    /// Per-language message maps constructed
    language_maps: AtomicUsize,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bundle cache hit.
    pub fn record_bundle_hit(&self) {
        self.bundle_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a bundle cache miss.
    pub fn record_bundle_miss(&self) {
        self.bundle_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a content store round-trip.
    pub fn record_store_fetch(&self) {
        self.store_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record construction of a language map.
    pub fn record_language_map(&self) {
        self.language_maps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bundle_hits(&self) -> usize {
        self.bundle_hits.load(Ordering::Relaxed)
    }

    pub fn bundle_misses(&self) -> usize {
        self.bundle_misses.load(Ordering::Relaxed)
    }

    pub fn store_fetches(&self) -> usize {
        self.store_fetches.load(Ordering::Relaxed)
    }

    pub fn language_maps(&self) -> usize {
        self.language_maps.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.bundle_hits();
        let misses = self.bundle_misses();
        let total = hits + misses;
        let bundle_hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            bundle_hits: hits,
            bundle_misses: misses,
            bundle_hit_rate,
            store_fetches: self.store_fetches(),
            language_maps: self.language_maps(),
        }
    }
}

/// Snapshot of resolver counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of bundle cache hits
    pub bundle_hits: usize,

    /// Number of bundle cache misses
    pub bundle_misses: usize,

    /// Bundle cache hit rate as a percentage (0-100)
    pub bundle_hit_rate: f64,

    /// Number of content store fetches
    pub store_fetches: usize,

    /// Number of language maps built
    pub language_maps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_counters() {
        let metrics = ResolverMetrics::new();

        metrics.record_bundle_hit();
        metrics.record_bundle_hit();
        metrics.record_bundle_miss();
        metrics.record_store_fetch();
        metrics.record_language_map();

        assert_eq!(metrics.bundle_hits(), 2);
        assert_eq!(metrics.bundle_misses(), 1);
        assert_eq!(metrics.store_fetches(), 1);
        assert_eq!(metrics.language_maps(), 1);
    }

    #[test]
    fn test_instances_are_independent() {
        let first = ResolverMetrics::new();
        let second = ResolverMetrics::new();

        first.record_store_fetch();
        assert_eq!(first.store_fetches(), 1);
        assert_eq!(second.store_fetches(), 0);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = ResolverMetrics::new().report();

        assert_eq!(report.bundle_hits, 0);
        assert_eq!(report.bundle_misses, 0);
        assert_eq!(report.bundle_hit_rate, 0.0);
        assert_eq!(report.store_fetches, 0);
        assert_eq!(report.language_maps, 0);
    }

    #[test]
    fn test_report_hit_rate() {
        let metrics = ResolverMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_bundle_hit();
        metrics.record_bundle_hit();
        metrics.record_bundle_hit();
        metrics.record_bundle_miss();

        let report = metrics.report();
        assert_eq!(report.bundle_hit_rate, 75.0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = ResolverMetrics::new();
        metrics.record_bundle_miss();

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["bundle_misses"], 1);
        assert_eq!(json["bundle_hit_rate"], 0.0);
    }
}
