//! Opt-in timing hooks for mesh builds and mapping queries.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). In
//! every other configuration the calls compile down to running the closure.
//!
//! ```ignore
//! use pam_engine::geom::{EngineMetrics, TimingBucket};
//!
//! let mut metrics = EngineMetrics::default();
//! metrics.begin();
//! let mesh = Mesh::build_with_metrics("cortex", &polygons, MeshOptions::default(), &mut metrics)?;
//! if let Some(report) = metrics.end() {
//!     log::info!("octree build: {} ns", report.octree_build_ns);
//! }
//! ```

/// Phases whose time is accumulated separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Octree construction.
    OctreeBuild,
    /// UV quadtree construction.
    QuadtreeBuild,
    /// Eager per-triangle plane frame computation.
    FrameCache,
    /// Projection of a point onto the next layer.
    MappingRule,
    /// Path extension for a segment.
    DistanceRule,
    /// Final UV resolution on the terminal layer.
    UvResolve,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub octree_build_ns: u64,
    pub quadtree_build_ns: u64,
    pub frame_cache_ns: u64,
    pub mapping_rule_ns: u64,
    pub distance_rule_ns: u64,
    pub uv_resolve_ns: u64,
}

impl TimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.octree_build_ns
            .saturating_add(self.quadtree_build_ns)
            .saturating_add(self.frame_cache_ns)
            .saturating_add(self.mapping_rule_ns)
            .saturating_add(self.distance_rule_ns)
            .saturating_add(self.uv_resolve_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    fn slot(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::OctreeBuild => &mut self.octree_build_ns,
            TimingBucket::QuadtreeBuild => &mut self.quadtree_build_ns,
            TimingBucket::FrameCache => &mut self.frame_cache_ns,
            TimingBucket::MappingRule => &mut self.mapping_rule_ns,
            TimingBucket::DistanceRule => &mut self.distance_rule_ns,
            TimingBucket::UvResolve => &mut self.uv_resolve_ns,
        }
    }
}

/// Accumulator for [`TimingReport`]s. A no-op unless `engine_metrics` is enabled.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    report: TimingReport,
}

impl EngineMetrics {
    /// Resets all counters.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = TimingReport::default();
        }
    }

    /// The accumulated report, or `None` when metrics are compiled out.
    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.slot(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_total_sums_buckets() {
        let report = TimingReport {
            octree_build_ns: 1000,
            quadtree_build_ns: 2000,
            mapping_rule_ns: 3000,
            ..TimingReport::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn time_returns_closure_result() {
        let mut metrics = EngineMetrics::default();
        metrics.begin();
        assert_eq!(metrics.time(TimingBucket::OctreeBuild, || 42), 42);
    }

    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    #[test]
    fn enabled_metrics_produce_a_report() {
        let mut metrics = EngineMetrics::default();
        metrics.begin();
        metrics.time(TimingBucket::UvResolve, || std::hint::black_box(1 + 1));
        assert!(metrics.end().is_some());
    }

    #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
    #[test]
    fn disabled_metrics_report_nothing() {
        let metrics = EngineMetrics::default();
        assert!(metrics.end().is_none());
    }
}
