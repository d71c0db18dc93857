//! Counters and latency aggregates for the hot endpoints.
//!
//! These are the authoritative numbers behind the stats surface: active
//! request counts, total/mean latency per endpoint, and the admission
//! rejection count. Everything is atomic — the counters are bumped from
//! every in-flight request.
//!
//! The [`metrics`](crate::metrics) module additionally mirrors these events
//! onto the process-wide metrics recorder; this module is what `getStats`
//! reads back.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The two admission-gated endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    RevsDiff,
    BulkDocs,
}

impl Endpoint {
    /// Label used for metrics and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::RevsDiff => "_revs_diff",
            Endpoint::BulkDocs => "_bulk_docs",
        }
    }
}

/// Running mean of operation latency: total request count and summed millis.
#[derive(Debug, Default)]
pub struct MeanLatency {
    count: AtomicU64,
    total_millis: AtomicU64,
}

impl MeanLatency {
    pub fn record(&self, elapsed: Duration) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_millis
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn total_millis(&self) -> u64 {
        self.total_millis.load(Ordering::Relaxed)
    }

    pub fn mean_millis(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.total_millis() as f64 / count as f64
        }
    }
}

/// Shared counters for the bridge.
#[derive(Debug, Default)]
pub struct BridgeStats {
    active_revs_diff: AtomicU64,
    active_bulk_docs: AtomicU64,
    revs_diff_latency: MeanLatency,
    bulk_docs_latency: MeanLatency,
    too_many_concurrent_requests: AtomicU64,
}

impl BridgeStats {
    /// Total requests currently inside either hot endpoint.
    pub fn active_total(&self) -> u64 {
        self.active_revs_diff.load(Ordering::SeqCst) + self.active_bulk_docs.load(Ordering::SeqCst)
    }

    pub fn active(&self, endpoint: Endpoint) -> u64 {
        self.counter(endpoint).load(Ordering::SeqCst)
    }

    /// Admission rejections since startup.
    pub fn too_many_concurrent_requests(&self) -> u64 {
        self.too_many_concurrent_requests.load(Ordering::SeqCst)
    }

    pub fn latency(&self, endpoint: Endpoint) -> &MeanLatency {
        match endpoint {
            Endpoint::RevsDiff => &self.revs_diff_latency,
            Endpoint::BulkDocs => &self.bulk_docs_latency,
        }
    }

    pub(crate) fn enter(&self, endpoint: Endpoint) {
        self.counter(endpoint).fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn exit(&self, endpoint: Endpoint, elapsed: Duration) {
        self.counter(endpoint).fetch_sub(1, Ordering::SeqCst);
        self.latency(endpoint).record(elapsed);
    }

    pub(crate) fn record_rejection(&self) {
        self.too_many_concurrent_requests
            .fetch_add(1, Ordering::SeqCst);
    }

    fn counter(&self, endpoint: Endpoint) -> &AtomicU64 {
        match endpoint {
            Endpoint::RevsDiff => &self.active_revs_diff,
            Endpoint::BulkDocs => &self.active_bulk_docs,
        }
    }

    /// Snapshot in the wire shape served by the stats endpoint.
    pub fn snapshot(&self) -> Value {
        json!({
            "_bulk_docs": self.endpoint_snapshot(Endpoint::BulkDocs),
            "_revs_diff": self.endpoint_snapshot(Endpoint::RevsDiff),
            "tooManyConcurrentRequestsErrors": self.too_many_concurrent_requests(),
        })
    }

    fn endpoint_snapshot(&self, endpoint: Endpoint) -> Value {
        let latency = self.latency(endpoint);
        json!({
            "activeCount": self.active(endpoint),
            "totalCount": latency.count(),
            "totalTime": latency.total_millis(),
            "avgTime": latency.mean_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_latency_empty() {
        let latency = MeanLatency::default();
        assert_eq!(latency.count(), 0);
        assert_eq!(latency.total_millis(), 0);
        assert_eq!(latency.mean_millis(), 0.0);
    }

    #[test]
    fn test_mean_latency_record() {
        let latency = MeanLatency::default();
        latency.record(Duration::from_millis(10));
        latency.record(Duration::from_millis(30));
        assert_eq!(latency.count(), 2);
        assert_eq!(latency.total_millis(), 40);
        assert_eq!(latency.mean_millis(), 20.0);
    }

    #[test]
    fn test_enter_exit_tracks_active() {
        let stats = BridgeStats::default();
        assert_eq!(stats.active_total(), 0);

        stats.enter(Endpoint::RevsDiff);
        stats.enter(Endpoint::BulkDocs);
        assert_eq!(stats.active(Endpoint::RevsDiff), 1);
        assert_eq!(stats.active(Endpoint::BulkDocs), 1);
        assert_eq!(stats.active_total(), 2);

        stats.exit(Endpoint::RevsDiff, Duration::from_millis(5));
        assert_eq!(stats.active_total(), 1);
        assert_eq!(stats.latency(Endpoint::RevsDiff).count(), 1);
    }

    #[test]
    fn test_rejection_counter() {
        let stats = BridgeStats::default();
        stats.record_rejection();
        stats.record_rejection();
        assert_eq!(stats.too_many_concurrent_requests(), 2);
    }

    #[test]
    fn test_snapshot_shape() {
        let stats = BridgeStats::default();
        stats.enter(Endpoint::BulkDocs);
        stats.exit(Endpoint::BulkDocs, Duration::from_millis(12));
        stats.record_rejection();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot["_bulk_docs"]["activeCount"], 0);
        assert_eq!(snapshot["_bulk_docs"]["totalCount"], 1);
        assert_eq!(snapshot["_bulk_docs"]["totalTime"], 12);
        assert_eq!(snapshot["_bulk_docs"]["avgTime"], 12.0);
        assert_eq!(snapshot["_revs_diff"]["totalCount"], 0);
        assert_eq!(snapshot["tooManyConcurrentRequestsErrors"], 1);
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(Endpoint::RevsDiff.as_str(), "_revs_diff");
        assert_eq!(Endpoint::BulkDocs.as_str(), "_bulk_docs");
    }
}
