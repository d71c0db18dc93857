//! Admission gate for the hot endpoints.
//!
//! A pressure valve, not a queue: when the combined in-flight count of
//! `_revs_diff` and `_bulk_docs` requests reaches the ceiling, new requests
//! fail with a retryable error and the Source backs off. Admitted requests
//! hold an [`AdmissionPermit`]; dropping it (on any exit path, success or
//! failure) releases the slot and records the request latency.
//!
//! The gate is a pair of atomic counters with a precheck. There is no
//! fairness and no waiting — the Source's own serialization provides all
//! the ordering that matters.

use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::error::BridgeError;
use crate::metrics;
use crate::stats::{BridgeStats, Endpoint};

/// Bounds total in-flight work across the two hot endpoints.
#[derive(Debug)]
pub struct AdmissionGate {
    stats: Arc<BridgeStats>,
    max_concurrent: u64,
}

impl AdmissionGate {
    pub fn new(stats: Arc<BridgeStats>, max_concurrent: u64) -> Self {
        Self {
            stats,
            max_concurrent,
        }
    }

    /// Try to enter an endpoint.
    ///
    /// On rejection the `tooManyConcurrentRequests` counter is bumped and
    /// the caller gets [`BridgeError::TooManyConcurrentRequests`].
    pub fn enter(&self, endpoint: Endpoint) -> Result<AdmissionPermit, BridgeError> {
        if self.stats.active_total() >= self.max_concurrent {
            self.stats.record_rejection();
            metrics::record_admission_rejected(endpoint);
            return Err(BridgeError::TooManyConcurrentRequests);
        }
        self.stats.enter(endpoint);
        trace!(endpoint = endpoint.as_str(), "request admitted");
        Ok(AdmissionPermit {
            stats: Arc::clone(&self.stats),
            endpoint,
            started: Instant::now(),
        })
    }
}

/// Held for the duration of one admitted request.
///
/// Dropping the permit decrements the active counter and records elapsed
/// time in the endpoint's mean-latency aggregate.
#[derive(Debug)]
pub struct AdmissionPermit {
    stats: Arc<BridgeStats>,
    endpoint: Endpoint,
    started: Instant,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.stats.exit(self.endpoint, elapsed);
        metrics::record_request(self.endpoint, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max: u64) -> (AdmissionGate, Arc<BridgeStats>) {
        let stats = Arc::new(BridgeStats::default());
        (AdmissionGate::new(Arc::clone(&stats), max), stats)
    }

    #[test]
    fn test_admits_under_ceiling() {
        let (gate, stats) = gate(2);
        let _a = gate.enter(Endpoint::BulkDocs).unwrap();
        let _b = gate.enter(Endpoint::RevsDiff).unwrap();
        assert_eq!(stats.active_total(), 2);
    }

    #[test]
    fn test_rejects_at_ceiling() {
        let (gate, stats) = gate(1);
        let _held = gate.enter(Endpoint::BulkDocs).unwrap();

        let err = gate.enter(Endpoint::RevsDiff).unwrap_err();
        assert!(matches!(err, BridgeError::TooManyConcurrentRequests));
        assert!(err.is_retryable());
        assert_eq!(stats.too_many_concurrent_requests(), 1);
        // The rejected request never entered.
        assert_eq!(stats.active(Endpoint::RevsDiff), 0);
    }

    #[test]
    fn test_permit_drop_releases_slot() {
        let (gate, stats) = gate(1);
        {
            let _permit = gate.enter(Endpoint::BulkDocs).unwrap();
            assert_eq!(stats.active_total(), 1);
        }
        assert_eq!(stats.active_total(), 0);
        assert_eq!(stats.latency(Endpoint::BulkDocs).count(), 1);

        // Slot is reusable after release.
        let _again = gate.enter(Endpoint::BulkDocs).unwrap();
    }

    #[test]
    fn test_mixed_endpoints_share_ceiling() {
        let (gate, _stats) = gate(2);
        let _a = gate.enter(Endpoint::RevsDiff).unwrap();
        let _b = gate.enter(Endpoint::RevsDiff).unwrap();
        assert!(gate.enter(Endpoint::BulkDocs).is_err());
    }

    #[test]
    fn test_zero_ceiling_rejects_everything() {
        let (gate, stats) = gate(0);
        assert!(gate.enter(Endpoint::BulkDocs).is_err());
        assert!(gate.enter(Endpoint::RevsDiff).is_err());
        assert_eq!(stats.too_many_concurrent_requests(), 2);
    }
}
