//! Metrics for observability.
//!
//! Mirrors the bridge's request flow onto the process-wide metrics recorder.
//! The authoritative counts behind the stats endpoint live in
//! [`stats`](crate::stats); this module is the Prometheus-facing view.
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `bridge_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Histograms track distributions (duration, batch size)

use metrics::{counter, histogram};
use std::time::Duration;

use crate::stats::Endpoint;

/// Record a completed hot-endpoint request.
pub fn record_request(endpoint: Endpoint, duration: Duration) {
    counter!("bridge_requests_total", "endpoint" => endpoint.as_str()).increment(1);
    histogram!("bridge_request_duration_seconds", "endpoint" => endpoint.as_str())
        .record(duration.as_secs_f64());
}

/// Record an admission rejection.
pub fn record_admission_rejected(endpoint: Endpoint) {
    counter!("bridge_admission_rejected_total", "endpoint" => endpoint.as_str()).increment(1);
}

/// Record a completed bulk-docs batch.
pub fn record_bulk_batch(docs: usize, indexed: usize, deleted: usize, attempts: u64) {
    counter!("bridge_bulk_docs_total").increment(docs as u64);
    counter!("bridge_bulk_indexed_total").increment(indexed as u64);
    counter!("bridge_bulk_deleted_total").increment(deleted as u64);
    histogram!("bridge_bulk_batch_size").record(docs as f64);
    histogram!("bridge_bulk_attempts").record(attempts as f64);
}

/// Record a bulk retry after a transient index rejection.
pub fn record_bulk_retry() {
    counter!("bridge_bulk_retries_total").increment(1);
}

/// Record a mutation stubbed because its payload could not be decoded.
pub fn record_malformed_payload(reason: &'static str) {
    counter!("bridge_malformed_payloads_total", "reason" => reason).increment(1);
}

/// Record a mutation dropped because it carried no meta section.
pub fn record_mutation_skipped() {
    counter!("bridge_mutations_skipped_total").increment(1);
}

/// Record revs-diff ids answered and ids suppressed by conflict resolution.
pub fn record_revs_diff(ids: usize, suppressed: usize) {
    counter!("bridge_revs_diff_ids_total").increment(ids as u64);
    if suppressed > 0 {
        counter!("bridge_revs_diff_suppressed_total").increment(suppressed as u64);
    }
}

/// Record a bucket-UUID cache probe.
pub fn record_uuid_cache(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("bridge_uuid_cache_probes_total", "outcome" => outcome).increment(1);
}
