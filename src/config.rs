//! Configuration for the bridge.
//!
//! All tunables recognized by the bridge core. Configuration is passed to
//! [`BridgeBehavior::new()`](crate::behavior::BridgeBehavior::new) and can be
//! constructed programmatically or deserialized from YAML/JSON by the host.
//!
//! # Quick Start
//!
//! ```rust
//! use capi_index_bridge::config::BridgeConfig;
//!
//! let config = BridgeConfig {
//!     resolve_conflicts: true,
//!     max_concurrent_requests: 64,
//!     ..Default::default()
//! };
//! ```
//!
//! # JSON Example
//!
//! ```json
//! {
//!   "checkpoint_document_type": "couchbaseCheckpoint",
//!   "resolve_conflicts": false,
//!   "max_concurrent_requests": 1024,
//!   "bulk_index_retries": 10,
//!   "bulk_index_retry_wait_ms": 1000,
//!   "document_type_parent_fields": { "brewery": "doc.brewery_id" },
//!   "document_type_routing_fields": { "beer": "doc.brewery_id" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Tunables for the bridge core.
///
/// # Fields
///
/// - `checkpoint_document_type`: index type reserved for checkpoint and UUID docs.
/// - `resolve_conflicts`: probe the index during `_revs_diff` to skip revisions
///   already stored.
/// - `max_concurrent_requests`: admission ceiling shared by the two hot endpoints.
/// - `bulk_index_retries` / `bulk_index_retry_wait_ms`: bulk retry policy for
///   transient index rejections.
/// - `document_type_parent_fields` / `document_type_routing_fields`: dotted paths
///   per index type for parent/routing extraction from the indexed envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Index type under which checkpoint and UUID documents are stored.
    #[serde(default = "default_checkpoint_document_type")]
    pub checkpoint_document_type: String,

    /// Dotted path consumed by type-selector implementations that derive the
    /// type from document content. The core itself never reads it.
    #[serde(default)]
    pub dynamic_type_path: Option<String>,

    /// When enabled, `_revs_diff` multi-gets the index and drops ids whose
    /// stored revision already matches the candidate.
    #[serde(default)]
    pub resolve_conflicts: bool,

    /// Ceiling on in-flight `_revs_diff` + `_bulk_docs` requests.
    /// Requests over the ceiling are rejected, not queued.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u64,

    /// Maximum bulk attempts (first try included) before giving up on a
    /// batch that keeps hitting transient rejections.
    #[serde(default = "default_bulk_index_retries")]
    pub bulk_index_retries: u64,

    /// Fixed wait between bulk attempts, in milliseconds.
    #[serde(default = "default_bulk_index_retry_wait_ms")]
    pub bulk_index_retry_wait_ms: u64,

    /// Per-type dotted path to the parent id inside the indexed envelope.
    #[serde(default)]
    pub document_type_parent_fields: HashMap<String, String>,

    /// Per-type dotted path to the routing value inside the indexed envelope.
    #[serde(default)]
    pub document_type_routing_fields: HashMap<String, String>,

    /// Capacity of the bucket-UUID read-through cache.
    #[serde(default = "default_bucket_uuid_cache_size")]
    pub bucket_uuid_cache_size: usize,
}

fn default_checkpoint_document_type() -> String {
    "couchbaseCheckpoint".to_string()
}

fn default_max_concurrent_requests() -> u64 {
    1024
}

fn default_bulk_index_retries() -> u64 {
    10
}

fn default_bulk_index_retry_wait_ms() -> u64 {
    1000
}

fn default_bucket_uuid_cache_size() -> usize {
    1024
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            checkpoint_document_type: default_checkpoint_document_type(),
            dynamic_type_path: None,
            resolve_conflicts: false,
            max_concurrent_requests: default_max_concurrent_requests(),
            bulk_index_retries: default_bulk_index_retries(),
            bulk_index_retry_wait_ms: default_bulk_index_retry_wait_ms(),
            document_type_parent_fields: HashMap::new(),
            document_type_routing_fields: HashMap::new(),
            bucket_uuid_cache_size: default_bucket_uuid_cache_size(),
        }
    }
}

impl BridgeConfig {
    /// Create a config with a small footprint and fast retries for testing.
    pub fn for_testing() -> Self {
        Self {
            max_concurrent_requests: 16,
            bulk_index_retries: 3,
            bulk_index_retry_wait_ms: 10,
            bucket_uuid_cache_size: 16,
            ..Default::default()
        }
    }

    /// The bulk retry wait as a [`Duration`].
    pub fn bulk_index_retry_wait(&self) -> Duration {
        Duration::from_millis(self.bulk_index_retry_wait_ms)
    }
}
