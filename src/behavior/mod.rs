//! The replication-endpoint behavior.
//!
//! The main request handler that ties together:
//! - The admission gate via [`crate::admission::AdmissionGate`]
//! - Revision diffing against the Index (`revs_diff`)
//! - Bulk mutation translation (`bulk_docs`)
//! - Checkpoint and local-document persistence
//! - Bucket/vbucket identity via [`crate::uuid_store::UuidStore`]
//!
//! # Architecture
//!
//! One behavior serves every database the Source addresses; state shared
//! across requests is the stats block, the admission gate, and the
//! bucket-UUID cache. Each request runs to completion on its worker — the
//! only global coordination is admission.

mod bulk_docs;
mod checkpoints;
mod revs_diff;

pub use bulk_docs::{failure_appears_fatal, DocAck};

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::admission::AdmissionGate;
use crate::clock::{Clock, SystemClock};
use crate::config::BridgeConfig;
use crate::database_name::DatabaseRef;
use crate::error::{BridgeError, Result};
use crate::index_client::{IndexClient, NoOpIndexClient};
use crate::stats::BridgeStats;
use crate::type_selector::TypeSelector;
use crate::uuid_store::UuidStore;

/// Outcome of a database existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    /// The index exists and any supplied UUID matched.
    Exists,
    /// No such index.
    Missing,
    /// The index exists but its bucket UUID differs from the one supplied —
    /// the target was re-created since the Source last checkpointed.
    UuidMismatch,
}

impl DatabaseStatus {
    /// The wire reason string, `None` when the database exists.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            DatabaseStatus::Exists => None,
            DatabaseStatus::Missing => Some("missing"),
            DatabaseStatus::UuidMismatch => Some("uuids_dont_match"),
        }
    }
}

/// Answers the Source's replication protocol against an Index backend.
pub struct BridgeBehavior<C: IndexClient = NoOpIndexClient> {
    config: BridgeConfig,
    client: Arc<C>,
    type_selector: Arc<dyn TypeSelector>,
    clock: Arc<dyn Clock>,
    stats: Arc<BridgeStats>,
    gate: AdmissionGate,
    uuid_store: UuidStore,
}

impl BridgeBehavior<NoOpIndexClient> {
    /// Create a behavior backed by the no-op client, for standalone/smoke use.
    pub fn standalone(config: BridgeConfig, type_selector: Arc<dyn TypeSelector>) -> Self {
        Self::new(config, Arc::new(NoOpIndexClient), type_selector)
    }
}

impl<C: IndexClient> BridgeBehavior<C> {
    /// Create a behavior over an Index client using the system clock.
    pub fn new(
        config: BridgeConfig,
        client: Arc<C>,
        type_selector: Arc<dyn TypeSelector>,
    ) -> Self {
        Self::with_clock(config, client, type_selector, Arc::new(SystemClock))
    }

    /// Create a behavior with an explicit clock (tests pin TTL math with it).
    pub fn with_clock(
        config: BridgeConfig,
        client: Arc<C>,
        type_selector: Arc<dyn TypeSelector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let stats = Arc::new(BridgeStats::default());
        let gate = AdmissionGate::new(Arc::clone(&stats), config.max_concurrent_requests);
        let uuid_store = UuidStore::new(
            config.checkpoint_document_type.clone(),
            config.bucket_uuid_cache_size,
        );
        Self {
            config,
            client,
            type_selector,
            clock,
            stats,
            gate,
            uuid_store,
        }
    }

    /// Identifying record returned for `GET /`.
    pub fn welcome(&self) -> Value {
        json!({ "welcome": env!("CARGO_PKG_NAME") })
    }

    /// Check whether a Source-addressed database exists here.
    ///
    /// When the database string carries a UUID, the stored bucket UUID must
    /// match it — a mismatch means the index was re-created and the Source
    /// must not resume from its old checkpoint.
    pub async fn database_exists(&self, database: &str) -> Result<DatabaseStatus> {
        let db = DatabaseRef::parse(database);
        let exists = self
            .client
            .indices_exists(db.index())
            .await
            .map_err(|e| BridgeError::index("indices_exists", e))?;
        if !exists {
            return Ok(DatabaseStatus::Missing);
        }
        if let Some(expected) = db.expected_uuid() {
            debug!(db = %db, "database name included uuid, validating");
            let actual = self.uuid_store.bucket_uuid(&*self.client, db.index()).await?;
            if actual != expected {
                return Ok(DatabaseStatus::UuidMismatch);
            }
        }
        Ok(DatabaseStatus::Exists)
    }

    /// Details record for `GET /<db>`, `None` when the database is missing
    /// or its UUID does not match.
    pub async fn database_details(&self, database: &str) -> Result<Option<Value>> {
        match self.database_exists(database).await? {
            DatabaseStatus::Exists => {
                let db = DatabaseRef::parse(database);
                Ok(Some(json!({ "db_name": db.name_without_uuid() })))
            }
            _ => Ok(None),
        }
    }

    /// Indexes are managed outside the replication protocol.
    pub fn create_database(&self, _database: &str) -> Result<()> {
        Err(BridgeError::Unsupported("creating indexes"))
    }

    /// Indexes are managed outside the replication protocol.
    pub fn delete_database(&self, _database: &str) -> Result<()> {
        Err(BridgeError::Unsupported("deleting indexes"))
    }

    /// The Index manages its own durability; commit requests succeed trivially.
    pub fn ensure_full_commit(&self, _database: &str) -> bool {
        true
    }

    /// The stable UUID for a bucket. `pool` is carried by the protocol but
    /// does not influence placement.
    pub async fn bucket_uuid(&self, _pool: &str, bucket: &str) -> Result<String> {
        self.uuid_store.bucket_uuid(&*self.client, bucket).await
    }

    /// The stable UUID for one vbucket, `None` when the index is missing.
    pub async fn vbucket_uuid(
        &self,
        _pool: &str,
        bucket: &str,
        vbucket: u32,
    ) -> Result<Option<String>> {
        self.uuid_store
            .vbucket_uuid(&*self.client, bucket, vbucket)
            .await
    }

    /// Counters and latency aggregates for the hot endpoints.
    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Stats snapshot in the wire shape.
    pub fn stats_snapshot(&self) -> Value {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    pub(crate) fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    pub(crate) fn type_selector(&self) -> &dyn TypeSelector {
        &*self.type_selector
    }
}
