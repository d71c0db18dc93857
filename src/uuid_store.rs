//! Bucket and vbucket UUID persistence.
//!
//! Every logical bucket gets a stable random identity, stored as a
//! checkpoint-type document inside its own index. The Source compares the
//! identity across sessions to detect a re-created target and refuse to
//! resume blindly.
//!
//! Writes use a create-only op: when two replicators race on a fresh index,
//! only one create lands and the loser re-reads the winner's value on the
//! next iteration. That gives single-value-per-key without locking. Bucket
//! UUIDs go through a bounded read-through cache; vbucket UUIDs are looked
//! up every time.

use lru::LruCache;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BridgeError, Result};
use crate::index_client::{DocRef, IndexClient};
use crate::metrics;

/// Checkpoint document id holding the bucket UUID.
const BUCKET_UUID_DOC_ID: &str = "bucketUUID";

/// Create/re-read iterations before giving up on reconciliation.
const MAX_RECONCILE_TRIES: u32 = 100;

/// Read-through store for bucket and vbucket UUIDs.
#[derive(Debug)]
pub struct UuidStore {
    checkpoint_type: String,
    cache: Mutex<LruCache<String, String>>,
}

impl UuidStore {
    pub fn new(checkpoint_type: impl Into<String>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            checkpoint_type: checkpoint_type.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch (or create) the stable UUID for a bucket.
    ///
    /// Cache hit short-circuits; otherwise the index must exist, and the
    /// stored UUID is read — or created and re-read — before being cached.
    pub async fn bucket_uuid<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
    ) -> Result<String> {
        if let Some(uuid) = self.cache_probe(bucket) {
            debug!(bucket = %bucket, "bucket uuid cache hit");
            metrics::record_uuid_cache(true);
            return Ok(uuid);
        }
        metrics::record_uuid_cache(false);

        let uuid = self.reconcile(client, bucket, BUCKET_UUID_DOC_ID).await?;
        self.cache
            .lock()
            .expect("uuid cache lock")
            .put(bucket.to_string(), uuid.clone());
        Ok(uuid)
    }

    /// Fetch (or create) the UUID for one vbucket.
    ///
    /// Not cached. Returns `None` when the index does not exist.
    pub async fn vbucket_uuid<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
        vbucket: u32,
    ) -> Result<Option<String>> {
        if !client
            .indices_exists(bucket)
            .await
            .map_err(|e| BridgeError::index("indices_exists", e))?
        {
            return Ok(None);
        }
        let key = format!("vbucket{vbucket}UUID");
        self.reconcile_existing(client, bucket, &key).await.map(Some)
    }

    fn cache_probe(&self, bucket: &str) -> Option<String> {
        self.cache
            .lock()
            .expect("uuid cache lock")
            .get(bucket)
            .cloned()
    }

    /// Verify the index exists, then converge on the stored UUID.
    async fn reconcile<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
        key: &str,
    ) -> Result<String> {
        let exists = client
            .indices_exists(bucket)
            .await
            .map_err(|e| BridgeError::index("indices_exists", e))?;
        if !exists {
            return Err(BridgeError::UuidReconcile {
                index: bucket.to_string(),
            });
        }
        self.reconcile_existing(client, bucket, key).await
    }

    /// Read the UUID, creating it when absent, until a value is observed.
    ///
    /// The create is best-effort: losing the race is fine because the
    /// follow-up read returns whatever landed.
    async fn reconcile_existing<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
        key: &str,
    ) -> Result<String> {
        let mut uuid = self.lookup(client, bucket, key).await?;
        let mut tries = 0;
        while uuid.is_none() && tries < MAX_RECONCILE_TRIES {
            debug!(bucket = %bucket, key = %key, tries, "uuid doesn't exist yet, creating");
            let candidate = new_uuid();
            let created = self.store_create_only(client, bucket, key, &candidate).await?;
            if !created {
                debug!(bucket = %bucket, key = %key, "lost uuid create race, re-reading");
            }
            uuid = self.lookup(client, bucket, key).await?;
            tries += 1;
        }
        uuid.ok_or_else(|| BridgeError::UuidReconcile {
            index: bucket.to_string(),
        })
    }

    async fn lookup<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let target = DocRef::new(bucket, self.checkpoint_type.clone(), key);
        let source = client
            .get(target)
            .await
            .map_err(|e| BridgeError::index("get", e))?;
        Ok(source.as_ref().and_then(uuid_from_checkpoint_source))
    }

    async fn store_create_only<C: IndexClient + ?Sized>(
        &self,
        client: &C,
        bucket: &str,
        key: &str,
        uuid: &str,
    ) -> Result<bool> {
        let target = DocRef::new(bucket, self.checkpoint_type.clone(), key);
        let source = json!({"doc": {"uuid": uuid}});
        client
            .index_doc(target, source, true)
            .await
            .map_err(|e| BridgeError::index("index", e))
    }
}

/// Read `doc.uuid` out of a checkpoint document source.
fn uuid_from_checkpoint_source(source: &Value) -> Option<String> {
    source
        .get("doc")?
        .get("uuid")?
        .as_str()
        .map(ToOwned::to_owned)
}

/// A fresh random identifier, hex with no dashes.
pub(crate) fn new_uuid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uuid_shape() {
        let uuid = new_uuid();
        assert_eq!(uuid.len(), 32);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!uuid.contains('-'));
    }

    #[test]
    fn test_new_uuid_unique() {
        assert_ne!(new_uuid(), new_uuid());
    }

    #[test]
    fn test_uuid_from_checkpoint_source() {
        let source = json!({"doc": {"uuid": "abc123"}});
        assert_eq!(
            uuid_from_checkpoint_source(&source),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_uuid_from_checkpoint_source_missing_layers() {
        assert_eq!(uuid_from_checkpoint_source(&json!({})), None);
        assert_eq!(uuid_from_checkpoint_source(&json!({"doc": {}})), None);
        assert_eq!(
            uuid_from_checkpoint_source(&json!({"doc": {"uuid": 7}})),
            None
        );
        assert_eq!(uuid_from_checkpoint_source(&json!("not a map")), None);
    }

    #[test]
    fn test_zero_cache_size_clamped() {
        // Must not panic.
        let _store = UuidStore::new("couchbaseCheckpoint", 0);
    }
}
