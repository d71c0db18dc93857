//! The `_bulk_docs` engine.
//!
//! Translates one batch of Source mutations into one bulk write against the
//! Index: normalize each payload, pick delete or index per the tombstone
//! flag, attach TTL/parent/routing, submit, and acknowledge with the
//! Source's own revisions. Transient index rejections retry the whole batch
//! after a fixed wait; anything else aborts immediately with no
//! acknowledgements, so the Source never hears about a write that did not
//! land.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::database_name::DatabaseRef;
use crate::error::{BridgeError, Result};
use crate::index_client::{BulkOp, DocRef, IndexClient};
use crate::json_path;
use crate::metrics;
use crate::mutation::{indexed_envelope, JsonObject, Mutation};
use crate::stats::Endpoint;

use super::BridgeBehavior;

/// Marker the Index puts in failure messages when an op was rejected for
/// queue pressure. The whole batch is eligible for retry on this class.
const TRANSIENT_FAILURE_MARKER: &str = "EsRejectedExecutionException";

/// Whether a bulk item failure should abort the batch instead of retrying.
pub fn failure_appears_fatal(message: &str) -> bool {
    !message.contains(TRANSIENT_FAILURE_MARKER)
}

/// Acknowledgement for one indexed mutation, echoing the Source's revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocAck {
    pub id: String,
    pub rev: String,
}

impl<C: IndexClient> BridgeBehavior<C> {
    /// Handle a `_bulk_docs` push.
    ///
    /// Returns one `{id, rev}` acknowledgement per successfully written
    /// mutation, in input order, using the revision captured off the wire —
    /// never one echoed by the Index. Mutations without a meta section are
    /// skipped and do not appear in the output.
    pub async fn bulk_docs(&self, database: &str, docs: Vec<Mutation>) -> Result<Vec<DocAck>> {
        let _permit = self.gate().enter(Endpoint::BulkDocs)?;
        let db = DatabaseRef::parse(database);
        debug!(db = %db, docs = docs.len(), "_bulk_docs request");

        let (ops, revisions) = self.build_ops(db.index(), &docs);
        if ops.is_empty() {
            return Ok(Vec::new());
        }
        let indexed = ops
            .iter()
            .filter(|op| matches!(op, BulkOp::Index { .. }))
            .count();
        let deleted = ops.len() - indexed;

        let (acks, attempts) = self.submit_with_retry(ops, &revisions).await?;
        metrics::record_bulk_batch(docs.len(), indexed, deleted, attempts);
        Ok(acks)
    }

    /// Translate mutations into bulk ops, keeping the id → rev map used to
    /// build acknowledgements.
    fn build_ops(&self, index: &str, docs: &[Mutation]) -> (Vec<BulkOp>, HashMap<String, String>) {
        let mut ops = Vec::with_capacity(docs.len());
        let mut revisions = HashMap::with_capacity(docs.len());

        for mutation in docs {
            let Some(meta) = mutation.meta.as_ref() else {
                warn!("mutation without meta in _bulk_docs, ignoring");
                metrics::record_mutation_skipped();
                continue;
            };
            let (Some(id), Some(rev)) = (mutation.id(), mutation.rev()) else {
                warn!("mutation meta missing id or rev, ignoring");
                metrics::record_mutation_skipped();
                continue;
            };
            let id = id.to_string();
            revisions.insert(id.clone(), rev.to_string());

            let doc_type = self.type_selector().select(index, &id);
            let target = DocRef::new(index, doc_type.clone(), id.clone());

            if mutation.is_deleted() {
                ops.push(BulkOp::Delete { target });
                continue;
            }

            let source = indexed_envelope(meta.clone(), mutation.payload());
            let ttl_millis = self.ttl_for(mutation);
            let parent = self.routed_value(
                &self.config().document_type_parent_fields,
                &doc_type,
                &source,
                &id,
                "parent",
            );
            let routing = self.routed_value(
                &self.config().document_type_routing_fields,
                &doc_type,
                &source,
                &id,
                "routing",
            );
            ops.push(BulkOp::Index {
                target,
                source: Value::Object(source),
                ttl_millis,
                parent,
                routing,
            });
        }

        (ops, revisions)
    }

    /// TTL for a live mutation. Expirations in the past (or the 0 sentinel)
    /// attach no TTL; the Index decides what to do with the document.
    fn ttl_for(&self, mutation: &Mutation) -> Option<i64> {
        let expiration = mutation.expiration_secs()?;
        if expiration == 0 {
            return None;
        }
        let ttl = expiration * 1000 - self.clock().now_millis();
        (ttl > 0).then_some(ttl)
    }

    /// Resolve a configured parent/routing path against the envelope. A path
    /// that reaches nothing or a non-string disables the option.
    fn routed_value(
        &self,
        fields: &HashMap<String, String>,
        doc_type: &str,
        source: &JsonObject,
        id: &str,
        role: &str,
    ) -> Option<String> {
        let path = fields.get(doc_type)?;
        match json_path::resolve_string_path(source, path) {
            Some(value) => Some(value.to_string()),
            None => {
                warn!(id, path = %path, role, "unable to determine value from configured field");
                None
            }
        }
    }

    /// Submit the batch, retrying whole on transient rejections.
    ///
    /// The op list is built once and re-sent verbatim on every attempt; each
    /// op is keyed by id, so replaying already-applied items is idempotent.
    /// Acknowledgements are rebuilt per attempt and reflect only the final
    /// attempt's successes.
    async fn submit_with_retry(
        &self,
        ops: Vec<BulkOp>,
        revisions: &HashMap<String, String>,
    ) -> Result<(Vec<DocAck>, u64)> {
        let max_attempts = self.config().bulk_index_retries.max(1);
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                tokio::time::sleep(self.config().bulk_index_retry_wait()).await;
            }

            let outcome = self
                .client()
                .bulk(ops.clone())
                .await
                .map_err(|e| BridgeError::index("bulk", e))?;

            let mut acks = Vec::with_capacity(outcome.items.len());
            let mut transient: Option<String> = None;
            for item in outcome.items {
                match item.failure {
                    None => {
                        let Some(rev) = revisions.get(&item.id) else {
                            warn!(id = %item.id, "bulk response for unknown id, skipping ack");
                            continue;
                        };
                        acks.push(DocAck {
                            id: item.id,
                            rev: rev.clone(),
                        });
                    }
                    Some(message) => {
                        if failure_appears_fatal(&message) {
                            return Err(BridgeError::index(
                                "bulk",
                                format!("indexing error for id {}: {message}", item.id),
                            ));
                        }
                        transient = Some(message);
                    }
                }
            }

            let Some(message) = transient else {
                debug!(attempt, "bulk index succeeded");
                return Ok((acks, attempt));
            };
            if attempt >= max_attempts {
                return Err(BridgeError::RetriesExhausted {
                    attempts: attempt,
                    message,
                });
            }
            warn!(attempt, error = %message, "transient bulk rejection, retrying whole batch");
            metrics::record_bulk_retry();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_marker_is_not_fatal() {
        assert!(!failure_appears_fatal(
            "RemoteTransportException[EsRejectedExecutionException: queue full]"
        ));
    }

    #[test]
    fn test_other_failures_are_fatal() {
        assert!(failure_appears_fatal("MapperParsingException: bad field"));
        assert!(failure_appears_fatal(""));
    }

    #[test]
    fn test_doc_ack_serializes_to_wire_shape() {
        let ack = DocAck {
            id: "d".to_string(),
            rev: "3-r".to_string(),
        };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json, serde_json::json!({"id": "d", "rev": "3-r"}));
    }
}
