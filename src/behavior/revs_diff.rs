//! The `_revs_diff` engine.
//!
//! Answers which revisions the Index does not already hold. The
//! conservative default is "everything is missing" — the Source then pushes
//! the full batch, which is wasteful but never wrong. With
//! `resolve_conflicts` enabled, one multi-get round trip prunes ids whose
//! stored `meta.rev` already equals the candidate; any failure along the way
//! (item failure, missing document, absent meta) leaves the id in the
//! response.

use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::database_name::DatabaseRef;
use crate::error::Result;
use crate::index_client::{DocRef, IndexClient, MultiGetOutcome};
use crate::metrics;
use crate::mutation::JsonObject;
use crate::stats::Endpoint;

use super::BridgeBehavior;

impl<C: IndexClient> BridgeBehavior<C> {
    /// Answer a `_revs_diff` request.
    ///
    /// Input maps document ids to candidate revisions; the response maps
    /// each id the target lacks to `{"missing": <rev>}`. An id absent from
    /// the response tells the Source not to push that document.
    pub async fn revs_diff(
        &self,
        database: &str,
        revs: HashMap<String, String>,
    ) -> Result<JsonObject> {
        let _permit = self.gate().enter(Endpoint::RevsDiff)?;
        trace!(db = %database, ids = revs.len(), "_revs_diff request");

        // Start with every entry reported missing.
        let mut response = JsonObject::new();
        for (id, rev) in &revs {
            response.insert(id.clone(), json!({ "missing": rev }));
        }

        let mut suppressed = 0usize;
        if self.config().resolve_conflicts {
            suppressed = self.suppress_known_revisions(database, &revs, &mut response).await;
            trace!(db = %database, suppressed, "_revs_diff after conflict resolution");
        }

        metrics::record_revs_diff(revs.len(), suppressed);
        Ok(response)
    }

    /// Multi-get the candidate documents and drop ids whose stored revision
    /// matches. Purely an optimization: on any failure the id stays in the
    /// response and the Source re-pushes.
    async fn suppress_known_revisions(
        &self,
        database: &str,
        revs: &HashMap<String, String>,
        response: &mut JsonObject,
    ) -> usize {
        let db = DatabaseRef::parse(database);
        let refs: Vec<DocRef> = response
            .keys()
            .map(|id| {
                let doc_type = self.type_selector().select(db.index(), id);
                DocRef::new(db.index(), doc_type, id.clone())
            })
            .collect();

        let items = match self.client().multi_get(refs).await {
            Ok(items) => items,
            Err(error) => {
                debug!(db = %db, %error, "multi-get failed, keeping conservative response");
                return 0;
            }
        };

        let mut suppressed = 0;
        for item in items {
            match item.outcome {
                MultiGetOutcome::Failed { message } => {
                    warn!(id = %item.id, %message, "_revs_diff get failure");
                }
                MultiGetOutcome::Missing => {}
                MultiGetOutcome::Found { source } => {
                    let stored_rev = source
                        .get("meta")
                        .and_then(|meta| meta.get("rev"))
                        .and_then(Value::as_str);
                    let candidate = revs.get(&item.id).map(String::as_str);
                    if stored_rev.is_some() && stored_rev == candidate {
                        response.remove(&item.id);
                        suppressed += 1;
                        trace!(id = %item.id, rev = stored_rev.unwrap_or(""), "already have revision");
                    }
                }
            }
        }
        suppressed
    }
}
