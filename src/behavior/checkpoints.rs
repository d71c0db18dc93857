//! Checkpoint and document get/store.
//!
//! The Source persists small state documents on the target to resume
//! replication: local checkpoint docs under `_local/<id>` and, less often,
//! plain documents. Both are stored under the `{doc: <payload>}` envelope —
//! reads unwrap `doc`, and writes synthesize a `_rev` when the caller did
//! not supply one, so a store followed by a fetch round-trips.

use serde_json::{json, Value};
use tracing::trace;
use uuid::Uuid;

use crate::database_name::DatabaseRef;
use crate::error::{BridgeError, Result};
use crate::index_client::{DocRef, IndexClient};
use crate::mutation::JsonObject;

use super::BridgeBehavior;

/// Revision synthesized for payloads stored without one.
fn generate_revision() -> String {
    format!("1-{}", Uuid::new_v4())
}

impl<C: IndexClient> BridgeBehavior<C> {
    /// Fetch a checkpoint/local document, unwrapped from its envelope.
    pub async fn get_local_document(&self, database: &str, doc_id: &str) -> Result<Option<Value>> {
        let db = DatabaseRef::parse(database);
        self.fetch_document(db.index(), doc_id, &self.config().checkpoint_document_type)
            .await
    }

    /// Store a checkpoint/local document; returns its revision.
    pub async fn store_local_document(
        &self,
        database: &str,
        doc_id: &str,
        document: JsonObject,
    ) -> Result<String> {
        let db = DatabaseRef::parse(database);
        self.persist_document(
            db.index(),
            doc_id,
            document,
            &self.config().checkpoint_document_type,
        )
        .await
    }

    /// Fetch a plain document under its selected type.
    pub async fn get_document(&self, database: &str, doc_id: &str) -> Result<Option<Value>> {
        let db = DatabaseRef::parse(database);
        let doc_type = self.type_selector().select(db.index(), doc_id);
        self.fetch_document(db.index(), doc_id, &doc_type).await
    }

    /// Store a plain document under its selected type; returns its revision.
    pub async fn store_document(
        &self,
        database: &str,
        doc_id: &str,
        document: JsonObject,
    ) -> Result<String> {
        let db = DatabaseRef::parse(database);
        let doc_type = self.type_selector().select(db.index(), doc_id);
        self.persist_document(db.index(), doc_id, document, &doc_type).await
    }

    /// Attachments have no representation on the Index side.
    pub fn get_attachment(&self, _database: &str, _doc_id: &str, _name: &str) -> Result<Vec<u8>> {
        Err(BridgeError::Unsupported("attachments"))
    }

    /// Attachments have no representation on the Index side.
    pub fn store_attachment(
        &self,
        _database: &str,
        _doc_id: &str,
        _name: &str,
        _content_type: &str,
        _body: Vec<u8>,
    ) -> Result<String> {
        Err(BridgeError::Unsupported("attachments"))
    }

    async fn fetch_document(
        &self,
        index: &str,
        doc_id: &str,
        doc_type: &str,
    ) -> Result<Option<Value>> {
        let target = DocRef::new(index, doc_type, doc_id);
        let source = self
            .client()
            .get(target)
            .await
            .map_err(|e| BridgeError::index("get", e))?;
        trace!(index, id = doc_id, found = source.is_some(), "document fetch");
        Ok(source.and_then(|source| source.get("doc").cloned()))
    }

    async fn persist_document(
        &self,
        index: &str,
        doc_id: &str,
        mut document: JsonObject,
        doc_type: &str,
    ) -> Result<String> {
        let revision = match document.get("_rev").and_then(Value::as_str) {
            Some(rev) => rev.to_string(),
            None => {
                let rev = generate_revision();
                document.insert("_rev".to_string(), Value::String(rev.clone()));
                rev
            }
        };

        let target = DocRef::new(index, doc_type, doc_id);
        let acked = self
            .client()
            .index_doc(target, json!({ "doc": document }), false)
            .await
            .map_err(|e| BridgeError::index("index", e))?;
        if !acked {
            return Err(BridgeError::index("index", "document write not acknowledged"));
        }
        Ok(revision)
    }
}
