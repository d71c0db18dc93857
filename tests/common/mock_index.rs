//! Mock IndexClient for testing.
//!
//! Backs the trait with an in-memory document map and records every call
//! for assertions. Bulk failures are scriptable per call (id → failure
//! message), and the next bulk round trip can be held open to exercise the
//! admission gate. Each operation yields once so concurrent requests
//! genuinely interleave under the single-threaded test runtime.

use capi_index_bridge::index_client::{
    BoxFuture, BulkItemOutcome, BulkOp, BulkOutcome, DocRef, IndexClient, MultiGetItem,
    MultiGetOutcome,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

type DocKey = (String, String, String);

/// A recorded `index_doc` call.
#[derive(Debug, Clone)]
pub struct IndexDocCall {
    pub target: DocRef,
    pub source: Value,
    pub create_only: bool,
}

/// Mock implementation of [`IndexClient`] that records all calls.
#[derive(Default)]
pub struct MockIndexClient {
    docs: Mutex<HashMap<DocKey, Value>>,
    indices: Mutex<HashSet<String>>,
    /// Scripted failures for upcoming bulk calls, consumed front-first.
    bulk_failures: Mutex<VecDeque<HashMap<String, String>>>,
    /// Scripted per-item multi-get failures by id.
    multi_get_failures: Mutex<HashMap<String, String>>,

    bulk_calls: AtomicUsize,
    bulk_ops_log: Mutex<Vec<Vec<BulkOp>>>,
    index_doc_calls: Mutex<Vec<IndexDocCall>>,
    create_successes: AtomicUsize,
    get_calls: AtomicUsize,

    hold_next_bulk: AtomicBool,
    bulk_started: Notify,
    bulk_release: Notify,
}

impl MockIndexClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an index as existing.
    pub fn create_index(&self, index: &str) {
        self.indices.lock().unwrap().insert(index.to_string());
    }

    /// Seed a stored document.
    pub fn insert_doc(&self, index: &str, doc_type: &str, id: &str, source: Value) {
        self.docs.lock().unwrap().insert(
            (index.to_string(), doc_type.to_string(), id.to_string()),
            source,
        );
    }

    /// Read a stored document back.
    pub fn stored_doc(&self, index: &str, doc_type: &str, id: &str) -> Option<Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(index.to_string(), doc_type.to_string(), id.to_string()))
            .cloned()
    }

    /// Script the failures for the next bulk call (id → message).
    pub fn script_bulk_failures(&self, failures: &[(&str, &str)]) {
        let map = failures
            .iter()
            .map(|(id, msg)| (id.to_string(), msg.to_string()))
            .collect();
        self.bulk_failures.lock().unwrap().push_back(map);
    }

    /// Script a per-item failure for multi-get lookups of `id`.
    pub fn script_multi_get_failure(&self, id: &str, message: &str) {
        self.multi_get_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), message.to_string());
    }

    /// Make the next bulk call block until [`release_bulk`](Self::release_bulk).
    pub fn hold_next_bulk(&self) {
        self.hold_next_bulk.store(true, Ordering::SeqCst);
    }

    /// Wait until a held bulk call is in flight.
    pub async fn wait_bulk_started(&self) {
        self.bulk_started.notified().await;
    }

    /// Release a held bulk call.
    pub fn release_bulk(&self) {
        self.bulk_release.notify_one();
    }

    pub fn bulk_call_count(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn recorded_bulk_ops(&self) -> Vec<Vec<BulkOp>> {
        self.bulk_ops_log.lock().unwrap().clone()
    }

    pub fn recorded_index_docs(&self) -> Vec<IndexDocCall> {
        self.index_doc_calls.lock().unwrap().clone()
    }

    /// How many create-only writes actually landed.
    pub fn create_success_count(&self) -> usize {
        self.create_successes.load(Ordering::SeqCst)
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn key(target: &DocRef) -> DocKey {
        (
            target.index.clone(),
            target.doc_type.clone(),
            target.id.clone(),
        )
    }
}

impl IndexClient for MockIndexClient {
    fn indices_exists(&self, index: &str) -> BoxFuture<'_, bool> {
        let index = index.to_string();
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(self.indices.lock().unwrap().contains(&index))
        })
    }

    fn multi_get(&self, refs: Vec<DocRef>) -> BoxFuture<'_, Vec<MultiGetItem>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let failures = self.multi_get_failures.lock().unwrap().clone();
            let docs = self.docs.lock().unwrap();
            Ok(refs
                .into_iter()
                .map(|doc_ref| {
                    let outcome = if let Some(message) = failures.get(&doc_ref.id) {
                        MultiGetOutcome::Failed {
                            message: message.clone(),
                        }
                    } else if let Some(source) = docs.get(&Self::key(&doc_ref)) {
                        MultiGetOutcome::Found {
                            source: source.clone(),
                        }
                    } else {
                        MultiGetOutcome::Missing
                    };
                    MultiGetItem {
                        id: doc_ref.id,
                        outcome,
                    }
                })
                .collect())
        })
    }

    fn bulk(&self, ops: Vec<BulkOp>) -> BoxFuture<'_, BulkOutcome> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            self.bulk_ops_log.lock().unwrap().push(ops.clone());

            if self.hold_next_bulk.swap(false, Ordering::SeqCst) {
                self.bulk_started.notify_one();
                self.bulk_release.notified().await;
            }

            let failures = self
                .bulk_failures
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default();

            let mut items = Vec::with_capacity(ops.len());
            for op in &ops {
                if let Some(message) = failures.get(op.id()) {
                    items.push(BulkItemOutcome::failed(op.id(), message.clone()));
                    continue;
                }
                let mut docs = self.docs.lock().unwrap();
                match op {
                    BulkOp::Index { target, source, .. } => {
                        docs.insert(Self::key(target), source.clone());
                    }
                    BulkOp::Delete { target } => {
                        docs.remove(&Self::key(target));
                    }
                }
                items.push(BulkItemOutcome::ok(op.id()));
            }
            Ok(BulkOutcome { items })
        })
    }

    fn get(&self, target: DocRef) -> BoxFuture<'_, Option<Value>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.docs.lock().unwrap().get(&Self::key(&target)).cloned())
        })
    }

    fn index_doc(&self, target: DocRef, source: Value, create_only: bool) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.index_doc_calls.lock().unwrap().push(IndexDocCall {
                target: target.clone(),
                source: source.clone(),
                create_only,
            });
            let mut docs = self.docs.lock().unwrap();
            let key = Self::key(&target);
            if create_only {
                if docs.contains_key(&key) {
                    return Ok(false);
                }
                self.create_successes.fetch_add(1, Ordering::SeqCst);
            }
            docs.insert(key, source);
            Ok(true)
        })
    }
}
