//! Index client interface.
//!
//! Defines what the bridge needs from the Index: existence checks, a
//! single-round-trip multi-get, bulk writes, and single-document get/index.
//! The concrete client (HTTP, native transport, embedded) lives outside the
//! crate; the bridge only ever talks to this trait, which keeps the core
//! testable with a recording mock.
//!
//! # Example
//!
//! ```rust,no_run
//! use capi_index_bridge::index_client::{
//!     BoxFuture, BulkOp, BulkOutcome, DocRef, IndexClient, MultiGetItem,
//! };
//! use serde_json::Value;
//!
//! struct MyBackend { /* ... */ }
//!
//! impl IndexClient for MyBackend {
//!     fn indices_exists(&self, _index: &str) -> BoxFuture<'_, bool> {
//!         Box::pin(async move { Ok(true) })
//!     }
//!
//!     fn multi_get(&self, _refs: Vec<DocRef>) -> BoxFuture<'_, Vec<MultiGetItem>> {
//!         Box::pin(async move { Ok(Vec::new()) })
//!     }
//!
//!     fn bulk(&self, ops: Vec<BulkOp>) -> BoxFuture<'_, BulkOutcome> {
//!         Box::pin(async move { Ok(BulkOutcome::all_ok(&ops)) })
//!     }
//!
//!     fn get(&self, _target: DocRef) -> BoxFuture<'_, Option<Value>> {
//!         Box::pin(async move { Ok(None) })
//!     }
//!
//!     fn index_doc(
//!         &self,
//!         _target: DocRef,
//!         _source: Value,
//!         _create_only: bool,
//!     ) -> BoxFuture<'_, bool> {
//!         Box::pin(async move { Ok(true) })
//!     }
//! }
//! ```

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = IndexResult<T>> + Send + 'a>>;

/// Transport-level index failure.
///
/// Per-item failures inside a completed bulk or multi-get round trip are
/// reported in the response types instead.
#[derive(Debug, Clone)]
pub struct IndexError(pub String);

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IndexError {}

/// Fully-qualified document address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub index: String,
    pub doc_type: String,
    pub id: String,
}

impl DocRef {
    pub fn new(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

/// One operation inside a bulk request, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOp {
    /// Index (upsert) a document.
    Index {
        target: DocRef,
        /// The `{meta, doc}` envelope.
        source: Value,
        /// Time-to-live in milliseconds; `None` means no expiry.
        ttl_millis: Option<i64>,
        /// Parent document id, when the type is parent-joined.
        parent: Option<String>,
        /// Shard routing value.
        routing: Option<String>,
    },
    /// Delete a document.
    Delete { target: DocRef },
}

impl BulkOp {
    /// The document id this op addresses.
    pub fn id(&self) -> &str {
        match self {
            BulkOp::Index { target, .. } => &target.id,
            BulkOp::Delete { target } => &target.id,
        }
    }

    /// The target address of this op.
    pub fn target(&self) -> &DocRef {
        match self {
            BulkOp::Index { target, .. } => target,
            BulkOp::Delete { target } => target,
        }
    }
}

/// Per-op result inside a completed bulk round trip, in op order.
#[derive(Debug, Clone)]
pub struct BulkItemOutcome {
    pub id: String,
    /// Failure message when the op failed; `None` means the op was applied.
    pub failure: Option<String>,
}

impl BulkItemOutcome {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            failure: None,
        }
    }

    pub fn failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            failure: Some(message.into()),
        }
    }
}

/// Outcome of one bulk round trip.
///
/// Implementations must return exactly one item per submitted op, in
/// submission order, even when some items fail.
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    pub items: Vec<BulkItemOutcome>,
}

impl BulkOutcome {
    /// Outcome acknowledging every op — handy for no-op and mock clients.
    pub fn all_ok(ops: &[BulkOp]) -> Self {
        Self {
            items: ops.iter().map(|op| BulkItemOutcome::ok(op.id())).collect(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|item| item.failure.is_some())
    }
}

/// Per-document result of a multi-get, in request order.
#[derive(Debug, Clone)]
pub struct MultiGetItem {
    pub id: String,
    pub outcome: MultiGetOutcome,
}

/// What the index said about one multi-get document.
#[derive(Debug, Clone)]
pub enum MultiGetOutcome {
    /// Document exists; `source` is its stored source.
    Found { source: Value },
    /// Document does not exist.
    Missing,
    /// The item itself failed (shard down, mapping trouble).
    Failed { message: String },
}

/// What the bridge needs from the Index.
///
/// All calls are one synchronous round trip from the caller's perspective.
/// Implementations must be safe to share across concurrent requests.
pub trait IndexClient: Send + Sync + 'static {
    /// Check whether an index exists.
    fn indices_exists(&self, index: &str) -> BoxFuture<'_, bool>;

    /// Fetch several documents in one round trip.
    ///
    /// Returns one item per requested ref, in request order. Individual
    /// failures are reported per item; `Err` means the whole round trip
    /// failed.
    fn multi_get(&self, refs: Vec<DocRef>) -> BoxFuture<'_, Vec<MultiGetItem>>;

    /// Execute a bulk write.
    ///
    /// `Ok` means the round trip completed — inspect
    /// [`BulkOutcome::items`] for per-op failures. `Err` means the request
    /// never produced a response.
    fn bulk(&self, ops: Vec<BulkOp>) -> BoxFuture<'_, BulkOutcome>;

    /// Fetch a single document's source, or `None` if absent.
    fn get(&self, target: DocRef) -> BoxFuture<'_, Option<Value>>;

    /// Write a single document.
    ///
    /// With `create_only` the write must not overwrite an existing document;
    /// returns `false` when it lost to an existing one. Plain writes return
    /// `true` once acknowledged.
    fn index_doc(&self, target: DocRef, source: Value, create_only: bool) -> BoxFuture<'_, bool>;
}

/// A no-op client for standalone/smoke use.
///
/// Acknowledges everything and stores nothing.
#[derive(Debug, Clone, Default)]
pub struct NoOpIndexClient;

impl IndexClient for NoOpIndexClient {
    fn indices_exists(&self, index: &str) -> BoxFuture<'_, bool> {
        debug!(index = %index, "NoOp: index exists");
        Box::pin(async move { Ok(true) })
    }

    fn multi_get(&self, refs: Vec<DocRef>) -> BoxFuture<'_, Vec<MultiGetItem>> {
        Box::pin(async move {
            Ok(refs
                .into_iter()
                .map(|doc_ref| MultiGetItem {
                    id: doc_ref.id,
                    outcome: MultiGetOutcome::Missing,
                })
                .collect())
        })
    }

    fn bulk(&self, ops: Vec<BulkOp>) -> BoxFuture<'_, BulkOutcome> {
        debug!(ops = ops.len(), "NoOp: would bulk index");
        Box::pin(async move { Ok(BulkOutcome::all_ok(&ops)) })
    }

    fn get(&self, target: DocRef) -> BoxFuture<'_, Option<Value>> {
        debug!(index = %target.index, id = %target.id, "NoOp: get");
        Box::pin(async move { Ok(None) })
    }

    fn index_doc(&self, target: DocRef, _source: Value, _create_only: bool) -> BoxFuture<'_, bool> {
        debug!(index = %target.index, id = %target.id, "NoOp: would index document");
        Box::pin(async move { Ok(true) })
    }
}
