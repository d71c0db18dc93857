//! # CAPI Index Bridge
//!
//! A protocol-translation bridge that lets a document database replicate
//! live mutations into a search index as if the index were a peer database
//! speaking the replication protocol.
//!
//! ## Architecture
//!
//! The bridge sits between the Source's replication stream and the Index's
//! bulk write API:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                            capi-index-bridge                             │
//! │                                                                          │
//! │            ┌───────────────┐     ┌────────────────────────────────────┐  │
//! │  Source ──►│ AdmissionGate │────►│ revs_diff  (multi-get ── meta.rev) │  │
//! │  (HTTP     │ (two counters)│     ├────────────────────────────────────┤  │
//! │  transport)│               │────►│ bulk_docs  (normalize ── bulk)     │  │
//! │            └───────────────┘     └──────────────────┬─────────────────┘  │
//! │                    │                                ▼                    │
//! │            ┌───────────────┐              ┌───────────────────────────┐  │
//! │            │  BridgeStats  │              │ IndexClient (trait)       │  │
//! │            │  (getStats)   │              │ exists/mget/bulk/get/index│  │
//! │            └───────────────┘              └───────────────────────────┘  │
//! │                                                                          │
//! │  checkpoints + bucket UUIDs stored as checkpoint-type docs in the Index  │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Protocol Mapping
//!
//! The HTTP transport (external) maps endpoints onto
//! [`BridgeBehavior`](behavior::BridgeBehavior) operations:
//!
//! | Endpoint | Operation |
//! |---|---|
//! | `GET /` | `welcome` |
//! | `HEAD /<db>` | `database_exists` |
//! | `GET /<db>` | `database_details` |
//! | `POST /<db>/_revs_diff` | `revs_diff` (503 on admission rejection) |
//! | `POST /<db>/_bulk_docs` | `bulk_docs` (503 on admission rejection, 500 on fatal) |
//! | `POST /<db>/_ensure_full_commit` | `ensure_full_commit` |
//! | `GET/PUT /<db>/_local/<id>` | `get_local_document` / `store_local_document` |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use capi_index_bridge::{BridgeBehavior, BridgeConfig, ConstantTypeSelector};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let behavior = BridgeBehavior::standalone(
//!     BridgeConfig::default(),
//!     Arc::new(ConstantTypeSelector::default()),
//! );
//!
//! let missing = behavior
//!     .revs_diff("beer-sample", [("beer_ipa".into(), "2-abc".into())].into())
//!     .await
//!     .expect("admitted");
//! assert!(missing.contains_key("beer_ipa"));
//! # }
//! ```

pub mod admission;
pub mod behavior;
pub mod clock;
pub mod config;
pub mod database_name;
pub mod error;
pub mod index_client;
pub mod json_path;
pub mod metrics;
pub mod mutation;
pub mod stats;
pub mod type_selector;
pub mod uuid_store;

// Re-exports for convenience
pub use behavior::{BridgeBehavior, DatabaseStatus, DocAck};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BridgeConfig;
pub use database_name::DatabaseRef;
pub use error::{BridgeError, Result};
pub use index_client::{
    BulkItemOutcome, BulkOp, BulkOutcome, DocRef, IndexClient, IndexError, MultiGetItem,
    MultiGetOutcome, NoOpIndexClient,
};
pub use mutation::{JsonObject, Mutation};
pub use stats::{BridgeStats, Endpoint};
pub use type_selector::{ConstantTypeSelector, IdPrefixTypeSelector, TypeSelector};
