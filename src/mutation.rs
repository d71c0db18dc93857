//! Wire shape and normalization of `_bulk_docs` mutations.
//!
//! A mutation arrives as an untyped mapping with a `meta` section and at
//! most one payload carrier (`json` or `base64`). Documents off the wire
//! are arbitrary: the meta section is kept verbatim (unknown fields and
//! all) and payload decoding never fails a batch — undecodable bodies are
//! stubbed to `{}` so the Source's revision tracking stays consistent.
//!
//! What gets written to the Index for a live mutation is the two-level
//! envelope `{meta: <verbatim>, doc: <payload>}`; downstream paths
//! (`meta.rev` during conflict resolution, `doc.*` for parent/routing) rely
//! on that shape.

use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::metrics;

/// An untyped JSON mapping.
pub type JsonObject = serde_json::Map<String, Value>;

/// The `att_reason` marker telling us the body is not JSON.
pub const NON_JSON_MODE: &str = "non-JSON mode";

/// One entry of a `_bulk_docs` push.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mutation {
    /// Metadata section, kept verbatim for the indexed envelope.
    #[serde(default)]
    pub meta: Option<JsonObject>,
    /// Plain JSON payload.
    #[serde(default)]
    pub json: Option<Value>,
    /// Base64-encoded payload, used when `json` is absent.
    #[serde(default)]
    pub base64: Option<String>,
}

impl Mutation {
    /// Read a string field from the meta section.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.as_ref()?.get(key)?.as_str()
    }

    /// The document id.
    pub fn id(&self) -> Option<&str> {
        self.meta_str("id")
    }

    /// The Source-assigned revision.
    pub fn rev(&self) -> Option<&str> {
        self.meta_str("rev")
    }

    /// Whether this mutation is a deletion tombstone.
    pub fn is_deleted(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("deleted"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Expiration in seconds since the epoch; 0 and absent both mean none.
    pub fn expiration_secs(&self) -> Option<i64> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("expiration"))
            .and_then(Value::as_i64)
    }

    /// Extract the document payload to index.
    ///
    /// Precedence: the non-JSON marker forces an empty payload; otherwise a
    /// present `json` body wins; otherwise `base64` is decoded and parsed.
    /// Anything undecodable (bad base64, unparseable bytes, non-object
    /// payload) is stubbed to `{}` with a warning — the mutation is still
    /// indexed so the revision stream stays intact.
    pub fn payload(&self) -> JsonObject {
        if self.meta_str("att_reason") == Some(NON_JSON_MODE) {
            return JsonObject::new();
        }

        if let Some(json) = &self.json {
            return match json {
                Value::Object(map) => map.clone(),
                other => {
                    warn!(
                        id = self.id().unwrap_or(""),
                        kind = json_kind(other),
                        "non-object json payload, indexing stub"
                    );
                    metrics::record_malformed_payload("non_object");
                    JsonObject::new()
                }
            };
        }

        if let Some(base64_body) = &self.base64 {
            return self.decode_base64_payload(base64_body);
        }

        JsonObject::new()
    }

    fn decode_base64_payload(&self, body: &str) -> JsonObject {
        let decoded = match base64::engine::general_purpose::STANDARD.decode(body) {
            Ok(decoded) => decoded,
            Err(error) => {
                warn!(
                    id = self.id().unwrap_or(""),
                    %error,
                    "unable to decode base64 payload, indexing stub"
                );
                metrics::record_malformed_payload("base64");
                return JsonObject::new();
            }
        };
        match serde_json::from_slice::<Value>(&decoded) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(
                    id = self.id().unwrap_or(""),
                    kind = json_kind(&other),
                    "decoded payload is not an object, indexing stub"
                );
                metrics::record_malformed_payload("non_object");
                JsonObject::new()
            }
            Err(error) => {
                warn!(
                    id = self.id().unwrap_or(""),
                    %error,
                    "unable to parse decoded base64 payload as JSON, indexing stub"
                );
                metrics::record_malformed_payload("json");
                JsonObject::new()
            }
        }
    }
}

/// Build the `{meta, doc}` envelope written to the Index.
pub fn indexed_envelope(meta: JsonObject, doc: JsonObject) -> JsonObject {
    let mut envelope = JsonObject::new();
    envelope.insert("meta".to_string(), Value::Object(meta));
    envelope.insert("doc".to_string(), Value::Object(doc));
    envelope
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
