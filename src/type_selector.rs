//! Type selection for indexed documents.
//!
//! The Index stores every document under an (index, type, id) triple, but the
//! Source only supplies ids. A [`TypeSelector`] closes the gap: given the
//! index name and a document id it names the type to index under. Selection
//! is total — every id maps to some type.
//!
//! The selector is a capability injected into the behavior, so deployments
//! can route by id shape, by a fixed name, or with a custom closure:
//!
//! ```rust
//! use capi_index_bridge::type_selector::{ConstantTypeSelector, TypeSelector};
//!
//! let selector = ConstantTypeSelector::default();
//! assert_eq!(selector.select("beer-sample", "beer_ipa"), "couchbaseDocument");
//!
//! let by_index = |index: &str, _id: &str| format!("{index}-doc");
//! assert_eq!(by_index.select("beer-sample", "x"), "beer-sample-doc");
//! ```

/// Maps an (index, doc-id) pair to the index type it is stored under.
pub trait TypeSelector: Send + Sync {
    /// Name the type for a document. Must always return a type.
    fn select(&self, index: &str, doc_id: &str) -> String;
}

impl<F> TypeSelector for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn select(&self, index: &str, doc_id: &str) -> String {
        self(index, doc_id)
    }
}

/// Selects the same type for every document.
#[derive(Debug, Clone)]
pub struct ConstantTypeSelector {
    type_name: String,
}

impl ConstantTypeSelector {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl Default for ConstantTypeSelector {
    fn default() -> Self {
        Self::new("couchbaseDocument")
    }
}

impl TypeSelector for ConstantTypeSelector {
    fn select(&self, _index: &str, _doc_id: &str) -> String {
        self.type_name.clone()
    }
}

/// Derives the type from the id prefix before a delimiter.
///
/// `beer_brew-free` with delimiter `_` selects type `beer`; ids without the
/// delimiter (or starting with it) fall back to the default type.
#[derive(Debug, Clone)]
pub struct IdPrefixTypeSelector {
    delimiter: char,
    default_type: String,
}

impl IdPrefixTypeSelector {
    pub fn new(delimiter: char, default_type: impl Into<String>) -> Self {
        Self {
            delimiter,
            default_type: default_type.into(),
        }
    }
}

impl TypeSelector for IdPrefixTypeSelector {
    fn select(&self, _index: &str, doc_id: &str) -> String {
        match doc_id.split_once(self.delimiter) {
            Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
            _ => self.default_type.clone(),
        }
    }
}
