//! Shared test support.

pub mod mock_index;

use capi_index_bridge::mutation::Mutation;
use serde_json::Value;

/// Build a mutation from a JSON literal.
pub fn mutation(value: Value) -> Mutation {
    serde_json::from_value(value).expect("valid mutation literal")
}
