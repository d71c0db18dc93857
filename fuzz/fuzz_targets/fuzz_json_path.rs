//! Fuzz target for dotted-path resolution.
//!
//! Resolution must never panic, whatever document shape and path arrive.

#![no_main]

use capi_index_bridge::json_path::{resolve_path, resolve_string_path};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: (&str, &str)| {
    let (document, path) = data;

    if let Ok(Value::Object(root)) = serde_json::from_str::<Value>(document) {
        let _ = resolve_path(&root, path);
        let _ = resolve_string_path(&root, path);
    }
});
