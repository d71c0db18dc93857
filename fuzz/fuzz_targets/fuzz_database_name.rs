//! Fuzz target for the database-name codec.
//!
//! Parsing must never panic, and the extracted index name must never
//! contain either delimiter.

#![no_main]

use capi_index_bridge::database_name::DatabaseRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let db = DatabaseRef::parse(data);

    assert!(!db.index().contains('/'));
    assert!(!db.index().contains(';'));

    // Reformatting must be stable.
    let _ = db.name_without_uuid();
    let _ = db.expected_uuid();
});
