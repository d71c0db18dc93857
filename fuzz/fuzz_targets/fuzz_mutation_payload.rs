//! Fuzz target for mutation payload normalization.
//!
//! Arbitrary wire bytes must either fail deserialization cleanly or
//! normalize to a payload without panicking.

#![no_main]

use capi_index_bridge::mutation::Mutation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mutation) = serde_json::from_slice::<Mutation>(data) {
        let _ = mutation.payload();
        let _ = mutation.id();
        let _ = mutation.rev();
        let _ = mutation.is_deleted();
        let _ = mutation.expiration_secs();
    }
});
