//! Fuzz target for version policy decoding.
//!
//! Arbitrary JSON must either decode into a policy or be rejected, and a
//! decoded policy must resolve to an ascending subset of its input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use servable_core::models::VersionPolicy;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(policy) = VersionPolicy::from_document(&document) {
        let available: Vec<u64> = (1..=32).collect();
        let selected = policy.resolve(&available);
        assert!(selected.windows(2).all(|w| w[0] < w[1]));
        assert!(selected.iter().all(|v| available.contains(v)));
    }
});
