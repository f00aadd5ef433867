//! Fuzz target for version identifier parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use servable_core::models::parse_version_number;

fuzz_target!(|data: &[u8]| {
    if let Ok(identifier) = std::str::from_utf8(data) {
        // Must only return Ok or Err, never panic.
        let _ = parse_version_number(identifier);
    }
});
