//! Fuzz target for custom attribute parsing.
//!
//! This fuzzer feeds arbitrary strings to the tag grammar parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pagetag::tags::{parse_attribute, parse_expressions};

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(attribute) = std::str::from_utf8(data) else {
        return;
    };
    let _ = parse_attribute(attribute);
    let _ = parse_expressions(attribute);
});
