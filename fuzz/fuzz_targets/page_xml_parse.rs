//! Fuzz target for PAGE XML loading.
//!
//! Arbitrary bytes go through the loader; whatever parses is stripped,
//! serialized, and must load again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pagetag::page::io_page_xml::{from_page_xml_slice, from_page_xml_str, to_page_xml_string};
use pagetag::page::normalize::{restore_namespace_on_serialize, strip};

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(mut doc) = from_page_xml_slice(data) else {
        return;
    };
    strip(&mut doc);
    let xml = restore_namespace_on_serialize(&to_page_xml_string(&doc));
    from_page_xml_str(&xml).expect("serialized document must parse");
});
