#![allow(dead_code)]

use pagetag::entity::EntitySpan;
use pagetag::tags::LabelTable;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Label codes of the default table.
pub fn table_labels() -> Vec<String> {
    LabelTable::transkribus()
        .iter()
        .map(|(label, _)| label.as_str().to_string())
        .collect()
}

pub fn arb_label() -> BoxedStrategy<String> {
    prop::sample::select(table_labels()).boxed()
}

/// Tag names as they could appear in a label map.
pub fn arb_tag_name() -> BoxedStrategy<String> {
    "[a-z][a-z_]{0,24}".boxed()
}

pub fn arb_span() -> BoxedStrategy<EntitySpan> {
    (arb_label(), 0usize..100_000, 0usize..10_000)
        .prop_map(|(label, offset, length)| EntitySpan::new(label, offset, length))
        .boxed()
}

pub fn arb_spans(max: usize) -> BoxedStrategy<Vec<EntitySpan>> {
    prop::collection::vec(arb_span(), 0..=max).boxed()
}

/// An attribute made of well-formed expressions, e.g. what an earlier run
/// or Transkribus itself left behind.
pub fn arb_existing_attribute() -> BoxedStrategy<String> {
    prop::collection::vec(
        prop_oneof![
            (0usize..50).prop_map(|index| format!("readingOrder {{index:{index};}}")),
            (arb_tag_name(), 0usize..500, 1usize..50).prop_map(|(name, offset, length)| {
                format!("{name} {{offset:{offset};length:{length};}}")
            }),
        ],
        0..4,
    )
    .prop_map(|tags| tags.join(" "))
    .boxed()
}

/// Line text without XML-significant characters, plus a few non-ASCII
/// letters so char and byte offsets differ.
pub fn arb_line_text() -> BoxedStrategy<String> {
    "[A-Za-zéëïüÑ ,.-]{1,60}"
        .prop_filter("needs a non-space character", |s| !s.trim().is_empty())
        .boxed()
}
