//! Criterion microbenches for pagetag parsing and annotation.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - PAGE XML loading (from_page_xml_str)
//! - Custom attribute parsing (parse_attribute)
//! - The full in-memory pipeline with a gazetteer tagger (annotate_xml_str)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use pagetag::annotate::AnnotateOptions;
use pagetag::entity::gazetteer::GazetteerTagger;
use pagetag::page::io_page_xml::from_page_xml_str;
use pagetag::process::annotate_xml_str;
use pagetag::tags::{parse_attribute, LabelTable};

// Include test fixtures at compile time (no file I/O during benchmark)
const PAGE_FIXTURE: &str =
    include_str!("../tests/fixtures/collections/0001_resoluties/page/0001.xml");

const CUSTOM_ATTRIBUTE: &str = "readingOrder {index:3;} persoon {offset:0;length:12;} \
geonames_locations {offset:25;length:7;} datum {offset:40;length:10;} \
organisatie {offset:60;length:15;} textStyle {offset:0;length:3;bold:true;}";

/// Benchmark PAGE XML loading into the owned tree.
fn bench_page_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_parse");
    group.throughput(Throughput::Bytes(PAGE_FIXTURE.len() as u64));

    group.bench_function("from_page_xml_str", |b| {
        b.iter(|| {
            let doc = from_page_xml_str(black_box(PAGE_FIXTURE)).unwrap();
            black_box(doc)
        })
    });

    group.finish();
}

/// Benchmark custom attribute parsing.
fn bench_attribute_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_parse");
    group.throughput(Throughput::Bytes(CUSTOM_ATTRIBUTE.len() as u64));

    group.bench_function("parse_attribute", |b| {
        b.iter(|| {
            let tags = parse_attribute(black_box(CUSTOM_ATTRIBUTE)).unwrap();
            black_box(tags)
        })
    });

    group.finish();
}

/// Benchmark load, strip, tag, and render of one document.
fn bench_annotate(c: &mut Criterion) {
    let table = LabelTable::transkribus();
    let options = AnnotateOptions::default();
    let mut tagger = GazetteerTagger::from_entries([
        ("Jan de Vries", "PER"),
        ("Utrecht", "LOC"),
        ("Staten-Generaal", "ORG"),
    ]);

    let mut group = c.benchmark_group("annotate");
    group.throughput(Throughput::Bytes(PAGE_FIXTURE.len() as u64));

    group.bench_function("annotate_xml_str", |b| {
        b.iter(|| {
            let out =
                annotate_xml_str(black_box(PAGE_FIXTURE), &mut tagger, &table, &options).unwrap();
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_page_parse,
    bench_attribute_parse,
    bench_annotate,
);
criterion_main!(benches);
