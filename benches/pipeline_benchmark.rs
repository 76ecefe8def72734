//! Benchmarks for the marker pipeline and the line classifier.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic record streams and layout documents.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use geommark::model::{LayoutBlock, LayoutLine, LayoutSpan, PageLayout, FLAG_BOLD};
use geommark::{LineClassifier, ParseOptions};

/// Creates an NDJSON stream with `elements` start/end pairs spread over pages.
fn create_test_stream(elements: usize) -> String {
    let mut stream = String::new();
    for i in 0..elements {
        let page = i / 40 + 1;
        let x = 4_718_592 + (i % 2) * 20_000_000;
        let y = 50_000_000 - (i % 40) * 1_000_000;
        stream.push_str(&format!(
            "{{\"id\":\"p-{i}\",\"page\":{page},\"role\":\"P-start\",\"xsp\":{x},\"ysp\":{y},\"page_source\":\"label\",\"cwsp\":15456563,\"twsp\":31699558,\"col\":{}}}\n",
            i % 2
        ));
        stream.push_str(&format!(
            "{{\"id\":\"p-{i}\",\"page\":{page},\"role\":\"P-end\",\"xsp\":{},\"ysp\":{},\"page_source\":\"label\",\"cwsp\":15456563,\"twsp\":31699558,\"col\":{}}}\n",
            x + 15_000_000,
            y - 800_000,
            i % 2
        ));
    }
    stream
}

/// Creates a layout document with a heading and body lines on each page.
fn create_test_layout(pages: u32) -> Vec<PageLayout> {
    (1..=pages)
        .map(|n| {
            let mut lines = vec![LayoutLine::new(
                [72.0, 72.0, 400.0, 90.0],
                vec![LayoutSpan::new("1 Introduction", "CMBX12", 14.35, FLAG_BOLD)],
            )];
            for i in 0..50 {
                let top = 100.0 + i as f64 * 12.0;
                lines.push(LayoutLine::new(
                    [72.0, top, 520.0, top + 10.0],
                    vec![LayoutSpan::new("Body text of the document", "CMR10", 9.96, 0)],
                ));
            }
            let mut page = PageLayout::new(n);
            page.add_block(LayoutBlock {
                block_id: Some(0),
                bbox: [72.0, 72.0, 520.0, 720.0],
                lines,
            });
            page
        })
        .collect()
}

/// Benchmark record stream parsing.
fn bench_stream_parsing(c: &mut Criterion) {
    let stream = create_test_stream(1_000);

    c.bench_function("parse_1000_elements", |b| {
        b.iter(|| geommark::read_records_from_str(black_box(&stream)));
    });
}

/// Benchmark box synthesis, sequential and parallel.
fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");

    for elements in [100, 1_000, 10_000].iter() {
        let records = geommark::read_records_from_str(&create_test_stream(*elements)).records;

        group.bench_function(format!("{}_elements_parallel", elements), |b| {
            let options = ParseOptions::new();
            b.iter(|| geommark::synthesize(black_box(records.clone()), &options));
        });
        group.bench_function(format!("{}_elements_sequential", elements), |b| {
            let options = ParseOptions::new().sequential();
            b.iter(|| geommark::synthesize(black_box(records.clone()), &options));
        });
    }

    group.finish();
}

/// Benchmark the reliability report.
fn bench_report(c: &mut Criterion) {
    let records = geommark::read_records_from_str(&create_test_stream(1_000)).records;

    c.bench_function("report_1000_elements", |b| {
        b.iter(|| geommark::analyze_records(black_box(&records)));
    });
}

/// Benchmark line classification.
fn bench_classification(c: &mut Criterion) {
    let layout = create_test_layout(20);
    let classifier = LineClassifier::new(&ParseOptions::new());

    c.bench_function("classify_20_pages", |b| {
        b.iter(|| classifier.classify(black_box(&layout)));
    });
}

criterion_group!(
    benches,
    bench_stream_parsing,
    bench_synthesis,
    bench_report,
    bench_classification,
);
criterion_main!(benches);
