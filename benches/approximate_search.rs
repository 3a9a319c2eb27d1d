//! Approximate Search Benchmarks
//!
//! Locating stored highlight text on a page as the embed pass does it:
//! bounded edit-distance search over a page of text, and the escalating
//! selection lookup on top of it.
//!
//! Run with: `cargo bench --bench approximate_search`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use marginalia::document::PageCache;
use marginalia::matching::{find_approx, fuzzy_equal};
use marginalia::pdf::MemoryPdf;
use marginalia::selection::TextSelector;

const SENTENCE: &str = "Rectangles of adjacent glyphs are merged into one box per line before the highlight is written";

/// A page worth of prose, about 3000 characters
fn page_text() -> String {
    (0..30)
        .map(|i| format!("{} {}.", SENTENCE, i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn page_pdf() -> MemoryPdf {
    let mut pdf = MemoryPdf::new(vec![(612.0, 792.0)]);
    for i in 0..30 {
        pdf.layout_line(0, i / 10, 40.0 + 24.0 * i as f64, &format!("{} {}.", SENTENCE, i));
    }
    pdf
}

/// Benchmark bounded edit-distance search at increasing tolerance
fn bench_find_approx(c: &mut Criterion) {
    let haystack = page_text();
    // near the end of the page, with two typos
    let needle = "merged into one box per lnie before the higlight is written 27";

    let mut group = c.benchmark_group("find_approx");
    group.measurement_time(Duration::from_secs(10));

    for max_errors in [0usize, 2, 5, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(max_errors), &max_errors, |b, &k| {
            b.iter(|| black_box(find_approx(black_box(&haystack), black_box(needle), k)))
        });
    }

    group.finish();
}

/// Benchmark the fuzzy comparison used by the dedup predicate
fn bench_fuzzy_equal(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_equal");

    group.bench_function("short", |b| {
        b.iter(|| black_box(fuzzy_equal(black_box("margins"), black_box("margin"))))
    });
    group.bench_function("long", |b| {
        b.iter(|| black_box(fuzzy_equal(black_box(SENTENCE), black_box(&SENTENCE[4..]))))
    });

    group.finish();
}

/// Benchmark the escalating selection lookup with a warm page cache
fn bench_best_selection(c: &mut Criterion) {
    let pdf = page_pdf();
    let mut cache = PageCache::default();

    let mut group = c.benchmark_group("best_selection_rects");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    group.bench_function("exact", |b| {
        b.iter(|| {
            let mut selector = TextSelector::new(&pdf, &mut cache);
            black_box(selector.best_selection_rects(0, black_box("box per line before the highlight"), true))
        })
    });

    group.bench_function("two_typos", |b| {
        b.iter(|| {
            let mut selector = TextSelector::new(&pdf, &mut cache);
            black_box(selector.best_selection_rects(0, black_box("box per lnie before the higlight"), true))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_find_approx, bench_fuzzy_equal, bench_best_selection);
criterion_main!(benches);
