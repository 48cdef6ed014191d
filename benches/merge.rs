//! Benchmarks for merging fetched pages into the gallery.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pexgal::gallery::merge;
use pexgal::source::Photo;

fn photos(range: std::ops::Range<usize>) -> Vec<Photo> {
    range
        .map(|i| Photo::new(format!("https://img.test/{i}/m"), format!("https://img.test/{i}/o")))
        .collect()
}

fn bench_merge_fresh_page(c: &mut Criterion) {
    let current = photos(0..700);
    let incoming = photos(700..707);
    c.bench_function("merge_fresh_page", |b| {
        b.iter(|| merge(black_box(&current), black_box(incoming.clone())));
    });
}

fn bench_merge_overlapping_page(c: &mut Criterion) {
    let current = photos(0..700);
    let incoming = photos(696..703);
    c.bench_function("merge_overlapping_page", |b| {
        b.iter(|| merge(black_box(&current), black_box(incoming.clone())));
    });
}

criterion_group!(benches, bench_merge_fresh_page, bench_merge_overlapping_page);
criterion_main!(benches);
