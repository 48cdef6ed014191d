//! Benchmarks for masonry placement and visibility queries.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pexgal::layout::{MasonryLayout, tile_rows};

fn heights(count: usize) -> Vec<usize> {
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let aspect = 0.5 + (i % 7) as f64 * 0.2;
            tile_rows(Some(aspect), 39, (8, 16))
        })
        .collect()
}

fn bench_arrange(c: &mut Criterion) {
    let heights = heights(1000);
    c.bench_function("arrange_1000_tiles", |b| {
        b.iter(|| MasonryLayout::arrange(black_box(&heights), 4, 200));
    });
}

fn bench_visible(c: &mut Criterion) {
    let layout = MasonryLayout::arrange(&heights(1000), 4, 200);
    let middle = layout.content_rows() / 2;
    c.bench_function("visible_window", |b| {
        b.iter(|| layout.visible(black_box(middle..middle + 50)).count());
    });
}

criterion_group!(benches, bench_arrange, bench_visible);
criterion_main!(benches);
