use bplane_core::{BPlane, MatchMode, Rect};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Scatter `n` unit rectangles across a fixed page-sized region in a grid-like pattern.
fn generate_rects(n: usize) -> Vec<Rect> {
    let page_width = 612;
    let page_height = 792;

    (0..n)
        .map(|i| {
            let row = (i / 10) as i64;
            let col = (i % 10) as i64;
            let x0 = col * 60 + 10;
            let y0 = row * 12 + 10;
            let width = 50 + (i % 3) as i64 * 10;
            let height = 10;
            let x0 = x0.min(page_width - width);
            let y0 = y0.min(page_height - height);
            Rect::new(x0, y0, (x0 + width).min(page_width), (y0 + height).min(page_height))
        })
        .collect()
}

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("plane_construct");

    for size in [100, 1_000, 10_000] {
        let rects = generate_rects(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &rects, |b, rects| {
            b.iter(|| {
                let mut plane = BPlane::new();
                for &rect in black_box(rects) {
                    plane.add(rect, ());
                }
                plane
            })
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("plane_query");

    // Roughly a quarter of the page.
    let query_area = Rect::new(100, 100, 400, 500);

    for size in [100, 1_000, 10_000] {
        let rects = generate_rects(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &rects, |b, rects| {
            b.iter_batched(
                || {
                    let mut plane = BPlane::new();
                    for &rect in rects {
                        plane.add(rect, ());
                    }
                    // Prime the bin tree once so the timed query hits a built index rather
                    // than paying for the first lazy rebuild inside the measured section.
                    plane.query(query_area, MatchMode::Overlap);
                    plane
                },
                |mut plane| plane.query(black_box(query_area), MatchMode::Overlap),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("plane_delete");

    for size in [100, 1_000, 10_000] {
        let rects = generate_rects(size);
        let target = rects[size / 2];

        group.bench_with_input(BenchmarkId::from_parameter(size), &(rects, target), |b, (rects, target)| {
            b.iter_batched(
                || {
                    let mut plane = BPlane::new();
                    let mut target_id = None;
                    for &rect in rects {
                        let id = plane.add(rect, ());
                        if rect == *target {
                            target_id = Some(id);
                        }
                    }
                    (plane, target_id.expect("target rect was inserted"))
                },
                |(mut plane, id)| plane.delete(black_box(id)),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_construct, bench_query, bench_delete);
criterion_main!(benches);
