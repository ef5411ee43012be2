// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kerf_clip::{ClipOptions, Clipper, Segment, Tolerances, intersect};
use kurbo::{BezPath, CubicBez, Line, QuadBez};

/// `n` overlapping squares along a diagonal, each crossing its neighbours.
fn staircase(n: usize) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..n {
        let o = i as f64 * 7.0;
        path.move_to((o, o));
        path.line_to((o + 10.0, o));
        path.line_to((o + 10.0, o + 10.0));
        path.line_to((o, o + 10.0));
        path.close_path();
    }
    path
}

/// A wave of cubics crossed by horizontal lines.
fn hatched_wave(n: usize) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    for i in 0..n {
        let x = i as f64 * 20.0;
        path.curve_to((x + 5.0, 30.0), (x + 15.0, -30.0), (x + 20.0, 0.0));
    }
    for k in 0..5 {
        let y = -8.0 + k as f64 * 4.0 + 0.5;
        path.move_to((-1.0, y));
        path.line_to((n as f64 * 20.0 + 1.0, y));
    }
    path
}

fn bench_clip(c: &mut Criterion) {
    let mut group = c.benchmark_group("clip_paths");
    let options = ClipOptions {
        isolate_subpaths: false,
        ..ClipOptions::default()
    };
    for &n in &[16_usize, 64, 256] {
        let stairs = staircase(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("staircase_n{n}"), |b| {
            b.iter_batched(
                || Clipper::with_options(options).unwrap(),
                |mut clipper| {
                    let summary = clipper.add_path(stairs.iter()).unwrap();
                    black_box(summary.intersections);
                },
                BatchSize::SmallInput,
            );
        });
        let wave = hatched_wave(n);
        group.bench_function(format!("hatched_wave_n{n}"), |b| {
            b.iter_batched(
                || Clipper::with_options(options).unwrap(),
                |mut clipper| {
                    let summary = clipper.add_path(wave.iter()).unwrap();
                    black_box(summary.intersections);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_intersect(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect_pairs");
    let tol = Tolerances::default();
    let line = Segment::Line(Line::new((0.0, 2.0), (10.0, 3.0)));
    let quad = Segment::Quad(QuadBez::new((0.0, 0.0), (5.0, 10.0), (10.0, 0.0)));
    let quad2 = Segment::Quad(QuadBez::new((0.0, 5.0), (5.0, -5.0), (10.0, 5.0)));
    let cubic = Segment::Cubic(CubicBez::new((0.0, 0.0), (3.0, 12.0), (7.0, -4.0), (10.0, 8.0)));
    let cubic2 = Segment::Cubic(CubicBez::new((0.0, 8.0), (4.0, -6.0), (6.0, 14.0), (10.0, 0.0)));
    for (name, a, b) in [
        ("line_line", line, Segment::Line(Line::new((2.0, 0.0), (8.0, 6.0)))),
        ("line_quad", line, quad),
        ("quad_quad", quad, quad2),
        ("line_cubic", line, cubic),
        ("cubic_cubic", cubic, cubic2),
    ] {
        group.bench_function(name, |bench| {
            bench.iter(|| black_box(intersect(black_box(&a), black_box(&b), &tol).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clip, bench_intersect);
criterion_main!(benches);
