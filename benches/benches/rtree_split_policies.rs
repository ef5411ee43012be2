// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kerf_index::{Aabb2D, RTree, RTreeConfig, SplitPolicy};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

fn gen_random_rects(count: usize, extent: f64, size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * extent;
            let y0 = rng.next_f64() * extent;
            Aabb2D::<f64>::from_xywh(x0, y0, size * rng.next_f64() + 1.0, size * rng.next_f64() + 1.0)
        })
        .collect()
}

fn policies() -> [(&'static str, RTreeConfig); 3] {
    [
        ("linear_13_5", RTreeConfig::new(13, 5).with_split(SplitPolicy::Linear)),
        ("quadratic_13_5", RTreeConfig::new(13, 5).with_split(SplitPolicy::Quadratic)),
        ("quadratic_32_12", RTreeConfig::new(32, 12).with_split(SplitPolicy::Quadratic)),
    ]
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_insert");
    let rects = gen_random_rects(10_000, 4000.0, 40.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    for (name, config) in policies() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || RTree::<f64, u32>::with_config(config).unwrap(),
                |mut tree| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        tree.insert(r, i as u32);
                    }
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.bench_function("bulk_load_13_5", |b| {
        b.iter_batched(
            || rects.iter().copied().zip(0_u32..).collect::<Vec<_>>(),
            |entries| {
                let mut tree = RTree::<f64, u32>::new();
                tree.bulk_load(entries);
                black_box(tree.height());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_query");
    let rects = gen_grid_rects(128, 10.0);
    let queries = gen_random_rects(256, 1200.0, 80.0);
    group.throughput(Throughput::Elements(queries.len() as u64));
    for (name, config) in policies() {
        let mut tree = RTree::<f64, u32>::with_config(config).unwrap();
        for (i, r) in rects.iter().copied().enumerate() {
            tree.insert(r, i as u32);
        }
        group.bench_function(name, |b| {
            let mut hits = Vec::new();
            b.iter(|| {
                let mut total = 0;
                for q in &queries {
                    hits.clear();
                    total += tree.query_rect(*q, &mut hits);
                }
                black_box(total)
            });
        });
    }
    let mut packed = RTree::<f64, u32>::new();
    packed.bulk_load(rects.iter().copied().zip(0_u32..));
    group.bench_function("bulk_loaded", |b| {
        let mut hits = Vec::new();
        b.iter(|| {
            let mut total = 0;
            for q in &queries {
                hits.clear();
                total += packed.query_rect(*q, &mut hits);
            }
            black_box(total)
        });
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_remove_reinsert");
    let rects = gen_random_rects(4_000, 2000.0, 30.0);
    for (name, config) in policies() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut tree = RTree::<f64, u32>::with_config(config).unwrap();
                    for (i, r) in rects.iter().copied().enumerate() {
                        tree.insert(r, i as u32);
                    }
                    tree
                },
                |mut tree| {
                    for (i, r) in rects.iter().copied().enumerate().step_by(2) {
                        tree.remove(r, i as u32);
                    }
                    for (i, r) in rects.iter().copied().enumerate().step_by(2) {
                        tree.insert(r, i as u32);
                    }
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_churn);
criterion_main!(benches);
