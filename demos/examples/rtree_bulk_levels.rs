// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compare the node rectangles of an incrementally built tree with a
//! bulk-loaded one.
//!
//! Run:
//! - `cargo run -p kerf_demos --example rtree_bulk_levels`

use kerf_index::{Aabb2D, RTree};

fn overlap_area(level: &[Aabb2D<f64>]) -> f64 {
    let mut total = 0.0;
    for (i, a) in level.iter().enumerate() {
        for b in &level[i + 1..] {
            let o = a.intersect(b);
            if !o.is_empty() {
                total += (o.max_x - o.min_x) * (o.max_y - o.min_y);
            }
        }
    }
    total
}

fn main() {
    env_logger::init();

    let boxes: Vec<(Aabb2D<f64>, usize)> = (0..2000)
        .map(|i| {
            // Scatter deterministically over a 400x400 area.
            let x = ((i * 7919) % 397) as f64;
            let y = ((i * 104_729) % 389) as f64;
            (Aabb2D::from_xywh(x, y, 4.0, 4.0), i)
        })
        .collect();

    let mut incremental = RTree::new();
    for &(bbox, i) in &boxes {
        incremental.insert(bbox, i);
    }
    let mut packed = RTree::new();
    packed.bulk_load(boxes.iter().copied());

    for (name, tree) in [("incremental", &incremental), ("bulk", &packed)] {
        println!("{name}: height {}", tree.height());
        for (depth, level) in tree.level_bounds().iter().enumerate() {
            println!(
                "  depth {depth}: {} nodes, sibling overlap {:.1}",
                level.len(),
                overlap_area(level)
            );
        }
        tree.validate().unwrap();
    }
}
