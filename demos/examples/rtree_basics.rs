// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree basics.
//!
//! Insert boxes with both split policies, query, remove, and validate.
//!
//! Run:
//! - `cargo run -p kerf_demos --example rtree_basics`

use kerf_index::{Aabb2D, RTree, RTreeConfig, SplitPolicy};

fn main() {
    env_logger::init();

    for split in [SplitPolicy::Linear, SplitPolicy::Quadratic] {
        let config = RTreeConfig::new(6, 2).with_split(split);
        let mut tree: RTree<i64, u32> = RTree::with_config(config).unwrap();
        for i in 0..100_u32 {
            let x = i64::from(i % 10) * 12;
            let y = i64::from(i / 10) * 12;
            tree.insert(Aabb2D::new(x, y, x + 10, y + 10), i);
        }
        println!("{split:?}: {} entries, height {}", tree.len(), tree.height());

        let mut hits = Vec::new();
        tree.query_rect(Aabb2D::new(15, 15, 30, 30), &mut hits);
        hits.sort_unstable();
        println!("  overlapping (15,15)-(30,30): {hits:?}");

        // Remove every other row; underfilled nodes are dissolved and reinserted.
        for i in (0..100_u32).filter(|i| (i / 10) % 2 == 0) {
            let x = i64::from(i % 10) * 12;
            let y = i64::from(i / 10) * 12;
            assert!(tree.remove(Aabb2D::new(x, y, x + 10, y + 10), i));
        }
        hits.clear();
        tree.query_point(13, 13, &mut hits);
        println!("  after removals: {} entries, hits at (13,13): {hits:?}", tree.len());
        tree.validate().unwrap();
    }
}
