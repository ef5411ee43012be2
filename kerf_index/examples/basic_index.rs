// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Kerf Index: insert, query, remove, and bulk load.

use kerf_index::{Aabb2D, RTree};

fn main() {
    let mut tree: RTree<i64, u32> = RTree::new();
    tree.insert(Aabb2D::new(0, 0, 10, 10), 1);
    tree.insert(Aabb2D::new(5, 5, 15, 15), 2);

    let mut hits = Vec::new();
    tree.query_point(6, 6, &mut hits);
    println!("hits at (6,6): {hits:?}");

    // Move box 1: remove it under its old rectangle, insert under the new one.
    tree.remove(Aabb2D::new(0, 0, 10, 10), 1);
    tree.insert(Aabb2D::new(20, 0, 30, 10), 1);
    hits.clear();
    tree.query_rect(Aabb2D::new(0, 0, 25, 25), &mut hits);
    println!("hits in (0,0)-(25,25): {hits:?}");

    // Bulk loading merges with what is already there.
    tree.bulk_load((3..50).map(|i| (Aabb2D::new(i * 3, 40, i * 3 + 2, 42), i as u32)));
    println!("{} entries, height {}", tree.len(), tree.height());
    tree.validate().unwrap();
}
