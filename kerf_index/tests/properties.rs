// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks of query correctness and structural invariants.

use kerf_index::{Aabb2D, RTree, RTreeConfig, SplitPolicy};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
enum Op {
    Insert { x: i16, y: i16, w: u8, h: u8 },
    Remove { idx: u16 },
    Query { x: i16, y: i16, w: u8, h: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<i16>(), any::<i16>(), any::<u8>(), any::<u8>())
            .prop_map(|(x, y, w, h)| Op::Insert { x, y, w, h }),
        1 => any::<u16>().prop_map(|idx| Op::Remove { idx }),
        1 => (any::<i16>(), any::<i16>(), any::<u8>(), any::<u8>())
            .prop_map(|(x, y, w, h)| Op::Query { x, y, w, h }),
    ]
}

fn rect(x: i16, y: i16, w: u8, h: u8) -> Aabb2D<i64> {
    let (x, y) = (i64::from(x), i64::from(y));
    Aabb2D::new(x, y, x + i64::from(w), y + i64::from(h))
}

fn brute_force(model: &[(Aabb2D<i64>, u32)], query: &Aabb2D<i64>) -> BTreeSet<u32> {
    model
        .iter()
        .filter(|(bbox, _)| bbox.overlaps(query))
        .map(|(_, h)| *h)
        .collect()
}

fn run(config: RTreeConfig, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut tree: RTree<i64, u32> = RTree::with_config(config).unwrap();
    let mut model: Vec<(Aabb2D<i64>, u32)> = Vec::new();
    let mut next = 0_u32;
    for op in ops {
        match op {
            Op::Insert { x, y, w, h } => {
                let bbox = rect(x, y, w, h);
                tree.insert(bbox, next);
                model.push((bbox, next));
                next += 1;
            }
            Op::Remove { idx } => {
                if model.is_empty() {
                    continue;
                }
                let (bbox, handle) = model.swap_remove(usize::from(idx) % model.len());
                prop_assert!(tree.remove(bbox, handle));
            }
            Op::Query { x, y, w, h } => {
                let query = rect(x, y, w, h);
                let mut out = Vec::new();
                let count = tree.query_rect(query, &mut out);
                prop_assert_eq!(count, out.len());
                let got: BTreeSet<u32> = out.iter().copied().collect();
                prop_assert_eq!(got.len(), out.len(), "duplicate handles");
                prop_assert_eq!(got, brute_force(&model, &query));
            }
        }
        prop_assert_eq!(tree.validate(), Ok(()));
        prop_assert_eq!(tree.len(), model.len());
    }
    Ok(())
}

proptest! {
    #[test]
    fn quadratic_matches_brute_force(ops in proptest::collection::vec(op_strategy(), 1..300)) {
        run(RTreeConfig::new(6, 2).with_split(SplitPolicy::Quadratic), ops)?;
    }

    #[test]
    fn linear_matches_brute_force(ops in proptest::collection::vec(op_strategy(), 1..300)) {
        run(RTreeConfig::new(5, 2).with_split(SplitPolicy::Linear), ops)?;
    }

    #[test]
    fn bulk_load_answers_like_inserts(
        rects in proptest::collection::vec((any::<i16>(), any::<i16>(), any::<u8>(), any::<u8>()), 0..400),
        queries in proptest::collection::vec((any::<i16>(), any::<i16>(), any::<u8>(), any::<u8>()), 1..20),
    ) {
        let entries: Vec<(Aabb2D<i64>, u32)> = rects
            .iter()
            .zip(0_u32..)
            .map(|(&(x, y, w, h), i)| (rect(x, y, w, h), i))
            .collect();
        let mut inserted: RTree<i64, u32> = RTree::new();
        for (bbox, h) in &entries {
            inserted.insert(*bbox, *h);
        }
        let mut bulk: RTree<i64, u32> = RTree::new();
        bulk.bulk_load(entries.iter().copied());
        prop_assert_eq!(bulk.validate(), Ok(()));
        for (x, y, w, h) in queries {
            let query = rect(x, y, w, h);
            let (mut a, mut b) = (Vec::new(), Vec::new());
            inserted.query_rect(query, &mut a);
            bulk.query_rect(query, &mut b);
            a.sort_unstable();
            b.sort_unstable();
            prop_assert_eq!(a, b);
        }
    }
}

#[test]
fn remove_after_bulk_load_keeps_invariants() {
    let mut tree: RTree<i64, u32> = RTree::with_config(RTreeConfig::new(4, 2)).unwrap();
    let entries: Vec<_> = (0..200_i64)
        .map(|i| (Aabb2D::new(i, i % 7, i + 3, i % 7 + 3), i as u32))
        .collect();
    tree.bulk_load(entries.iter().copied());
    for (bbox, h) in entries.iter().step_by(2) {
        assert!(tree.remove(*bbox, *h));
        tree.validate().unwrap();
    }
    assert_eq!(tree.len(), 100);
}
