// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sort-Tile-Recursive bulk loading.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Range;

use super::{NodeIdx, RChild, RNode, RTree};
use crate::types::{Aabb2D, Scalar, cmp_t};

impl<T: Scalar, P: Copy + Ord + Debug> RTree<T, P> {
    /// Add many entries at once and repack the whole tree.
    ///
    /// Entries already in the tree are kept. The tree is rebuilt bottom-up: each
    /// level is sorted by center x, cut into vertical slices, each slice is
    /// sorted by center y in alternating direction, and the resulting sequence
    /// is grouped into nodes of `max_record` children. The result answers
    /// queries exactly like a tree built by repeated [`insert`](Self::insert)
    /// but usually has less overlap between siblings.
    pub fn bulk_load<I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = (Aabb2D<T>, P)>,
    {
        let mut level: Vec<RChild<T, P>> = self
            .entries()
            .map(|(bbox, handle)| RChild::Item { bbox, handle })
            .collect();
        level.extend(
            entities
                .into_iter()
                .map(|(bbox, handle)| RChild::Item { bbox, handle }),
        );
        self.clear();
        self.len = level.len();
        self.root = self.pack(level);
        log::debug!(
            "rtree: bulk loaded {} entries, height {}",
            self.len,
            self.height()
        );
    }

    fn pack(&mut self, mut level: Vec<RChild<T, P>>) -> Option<NodeIdx> {
        if level.is_empty() {
            return None;
        }
        let max = self.config.max_record;
        let min = self.config.min_record;
        let mut leaf = true;
        loop {
            self.tile(&mut level);
            let mut next = Vec::new();
            let mut rest = level.into_iter();
            for group in divide(rest.len(), max, min) {
                let children: Vec<_> = rest.by_ref().take(group.len()).collect();
                let bbox = Self::node_bbox(&self.arena, &children);
                let idx = self.alloc(RNode {
                    bbox,
                    leaf,
                    children,
                });
                next.push(RChild::Node(idx));
            }
            leaf = false;
            if let [RChild::Node(root)] = next.as_slice() {
                return Some(*root);
            }
            level = next;
        }
    }

    /// Reorder one level into boustrophedon slice order.
    fn tile(&self, level: &mut [RChild<T, P>]) {
        let max = self.config.max_record;
        let n = level.len();
        let num_nodes = n.div_ceil(max);
        let mut slices = 1_usize;
        while slices * slices < num_nodes {
            slices += 1;
        }
        let arena = &self.arena;
        let center = |c: &RChild<T, P>| Self::child_bbox(arena, c).center();
        level.sort_by(|a, b| cmp_t(&center(a).0, &center(b).0));
        let slice_size = n.div_ceil(slices);
        for (i, slice) in level.chunks_mut(slice_size).enumerate() {
            if i % 2 == 0 {
                slice.sort_by(|a, b| cmp_t(&center(a).1, &center(b).1));
            } else {
                slice.sort_by(|a, b| cmp_t(&center(b).1, &center(a).1));
            }
        }
    }
}

/// Cut `len` consecutive items into groups of `max`.
///
/// A tail that would leave the last group under `min` is shared evenly between
/// the last two groups instead.
fn divide(len: usize, max: usize, min: usize) -> Vec<Range<usize>> {
    let mut groups = Vec::with_capacity(len.div_ceil(max));
    let mut start = 0;
    while start < len {
        let left = len - start;
        if left <= max {
            groups.push(start..len);
            break;
        }
        if left < max + min {
            let half = left / 2;
            groups.push(start..start + half);
            groups.push(start + half..len);
            break;
        }
        groups.push(start..start + max);
        start += max;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RTreeConfig;
    use alloc::vec;

    #[test]
    fn divide_never_underfills() {
        for len in 1..200 {
            let groups = divide(len, 13, 5);
            assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), len);
            if groups.len() > 1 {
                for g in &groups {
                    assert!((5..=13).contains(&g.len()), "len {len}: {groups:?}");
                }
            }
        }
    }

    #[test]
    fn divide_splits_short_tail_in_half() {
        assert_eq!(divide(15, 13, 5), vec![0..7, 7..15]);
        assert_eq!(divide(26, 13, 5), vec![0..13, 13..26]);
        assert_eq!(divide(13, 13, 5), vec![0..13]);
    }

    #[test]
    fn bulk_load_builds_valid_tree() {
        let mut t: RTree<f64, u32> = RTree::with_config(RTreeConfig::new(6, 3)).unwrap();
        let items: Vec<_> = (0..500_u32)
            .map(|i| {
                let x = f64::from(i % 25) * 4.0;
                let y = f64::from(i / 25) * 4.0;
                (Aabb2D::from_xywh(x, y, 3.0, 3.0), i)
            })
            .collect();
        t.bulk_load(items);
        t.validate().unwrap();
        assert_eq!(t.len(), 500);
        let mut out = Vec::new();
        assert_eq!(t.query_point(1.0, 1.0, &mut out), 1);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn bulk_load_keeps_existing_entries() {
        let mut t: RTree<i64, u32> = RTree::new();
        t.insert(Aabb2D::new(0, 0, 1, 1), 1);
        t.bulk_load((2..40).map(|i| (Aabb2D::new(i * 3, 0, i * 3 + 1, 1), i as u32)));
        t.validate().unwrap();
        assert_eq!(t.len(), 39);
        let mut out = Vec::new();
        t.query_point(0, 0, &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn bulk_load_of_nothing_is_empty() {
        let mut t: RTree<i64, u32> = RTree::new();
        t.bulk_load(core::iter::empty());
        assert!(t.is_empty());
        assert_eq!(t.height(), 0);
        t.validate().unwrap();
    }
}
