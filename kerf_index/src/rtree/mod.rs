// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree generic over scalar `T: Scalar` and an opaque payload `P`.
//!
//! Nodes live in an arena and refer to each other by index. Freed nodes are
//! recycled through a free list, so long insert/remove sequences do not grow
//! the arena without bound.
//!
//! ## Insertion
//!
//! An entry descends toward the leaf whose rectangle needs the least
//! enlargement (ties go to the smaller resulting area). An overflowing node is
//! split according to the configured [`SplitPolicy`](crate::SplitPolicy) and
//! the new sibling is handed to the parent, so each level splits at most once
//! per insert. A root split grows the tree by one level.
//!
//! ## Removal
//!
//! Removal searches every subtree whose rectangle overlaps the given one for
//! an entry carrying the handle. A node left with fewer than `min_record`
//! children is detached, its remaining entries become orphans, and the orphans
//! are reinserted from the top once the descent is finished. A root left with
//! a single child is replaced by that child.

mod bulk;
mod split;

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::RTreeConfig;
use crate::error::{ConfigError, InvariantError};
use crate::types::{Aabb2D, Scalar, area, union_aabb};

/// R-tree over `(rectangle, handle)` entries.
///
/// The tree does not interpret handles; it only compares them, so queries can
/// report each handle once even if it was indexed under several rectangles.
pub struct RTree<T: Scalar, P: Copy + Ord + Debug> {
    config: RTreeConfig,
    root: Option<NodeIdx>,
    arena: Vec<RNode<T, P>>,
    free: Vec<NodeIdx>,
    len: usize,
}

#[derive(Clone)]
struct RNode<T: Scalar, P: Copy + Ord + Debug> {
    bbox: Aabb2D<T>,
    leaf: bool,
    children: Vec<RChild<T, P>>,
}

#[derive(Copy, Clone)]
enum RChild<T: Scalar, P: Copy + Ord + Debug> {
    Node(NodeIdx),
    Item { bbox: Aabb2D<T>, handle: P },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

impl<T: Scalar, P: Copy + Ord + Debug> Default for RTree<T, P> {
    fn default() -> Self {
        Self {
            config: RTreeConfig::default(),
            root: None,
            arena: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T: Scalar, P: Copy + Ord + Debug> RTree<T, P> {
    /// Create an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with the given configuration.
    pub fn with_config(config: RTreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, 0 for an empty tree and 1 for a lone leaf root.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            height += 1;
            let node = &self.arena[idx.get()];
            cursor = match node.children.first() {
                Some(RChild::Node(child)) if !node.leaf => Some(*child),
                _ => None,
            };
        }
        height
    }

    /// Rectangle enclosing every entry, if any.
    pub fn bounds(&self) -> Option<Aabb2D<T>> {
        self.root.map(|r| self.arena[r.get()].bbox)
    }

    /// Remove every entry and release all nodes.
    pub fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.free.clear();
        self.len = 0;
    }

    /// Add an entry. Duplicate rectangles and duplicate handles are allowed.
    pub fn insert(&mut self, aabb: Aabb2D<T>, handle: P) {
        self.len += 1;
        self.insert_item(aabb, handle);
    }

    /// Remove the entry whose rectangle overlaps `aabb` and whose handle is `handle`.
    ///
    /// Returns false when no such entry exists.
    pub fn remove(&mut self, aabb: Aabb2D<T>, handle: P) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let mut orphans = Vec::new();
        if !self.remove_from(root, &aabb, handle, &mut orphans) {
            return false;
        }
        self.len -= 1;
        self.condense_root();
        if !orphans.is_empty() {
            log::trace!("rtree: reinserting {} orphaned entries", orphans.len());
        }
        for (bbox, handle) in orphans {
            self.insert_item(bbox, handle);
        }
        true
    }

    /// Append every distinct handle whose rectangle overlaps `rect` to `out`.
    ///
    /// Returns the number of handles appended.
    pub fn query_rect(&self, rect: Aabb2D<T>, out: &mut Vec<P>) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.bbox.overlaps(&rect) {
                continue;
            }
            for c in &n.children {
                match c {
                    RChild::Node(ci) => stack.push(*ci),
                    RChild::Item { bbox, handle } => {
                        if bbox.overlaps(&rect) && seen.insert(*handle) {
                            out.push(*handle);
                        }
                    }
                }
            }
        }
        seen.len()
    }

    /// Append every distinct handle whose rectangle contains the point to `out`.
    ///
    /// Returns the number of handles appended.
    pub fn query_point(&self, x: T, y: T, out: &mut Vec<P>) -> usize {
        self.query_rect(Aabb2D::from_point(x, y), out)
    }

    /// Iterate over all entries in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (Aabb2D<T>, P)> + '_ {
        self.arena
            .iter()
            .filter(|n| n.leaf)
            .flat_map(|n| n.children.iter())
            .filter_map(|c| match c {
                RChild::Item { bbox, handle } => Some((*bbox, *handle)),
                RChild::Node(_) => None,
            })
    }

    /// Node rectangles grouped by level, root level first.
    ///
    /// Meant for debugging dumps and tests; allocates.
    pub fn level_bounds(&self) -> Vec<Vec<Aabb2D<T>>> {
        let mut levels = Vec::new();
        let mut frontier: Vec<NodeIdx> = self.root.into_iter().collect();
        while !frontier.is_empty() {
            levels.push(frontier.iter().map(|i| self.arena[i.get()].bbox).collect());
            frontier = frontier
                .iter()
                .flat_map(|i| self.arena[i.get()].children.iter())
                .filter_map(|c| match c {
                    RChild::Node(ci) => Some(*ci),
                    RChild::Item { .. } => None,
                })
                .collect();
        }
        levels
    }

    /// Check fill bounds, cached rectangles, leaf depth and entry count.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut found = 0;
        if let Some(root) = self.root {
            let mut leaf_depth = None;
            self.validate_node(root, 0, &mut leaf_depth, &mut found)?;
        }
        if found != self.len {
            return Err(InvariantError::CountMismatch {
                expected: self.len,
                found,
            });
        }
        Ok(())
    }

    fn validate_node(
        &self,
        idx: NodeIdx,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        found: &mut usize,
    ) -> Result<(), InvariantError> {
        let node = &self.arena[idx.get()];
        let children = node.children.len();
        let min = if depth == 0 { 1 } else { self.config.min_record };
        if children < min {
            return Err(InvariantError::Underfilled {
                depth,
                children,
                min,
            });
        }
        if children > self.config.max_record {
            return Err(InvariantError::Overfilled {
                depth,
                children,
                max: self.config.max_record,
            });
        }
        if Self::node_bbox(&self.arena, &node.children) != node.bbox {
            return Err(InvariantError::StaleBounds { depth });
        }
        for c in &node.children {
            match (node.leaf, c) {
                (true, RChild::Item { .. }) => *found += 1,
                (false, RChild::Node(ci)) => {
                    self.validate_node(*ci, depth + 1, leaf_depth, found)?;
                }
                _ => return Err(InvariantError::MixedChildren { depth }),
            }
        }
        if node.leaf {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantError::UnevenDepth {
                        expected,
                        found: depth,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn alloc(&mut self, node: RNode<T, P>) -> NodeIdx {
        if let Some(idx) = self.free.pop() {
            self.arena[idx.get()] = node;
            idx
        } else {
            self.arena.push(node);
            NodeIdx::new(self.arena.len() - 1)
        }
    }

    fn release(&mut self, idx: NodeIdx) {
        self.arena[idx.get()].children.clear();
        self.free.push(idx);
    }

    fn child_bbox(arena: &[RNode<T, P>], c: &RChild<T, P>) -> Aabb2D<T> {
        match c {
            RChild::Node(i) => arena[i.get()].bbox,
            RChild::Item { bbox, .. } => *bbox,
        }
    }

    fn node_bbox(arena: &[RNode<T, P>], children: &[RChild<T, P>]) -> Aabb2D<T> {
        let mut it = children.iter();
        let first = match it.next() {
            Some(c) => Self::child_bbox(arena, c),
            None => Aabb2D::new(T::zero(), T::zero(), T::zero(), T::zero()),
        };
        it.fold(first, |acc, c| union_aabb(acc, Self::child_bbox(arena, c)))
    }

    fn refresh_bbox(&mut self, idx: NodeIdx) {
        let bbox = Self::node_bbox(&self.arena, &self.arena[idx.get()].children);
        self.arena[idx.get()].bbox = bbox;
    }

    fn insert_item(&mut self, bbox: Aabb2D<T>, handle: P) {
        let Some(root) = self.root else {
            let idx = self.alloc(RNode {
                bbox,
                leaf: true,
                children: vec![RChild::Item { bbox, handle }],
            });
            self.root = Some(idx);
            return;
        };
        if let Some(sibling) = self.insert_into(root, bbox, handle) {
            let new_bb = union_aabb(self.arena[root.get()].bbox, self.arena[sibling.get()].bbox);
            let new_root = self.alloc(RNode {
                bbox: new_bb,
                leaf: false,
                children: vec![RChild::Node(root), RChild::Node(sibling)],
            });
            self.root = Some(new_root);
            log::trace!("rtree: root split, height {}", self.height());
        }
    }

    /// Insert below `idx`; returns the new right sibling if `idx` had to split.
    fn insert_into(&mut self, idx: NodeIdx, bbox: Aabb2D<T>, handle: P) -> Option<NodeIdx> {
        if self.arena[idx.get()].leaf {
            let node = &mut self.arena[idx.get()];
            node.children.push(RChild::Item { bbox, handle });
            node.bbox = union_aabb(node.bbox, bbox);
        } else {
            let pos = self.choose_child(idx, &bbox);
            let RChild::Node(child) = self.arena[idx.get()].children[pos] else {
                unreachable!("internal node holds an entry");
            };
            let split = self.insert_into(child, bbox, handle);
            let node = &mut self.arena[idx.get()];
            node.bbox = union_aabb(node.bbox, bbox);
            if let Some(sibling) = split {
                node.children.insert(pos + 1, RChild::Node(sibling));
            }
        }
        if self.arena[idx.get()].children.len() > self.config.max_record {
            Some(self.split_node(idx))
        } else {
            None
        }
    }

    fn choose_child(&self, idx: NodeIdx, bbox: &Aabb2D<T>) -> usize {
        let children = &self.arena[idx.get()].children;
        assert!(
            !children.is_empty(),
            "corrupt R-tree: internal node without children"
        );
        let mut best_idx = 0_usize;
        let mut best: Option<(T::Acc, T::Acc)> = None;
        for (i, c) in children.iter().enumerate() {
            let cb = Self::child_bbox(&self.arena, c);
            let grown = area(&union_aabb(cb, *bbox));
            let cost = (grown - area(&cb), grown);
            let better = match best {
                None => true,
                Some((enlarge, size)) => cost.0 < enlarge || (cost.0 == enlarge && cost.1 < size),
            };
            if better {
                best = Some(cost);
                best_idx = i;
            }
        }
        best_idx
    }

    /// Split an overflowing node in place; returns the newly allocated sibling.
    fn split_node(&mut self, idx: NodeIdx) -> NodeIdx {
        let children = core::mem::take(&mut self.arena[idx.get()].children);
        let boxes: Vec<Aabb2D<T>> = children
            .iter()
            .map(|c| Self::child_bbox(&self.arena, c))
            .collect();
        let (left, right) = split::partition(self.config.split, &boxes, self.config.min_record);
        debug_assert_eq!(
            left.len() + right.len(),
            children.len(),
            "split must keep every child"
        );
        let leaf = self.arena[idx.get()].leaf;
        let left_children: Vec<_> = left.iter().map(|&i| children[i]).collect();
        let right_children: Vec<_> = right.iter().map(|&i| children[i]).collect();
        let l_bbox = Self::node_bbox(&self.arena, &left_children);
        let r_bbox = Self::node_bbox(&self.arena, &right_children);
        {
            let node = &mut self.arena[idx.get()];
            node.children = left_children;
            node.bbox = l_bbox;
        }
        log::trace!(
            "rtree: split {} node into {} + {}",
            if leaf { "leaf" } else { "internal" },
            left.len(),
            right.len()
        );
        self.alloc(RNode {
            bbox: r_bbox,
            leaf,
            children: right_children,
        })
    }

    fn remove_from(
        &mut self,
        idx: NodeIdx,
        aabb: &Aabb2D<T>,
        handle: P,
        orphans: &mut Vec<(Aabb2D<T>, P)>,
    ) -> bool {
        let node = &self.arena[idx.get()];
        if !node.bbox.overlaps(aabb) {
            return false;
        }
        if node.leaf {
            let hit = node.children.iter().position(|c| {
                matches!(c, RChild::Item { bbox, handle: h } if *h == handle && bbox.overlaps(aabb))
            });
            let Some(pos) = hit else {
                return false;
            };
            self.arena[idx.get()].children.remove(pos);
            self.refresh_bbox(idx);
            return true;
        }
        for pos in 0..self.arena[idx.get()].children.len() {
            let RChild::Node(child) = self.arena[idx.get()].children[pos] else {
                continue;
            };
            if !self.remove_from(child, aabb, handle, orphans) {
                continue;
            }
            if self.arena[child.get()].children.len() < self.config.min_record {
                self.arena[idx.get()].children.remove(pos);
                self.collect_entries(child, orphans);
            }
            self.refresh_bbox(idx);
            return true;
        }
        false
    }

    /// Move every entry below `idx` into `out` and free the subtree.
    fn collect_entries(&mut self, idx: NodeIdx, out: &mut Vec<(Aabb2D<T>, P)>) {
        let children = core::mem::take(&mut self.arena[idx.get()].children);
        for c in children {
            match c {
                RChild::Node(ci) => self.collect_entries(ci, out),
                RChild::Item { bbox, handle } => out.push((bbox, handle)),
            }
        }
        self.release(idx);
    }

    fn condense_root(&mut self) {
        while let Some(root) = self.root {
            let node = &self.arena[root.get()];
            match (node.leaf, node.children.as_slice()) {
                (_, []) => {
                    self.release(root);
                    self.root = None;
                }
                (false, [RChild::Node(only)]) => {
                    let only = *only;
                    self.release(root);
                    self.root = Some(only);
                    log::trace!("rtree: root collapsed, height {}", self.height());
                }
                _ => break,
            }
        }
    }
}

impl<T: Scalar, P: Copy + Ord + Debug> Debug for RTree<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("config", &self.config)
            .field("len", &self.len)
            .field("height", &self.height())
            .field("arena_nodes", &self.arena.len())
            .field("free_nodes", &self.free.len())
            .finish_non_exhaustive()
    }
}

/// R-tree with i64 coordinates and i128 metrics.
pub type RTreeI64<P> = RTree<i64, P>;

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32<P> = RTree<f32, P>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64<P> = RTree<f64, P>;
