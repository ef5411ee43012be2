// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

/// A structural defect found by [`RTree::validate`](crate::RTree::validate).
///
/// Any of these indicates a bug in the tree itself, never bad input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantError {
    /// A non-root node (or an empty root) has too few children.
    #[error("node at depth {depth} holds {children} children, fewer than the minimum {min}")]
    Underfilled {
        /// Depth of the node, root is 0.
        depth: usize,
        /// Number of children found.
        children: usize,
        /// Configured minimum.
        min: usize,
    },
    /// A node has more children than allowed.
    #[error("node at depth {depth} holds {children} children, more than the maximum {max}")]
    Overfilled {
        /// Depth of the node, root is 0.
        depth: usize,
        /// Number of children found.
        children: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A node's cached rectangle differs from the union of its children.
    #[error("node at depth {depth} caches a rectangle that is not the union of its children")]
    StaleBounds {
        /// Depth of the node, root is 0.
        depth: usize,
    },
    /// Leaves sit at different depths.
    #[error("leaf at depth {found} while other leaves sit at depth {expected}")]
    UnevenDepth {
        /// Depth of the first leaf seen.
        expected: usize,
        /// Depth of the offending leaf.
        found: usize,
    },
    /// A leaf holds a child node, or an internal node holds an entry.
    #[error("node at depth {depth} mixes entries and child nodes")]
    MixedChildren {
        /// Depth of the node, root is 0.
        depth: usize,
    },
    /// The cached entry count disagrees with the leaves.
    #[error("tree reports {expected} entries but its leaves hold {found}")]
    CountMismatch {
        /// Cached count.
        expected: usize,
        /// Entries reachable from the root.
        found: usize,
    },
}

/// Rejected [`RTreeConfig`](crate::RTreeConfig) values.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_record` below 2 cannot be split.
    #[error("max_record must be at least 2, got {0}")]
    MaxTooSmall(usize),
    /// `min_record` of zero would allow empty nodes.
    #[error("min_record must be at least 1")]
    MinTooSmall,
    /// Both halves of a split could not be filled.
    #[error("min_record {min} exceeds half of max_record {max}")]
    MinTooLarge {
        /// Requested minimum.
        min: usize,
        /// Requested maximum.
        max: usize,
    },
}
