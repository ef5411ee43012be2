// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=kerf_index --heading-base-level=0

//! Kerf Index: a payload-agnostic 2D R-tree.
//!
//! Kerf Index stores `(rectangle, handle)` pairs and answers "what overlaps
//! this rectangle" queries. It knows nothing about what the handles refer to,
//! so the same tree serves the clipping kernel in `kerf_clip` and any other
//! code that needs overlap tests between boxes.
//!
//! - Insert and remove single entries. Overflowing nodes split with a
//!   [linear or quadratic](SplitPolicy) heuristic; underfilled nodes are
//!   dissolved and their entries reinserted.
//! - Query by point or rectangle. Each handle is reported once per query even
//!   if it is indexed under several rectangles.
//! - Bulk load with Sort-Tile-Recursive packing.
//! - [`RTree::validate`] checks the structural invariants and reports the first
//!   violation as an [`InvariantError`].
//!
//! It is generic over the scalar type `T` (`f32`, `f64`, `i64`) and uses
//! widened accumulator types (f32→f64, f64→f64, i64→i128) for area metrics.
//!
//! # Example
//!
//! ```rust
//! use kerf_index::{Aabb2D, RTree, RTreeConfig, SplitPolicy};
//!
//! let config = RTreeConfig::new(8, 3).with_split(SplitPolicy::Linear);
//! let mut tree: RTree<i64, u32> = RTree::with_config(config).unwrap();
//! tree.insert(Aabb2D::new(0, 0, 10, 10), 1);
//! tree.insert(Aabb2D::new(5, 5, 15, 15), 2);
//!
//! let mut hits = Vec::new();
//! assert_eq!(tree.query_point(6, 6, &mut hits), 2);
//!
//! assert!(tree.remove(Aabb2D::new(0, 0, 10, 10), 1));
//! hits.clear();
//! assert_eq!(tree.query_point(6, 6, &mut hits), 1);
//! assert_eq!(hits, [2]);
//! ```
//!
//! Bulk loading packs a whole set at once:
//!
//! ```rust
//! use kerf_index::{Aabb2D, RTree};
//!
//! let mut tree: RTree<f64, usize> = RTree::new();
//! tree.bulk_load((0..1000).map(|i| {
//!     let x = (i % 40) as f64 * 2.0;
//!     let y = (i / 40) as f64 * 2.0;
//!     (Aabb2D::from_xywh(x, y, 1.5, 1.5), i)
//! }));
//! assert!(tree.validate().is_ok());
//!
//! let mut hits = Vec::new();
//! tree.query_rect(Aabb2D::new(0.0, 0.0, 3.0, 3.0), &mut hits);
//! assert_eq!(hits.len(), 4);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. NaN comparisons
//! are treated as "equal" when sorting and as "no overlap" when querying.

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;
pub mod rtree;
pub mod types;

pub use config::{RTreeConfig, SplitPolicy};
pub use error::{ConfigError, InvariantError};
pub use rtree::{RTree, RTreeF32, RTreeF64, RTreeI64};
pub use types::{Aabb2D, Scalar};
