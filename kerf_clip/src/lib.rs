// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=kerf_clip --heading-base-level=0

//! Kerf Clip: a curve-aware 2D path clipping kernel.
//!
//! Kerf Clip takes paths made of lines, quadratic and cubic Béziers and cuts
//! them at every place they cross, producing a mesh of simple, non-crossing
//! strips (open chains) and loops (closed chains). It is the bottom layer of a
//! boolean-operations stack: winding classification and fill rules live above
//! it.
//!
//! - Exact pairwise intersection of line, quad and cubic segments, see
//!   [`intersect`]. Line pairs and line/curve pairs are solved in closed form,
//!   quad pairs through a quartic, and cubic pairs through quadratic
//!   approximation. Curve pairs are additionally bracketed by subdivision,
//!   and every candidate is refined with Newton's method on the original
//!   curves.
//! - A half-edge [`Mesh`] whose twins mirror every link, so a contour can be
//!   walked in either direction.
//! - Crossing resolution: each new segment is tested against overlapping edges
//!   found through a [`kerf_index::RTree`]. Crossed edges are split, the chains
//!   are re-linked at the crossings and the affected contours are rebuilt.
//! - Self-intersecting cubics are split into a head, a loop and a tail.
//!
//! ## Example
//!
//! ```rust
//! use kerf_clip::{ClipOptions, Clipper, ContourFlags};
//! use kurbo::{BezPath, Rect, Shape};
//!
//! let mut clipper = Clipper::with_options(ClipOptions {
//!     isolate_subpaths: false,
//!     ..ClipOptions::default()
//! })
//! .unwrap();
//! let a = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1);
//! let b = Rect::new(5.0, 5.0, 15.0, 15.0).to_path(0.1);
//! let mut both = BezPath::new();
//! both.extend(a);
//! both.extend(b);
//!
//! let summary = clipper.add_path(both).unwrap();
//! assert_eq!(summary.intersections, 2);
//! assert_eq!(clipper.loops().len(), 2);
//! for (_, contour) in clipper.contours() {
//!     assert!(contour.flags().contains(ContourFlags::CROSSED));
//! }
//! clipper.validate_simple().unwrap();
//! ```
//!
//! ## Tolerances
//!
//! Intersections within [`Tolerances::endpoint`] of an endpoint of an input
//! segment are treated as shared vertices and never split anything. Points
//! where an earlier crossing was split are not endpoints in this sense, so
//! closely spaced crossings all resolve. Near-linear curves are
//! demoted to lines according to [`Tolerances::flatness`]. See [`Tolerances`]
//! for the full set.
//!
//! Input coordinates must be finite; a NaN or infinite coordinate rejects its
//! sub-path with [`ClipError::NonFiniteCoordinate`].

mod clipper;
mod curve;
mod error;
mod intersect;
mod mesh;
mod observer;
pub mod poly;
mod resolve;
pub mod tolerance;
mod types;

pub use clipper::{ClipOptions, ClipSummary, Clipper};
pub use curve::{QuadPiece, Segment, cubic_inflections, cubic_self_intersection, cubic_to_quads};
pub use error::{ClipError, ErrorKind, InvariantViolation};
pub use intersect::{Hit, intersect, intersect_anchored};
pub use mesh::{Contour, Mesh};
pub use observer::{ClipObserver, NoopObserver};
pub use resolve::IntersectionRecord;
pub use tolerance::{Tolerances, tolerance_correct};
pub use types::{ContourFlags, ContourId, EdgeId, SegmentId};
