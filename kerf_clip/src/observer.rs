// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optional hooks into the clipping process.

use crate::curve::Segment;
use crate::resolve::IntersectionRecord;
use crate::types::{ContourFlags, ContourId, EdgeId};

/// Receives progress events from [`Clipper::add_path_observed`].
///
/// Every method has an empty default, so implementors override only what they
/// need. Events fire synchronously, in processing order, while the mesh is
/// being mutated; implementations must not assume contour ids seen in one
/// event survive the next.
///
/// [`Clipper::add_path_observed`]: crate::Clipper::add_path_observed
pub trait ClipObserver {
    /// A segment was accepted for processing (after normalization).
    fn segment_added(&mut self, segment: &Segment) {
        let _ = segment;
    }

    /// Crossings of `segment` with existing edges were found and ordered.
    ///
    /// `records` are sorted by the parameter on `segment`.
    fn intersections_resolved(&mut self, segment: &Segment, records: &[IntersectionRecord]) {
        let _ = (segment, records);
    }

    /// An existing edge was replaced by `pieces`.
    fn edge_split(&mut self, edge: EdgeId, pieces: &[EdgeId]) {
        let _ = (edge, pieces);
    }

    /// A cubic crossed itself at parameters `s < t`.
    fn self_intersection(&mut self, segment: &Segment, s: f64, t: f64) {
        let _ = (segment, s, t);
    }

    /// A contour was closed into a loop or left open at the end of a sub-path.
    fn contour_finished(&mut self, contour: ContourId, flags: ContourFlags) {
        let _ = (contour, flags);
    }
}

/// An observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ClipObserver for NoopObserver {}
