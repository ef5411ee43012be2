// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The clipping session: walks paths and feeds their segments to the resolver.

use std::collections::HashSet;

use arrayvec::ArrayVec;
use kerf_index::{ConfigError, RTree, RTreeConfig};
use kurbo::{BezPath, CubicBez, Line, PathEl, Point, QuadBez};

use crate::curve::{Segment, cubic_self_intersection};
use crate::error::{ClipError, InvariantViolation};
use crate::intersect::intersect_anchored;
use crate::mesh::{Contour, Mesh};
use crate::observer::{ClipObserver, NoopObserver};
use crate::resolve::{Kernel, rect_to_aabb};
use crate::tolerance::Tolerances;
use crate::types::{ContourFlags, ContourId, EdgeId};

/// Settings for a [`Clipper`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipOptions {
    /// Numeric thresholds for the geometry.
    pub tolerances: Tolerances,
    /// A strip whose ends are this close is closed into a loop.
    pub close_tolerance: f64,
    /// Start every sub-path with an empty spatial index, so sub-paths are not
    /// resolved against each other. Disable to clip several sub-paths or paths
    /// against each other through one session.
    pub isolate_subpaths: bool,
    /// Spatial index configuration.
    pub index: RTreeConfig,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            close_tolerance: 1e-6,
            isolate_subpaths: true,
            index: RTreeConfig::default(),
        }
    }
}

/// Counts reported by [`Clipper::add_path`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipSummary {
    /// Sub-paths processed.
    pub subpaths: usize,
    /// Segments accepted after dropping degenerate ones.
    pub segments: usize,
    /// Crossings resolved between segments.
    pub intersections: usize,
    /// Cubics that crossed themselves.
    pub self_intersections: usize,
}

impl ClipSummary {
    fn absorb(&mut self, other: Self) {
        self.subpaths += other.subpaths;
        self.segments += other.segments;
        self.intersections += other.intersections;
        self.self_intersections += other.self_intersections;
    }
}

/// A clipping session.
///
/// Paths added to a session are split at every crossing found through the
/// spatial index and re-linked into simple strips and loops. The session owns
/// all edges it creates and drops them together on [`reset`](Self::reset).
#[derive(Debug)]
pub struct Clipper {
    options: ClipOptions,
    kernel: Kernel,
    /// Sub-paths started in this session; the first element of every path id.
    subpaths: u32,
    /// Edges from this arena index on must be in the spatial index.
    indexed_from: usize,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipper {
    /// A session with default options.
    pub fn new() -> Self {
        let options = ClipOptions::default();
        Self {
            kernel: Kernel::with_index(options.tolerances, RTree::new()),
            options,
            subpaths: 0,
            indexed_from: 0,
        }
    }

    /// A session with the given options.
    pub fn with_options(options: ClipOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            kernel: Kernel::new(options.tolerances, options.index)?,
            options,
            subpaths: 0,
            indexed_from: 0,
        })
    }

    /// The session's options.
    pub fn options(&self) -> &ClipOptions {
        &self.options
    }

    /// Drop every edge, contour and index entry.
    pub fn reset(&mut self) {
        self.kernel.mesh.clear();
        self.kernel.index.clear();
        self.kernel.tail = None;
        self.subpaths = 0;
        self.indexed_from = 0;
    }

    /// Clip `path` into the session.
    pub fn add_path<I>(&mut self, path: I) -> Result<ClipSummary, ClipError>
    where
        I: IntoIterator<Item = PathEl>,
    {
        self.add_path_observed(path, &mut NoopObserver)
    }

    /// Clip `path` into the session, reporting progress to `observer`.
    ///
    /// Each sub-path is validated before it touches the mesh. On an input
    /// error the offending sub-path is skipped entirely and the error
    /// returned; sub-paths before it stay committed.
    pub fn add_path_observed<I>(&mut self, path: I, observer: &mut dyn ClipObserver) -> Result<ClipSummary, ClipError>
    where
        I: IntoIterator<Item = PathEl>,
    {
        let elements: Vec<PathEl> = path.into_iter().collect();
        let mut summary = ClipSummary::default();
        let mut start = 0;
        while start < elements.len() {
            if !matches!(elements[start], PathEl::MoveTo(_)) {
                return Err(ClipError::MissingMoveTo { index: start });
            }
            let len = elements[start + 1..]
                .iter()
                .position(|el| matches!(el, PathEl::MoveTo(_)))
                .map_or(elements.len() - start, |n| n + 1);
            let sub = &elements[start..start + len];
            validate_subpath(sub, start)?;
            summary.absorb(self.clip_subpath(sub, observer)?);
            start += len;
        }
        Ok(summary)
    }

    fn clip_subpath(&mut self, elements: &[PathEl], observer: &mut dyn ClipObserver) -> Result<ClipSummary, ClipError> {
        let PathEl::MoveTo(origin) = elements[0] else {
            unreachable!("sub-paths start with MoveTo");
        };
        if self.options.isolate_subpaths {
            self.kernel.index.clear();
            self.indexed_from = self.kernel.mesh.edge_count();
        }
        self.kernel.tail = None;
        let subpath = self.subpaths;
        self.subpaths += 1;

        let mut summary = ClipSummary {
            subpaths: 1,
            ..ClipSummary::default()
        };
        let mut walker = Walker {
            subpath,
            next_id: 0,
            current: origin,
        };
        for el in &elements[1..] {
            let seg = match *el {
                PathEl::LineTo(p) => Segment::Line(Line::new(walker.current, p)),
                PathEl::QuadTo(c, p) => Segment::Quad(QuadBez::new(walker.current, c, p)),
                PathEl::CurveTo(c1, c2, p) => Segment::Cubic(CubicBez::new(walker.current, c1, c2, p)),
                PathEl::ClosePath => {
                    if walker.current.distance(origin) <= self.options.close_tolerance {
                        continue;
                    }
                    Segment::Line(Line::new(walker.current, origin))
                }
                PathEl::MoveTo(_) => unreachable!("sub-paths hold a single MoveTo"),
            };
            walker.current = seg.end();
            self.add_drawn(seg, &mut walker, &mut summary, observer)?;
        }

        if let Some(c) = self.kernel.tail.and_then(|t| self.kernel.mesh.host_contour(t)) {
            self.kernel.mesh.try_finish(c, self.options.close_tolerance);
            self.finished(c, observer);
        }
        Ok(summary)
    }

    fn add_drawn(
        &mut self,
        seg: Segment,
        walker: &mut Walker,
        summary: &mut ClipSummary,
        observer: &mut dyn ClipObserver,
    ) -> Result<(), ClipError> {
        if seg.is_degenerate() {
            log::trace!("clip: dropping degenerate segment {seg:?}");
            return Ok(());
        }
        let tol = self.options.tolerances;
        let seg = seg.normalize(tol.flatness);
        observer.segment_added(&seg);
        summary.segments += 1;

        let split = match seg {
            Segment::Cubic(c) => cubic_self_intersection(&c).filter(|&(s, t)| s > tol.param && t < 1.0 - tol.param),
            _ => None,
        };
        let anchors = [seg.start(), seg.end()];
        let Some((s, t)) = split else {
            let added = self.kernel.add_segment(seg, anchors, true, &walker.ids(), observer)?;
            summary.intersections += added.crossings;
            return Ok(());
        };

        observer.self_intersection(&seg, s, t);
        summary.self_intersections += 1;
        log::debug!("clip: cubic crosses itself at {s:.6} and {t:.6}");
        let [head, mid, tail] = seg.split_at2(s, t);
        let x = head.end();
        let mid = mid.with_endpoints(x, x);
        let tail = tail.with_endpoints(x, tail.end());

        for (piece, attach) in [(head, true), (mid, false), (tail, true)] {
            if piece.is_degenerate() {
                continue;
            }
            let added = self.kernel.add_segment(piece, anchors, attach, &walker.ids(), observer)?;
            summary.intersections += added.crossings;
            if !attach
                && let Some(&last) = added.pieces.last()
                && let Some(c) = self.kernel.mesh.host_contour(last)
                && self.kernel.mesh.try_finish(c, self.options.close_tolerance)
            {
                self.kernel.mesh.mark(c, ContourFlags::SELF_LOOP);
                self.finished(c, observer);
            }
        }
        Ok(())
    }

    fn finished(&self, c: ContourId, observer: &mut dyn ClipObserver) {
        if let Some(contour) = self.kernel.mesh.contour(c) {
            log::debug!(
                "clip: contour {c:?} finished with {} edge(s), {:?}",
                self.kernel.mesh.contour_edges(c).len(),
                contour.flags()
            );
            observer.contour_finished(c, contour.flags());
        }
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.kernel.mesh
    }

    /// All strips and loops.
    pub fn contours(&self) -> impl Iterator<Item = (ContourId, &Contour)> + '_ {
        self.kernel.mesh.contours()
    }

    /// Ids of the closed contours.
    pub fn loops(&self) -> Vec<ContourId> {
        self.contours()
            .filter(|(_, c)| c.is_closed())
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids of the open contours.
    pub fn strips(&self) -> Vec<ContourId> {
        self.contours()
            .filter(|(_, c)| !c.is_closed())
            .map(|(id, _)| id)
            .collect()
    }

    /// One contour as a path.
    pub fn contour_path(&self, c: ContourId) -> Option<BezPath> {
        self.kernel
            .mesh
            .contour(c)
            .map(|_| self.kernel.mesh.contour_to_path(c))
    }

    /// Every contour as a path, in contour order.
    pub fn to_paths(&self) -> Vec<BezPath> {
        self.contours()
            .map(|(id, _)| self.kernel.mesh.contour_to_path(id))
            .collect()
    }

    /// Check the mesh and that the spatial index holds exactly the live
    /// forward edges created since it was last cleared.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mesh = &self.kernel.mesh;
        mesh.validate(self.options.close_tolerance.max(1e-6))?;
        self.kernel.index.validate()?;
        let mut seen = HashSet::new();
        for (bbox, e) in self.kernel.index.entries() {
            if !mesh.is_alive(e)
                || !mesh.is_forward(e)
                || e.index() < self.indexed_from
                || bbox != rect_to_aabb(mesh.bounds(e))
                || !seen.insert(e)
            {
                return Err(InvariantViolation::StaleIndexEntry(e));
            }
        }
        for i in (self.indexed_from..mesh.edge_count()).step_by(2) {
            let e = EdgeId::new(i);
            if mesh.is_alive(e) && !seen.contains(&e) {
                return Err(InvariantViolation::MissingIndexEntry(e));
            }
        }
        Ok(())
    }

    /// [`validate`](Self::validate), then check that no two edges resolved
    /// against each other still cross.
    ///
    /// Candidate pairs come from an R-tree over every live forward edge. With
    /// [`isolate_subpaths`](ClipOptions::isolate_subpaths) only edges of the
    /// same sub-path are compared, since separate sub-paths are never
    /// resolved against each other.
    pub fn validate_simple(&self) -> Result<(), InvariantViolation> {
        self.validate()?;
        let mesh = &self.kernel.mesh;
        let tol = &self.options.tolerances;
        let mut tree = RTree::new();
        tree.bulk_load(
            (0..mesh.edge_count())
                .step_by(2)
                .map(EdgeId::new)
                .filter(|&e| mesh.is_alive(e))
                .map(|e| (rect_to_aabb(mesh.bounds(e)), e)),
        );
        let mut candidates = Vec::new();
        for (bbox, e) in tree.entries() {
            candidates.clear();
            tree.query_rect(bbox, &mut candidates);
            let seg = mesh.segment(e);
            let anchors = mesh.anchors(e);
            for &f in candidates.iter().filter(|&&f| f > e) {
                if self.options.isolate_subpaths && mesh.path_ids(e).first() != mesh.path_ids(f).first() {
                    continue;
                }
                let hits = intersect_anchored(&seg, &anchors, &mesh.segment(f), &mesh.anchors(f), tol);
                if let Some(hit) = hits.first() {
                    log::debug!("clip: {e:?} and {f:?} still cross at {:?}", hit.point);
                    return Err(InvariantViolation::UnresolvedCrossing { first: e, second: f });
                }
            }
        }
        Ok(())
    }
}

/// Per-sub-path drawing state.
#[derive(Debug)]
struct Walker {
    subpath: u32,
    next_id: u32,
    current: Point,
}

impl Walker {
    /// Path ids for the next segment.
    fn ids(&mut self) -> [u32; 2] {
        let ids = [self.subpath, self.next_id];
        self.next_id += 1;
        ids
    }
}

/// Reject a sub-path with non-finite points or drawing after `ClosePath`.
///
/// `offset` is the index of the sub-path's `MoveTo` in the whole path.
fn validate_subpath(elements: &[PathEl], offset: usize) -> Result<(), ClipError> {
    let mut closed = false;
    for (i, el) in elements.iter().enumerate() {
        let index = offset + i;
        let points: ArrayVec<Point, 3> = match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => [p].into_iter().collect(),
            PathEl::QuadTo(a, b) => [a, b].into_iter().collect(),
            PathEl::CurveTo(a, b, c) => ArrayVec::from([a, b, c]),
            PathEl::ClosePath => {
                closed = true;
                continue;
            }
        };
        if closed {
            return Err(ClipError::DrawAfterClose { index });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(ClipError::NonFiniteCoordinate { index });
        }
    }
    Ok(())
}
