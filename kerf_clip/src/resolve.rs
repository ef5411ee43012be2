// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-segment crossing resolution.
//!
//! A new segment is checked against every indexed edge whose bounds overlap
//! its own. Each crossing splits both the new segment and the crossed edge,
//! and the four pieces meeting at the crossing are re-linked so that each
//! incoming piece continues along the other curve. The contours touched by the
//! step are then rebuilt from the rewired chains.

use kerf_index::{Aabb2D, RTree, RTreeConfig};
use kurbo::{Point, Rect};

use crate::curve::Segment;
use crate::error::{ClipError, InvariantViolation};
use crate::intersect::intersect_anchored;
use crate::mesh::Mesh;
use crate::observer::ClipObserver;
use crate::tolerance::{Tolerances, near_param_end};
use crate::types::{ContourFlags, ContourId, EdgeId, narrow};

/// A crossing between the segment being added and an existing edge.
///
/// Records live for one resolution step.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionRecord {
    /// Where the curves cross.
    pub point: Point,
    /// The existing edge that is crossed.
    pub crossed: EdgeId,
    /// Parameter of the crossing on the new segment.
    pub t_new: f64,
    /// Parameter of the crossing on the crossed edge.
    pub t_crossed: f64,
    /// Position in the order of (crossed edge identity, parameter on it).
    pub serial: usize,
}

/// What [`Kernel::add_segment`] produced.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Added {
    /// The forward edges covering the new segment, in order.
    pub(crate) pieces: Vec<EdgeId>,
    /// Number of crossings resolved.
    pub(crate) crossings: usize,
}

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

/// Mesh, spatial index and the open end of the strip being drawn.
#[derive(Debug)]
pub(crate) struct Kernel {
    pub(crate) mesh: Mesh,
    pub(crate) index: RTree<f64, EdgeId>,
    pub(crate) tolerances: Tolerances,
    /// Last edge of the strip that new segments attach to.
    pub(crate) tail: Option<EdgeId>,
}

impl Kernel {
    pub(crate) fn new(tolerances: Tolerances, index: RTreeConfig) -> Result<Self, kerf_index::ConfigError> {
        Ok(Self::with_index(tolerances, RTree::with_config(index)?))
    }

    pub(crate) fn with_index(tolerances: Tolerances, index: RTree<f64, EdgeId>) -> Self {
        Self {
            mesh: Mesh::new(),
            index,
            tolerances,
            tail: None,
        }
    }

    /// Add one segment, resolving its crossings with indexed edges.
    ///
    /// With `attach` the segment continues the strip ending at the current
    /// tail and becomes the new tail; otherwise it starts a chain of its own.
    /// `anchors` are the endpoints of the path segment `seg` belongs to.
    pub(crate) fn add_segment(
        &mut self,
        seg: Segment,
        anchors: [Point; 2],
        attach: bool,
        path_ids: &[u32],
        observer: &mut dyn ClipObserver,
    ) -> Result<Added, ClipError> {
        let records = self.find_crossings(&seg, &anchors);
        if records.is_empty() {
            let e = self.mesh.add_anchored_edge(seg, anchors, path_ids.to_vec());
            let host = if attach {
                self.tail.and_then(|t| self.mesh.host_contour(t))
            } else {
                None
            };
            match host {
                Some(c) => self.mesh.push_back(c, e),
                None => {
                    self.mesh.new_contour(e, e, ContourFlags::empty());
                }
            }
            self.index.insert(rect_to_aabb(self.mesh.bounds(e)), e);
            if attach {
                self.tail = Some(e);
            }
            return Ok(Added {
                pieces: vec![e],
                crossings: 0,
            });
        }
        observer.intersections_resolved(&seg, &records);
        log::debug!("resolve: {} crossing(s) on {seg:?}", records.len());

        // Contours whose chains are about to be rewired.
        let mut hosts: Vec<ContourId> = records
            .iter()
            .filter_map(|r| self.mesh.host_contour(r.crossed))
            .collect();
        if attach && let Some(c) = self.tail.and_then(|t| self.mesh.host_contour(t)) {
            hosts.push(c);
        }
        hosts.sort_unstable();
        hosts.dedup();

        // Split every crossed edge; remember the pieces on each side of a crossing.
        let mut sides: Vec<(EdgeId, EdgeId)> = vec![(EdgeId(0), EdgeId(0)); records.len()];
        let mut seeds = Vec::new();
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| records[a].serial.cmp(&records[b].serial));
        let mut i = 0;
        while i < order.len() {
            let crossed = records[order[i]].crossed;
            let mut group = vec![order[i]];
            while i + group.len() < order.len() && records[order[i + group.len()]].crossed == crossed {
                group.push(order[i + group.len()]);
            }
            i += group.len();
            let pieces = self.split_crossed(crossed, &group, &records, observer)?;
            for (k, &r) in group.iter().enumerate() {
                sides[r] = (pieces[k], pieces[k + 1]);
            }
            seeds.extend(pieces);
        }

        // Split the new segment at the crossings, in order along it.
        let ts: Vec<f64> = records.iter().map(|r| r.t_new).collect();
        let points: Vec<Point> = records.iter().map(|r| r.point).collect();
        let snapped = snap_pieces(&seg, &ts, &points);
        let mut clip = Vec::with_capacity(snapped.len());
        for (k, piece) in snapped.into_iter().enumerate() {
            let mut ids = path_ids.to_vec();
            ids.push(narrow(k));
            let e = self.mesh.add_anchored_edge(piece, anchors, ids);
            check_finite(&self.mesh, e)?;
            self.index.insert(rect_to_aabb(self.mesh.bounds(e)), e);
            clip.push(e);
        }
        for pair in clip.windows(2) {
            self.mesh.connect(pair[0], pair[1]);
        }
        if attach && let Some(t) = self.tail {
            self.mesh.connect(t, clip[0]);
        }

        // Swap at every crossing: each incoming piece continues on the other curve.
        for (k, &(s_in, s_out)) in sides.iter().enumerate() {
            let (c_in, c_out) = (clip[k], clip[k + 1]);
            self.mesh.connect(c_in, s_out);
            self.mesh.connect(s_in, c_out);
        }

        for c in hosts {
            self.mesh.remove_contour(c);
        }
        seeds.extend(clip.iter().copied());
        let rebuilt = self.mesh.rebuild(&seeds, ContourFlags::CROSSED)?;
        log::trace!("resolve: rebuilt {} contour(s)", rebuilt.len());
        if attach {
            self.tail = clip.last().copied();
        }
        Ok(Added {
            crossings: records.len(),
            pieces: clip,
        })
    }

    /// Crossings of `seg` with indexed edges, ordered along `seg`.
    fn find_crossings(&self, seg: &Segment, anchors: &[Point]) -> Vec<IntersectionRecord> {
        let mut candidates = Vec::new();
        self.index
            .query_rect(rect_to_aabb(seg.bounding_box()), &mut candidates);
        candidates.sort_unstable();
        let tol = &self.tolerances;
        let mut records = Vec::new();
        for e in candidates {
            if !self.mesh.is_alive(e) {
                continue;
            }
            let crossed = self.mesh.segment(e);
            for hit in intersect_anchored(seg, anchors, &crossed, &self.mesh.anchors(e), tol) {
                if near_param_end(hit.t_a, tol.param) || near_param_end(hit.t_b, tol.param) {
                    continue;
                }
                records.push(IntersectionRecord {
                    point: hit.point,
                    crossed: e,
                    t_new: hit.t_a,
                    t_crossed: hit.t_b,
                    serial: 0,
                });
            }
        }
        order_records(&self.mesh, records, tol.param)
    }

    /// Split `crossed` at the crossings `group` (indices into `records`, in
    /// ascending `t_crossed`) and swap the pieces into the index.
    fn split_crossed(
        &mut self,
        crossed: EdgeId,
        group: &[usize],
        records: &[IntersectionRecord],
        observer: &mut dyn ClipObserver,
    ) -> Result<Vec<EdgeId>, ClipError> {
        let bounds = rect_to_aabb(self.mesh.bounds(crossed));
        if !self.index.remove(bounds, crossed) {
            return Err(InvariantViolation::MissingIndexEntry(crossed).into());
        }
        let ts: Vec<f64> = group.iter().map(|&r| records[r].t_crossed).collect();
        let points: Vec<Point> = group.iter().map(|&r| records[r].point).collect();
        let pieces = snap_pieces(&self.mesh.segment(crossed), &ts, &points);
        let parent = self.mesh.path_ids(crossed).to_vec();
        let ids = (0..pieces.len())
            .map(|k| {
                let mut ids = parent.clone();
                ids.push(narrow(k));
                ids
            })
            .collect();
        let new = self.mesh.replace_edge(crossed, &pieces, ids);
        for &e in &new {
            check_finite(&self.mesh, e)?;
            self.index.insert(rect_to_aabb(self.mesh.bounds(e)), e);
        }
        observer.edge_split(crossed, &new);
        if self.tail == Some(crossed) {
            self.tail = new.last().copied();
        }
        Ok(new)
    }
}

/// Assign serials by (crossed edge identity, parameter on it), then order by
/// parameter on the new segment and merge crossings that coincide on it.
fn order_records(mesh: &Mesh, mut records: Vec<IntersectionRecord>, param: f64) -> Vec<IntersectionRecord> {
    records.sort_by(|a, b| {
        mesh.path_ids(a.crossed)
            .cmp(mesh.path_ids(b.crossed))
            .then(a.crossed.cmp(&b.crossed))
            .then(a.t_crossed.total_cmp(&b.t_crossed))
    });
    for (serial, r) in records.iter_mut().enumerate() {
        r.serial = serial;
    }
    records.sort_by(|a, b| a.t_new.total_cmp(&b.t_new).then(a.serial.cmp(&b.serial)));
    let mut out: Vec<IntersectionRecord> = Vec::with_capacity(records.len());
    for r in records {
        match out.last_mut() {
            Some(last) if (r.t_new - last.t_new).abs() <= param => {
                if r.serial < last.serial {
                    *last = r;
                }
            }
            _ => out.push(r),
        }
    }
    // Two crossings of one edge at the same place cannot both be split.
    let mut kept: Vec<IntersectionRecord> = Vec::with_capacity(out.len());
    for r in out {
        let clash = kept
            .iter()
            .any(|k| k.crossed == r.crossed && (k.t_crossed - r.t_crossed).abs() <= param);
        if !clash {
            kept.push(r);
        }
    }
    kept
}

/// Split `seg` at ascending `ts` and pin each cut to the matching point so
/// that pieces of different curves meet exactly.
fn snap_pieces(seg: &Segment, ts: &[f64], points: &[Point]) -> Vec<Segment> {
    let pieces = seg.split_many(ts);
    let n = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(k, piece)| {
            let start = if k == 0 { seg.start() } else { points[k - 1] };
            let end = if k + 1 == n { seg.end() } else { points[k] };
            piece.with_endpoints(start, end)
        })
        .collect()
}

fn check_finite(mesh: &Mesh, e: EdgeId) -> Result<(), InvariantViolation> {
    let b = mesh.bounds(e);
    if [b.x0, b.y0, b.x1, b.y1].iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(InvariantViolation::NonFinite(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use kurbo::Line;

    fn kernel() -> Kernel {
        Kernel::new(Tolerances::default(), RTreeConfig::default()).unwrap()
    }

    fn line(a: (f64, f64), b: (f64, f64)) -> Segment {
        Segment::Line(Line::new(a, b))
    }

    fn add(k: &mut Kernel, seg: Segment, ids: &[u32]) -> Added {
        k.add_segment(seg, [seg.start(), seg.end()], true, ids, &mut NoopObserver)
            .unwrap()
    }

    #[test]
    fn chain_without_crossings() {
        let mut k = kernel();
        let a = add(&mut k, line((0.0, 0.0), (10.0, 0.0)), &[0, 0]);
        let b = add(&mut k, line((10.0, 0.0), (10.0, 10.0)), &[0, 1]);
        assert_eq!((a.crossings, b.crossings), (0, 0));
        assert_eq!(k.mesh.next(a.pieces[0]), Some(b.pieces[0]));
        assert_eq!(k.tail, Some(b.pieces[0]));
        assert_eq!(k.mesh.contours().count(), 1);
        assert_eq!(k.index.len(), 2);
        k.mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn crossing_splits_both_edges() {
        let mut k = kernel();
        let a = add(&mut k, line((0.0, 5.0), (10.0, 5.0)), &[0, 0]);
        k.tail = None;
        let b = add(&mut k, line((5.0, 0.0), (5.0, 10.0)), &[1, 0]);
        assert_eq!(b.crossings, 1);
        assert_eq!(b.pieces.len(), 2);
        assert!(!k.mesh.is_alive(a.pieces[0]));
        // Two live forward edges per segment, all indexed.
        assert_eq!(k.index.len(), 4);
        let x = Point::new(5.0, 5.0);
        assert_eq!(k.mesh.dest(b.pieces[0]), x);
        assert_eq!(k.mesh.org(b.pieces[1]), x);
        // The first clip piece now continues along the horizontal line.
        let after = k.mesh.next(b.pieces[0]).unwrap();
        assert_eq!(k.mesh.dest(after), Point::new(10.0, 5.0));
        k.mesh.validate(1e-9).unwrap();
        // Two strips: (5,0)->(5,5)->(10,5) and (0,5)->(5,5)->(5,10).
        let strips: Vec<_> = k.mesh.contours().collect();
        assert_eq!(strips.len(), 2);
        assert!(strips.iter().all(|(_, c)| c.flags().contains(ContourFlags::CROSSED)));
    }

    #[test]
    fn records_are_ordered_along_new_segment() {
        let mut k = kernel();
        for (i, x) in [7.0, 3.0, 5.0].into_iter().enumerate() {
            k.tail = None;
            add(&mut k, line((x, 0.0), (x, 10.0)), &[narrow(i), 0]);
        }
        let seg = line((0.0, 5.0), (10.0, 5.0));
        let recs = k.find_crossings(&seg, &[seg.start(), seg.end()]);
        let ts: Vec<f64> = recs.iter().map(|r| r.t_new).collect();
        assert_eq!(ts, vec![0.3, 0.5, 0.7]);
        // Serials follow the crossed edges' path ids: x = 7 was added first.
        let serials: Vec<usize> = recs.iter().map(|r| r.serial).collect();
        assert_eq!(serials, vec![1, 2, 0]);
    }

    #[test]
    fn crossings_next_to_earlier_cuts_are_kept() {
        let mut k = kernel();
        add(&mut k, line((0.0, 5.0), (20.0, 5.0)), &[0, 0]);
        for (i, x) in [10.0, 10.4, 10.8].into_iter().enumerate() {
            k.tail = None;
            let added = add(&mut k, line((x, 0.0), (x, 10.0)), &[narrow(i + 1), 0]);
            assert_eq!(added.crossings, 1, "vertical at x = {x}");
        }
        // The horizontal line is cut three times, every vertical once.
        assert_eq!(k.index.len(), 4 + 3 * 2);
        let ends = [Point::new(0.0, 5.0), Point::new(20.0, 5.0)];
        let horizontal = (0..k.mesh.edge_count())
            .step_by(2)
            .map(EdgeId::new)
            .filter(|&e| k.mesh.is_alive(e) && k.mesh.anchors(e) == ends)
            .count();
        assert_eq!(horizontal, 4);
        k.mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn snapping_pins_cut_points() {
        let seg = line((0.0, 0.0), (10.0, 0.0));
        let p = Point::new(4.0, 0.0);
        let pieces = snap_pieces(&seg, &[0.4], &[p]);
        assert_eq!(pieces[0].end(), p);
        assert_eq!(pieces[1].start(), p);
        assert_eq!(pieces[1].end(), seg.end());
    }
}
