// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Half-edge mesh: an arena of oriented edges threaded into strips and loops.
//!
//! Every segment is owned by a pair of half-edges. The forward edge (even
//! index) runs along the segment, its twin (the following odd index) runs
//! backwards. Contours are built from forward edges; the twins form a mirror
//! image that [`Mesh::connect`] keeps in step, so walking `next` from a twin
//! traverses the same contour in reverse.
//!
//! Edges are never removed from the arena. An edge replaced by its split
//! pieces is marked dead and unlinked.

use std::collections::HashSet;

use kurbo::{BezPath, Point, Rect};

use crate::curve::Segment;
use crate::error::InvariantViolation;
use crate::types::{ContourFlags, ContourId, EdgeId, SegmentId};

#[derive(Clone, Debug)]
struct HalfEdge {
    sym: EdgeId,
    prev: Option<EdgeId>,
    next: Option<EdgeId>,
    src: SegmentId,
    reversed: bool,
    /// Set only on a contour's begin edge.
    contour: Option<ContourId>,
    path_ids: Vec<u32>,
    alive: bool,
}

/// A strip (open chain) or loop (closed chain) of forward half-edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contour {
    begin: EdgeId,
    end: EdgeId,
    flags: ContourFlags,
}

impl Contour {
    /// First edge of the chain.
    pub fn begin(&self) -> EdgeId {
        self.begin
    }

    /// Last edge of the chain. For a loop its `next` is [`begin`](Self::begin).
    pub fn end(&self) -> EdgeId {
        self.end
    }

    /// State flags.
    pub fn flags(&self) -> ContourFlags {
        self.flags
    }

    /// Whether this contour is a loop.
    pub fn is_closed(&self) -> bool {
        self.flags.contains(ContourFlags::CLOSED)
    }
}

/// Arena of half-edges, their source segments and the contours they form.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    edges: Vec<HalfEdge>,
    segments: Vec<Segment>,
    /// Endpoints of the path segment each segment was cut from.
    anchors: Vec<[Point; 2]>,
    bounds: Vec<Rect>,
    contours: Vec<Option<Contour>>,
}

impl Mesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.segments.clear();
        self.anchors.clear();
        self.bounds.clear();
        self.contours.clear();
    }

    /// Number of half-edges ever created, dead ones included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge(&self, e: EdgeId) -> &HalfEdge {
        &self.edges[e.index()]
    }

    fn edge_mut(&mut self, e: EdgeId) -> &mut HalfEdge {
        &mut self.edges[e.index()]
    }

    /// Whether `e` is still part of the mesh.
    pub fn is_alive(&self, e: EdgeId) -> bool {
        self.edges.get(e.index()).is_some_and(|h| h.alive)
    }

    /// Whether `e` runs along its segment rather than against it.
    pub fn is_forward(&self, e: EdgeId) -> bool {
        !self.edge(e).reversed
    }

    /// The twin of `e`.
    pub fn sym(&self, e: EdgeId) -> EdgeId {
        self.edge(e).sym
    }

    /// The edge before `e` in its chain.
    pub fn prev(&self, e: EdgeId) -> Option<EdgeId> {
        self.edge(e).prev
    }

    /// The edge after `e` in its chain.
    pub fn next(&self, e: EdgeId) -> Option<EdgeId> {
        self.edge(e).next
    }

    /// Lexicographic identity used to order sibling edges.
    pub fn path_ids(&self, e: EdgeId) -> &[u32] {
        &self.edge(e).path_ids
    }

    /// The source segment shared by `e` and its twin.
    pub fn source(&self, e: EdgeId) -> SegmentId {
        self.edge(e).src
    }

    /// The segment `e` traverses, oriented along `e`.
    pub fn segment(&self, e: EdgeId) -> Segment {
        let h = self.edge(e);
        let seg = self.segments[h.src.index()];
        if h.reversed { seg.reverse() } else { seg }
    }

    /// Start point of `e`.
    pub fn org(&self, e: EdgeId) -> Point {
        let h = self.edge(e);
        let seg = &self.segments[h.src.index()];
        if h.reversed { seg.end() } else { seg.start() }
    }

    /// End point of `e`, the origin of its twin.
    pub fn dest(&self, e: EdgeId) -> Point {
        self.org(self.sym(e))
    }

    /// Endpoints of the path segment `e` was cut from, in source order.
    ///
    /// These are the only places where a touch counts as a shared vertex;
    /// ends created by splitting are not anchors.
    pub fn anchors(&self, e: EdgeId) -> [Point; 2] {
        self.anchors[self.edge(e).src.index()]
    }

    /// Cached bounds of the segment under `e`.
    pub fn bounds(&self, e: EdgeId) -> Rect {
        self.bounds[self.edge(e).src.index()]
    }

    /// Create a half-edge pair for `seg` and return the forward edge.
    ///
    /// The pair is not linked to anything. The segment anchors itself.
    pub fn add_edge(&mut self, seg: Segment, path_ids: Vec<u32>) -> EdgeId {
        self.add_anchored_edge(seg, [seg.start(), seg.end()], path_ids)
    }

    /// Like [`add_edge`](Self::add_edge) for a piece of a longer path
    /// segment whose endpoints are `anchors`.
    pub fn add_anchored_edge(&mut self, seg: Segment, anchors: [Point; 2], path_ids: Vec<u32>) -> EdgeId {
        let src = SegmentId::new(self.segments.len());
        self.anchors.push(anchors);
        self.bounds.push(seg.bounding_box());
        self.segments.push(seg);
        let fwd = EdgeId::new(self.edges.len());
        let rev = EdgeId::new(self.edges.len() + 1);
        for (sym, reversed) in [(rev, false), (fwd, true)] {
            self.edges.push(HalfEdge {
                sym,
                prev: None,
                next: None,
                src,
                reversed,
                contour: None,
                path_ids: path_ids.clone(),
                alive: true,
            });
        }
        fwd
    }

    /// Make `b` follow `a`, and the twin of `a` follow the twin of `b`.
    pub fn connect(&mut self, a: EdgeId, b: EdgeId) {
        let (sa, sb) = (self.sym(a), self.sym(b));
        self.edge_mut(a).next = Some(b);
        self.edge_mut(b).prev = Some(a);
        self.edge_mut(sb).next = Some(sa);
        self.edge_mut(sa).prev = Some(sb);
    }

    /// Cut the link after `e`, in both orientations.
    pub fn disconnect(&mut self, e: EdgeId) {
        let Some(n) = self.next(e) else {
            return;
        };
        let (se, sn) = (self.sym(e), self.sym(n));
        self.edge_mut(e).next = None;
        self.edge_mut(n).prev = None;
        self.edge_mut(sn).next = None;
        self.edge_mut(se).prev = None;
    }

    /// Replace the forward edge `old` by a chain of new edges over `pieces`.
    ///
    /// The chain takes over `old`'s links (a single-edge loop stays a loop)
    /// and, if `old` began or ended its contour, that role, and every piece
    /// keeps `old`'s anchors. `old` and its twin are left dead and unlinked.
    /// Returns the new forward edges in order.
    pub fn replace_edge(&mut self, old: EdgeId, pieces: &[Segment], ids: Vec<Vec<u32>>) -> Vec<EdgeId> {
        debug_assert!(self.is_forward(old), "replace_edge expects a forward edge");
        debug_assert_eq!(pieces.len(), ids.len(), "one id per piece");
        let host = self.host_contour(old);
        let prev = self.prev(old);
        let next = self.next(old);
        let anchors = self.anchors(old);
        let new: Vec<EdgeId> = pieces
            .iter()
            .zip(ids)
            .map(|(seg, path_ids)| self.add_anchored_edge(*seg, anchors, path_ids))
            .collect();
        let (Some(&first), Some(&last)) = (new.first(), new.last()) else {
            return new;
        };
        for pair in new.windows(2) {
            self.connect(pair[0], pair[1]);
        }
        if prev == Some(old) {
            self.connect(last, first);
        } else {
            if let Some(p) = prev {
                self.connect(p, first);
            }
            if let Some(n) = next {
                self.connect(last, n);
            }
        }
        if let Some(c) = host {
            let (was_begin, was_end) = self
                .contour(c)
                .map_or((false, false), |k| (k.begin == old, k.end == old));
            if let Some(contour) = self.contours[c.index()].as_mut() {
                if was_begin {
                    contour.begin = first;
                }
                if was_end {
                    contour.end = last;
                }
            }
            if was_begin {
                self.edge_mut(first).contour = Some(c);
            }
        }
        let sym = self.sym(old);
        for e in [old, sym] {
            let h = self.edge_mut(e);
            h.prev = None;
            h.next = None;
            h.contour = None;
            h.alive = false;
        }
        new
    }

    /// The contour whose chain contains `e`, found by walking back to the
    /// edge carrying the back reference.
    pub fn host_contour(&self, e: EdgeId) -> Option<ContourId> {
        let mut cur = e;
        for _ in 0..=self.edges.len() {
            if let Some(c) = self.edge(cur).contour {
                return Some(c);
            }
            cur = self.prev(cur)?;
            if cur == e {
                return None;
            }
        }
        None
    }

    /// Register a chain from `begin` to `end` as a contour.
    pub fn new_contour(&mut self, begin: EdgeId, end: EdgeId, flags: ContourFlags) -> ContourId {
        let id = ContourId::new(self.contours.len());
        self.contours.push(Some(Contour { begin, end, flags }));
        self.edge_mut(begin).contour = Some(id);
        id
    }

    /// Forget a contour. Its edges and links are untouched.
    pub fn remove_contour(&mut self, c: ContourId) {
        if let Some(contour) = self.contours.get_mut(c.index()).and_then(Option::take)
            && self.edge(contour.begin).contour == Some(c)
        {
            self.edge_mut(contour.begin).contour = None;
        }
    }

    /// The contour with id `c`, if it still exists.
    pub fn contour(&self, c: ContourId) -> Option<&Contour> {
        self.contours.get(c.index()).and_then(Option::as_ref)
    }

    /// All live contours in creation order.
    pub fn contours(&self) -> impl Iterator<Item = (ContourId, &Contour)> + '_ {
        self.contours
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (ContourId::new(i), c)))
    }

    /// Append `e` to an open contour.
    pub fn push_back(&mut self, c: ContourId, e: EdgeId) {
        let Some(end) = self.contour(c).map(|k| k.end) else {
            return;
        };
        debug_assert!(
            !self.contour(c).is_some_and(Contour::is_closed),
            "push_back onto a closed contour"
        );
        self.connect(end, e);
        if let Some(contour) = self.contours[c.index()].as_mut() {
            contour.end = e;
        }
    }

    /// Close a strip into a loop if its ends are within `tol` of each other.
    ///
    /// Returns whether the contour is closed afterwards.
    pub fn try_finish(&mut self, c: ContourId, tol: f64) -> bool {
        let Some(&Contour { begin, end, flags }) = self.contour(c) else {
            return false;
        };
        if flags.contains(ContourFlags::CLOSED) {
            return true;
        }
        if self.dest(end).distance(self.org(begin)) > tol {
            return false;
        }
        self.connect(end, begin);
        if let Some(contour) = self.contours[c.index()].as_mut() {
            contour.flags |= ContourFlags::CLOSED;
        }
        true
    }

    /// Add `flags` to a contour.
    pub fn mark(&mut self, c: ContourId, flags: ContourFlags) {
        if let Some(contour) = self.contours.get_mut(c.index()).and_then(Option::as_mut) {
            contour.flags |= flags;
        }
    }

    /// The edges of a contour from begin to end.
    pub fn contour_edges(&self, c: ContourId) -> Vec<EdgeId> {
        let mut out = Vec::new();
        let Some(contour) = self.contour(c) else {
            return out;
        };
        let mut cur = contour.begin;
        for _ in 0..self.edges.len() {
            out.push(cur);
            if cur == contour.end {
                break;
            }
            match self.next(cur) {
                Some(n) if n != contour.begin => cur = n,
                _ => break,
            }
        }
        out
    }

    /// The contour as a path, closed if it is a loop.
    pub fn contour_to_path(&self, c: ContourId) -> BezPath {
        let mut path = BezPath::new();
        let edges = self.contour_edges(c);
        let Some(&first) = edges.first() else {
            return path;
        };
        path.move_to(self.org(first));
        for e in edges {
            path.push(self.segment(e).to_path_el());
        }
        if self.contour(c).is_some_and(Contour::is_closed) {
            path.close_path();
        }
        path
    }

    /// Register a contour for every chain through `seeds` that has none.
    ///
    /// Cyclic chains become loops starting at their lowest edge id, open
    /// chains become strips. `extra` is added to every new contour's flags.
    pub fn rebuild(&mut self, seeds: &[EdgeId], extra: ContourFlags) -> Result<Vec<ContourId>, InvariantViolation> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let limit = self.edges.len();
        for &seed in seeds {
            if !self.is_alive(seed) || seen.contains(&seed) {
                continue;
            }
            // Walk back to the chain start, or all the way around.
            let mut start = seed;
            let mut cyclic = false;
            let mut steps = 0;
            while let Some(p) = self.prev(start) {
                if p == seed {
                    cyclic = true;
                    break;
                }
                start = p;
                steps += 1;
                if steps > limit {
                    return Err(InvariantViolation::UnterminatedChain(seed));
                }
            }
            let mut chain = vec![start];
            let mut cur = start;
            while let Some(n) = self.next(cur) {
                if n == start {
                    break;
                }
                chain.push(n);
                cur = n;
                if chain.len() > limit {
                    return Err(InvariantViolation::UnterminatedChain(seed));
                }
            }
            seen.extend(chain.iter().copied());
            let (begin, end, flags) = if cyclic {
                let pos = chain
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| **e)
                    .map_or(0, |(i, _)| i);
                let before = chain[(pos + chain.len() - 1) % chain.len()];
                (chain[pos], before, extra | ContourFlags::CLOSED)
            } else {
                (start, cur, extra)
            };
            if let Some(old) = chain.iter().find_map(|&e| self.edge(e).contour) {
                // Seeds come from freshly split chains, whose contours were removed.
                return Err(InvariantViolation::MalformedContour(old));
            }
            out.push(self.new_contour(begin, end, flags));
        }
        Ok(out)
    }

    /// Check twin symmetry, link consistency and contour shape.
    ///
    /// Linked edges must meet within `tol`.
    pub fn validate(&self, tol: f64) -> Result<(), InvariantViolation> {
        for (i, h) in self.edges.iter().enumerate() {
            let e = EdgeId::new(i);
            if !h.alive {
                if h.prev.is_some() || h.next.is_some() {
                    return Err(InvariantViolation::DeadLink(e));
                }
                continue;
            }
            let s = self.edge(h.sym);
            if h.sym == e || s.sym != e || s.src != h.src || s.reversed == h.reversed || !s.alive {
                return Err(InvariantViolation::AsymmetricEdge(e));
            }
            let org = self.org(e);
            if !org.is_finite() || !self.dest(e).is_finite() {
                return Err(InvariantViolation::NonFinite(e));
            }
            if let Some(n) = h.next {
                if !self.is_alive(n) {
                    return Err(InvariantViolation::DeadLink(e));
                }
                if self.prev(n) != Some(e)
                    || self.next(self.sym(n)) != Some(h.sym)
                    || self.dest(e).distance(self.org(n)) > tol
                {
                    return Err(InvariantViolation::BrokenLink { edge: e, link: "next" });
                }
            }
            if let Some(p) = h.prev {
                if !self.is_alive(p) {
                    return Err(InvariantViolation::DeadLink(e));
                }
                if self.next(p) != Some(e) || self.prev(self.sym(p)) != Some(h.sym) {
                    return Err(InvariantViolation::BrokenLink { edge: e, link: "prev" });
                }
            }
            if let Some(c) = h.contour
                && self.contour(c).is_none_or(|k| k.begin != e)
            {
                return Err(InvariantViolation::MalformedContour(c));
            }
        }
        for (c, contour) in self.contours() {
            self.validate_contour(c, contour)?;
        }
        Ok(())
    }

    fn validate_contour(&self, c: ContourId, contour: &Contour) -> Result<(), InvariantViolation> {
        let Contour { begin, end, flags } = *contour;
        let bad = InvariantViolation::MalformedContour(c);
        if !self.is_alive(begin) || !self.is_alive(end) || self.edge(begin).contour != Some(c) {
            return Err(bad);
        }
        if !self.is_forward(begin) {
            return Err(bad);
        }
        if flags.contains(ContourFlags::CLOSED) {
            if self.next(end) != Some(begin) {
                return Err(bad);
            }
        } else if self.prev(begin).is_some() || self.next(end).is_some() {
            return Err(bad);
        }
        let mut cur = begin;
        for _ in 0..self.edges.len() {
            if cur == end {
                return Ok(());
            }
            cur = self.next(cur).ok_or_else(|| bad.clone())?;
            if cur == begin {
                return Err(bad);
            }
        }
        Err(InvariantViolation::UnterminatedChain(begin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Line;

    fn line(mesh: &mut Mesh, a: (f64, f64), b: (f64, f64), id: u32) -> EdgeId {
        mesh.add_edge(Segment::Line(Line::new(a, b)), vec![id])
    }

    fn square(mesh: &mut Mesh) -> (ContourId, [EdgeId; 4]) {
        let e0 = line(mesh, (0.0, 0.0), (10.0, 0.0), 0);
        let e1 = line(mesh, (10.0, 0.0), (10.0, 10.0), 1);
        let e2 = line(mesh, (10.0, 10.0), (0.0, 10.0), 2);
        let e3 = line(mesh, (0.0, 10.0), (0.0, 0.0), 3);
        let c = mesh.new_contour(e0, e0, ContourFlags::empty());
        for e in [e1, e2, e3] {
            mesh.push_back(c, e);
        }
        (c, [e0, e1, e2, e3])
    }

    #[test]
    fn twins_mirror_links() {
        let mut mesh = Mesh::new();
        let a = line(&mut mesh, (0.0, 0.0), (1.0, 0.0), 0);
        let b = line(&mut mesh, (1.0, 0.0), (2.0, 0.0), 1);
        assert_eq!(a.index() % 2, 0);
        assert_eq!(mesh.sym(a).index(), a.index() + 1);
        assert_eq!(mesh.dest(a), mesh.org(mesh.sym(a)));
        assert_eq!(mesh.source(a), mesh.source(mesh.sym(a)));
        assert_ne!(mesh.source(a), mesh.source(b));
        mesh.connect(a, b);
        assert_eq!(mesh.next(mesh.sym(b)), Some(mesh.sym(a)));
        assert_eq!(mesh.prev(mesh.sym(a)), Some(mesh.sym(b)));
        mesh.validate(1e-9).unwrap();
        mesh.disconnect(a);
        assert_eq!(mesh.next(a), None);
        assert_eq!(mesh.next(mesh.sym(b)), None);
        mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn square_closes() {
        let mut mesh = Mesh::new();
        let (c, edges) = square(&mut mesh);
        assert!(!mesh.contour(c).unwrap().is_closed());
        mesh.validate(1e-9).unwrap();
        assert!(mesh.try_finish(c, 1e-9));
        assert_eq!(mesh.next(edges[3]), Some(edges[0]));
        assert_eq!(mesh.contour_edges(c), edges.to_vec());
        mesh.validate(1e-9).unwrap();
        let path = mesh.contour_to_path(c);
        assert_eq!(path.elements().len(), 6);
    }

    #[test]
    fn open_strip_does_not_finish() {
        let mut mesh = Mesh::new();
        let a = line(&mut mesh, (0.0, 0.0), (1.0, 0.0), 0);
        let c = mesh.new_contour(a, a, ContourFlags::empty());
        assert!(!mesh.try_finish(c, 1e-6));
        assert_eq!(mesh.contour_to_path(c).elements().len(), 2);
    }

    #[test]
    fn replace_edge_keeps_loop_and_roles() {
        let mut mesh = Mesh::new();
        let (c, edges) = square(&mut mesh);
        mesh.try_finish(c, 1e-9);
        let (a, b) = mesh.segment(edges[0]).split_at(0.5);
        let new = mesh.replace_edge(edges[0], &[a, b], vec![vec![0, 0], vec![0, 1]]);
        assert_eq!(new.len(), 2);
        assert!(!mesh.is_alive(edges[0]));
        // Both halves remember the corners of the side they were cut from.
        let corners = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(mesh.anchors(new[0]), corners);
        assert_eq!(mesh.anchors(new[1]), corners);
        assert_eq!(mesh.dest(new[0]), Point::new(5.0, 0.0));
        let contour = *mesh.contour(c).unwrap();
        assert_eq!(contour.begin(), new[0]);
        assert_eq!(mesh.next(edges[3]), Some(new[0]));
        assert_eq!(mesh.next(new[1]), Some(edges[1]));
        assert_eq!(mesh.contour_edges(c).len(), 5);
        mesh.validate(1e-9).unwrap();

        // Replacing the end edge moves the end.
        let (a, b) = mesh.segment(edges[3]).split_at(0.5);
        let tail = mesh.replace_edge(edges[3], &[a, b], vec![vec![3, 0], vec![3, 1]]);
        assert_eq!(mesh.contour(c).unwrap().end(), tail[1]);
        assert_eq!(mesh.host_contour(tail[0]), Some(c));
        mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn replace_single_edge_loop() {
        let mut mesh = Mesh::new();
        let seg = Segment::Cubic(kurbo::CubicBez::new(
            (0.0, 0.0),
            (10.0, 10.0),
            (-10.0, 10.0),
            (0.0, 0.0),
        ));
        let e = mesh.add_edge(seg, vec![0]);
        let c = mesh.new_contour(e, e, ContourFlags::empty());
        assert!(mesh.try_finish(c, 1e-9));
        let (a, b) = seg.split_at(0.5);
        let new = mesh.replace_edge(e, &[a, b], vec![vec![0, 0], vec![0, 1]]);
        assert_eq!(mesh.next(new[1]), Some(new[0]));
        assert_eq!(mesh.contour(c).unwrap().end(), new[1]);
        mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn rebuild_finds_loops_and_strips() {
        let mut mesh = Mesh::new();
        let (c, edges) = square(&mut mesh);
        mesh.try_finish(c, 1e-9);
        mesh.remove_contour(c);
        let loose = line(&mut mesh, (20.0, 0.0), (30.0, 0.0), 9);
        let built = mesh
            .rebuild(&[edges[2], edges[1], loose], ContourFlags::CROSSED)
            .unwrap();
        assert_eq!(built.len(), 2);
        let ring = *mesh.contour(built[0]).unwrap();
        assert!(ring.is_closed());
        assert_eq!(ring.begin(), edges[0]);
        assert_eq!(ring.end(), edges[3]);
        assert!(ring.flags().contains(ContourFlags::CROSSED));
        let strip = *mesh.contour(built[1]).unwrap();
        assert!(!strip.is_closed());
        assert_eq!((strip.begin(), strip.end()), (loose, loose));
        mesh.validate(1e-9).unwrap();
    }

    #[test]
    fn validate_reports_broken_links() {
        let mut mesh = Mesh::new();
        let a = line(&mut mesh, (0.0, 0.0), (1.0, 0.0), 0);
        let b = line(&mut mesh, (5.0, 0.0), (6.0, 0.0), 1);
        mesh.connect(a, b);
        assert_eq!(
            mesh.validate(1e-6),
            Err(InvariantViolation::BrokenLink { edge: a, link: "next" })
        );
    }
}
