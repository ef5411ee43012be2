// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segment/segment intersection.
//!
//! Each type pair reduces to a single polynomial:
//!
//! - line × line: a 2×2 linear system.
//! - line × curve: the curve's coordinate polynomials substituted into the
//!   line's implicit equation.
//! - quad × quad: one parameter eliminated to give a quartic in the other.
//! - cubic × anything but a line: the cubic is approximated by quadratics and
//!   the pieces are intersected as quad × quad.
//!
//! Curve pairs are also bracketed: every pair of quadratic pieces is
//! subdivided on the original curves for as long as the control hulls of the
//! sub-pieces overlap, and each flat pair whose chords cross yields a seed.
//! All seeds, polynomial or bracketed, are refined with Newton's method
//! against the original curves.
//!
//! A pair is evaluated in a fixed order (lower degree first, then by control
//! points) and swapped back, so `intersect(a, b)` and `intersect(b, a)` give
//! the same hits up to the order of parameters.

use core::cmp::Ordering;

use arrayvec::ArrayVec;
use kurbo::{Point, QuadBez, Rect};

use crate::curve::{QuadPiece, Segment, cubic_to_quads};
use crate::poly;
use crate::tolerance::{Tolerances, in_unit, is_fuzzy_neighbour, near_param_end, tolerance_correct};

/// Relative threshold below which two directions count as parallel.
const PARALLEL_EPS: f64 = 1e-9;

/// Implicit-equation coefficients below this mean the curve lies on the line.
const COINCIDENT_EPS: f64 = 1e-9;

/// Newton iterations used to polish a candidate.
const NEWTON_STEPS: usize = 16;

/// Candidates whose refined points are farther apart than this are rejected.
const RESIDUAL_TOL: f64 = 1e-6;

/// Hits closer than this are the same hit.
const DEDUP_DIST: f64 = 1e-6;

/// Bracketing stops splitting a piece once its control points are this close
/// to its chord, relative to the size of the pair.
const FLAT_REL: f64 = 1e-8;

/// Subdivision depth after which a pair is treated as flat regardless.
const MAX_DEPTH: usize = 64;

/// Overlapping pairs examined per bracketing call. Only coincident curves
/// get near it.
const MAX_PAIRS: usize = 1 << 14;

/// How far past its ends a chord crossing may lie and still seed Newton.
const CHORD_SLACK: f64 = 0.25;

/// One crossing between two segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// The crossing point.
    pub point: Point,
    /// Parameter on the first segment.
    pub t_a: f64,
    /// Parameter on the second segment.
    pub t_b: f64,
}

impl Hit {
    fn swapped(self) -> Self {
        Self {
            point: self.point,
            t_a: self.t_b,
            t_b: self.t_a,
        }
    }
}

/// All interior crossings of `a` and `b`.
///
/// Hits within `tol.endpoint` of an endpoint of either segment are shared
/// vertices, not crossings, and are left out. Parallel, coincident or
/// otherwise ill-conditioned pairs report no hits. Results are ordered by
/// `t_a`.
pub fn intersect(a: &Segment, b: &Segment, tol: &Tolerances) -> ArrayVec<Hit, 9> {
    intersect_anchored(a, &[a.start(), a.end()], b, &[b.start(), b.end()], tol)
}

/// Like [`intersect`], with the shared-vertex band drawn around `a_anchors`
/// and `b_anchors` instead of the segments' own endpoints.
///
/// This is how pieces of a split segment are compared: the anchors are the
/// endpoints of the path segment a piece was cut from, and an end created by
/// a split only rejects hits that sit on it (at parameter 0 or 1, or within
/// rounding distance of the point).
pub fn intersect_anchored(
    a: &Segment,
    a_anchors: &[Point],
    b: &Segment,
    b_anchors: &[Point],
    tol: &Tolerances,
) -> ArrayVec<Hit, 9> {
    let mut out = ArrayVec::new();
    if !rects_overlap(a.bounding_box(), b.bounding_box()) {
        return out;
    }
    let swap = canonical_order(a, b) == Ordering::Greater;
    let (first, second) = if swap { (b, a) } else { (a, b) };
    let raw = raw_hits(first, second, tol.quad_approx);
    let ends = [a.start(), a.end(), b.start(), b.end()];
    let mut hits: Vec<Hit> = raw
        .into_iter()
        .filter(|h| in_unit(h.t_a) && in_unit(h.t_b) && h.point.is_finite())
        .map(|h| Hit {
            point: h.point,
            t_a: tolerance_correct(h.t_a),
            t_b: tolerance_correct(h.t_b),
        })
        .filter(|h| !near_param_end(h.t_a, tol.param) && !near_param_end(h.t_b, tol.param))
        .filter(|h| {
            !a_anchors
                .iter()
                .chain(b_anchors)
                .any(|&v| is_fuzzy_neighbour(h.point, v, tol.endpoint))
        })
        .filter(|h| !ends.iter().any(|&e| is_fuzzy_neighbour(h.point, e, DEDUP_DIST)))
        .collect();
    hits.sort_by(|x, y| x.t_a.total_cmp(&y.t_a).then(x.t_b.total_cmp(&y.t_b)));
    for h in hits {
        if out.iter().any(|o: &Hit| is_fuzzy_neighbour(o.point, h.point, DEDUP_DIST)) {
            continue;
        }
        if out.try_push(h).is_err() {
            break;
        }
    }
    if swap {
        for h in &mut out {
            *h = h.swapped();
        }
        out.sort_by(|x, y| x.t_a.total_cmp(&y.t_a));
    }
    log::trace!("intersect: {} hit(s) between {a:?} and {b:?}", out.len());
    out
}

/// Degree first, then control points in lexicographic order.
fn canonical_order(a: &Segment, b: &Segment) -> Ordering {
    a.degree().cmp(&b.degree()).then_with(|| {
        let (pa, pb) = (a.points(), b.points());
        pa.iter()
            .zip(pb.iter())
            .map(|(p, q)| p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// `a` precedes `b` in [`canonical_order`].
fn raw_hits(a: &Segment, b: &Segment, quad_approx: f64) -> Vec<Hit> {
    match (a, b) {
        (Segment::Line(l1), Segment::Line(l2)) => line_line(l1.p0, l1.p1, l2.p0, l2.p1)
            .into_iter()
            .collect(),
        (Segment::Line(l), curve) => line_curve(l.p0, l.p1, curve),
        _ => via_quads(a, b, quad_approx),
    }
}

fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn line_line(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Hit> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let denom = d1.cross(d2);
    if denom.abs() <= PARALLEL_EPS * d1.hypot() * d2.hypot() {
        return None;
    }
    let w = b0 - a0;
    let t_a = w.cross(d2) / denom;
    let t_b = w.cross(d1) / denom;
    Some(Hit {
        point: a0.lerp(a1, t_a),
        t_a,
        t_b,
    })
}

fn line_curve(p0: Point, p1: Point, curve: &Segment) -> Vec<Hit> {
    let d = p1 - p0;
    let len2 = d.hypot2();
    if len2 == 0.0 {
        return Vec::new();
    }
    // Unit normal form n·p + c0 = 0.
    let len = len2.sqrt();
    let (nx, ny) = (-d.y / len, d.x / len);
    let c0 = -(nx * p0.x + ny * p0.y);
    let (xs, ys) = curve.power_basis();
    let mut coeffs: ArrayVec<f64, 4> = xs.iter().zip(&ys).map(|(x, y)| nx * x + ny * y).collect();
    if let Some(last) = coeffs.last_mut() {
        *last += c0;
    }
    if coeffs.iter().all(|c| c.abs() < COINCIDENT_EPS) {
        return Vec::new();
    }
    poly::solve(&coeffs)
        .into_iter()
        .filter(|t| in_unit(*t))
        .map(|t| {
            let point = curve.eval(tolerance_correct(t));
            Hit {
                point,
                t_a: (point - p0).dot(d) / len2,
                t_b: t,
            }
        })
        .collect()
}

/// Parameter pairs where two quadratics meet, unrefined.
fn quad_quad(p: &QuadBez, q: &QuadBez) -> ArrayVec<(f64, f64), 4> {
    if let Some(r) = quad_quad_eliminate(p, q) {
        return r;
    }
    quad_quad_eliminate(q, p)
        .map(|r| r.into_iter().map(|(t, s)| (s, t)).collect())
        .unwrap_or_default()
}

/// Express `q`'s parameter as a quadratic in `p`'s and solve the quartic.
///
/// Returns `None` when `q`'s parameterization is too close to linear for the
/// elimination to be stable.
fn quad_quad_eliminate(p: &QuadBez, q: &QuadBez) -> Option<ArrayVec<(f64, f64), 4>> {
    let (px, py) = Segment::Quad(*p).power_basis();
    let (qx, qy) = Segment::Quad(*q).power_basis();
    let (a, b, c) = (px[0], px[1], px[2]);
    let (d, e, f) = (py[0], py[1], py[2]);
    let (g, h, i) = (qx[0], qx[1], qx[2]);
    let (j, k, l) = (qy[0], qy[1], qy[2]);

    let tc = j * h - g * k;
    let scale = g.abs().max(h.abs()).max(j.abs()).max(k.abs());
    if scale == 0.0 || tc.abs() <= 1e-12 * scale * scale {
        return None;
    }
    // t = u·s² + v·s + w
    let u = (j * a - g * d) / tc;
    let v = (j * b - g * e) / tc;
    let w = (j * c - g * f - j * i + g * l) / tc;

    // Substitute into whichever coordinate equation has the larger t² term.
    let (m, n, o, pp, qq, r) = if g.abs() >= j.abs() {
        (g, h, i, a, b, c)
    } else {
        (j, k, l, d, e, f)
    };
    let quartic = [
        m * u * u,
        2.0 * m * u * v,
        m * (v * v + 2.0 * u * w) + n * u - pp,
        2.0 * m * v * w + n * v - qq,
        m * w * w + n * w + o - r,
    ];
    Some(
        poly::solve(&quartic)
            .into_iter()
            .filter(|s| in_unit(*s))
            .map(|s| (s, u * s * s + v * s + w))
            .collect(),
    )
}

fn quad_pieces(seg: &Segment, tolerance: f64) -> Vec<QuadPiece> {
    match *seg {
        Segment::Cubic(c) => cubic_to_quads(&c, tolerance),
        Segment::Quad(quad) => vec![QuadPiece {
            quad,
            t0: 0.0,
            t1: 1.0,
        }],
        Segment::Line(l) => vec![QuadPiece {
            quad: QuadBez::new(l.p0, l.p0.midpoint(l.p1), l.p1),
            t0: 0.0,
            t1: 1.0,
        }],
    }
}

/// Intersect through quadratic pieces and refine on the originals.
///
/// The quartic roots of each piece pair are only seeds. The same pair is also
/// bracketed on the source curves, so a crossing the approximation misses
/// still gets a seed of its own.
fn via_quads(a: &Segment, b: &Segment, tolerance: f64) -> Vec<Hit> {
    let pa = quad_pieces(a, tolerance);
    let pb = quad_pieces(b, tolerance);
    let mut seeds = Vec::new();
    for qa in &pa {
        let ba = Segment::Quad(qa.quad).bounding_box().inflate(tolerance, tolerance);
        let sub_a = Span::new(a.subsegment(qa.t0, qa.t1), qa.t0, qa.t1);
        for qb in &pb {
            if rects_overlap(ba, Segment::Quad(qb.quad).bounding_box()) {
                for (s, t) in quad_quad(&qa.quad, &qb.quad) {
                    if !in_unit(t) {
                        continue;
                    }
                    let s = qa.to_source(tolerance_correct(s).clamp(0.0, 1.0));
                    let t = qb.to_source(tolerance_correct(t).clamp(0.0, 1.0));
                    seeds.push((s, t));
                }
            }
            let sub_b = Span::new(b.subsegment(qb.t0, qb.t1), qb.t0, qb.t1);
            bracket(sub_a, sub_b, &mut seeds);
        }
    }
    seeds
        .into_iter()
        .filter_map(|(s, t)| refine(a, b, s, t))
        .collect()
}

/// A piece of a source segment and the parameter range it covers.
#[derive(Clone, Copy, Debug)]
struct Span {
    seg: Segment,
    t0: f64,
    t1: f64,
}

impl Span {
    fn new(seg: Segment, t0: f64, t1: f64) -> Self {
        Self { seg, t0, t1 }
    }

    fn to_source(&self, t: f64) -> f64 {
        self.t0 + t * (self.t1 - self.t0)
    }

    fn halves(&self) -> (Self, Self) {
        let (l, r) = self.seg.split_at(0.5);
        let mid = self.to_source(0.5);
        (Self::new(l, self.t0, mid), Self::new(r, mid, self.t1))
    }
}

/// Subdivide `a` and `b` while their control hulls overlap and push a seed
/// (in source parameters) for every flat pair whose chords cross.
///
/// A pair is only dropped once its hulls are disjoint, so every transversal
/// crossing ends up inside some flat pair.
fn bracket(a: Span, b: Span, seeds: &mut Vec<(f64, f64)>) {
    let (ha, hb) = (control_hull(&a.seg), control_hull(&b.seg));
    let size = ha.union(hb);
    let flat_tol = ((size.width() + size.height()) * FLAT_REL).max(f64::MIN_POSITIVE);
    let mut stack = vec![(a, b, 0_usize)];
    let mut visited = 0;
    while let Some((a, b, depth)) = stack.pop() {
        let (ha, hb) = (control_hull(&a.seg), control_hull(&b.seg));
        if !rects_overlap(ha, hb) {
            continue;
        }
        visited += 1;
        if visited > MAX_PAIRS {
            log::trace!("intersect: bracketing gave up after {MAX_PAIRS} pairs");
            return;
        }
        let flat_a = flatness(&a.seg) <= flat_tol;
        let flat_b = flatness(&b.seg) <= flat_tol;
        if (flat_a && flat_b) || depth >= MAX_DEPTH {
            let slack = -CHORD_SLACK..=1.0 + CHORD_SLACK;
            if let Some(h) = line_line(a.seg.start(), a.seg.end(), b.seg.start(), b.seg.end())
                && slack.contains(&h.t_a)
                && slack.contains(&h.t_b)
            {
                seeds.push((a.to_source(h.t_a), b.to_source(h.t_b)));
            }
            continue;
        }
        let split_a = !flat_a && (flat_b || diagonal(ha) >= diagonal(hb));
        if split_a {
            let (l, r) = a.halves();
            stack.push((l, b, depth + 1));
            stack.push((r, b, depth + 1));
        } else {
            let (l, r) = b.halves();
            stack.push((a, l, depth + 1));
            stack.push((a, r, depth + 1));
        }
    }
}

/// Bounds of the control points, which contain the curve.
fn control_hull(seg: &Segment) -> Rect {
    let pts = seg.points();
    pts.iter()
        .skip(1)
        .fold(Rect::from_points(pts[0], pts[0]), |r, &p| r.union_pt(p))
}

fn diagonal(r: Rect) -> f64 {
    r.width() + r.height()
}

/// Farthest distance of an inner control point from the chord segment.
fn flatness(seg: &Segment) -> f64 {
    let pts = seg.points();
    let (p0, p1) = (pts[0], pts[pts.len() - 1]);
    let chord = p1 - p0;
    let len2 = chord.hypot2();
    pts[1..pts.len() - 1]
        .iter()
        .map(|&c| {
            let rel = c - p0;
            if len2 == 0.0 {
                return rel.hypot();
            }
            let along = (rel.dot(chord) / len2).clamp(0.0, 1.0);
            (rel - chord * along).hypot()
        })
        .fold(0.0, f64::max)
}

/// Newton's method on `a(s) - b(t) = 0`.
///
/// Returns `None` when the iteration does not land on a common point.
fn refine(a: &Segment, b: &Segment, mut s: f64, mut t: f64) -> Option<Hit> {
    for _ in 0..NEWTON_STEPS {
        let r = a.eval(s) - b.eval(t);
        if r.hypot2() < 1e-24 {
            break;
        }
        let da = a.deriv(s);
        let db = b.deriv(t);
        let det = -da.cross(db);
        if det.abs() < 1e-14 {
            break;
        }
        s = (s + r.cross(db) / det).clamp(-0.01, 1.01);
        t = (t + r.cross(da) / det).clamp(-0.01, 1.01);
    }
    let point = a.eval(s);
    (point.distance(b.eval(t)) <= RESIDUAL_TOL).then_some(Hit {
        point,
        t_a: s,
        t_b: t,
    })
}
