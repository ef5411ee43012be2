// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line, quadratic and cubic segments and the operations the clipper needs on
//! them: evaluation, exact bounds, splitting, reparameterization, inflections,
//! self-intersection and quadratic approximation.

use arrayvec::ArrayVec;
use kurbo::{CubicBez, Line, ParamCurve, ParamCurveExtrema, PathEl, Point, QuadBez, Rect, Vec2};

use crate::poly;
use crate::tolerance::{in_unit, tolerance_correct};

/// Control polygons shorter than this are treated as a single point.
const DEGENERATE_LEN: f64 = 1e-9;

/// Candidates this much farther from the target than the best one are not
/// considered by [`Segment::reparameterize_near`].
const REPARAM_SLACK: f64 = 1e-6;

/// Inflections closer than this to either end are ignored.
const INFLECTION_MARGIN: f64 = 1e-4;

/// Maximum halving depth of [`cubic_to_quads`].
const MAX_QUAD_DEPTH: u32 = 16;

/// An immutable path segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Straight line.
    Line(Line),
    /// Quadratic Bézier.
    Quad(QuadBez),
    /// Cubic Bézier.
    Cubic(CubicBez),
}

impl Segment {
    /// First point.
    pub fn start(&self) -> Point {
        match self {
            Self::Line(l) => l.p0,
            Self::Quad(q) => q.p0,
            Self::Cubic(c) => c.p0,
        }
    }

    /// Last point.
    pub fn end(&self) -> Point {
        match self {
            Self::Line(l) => l.p1,
            Self::Quad(q) => q.p2,
            Self::Cubic(c) => c.p3,
        }
    }

    /// All control points, endpoints included.
    pub fn points(&self) -> ArrayVec<Point, 4> {
        let mut pts = ArrayVec::new();
        match *self {
            Self::Line(l) => pts.extend([l.p0, l.p1]),
            Self::Quad(q) => pts.extend([q.p0, q.p1, q.p2]),
            Self::Cubic(c) => pts.extend([c.p0, c.p1, c.p2, c.p3]),
        }
        pts
    }

    /// Polynomial degree: 1, 2 or 3.
    pub fn degree(&self) -> usize {
        match self {
            Self::Line(_) => 1,
            Self::Quad(_) => 2,
            Self::Cubic(_) => 3,
        }
    }

    /// Point at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        match self {
            Self::Line(l) => l.eval(t),
            Self::Quad(q) => q.eval(t),
            Self::Cubic(c) => c.eval(t),
        }
    }

    /// First derivative at parameter `t`.
    pub fn deriv(&self, t: f64) -> Vec2 {
        let mt = 1.0 - t;
        match *self {
            Self::Line(l) => l.p1 - l.p0,
            Self::Quad(q) => 2.0 * (mt * (q.p1 - q.p0) + t * (q.p2 - q.p1)),
            Self::Cubic(c) => {
                3.0 * (mt * mt * (c.p1 - c.p0)
                    + 2.0 * mt * t * (c.p2 - c.p1)
                    + t * t * (c.p3 - c.p2))
            }
        }
    }

    /// The same curve traversed from end to start.
    pub fn reverse(&self) -> Self {
        match *self {
            Self::Line(l) => Self::Line(Line::new(l.p1, l.p0)),
            Self::Quad(q) => Self::Quad(QuadBez::new(q.p2, q.p1, q.p0)),
            Self::Cubic(c) => Self::Cubic(CubicBez::new(c.p3, c.p2, c.p1, c.p0)),
        }
    }

    /// Exact bounds of the curve (not of its control polygon).
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Line(l) => l.bounding_box(),
            Self::Quad(q) => q.bounding_box(),
            Self::Cubic(c) => c.bounding_box(),
        }
    }

    /// Length of the control polygon.
    pub fn polygon_len(&self) -> f64 {
        self.points().windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Whether the whole segment collapses to one point.
    pub fn is_degenerate(&self) -> bool {
        self.polygon_len() <= DEGENERATE_LEN
    }

    /// Demote a curve to a line when its interior control points lie within
    /// `flatness` of the chord and project onto it.
    pub fn normalize(self, flatness: f64) -> Self {
        let (p0, p1) = (self.start(), self.end());
        let chord = p1 - p0;
        let len2 = chord.hypot2();
        if matches!(self, Self::Line(_)) || len2 <= DEGENERATE_LEN * DEGENERATE_LEN {
            return self;
        }
        let pts = self.points();
        let inner = &pts[1..pts.len() - 1];
        let flat = inner.iter().all(|&c| {
            let rel = c - p0;
            let along = rel.dot(chord) / len2;
            let off = rel.cross(chord).abs() / len2.sqrt();
            (0.0..=1.0).contains(&along) && off <= flatness
        });
        if flat {
            Self::Line(Line::new(p0, p1))
        } else {
            self
        }
    }

    /// Replace the endpoints, keeping interior control points.
    pub fn with_endpoints(self, start: Point, end: Point) -> Self {
        match self {
            Self::Line(_) => Self::Line(Line::new(start, end)),
            Self::Quad(q) => Self::Quad(QuadBez::new(start, q.p1, end)),
            Self::Cubic(c) => Self::Cubic(CubicBez::new(start, c.p1, c.p2, end)),
        }
    }

    /// Split at `t` with de Casteljau's construction.
    pub fn split_at(&self, t: f64) -> (Self, Self) {
        match *self {
            Self::Line(l) => {
                let m = l.p0.lerp(l.p1, t);
                (Self::Line(Line::new(l.p0, m)), Self::Line(Line::new(m, l.p1)))
            }
            Self::Quad(q) => {
                let a = q.p0.lerp(q.p1, t);
                let b = q.p1.lerp(q.p2, t);
                let m = a.lerp(b, t);
                (
                    Self::Quad(QuadBez::new(q.p0, a, m)),
                    Self::Quad(QuadBez::new(m, b, q.p2)),
                )
            }
            Self::Cubic(c) => {
                let a = c.p0.lerp(c.p1, t);
                let b = c.p1.lerp(c.p2, t);
                let d = c.p2.lerp(c.p3, t);
                let ab = a.lerp(b, t);
                let bd = b.lerp(d, t);
                let m = ab.lerp(bd, t);
                (
                    Self::Cubic(CubicBez::new(c.p0, a, ab, m)),
                    Self::Cubic(CubicBez::new(m, bd, d, c.p3)),
                )
            }
        }
    }

    /// Split at `t1 < t2` into three pieces.
    ///
    /// The second cut is located by reparameterizing the point at `t2` on the
    /// remainder after the first cut, preferring the candidate nearest the
    /// rescaled parameter. This stays correct when the point at `t2` is also
    /// hit elsewhere on the remainder, as at a self-intersection.
    pub fn split_at2(&self, t1: f64, t2: f64) -> [Self; 3] {
        debug_assert!(t1 < t2, "split_at2 needs t1 < t2, got {t1} and {t2}");
        let target = self.eval(t2);
        let (head, rest) = self.split_at(t1);
        let hint = (t2 - t1) / (1.0 - t1);
        let local = rest.reparameterize_near(target, hint);
        let (mid, tail) = rest.split_at(local);
        [head, mid, tail]
    }

    /// Split at every parameter in `ts`, which must be ascending and inside
    /// `(0, 1)`.
    pub fn split_many(&self, ts: &[f64]) -> Vec<Self> {
        let mut out = Vec::with_capacity(ts.len() + 1);
        let mut rest = *self;
        let mut done = 0.0;
        for &t in ts {
            let local = (t - done) / (1.0 - done);
            let (piece, next) = rest.split_at(local);
            out.push(piece);
            rest = next;
            done = t;
        }
        out.push(rest);
        out
    }

    /// The part of the segment between `t0` and `t1`.
    pub fn subsegment(&self, t0: f64, t1: f64) -> Self {
        match self {
            Self::Line(l) => Self::Line(l.subsegment(t0..t1)),
            Self::Quad(q) => Self::Quad(q.subsegment(t0..t1)),
            Self::Cubic(c) => Self::Cubic(c.subsegment(t0..t1)),
        }
    }

    /// Parameter of the point on the segment closest to `p`, assuming `p` lies
    /// on or very near the curve.
    pub fn reparameterize(&self, p: Point) -> f64 {
        self.reparameterize_candidates(p)
            .into_iter()
            .map(|t| (t, self.eval(t).distance(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0.0, |(t, _)| t)
    }

    /// Like [`reparameterize`](Self::reparameterize), but when several
    /// parameters map to `p` pick the one nearest `hint`.
    pub fn reparameterize_near(&self, p: Point, hint: f64) -> f64 {
        let scored: ArrayVec<(f64, f64), 16> = self
            .reparameterize_candidates(p)
            .into_iter()
            .map(|t| (t, self.eval(t).distance(p)))
            .collect();
        let best = scored.iter().fold(f64::INFINITY, |m, s| m.min(s.1));
        scored
            .iter()
            .filter(|s| s.1 <= best + REPARAM_SLACK)
            .min_by(|a, b| (a.0 - hint).abs().total_cmp(&(b.0 - hint).abs()))
            .map_or(hint, |s| s.0)
    }

    fn reparameterize_candidates(&self, p: Point) -> ArrayVec<f64, 16> {
        let mut out = ArrayVec::new();
        out.push(0.0);
        out.push(1.0);
        if let Self::Line(l) = self {
            let d = l.p1 - l.p0;
            let t = if d.x.abs() >= d.y.abs() {
                if d.x == 0.0 { 0.0 } else { (p.x - l.p0.x) / d.x }
            } else {
                (p.y - l.p0.y) / d.y
            };
            out.push(t.clamp(0.0, 1.0));
            return out;
        }
        let (mut xs, mut ys) = self.power_basis();
        if let Some(c) = xs.last_mut() {
            *c -= p.x;
        }
        if let Some(c) = ys.last_mut() {
            *c -= p.y;
        }
        for t in poly::solve(&xs).into_iter().chain(poly::solve(&ys)) {
            if in_unit(t) {
                out.push(tolerance_correct(t));
            }
        }
        out
    }

    /// Power-basis coefficients of x(t) and y(t), highest degree first.
    pub fn power_basis(&self) -> (ArrayVec<f64, 4>, ArrayVec<f64, 4>) {
        let pts = self.points();
        let axis = |f: fn(&Point) -> f64| {
            let v: ArrayVec<f64, 4> = pts.iter().map(f).collect();
            power_coeffs(&v)
        };
        (axis(|p| p.x), axis(|p| p.y))
    }

    /// The drawing command that continues a path along this segment.
    pub fn to_path_el(&self) -> PathEl {
        match *self {
            Self::Line(l) => PathEl::LineTo(l.p1),
            Self::Quad(q) => PathEl::QuadTo(q.p1, q.p2),
            Self::Cubic(c) => PathEl::CurveTo(c.p1, c.p2, c.p3),
        }
    }
}

fn power_coeffs(v: &[f64]) -> ArrayVec<f64, 4> {
    let mut out = ArrayVec::new();
    match *v {
        [a, b] => out.extend([b - a, a]),
        [a, b, c] => out.extend([a - 2.0 * b + c, 2.0 * (b - a), a]),
        [a, b, c, d] => out.extend([
            d - 3.0 * c + 3.0 * b - a,
            3.0 * (c - 2.0 * b + a),
            3.0 * (b - a),
            a,
        ]),
        _ => {}
    }
    out
}

/// Interior parameters where the curvature of `c` changes sign.
pub fn cubic_inflections(c: &CubicBez) -> ArrayVec<f64, 2> {
    let (xs, ys) = Segment::Cubic(*c).power_basis();
    let (ax, bx, cx) = (xs[0], xs[1], xs[2]);
    let (ay, by, cy) = (ys[0], ys[1], ys[2]);
    // x'y'' - y'x'' divided by 2.
    poly::solve_quadratic(
        3.0 * (ay * bx - ax * by),
        3.0 * (ay * cx - ax * cy),
        cx * by - cy * bx,
    )
    .into_iter()
    .filter(|t| *t > INFLECTION_MARGIN && *t < 1.0 - INFLECTION_MARGIN)
    .collect()
}

/// The parameter pair `(s, t)`, `s < t`, where a cubic crosses itself.
///
/// Writes the coincidence condition in terms of `u = s + t` and `v = s·t`,
/// solves the resulting linear system per axis and recovers `s` and `t` as the
/// roots of `z² - u·z + v`. Cusps (a double root) are not loops and yield
/// `None`.
pub fn cubic_self_intersection(c: &CubicBez) -> Option<(f64, f64)> {
    let (xs, ys) = Segment::Cubic(*c).power_basis();
    let (ax, bx, cx) = (xs[0], xs[1], xs[2]);
    let (ay, by, cy) = (ys[0], ys[1], ys[2]);
    let det = ax * by - ay * bx;
    let scale = ax.abs().max(ay.abs()).max(bx.abs()).max(by.abs());
    if scale == 0.0 || det.abs() <= 1e-12 * scale * scale {
        return None;
    }
    // A·w + B·u = -C on both axes, with w = u² - v.
    let w = (bx * cy - cx * by) / det;
    let u = (ay * cx - ax * cy) / det;
    let v = u * u - w;
    let disc = u * u - 4.0 * v;
    if disc <= 1e-12 {
        return None;
    }
    let roots = poly::solve_quadratic(1.0, -u, v);
    let [s, t] = roots.as_slice() else {
        return None;
    };
    (*s >= 0.0 && *t <= 1.0 && s < t).then_some((*s, *t))
}

/// A quadratic approximating part of a cubic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadPiece {
    /// The approximation.
    pub quad: QuadBez,
    /// Start parameter on the source cubic.
    pub t0: f64,
    /// End parameter on the source cubic.
    pub t1: f64,
}

impl QuadPiece {
    /// Map a parameter on the piece back to the source cubic.
    pub fn to_source(&self, s: f64) -> f64 {
        self.t0 + s * (self.t1 - self.t0)
    }
}

/// Approximate a cubic by quadratics within `tolerance`.
///
/// The cubic is first cut at its inflections; each piece is then halved until
/// the mid-point quadratic is within tolerance of it.
pub fn cubic_to_quads(c: &CubicBez, tolerance: f64) -> Vec<QuadPiece> {
    let mut out = Vec::new();
    if Segment::Cubic(*c).polygon_len() < tolerance {
        out.push(QuadPiece {
            quad: QuadBez::new(c.p0, c.p1.midpoint(c.p2), c.p3),
            t0: 0.0,
            t1: 1.0,
        });
        return out;
    }
    let mut cuts: ArrayVec<f64, 4> = ArrayVec::new();
    cuts.push(0.0);
    cuts.extend(cubic_inflections(c));
    cuts.push(1.0);
    for span in cuts.windows(2) {
        approximate(&c.subsegment(span[0]..span[1]), span[0], span[1], tolerance, 0, &mut out);
    }
    out
}

fn approximate(c: &CubicBez, t0: f64, t1: f64, tolerance: f64, depth: u32, out: &mut Vec<QuadPiece>) {
    let err = 3_f64.sqrt() / 36.0 * (c.p3.to_vec2() - 3.0 * c.p2.to_vec2() + 3.0 * c.p1.to_vec2() - c.p0.to_vec2()).hypot();
    if err <= tolerance || depth >= MAX_QUAD_DEPTH {
        let ctrl = ((3.0 * (c.p1.to_vec2() + c.p2.to_vec2()) - c.p0.to_vec2() - c.p3.to_vec2()) / 4.0).to_point();
        out.push(QuadPiece {
            quad: QuadBez::new(c.p0, ctrl, c.p3),
            t0,
            t1,
        });
        return;
    }
    let (a, b) = c.subdivide();
    let tm = 0.5 * (t0 + t1);
    approximate(&a, t0, tm, tolerance, depth + 1, out);
    approximate(&b, tm, t1, tolerance, depth + 1, out);
}
