// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric thresholds shared by the curve primitives and the resolver.

use kurbo::Point;

/// Distance and parameter thresholds used throughout the kernel.
///
/// Distances are in path units. The defaults suit paths in a pixel-like
/// coordinate space; scale them with your data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    /// Maximum distance of control points from the chord for a curve to be
    /// treated as a line.
    pub flatness: f64,
    /// Maximum deviation when a cubic is approximated by quadratic pieces for
    /// intersection.
    pub quad_approx: f64,
    /// Intersections closer than this to an endpoint of the path segment
    /// either curve was cut from are treated as shared vertices rather than
    /// crossings. Ends created by splitting at a crossing are not covered.
    pub endpoint: f64,
    /// Crossings within this distance of parameter 0 or 1 are touches.
    pub param: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            flatness: 0.5,
            quad_approx: 0.2,
            endpoint: 0.5,
            param: 1e-6,
        }
    }
}

/// How far outside `[0, 1]` a parameter may drift and still be snapped back.
pub const PARAM_SLACK: f64 = 1e-3;

/// Snap a parameter that drifted just outside `[0, 1]` back onto the range.
///
/// Values further out are returned unchanged; callers reject them.
pub fn tolerance_correct(t: f64) -> f64 {
    if t < 0.0 && t > -PARAM_SLACK {
        0.0
    } else if t > 1.0 && t < 1.0 + PARAM_SLACK {
        1.0
    } else {
        t
    }
}

/// Whether `t` lies in `[0, 1]` after [`tolerance_correct`].
pub fn in_unit(t: f64) -> bool {
    (0.0..=1.0).contains(&tolerance_correct(t))
}

/// Whether two points coincide within `tol`.
pub fn is_fuzzy_neighbour(a: Point, b: Point, tol: f64) -> bool {
    (a - b).hypot2() <= tol * tol
}

/// Whether a parameter sits within `tol` of either end of the unit range.
pub fn near_param_end(t: f64, tol: f64) -> bool {
    t <= tol || t >= 1.0 - tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_snaps_only_small_drift() {
        assert_eq!(tolerance_correct(-0.0005), 0.0);
        assert_eq!(tolerance_correct(1.0005), 1.0);
        assert_eq!(tolerance_correct(0.5), 0.5);
        assert_eq!(tolerance_correct(-0.1), -0.1);
        assert_eq!(tolerance_correct(1.5), 1.5);
        assert!(in_unit(1.0009));
        assert!(!in_unit(1.01));
    }

    #[test]
    fn neighbours() {
        assert!(is_fuzzy_neighbour(Point::new(0.0, 0.0), Point::new(0.3, 0.3), 0.5));
        assert!(!is_fuzzy_neighbour(Point::new(0.0, 0.0), Point::new(0.4, 0.4), 0.5));
        assert!(near_param_end(1e-9, 1e-6));
        assert!(!near_param_end(0.5, 1e-6));
    }
}
