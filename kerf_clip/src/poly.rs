// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Real roots of univariate polynomials up to degree four.
//!
//! Every solver scales its coefficients so the largest has magnitude one
//! before deciding whether a leading coefficient is zero, then falls back to
//! the next lower degree. Roots are returned in ascending order with near
//! duplicates merged. No domain filtering happens here; callers clamp to
//! whatever parameter range they care about.
//!
//! The solvers never fail: an ill-conditioned or degenerate polynomial simply
//! reports fewer roots.

use arrayvec::ArrayVec;
use core::ops::{Add, Div, Mul, Sub};

/// Leading coefficients below this (after scaling) are treated as zero.
const EPS: f64 = 1e-12;

/// Complex roots whose imaginary part is below this (relative) count as real.
const IMAG_TOL: f64 = 1e-6;

/// Roots closer than this are merged.
const MERGE_TOL: f64 = 1e-7;

/// Evaluate a polynomial given highest-degree coefficient first.
pub fn eval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Value and first derivative of a polynomial, highest-degree first.
fn eval_with_deriv(coeffs: &[f64], x: f64) -> (f64, f64) {
    let mut p = 0.0;
    let mut dp = 0.0;
    for &c in coeffs {
        dp = dp * x + p;
        p = p * x + c;
    }
    (p, dp)
}

/// Roots of any polynomial of degree at most four, highest-degree first.
pub fn solve(coeffs: &[f64]) -> ArrayVec<f64, 4> {
    match *coeffs {
        [a, b] => solve_linear(a, b).into_iter().collect(),
        [a, b, c] => solve_quadratic(a, b, c).into_iter().collect(),
        [a, b, c, d] => solve_cubic(a, b, c, d).into_iter().collect(),
        [a, b, c, d, e] => solve_quartic(a, b, c, d, e),
        _ => ArrayVec::new(),
    }
}

/// Root of `a·x + b`.
pub fn solve_linear(a: f64, b: f64) -> ArrayVec<f64, 1> {
    let mut out = ArrayVec::new();
    if let Some([a, b]) = normalized([a, b])
        && a.abs() >= EPS
    {
        out.push(-b / a);
    }
    out
}

/// Roots of `a·x² + b·x + c`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> ArrayVec<f64, 2> {
    let mut out = ArrayVec::new();
    let Some([a, b, c]) = normalized([a, b, c]) else {
        return out;
    };
    if a.abs() < EPS {
        out.extend(solve_linear(b, c));
        return out;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < -EPS {
        return out;
    }
    if disc <= EPS {
        out.push(-b / (2.0 * a));
        return out;
    }
    // Avoid cancellation between -b and the root of the discriminant.
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let (r0, r1) = (q / a, c / q);
    if r0 <= r1 {
        out.push(r0);
        out.push(r1);
    } else {
        out.push(r1);
        out.push(r0);
    }
    out
}

/// Real roots of `a·x³ + b·x² + c·x + d`.
///
/// Cardano's formula is evaluated in complex arithmetic so one code path
/// covers one and three real roots; roots with a negligible imaginary part are
/// kept and polished with Newton steps.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> ArrayVec<f64, 3> {
    let mut out = ArrayVec::new();
    let Some(coeffs @ [a, b, c, d]) = normalized([a, b, c, d]) else {
        return out;
    };
    if a.abs() < EPS {
        out.extend(solve_quadratic(b, c, d));
        return out;
    }
    let d0 = b * b - 3.0 * a * c;
    let d1 = 2.0 * b * b * b - 9.0 * a * b * c + 27.0 * a * a * d;
    let disc = Complex::real(d1 * d1 - 4.0 * d0 * d0 * d0).sqrt();
    let plus = ((Complex::real(d1) + disc) * 0.5).cbrt();
    let minus = ((Complex::real(d1) - disc) * 0.5).cbrt();
    let cc = if plus.norm() >= minus.norm() {
        plus
    } else {
        minus
    };

    let mut roots = ArrayVec::<f64, 4>::new();
    if cc.norm() < EPS {
        // Triple root.
        roots.push(-b / (3.0 * a));
    } else {
        for w in OMEGA {
            let ck = cc * w;
            let x = (Complex::real(b) + ck + Complex::real(d0) / ck) * (-1.0 / (3.0 * a));
            if x.im.abs() <= IMAG_TOL * x.re.abs().max(1.0) {
                roots.push(polish(&coeffs, x.re));
            }
        }
    }
    out.extend(sorted_unique(roots));
    out
}

/// Real roots of `a·x⁴ + b·x³ + c·x² + d·x + e`.
///
/// Depresses the quartic, solves Ferrari's resolvent cubic for its largest
/// root and splits the quartic into two quadratics.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> ArrayVec<f64, 4> {
    let Some([a, b, c, d, e]) = normalized([a, b, c, d, e]) else {
        return ArrayVec::new();
    };
    if a.abs() < EPS {
        return solve_cubic(b, c, d, e).into_iter().collect();
    }
    let (b, c, d, e) = (b / a, c / a, d / a, e / a);
    let monic = [1.0, b, c, d, e];
    let b2 = b * b;
    let p = c - 3.0 * b2 / 8.0;
    let q = d - b * c / 2.0 + b2 * b / 8.0;
    let r = e - b * d / 4.0 + b2 * c / 16.0 - 3.0 * b2 * b2 / 256.0;
    let shift = -b / 4.0;

    let mut ys = ArrayVec::<f64, 4>::new();
    if q.abs() < EPS {
        // Biquadratic in y².
        for z in solve_quadratic(1.0, p, r) {
            if z > EPS {
                let s = z.sqrt();
                ys.push(-s);
                ys.push(s);
            } else if z.abs() <= EPS {
                ys.push(0.0);
            }
        }
    } else {
        let m = solve_cubic(8.0, 8.0 * p, 2.0 * p * p - 8.0 * r, -q * q)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);
        if m > 0.0 {
            let s = (2.0 * m).sqrt();
            let k = q / (2.0 * s);
            for y in solve_quadratic(1.0, -s, p / 2.0 + m + k) {
                ys.push(y);
            }
            for y in solve_quadratic(1.0, s, p / 2.0 + m - k) {
                ys.push(y);
            }
        }
    }
    sorted_unique(ys.into_iter().map(|y| polish(&monic, y + shift)).collect())
}

/// Scale so the largest coefficient has magnitude one.
fn normalized<const N: usize>(coeffs: [f64; N]) -> Option<[f64; N]> {
    if coeffs.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let s = coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if s == 0.0 {
        return None;
    }
    Some(coeffs.map(|c| c / s))
}

/// A few Newton steps, stopping as soon as the residual stops shrinking.
fn polish(coeffs: &[f64], mut x: f64) -> f64 {
    let (mut p, mut dp) = eval_with_deriv(coeffs, x);
    for _ in 0..4 {
        if p == 0.0 || dp == 0.0 {
            break;
        }
        let nx = x - p / dp;
        let (np, ndp) = eval_with_deriv(coeffs, nx);
        if !nx.is_finite() || np.abs() >= p.abs() {
            break;
        }
        (x, p, dp) = (nx, np, ndp);
    }
    x
}

fn sorted_unique(mut roots: ArrayVec<f64, 4>) -> ArrayVec<f64, 4> {
    roots.sort_by(f64::total_cmp);
    let mut out = ArrayVec::new();
    for r in roots {
        if out.last().is_none_or(|&last: &f64| r - last > MERGE_TOL) {
            out.push(r);
        }
    }
    out
}

/// Minimal complex number for Cardano's formula.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

const OMEGA: [Complex; 3] = [
    Complex { re: 1.0, im: 0.0 },
    Complex {
        re: -0.5,
        im: 0.866_025_403_784_438_6,
    },
    Complex {
        re: -0.5,
        im: -0.866_025_403_784_438_6,
    },
];

impl Complex {
    const fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }

    fn from_polar(r: f64, theta: f64) -> Self {
        Self {
            re: r * theta.cos(),
            im: r * theta.sin(),
        }
    }

    /// Principal square root.
    fn sqrt(self) -> Self {
        if self.im == 0.0 {
            return if self.re >= 0.0 {
                Self::real(self.re.sqrt())
            } else {
                Self {
                    re: 0.0,
                    im: (-self.re).sqrt(),
                }
            };
        }
        Self::from_polar(self.norm().sqrt(), self.arg() / 2.0)
    }

    /// Principal cube root.
    fn cbrt(self) -> Self {
        if self.im == 0.0 && self.re >= 0.0 {
            return Self::real(self.re.cbrt());
        }
        Self::from_polar(self.norm().cbrt(), self.arg() / 3.0)
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl Mul<f64> for Complex {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            re: self.re * rhs,
            im: self.im * rhs,
        }
    }
}

impl Div for Complex {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let den = rhs.re * rhs.re + rhs.im * rhs.im;
        Self {
            re: (self.re * rhs.re + self.im * rhs.im) / den,
            im: (self.im * rhs.re - self.re * rhs.im) / den,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_roots(got: &[f64], want: &[f64], tol: f64) {
        assert_eq!(got.len(), want.len(), "got {got:?}, want {want:?}");
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < tol, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn linear() {
        assert_roots(&solve_linear(2.0, -4.0), &[2.0], 1e-12);
        assert!(solve_linear(0.0, 1.0).is_empty());
    }

    #[test]
    fn quadratic_cases() {
        assert_roots(&solve_quadratic(1.0, -3.0, 2.0), &[1.0, 2.0], 1e-12);
        assert_roots(&solve_quadratic(1.0, -2.0, 1.0), &[1.0], 1e-12);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
        // Leading coefficient vanishes: falls back to the linear root.
        assert_roots(&solve_quadratic(0.0, 2.0, -4.0), &[2.0], 1e-12);
        assert!(solve_quadratic(0.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn quadratic_is_stable_with_tiny_root() {
        // Roots 1e-8 and 1e8; the naive formula loses the small one.
        let r = solve_quadratic(1.0, -(1e8 + 1e-8), 1.0);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 1e-8).abs() < 1e-16);
    }

    #[test]
    fn cubic_three_real_roots() {
        assert_roots(&solve_cubic(1.0, -6.0, 11.0, -6.0), &[1.0, 2.0, 3.0], 1e-9);
    }

    #[test]
    fn cubic_one_real_root() {
        assert_roots(&solve_cubic(1.0, 0.0, 1.0, 10.0), &[-2.0], 1e-9);
    }

    #[test]
    fn cubic_repeated_roots() {
        assert_roots(&solve_cubic(1.0, -3.0, 3.0, -1.0), &[1.0], 1e-4);
        // x²(x - 1): double root at zero.
        assert_roots(&solve_cubic(1.0, -1.0, 0.0, 0.0), &[0.0, 1.0], 1e-6);
    }

    #[test]
    fn cubic_degrades_to_quadratic() {
        assert_roots(&solve_cubic(0.0, 1.0, -3.0, 2.0), &[1.0, 2.0], 1e-12);
    }

    #[test]
    fn quartic_symmetric_roots() {
        assert_roots(
            &solve_quartic(1.0, -10.0, 35.0, -50.0, 24.0),
            &[1.0, 2.0, 3.0, 4.0],
            1e-8,
        );
        assert_roots(
            &solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0),
            &[-2.0, -1.0, 1.0, 2.0],
            1e-9,
        );
    }

    #[test]
    fn quartic_general_roots() {
        // (x - 1)(x - 2)(x - 3)(x - 5)
        assert_roots(
            &solve_quartic(1.0, -11.0, 41.0, -61.0, 30.0),
            &[1.0, 2.0, 3.0, 5.0],
            1e-8,
        );
        // (x² + 1)(x - 0.25)(x - 0.75): two real roots.
        assert_roots(
            &solve_quartic(1.0, -1.0, 1.1875, -1.0, 0.1875),
            &[0.25, 0.75],
            1e-8,
        );
    }

    #[test]
    fn quartic_without_real_roots() {
        assert!(solve_quartic(1.0, 0.0, 0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn solve_dispatches_on_length() {
        assert_roots(&solve(&[1.0, -3.0, 2.0]), &[1.0, 2.0], 1e-12);
        assert!(solve(&[5.0]).is_empty());
        assert_eq!(eval(&[1.0, -3.0, 2.0], 3.0), 2.0);
    }
}
