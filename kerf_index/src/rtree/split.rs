// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node split heuristics.
//!
//! Both heuristics take the rectangles of an overflowing node's children and
//! return two index groups, each holding at least `min` children.

use alloc::vec::Vec;

use crate::config::SplitPolicy;
use crate::types::{Aabb2D, Scalar, area, cmp_t, union_aabb};

/// Divide `boxes` into two groups according to `policy`.
pub(super) fn partition<T: Scalar>(
    policy: SplitPolicy,
    boxes: &[Aabb2D<T>],
    min: usize,
) -> (Vec<usize>, Vec<usize>) {
    debug_assert!(
        boxes.len() >= 2 * min && boxes.len() >= 2,
        "cannot split {} children with minimum fill {min}",
        boxes.len()
    );
    match policy {
        SplitPolicy::Linear => linear(boxes, min),
        SplitPolicy::Quadratic => quadratic(boxes, min),
    }
}

fn linear<T: Scalar>(boxes: &[Aabb2D<T>], min: usize) -> (Vec<usize>, Vec<usize>) {
    let centers: Vec<(T::Acc, T::Acc)> = boxes
        .iter()
        .map(|b| {
            let (x, y) = b.center();
            (T::widen(x), T::widen(y))
        })
        .collect();

    let extremes = |key: fn(&(T::Acc, T::Acc)) -> T::Acc| {
        let mut lo = 0;
        let mut hi = 0;
        for (i, c) in centers.iter().enumerate() {
            if key(c) < key(&centers[lo]) {
                lo = i;
            }
            if key(c) > key(&centers[hi]) {
                hi = i;
            }
        }
        (lo, hi, key(&centers[hi]) - key(&centers[lo]))
    };
    let (xlo, xhi, xspread) = extremes(|c| c.0);
    let (ylo, yhi, yspread) = extremes(|c| c.1);
    let (i, j) = if xspread >= yspread {
        (xlo, xhi)
    } else {
        (ylo, yhi)
    };
    // All centers coincide.
    let (i, j) = if i == j { (0, 1) } else { (i, j) };

    // Signed distance to the perpendicular bisector of the seed centers, scaled
    // by |cj - ci|² so it stays exact for integer scalars. Positive is j's side.
    let (ix, iy) = centers[i];
    let (jx, jy) = centers[j];
    let dx = jx - ix;
    let dy = jy - iy;
    let mut rest: Vec<(T::Acc, usize)> = (0..boxes.len())
        .filter(|&k| k != i && k != j)
        .map(|k| {
            let (px, py) = centers[k];
            ((px + px - ix - jx) * dx + (py + py - iy - jy) * dy, k)
        })
        .collect();
    rest.sort_by(|a, b| cmp_t(&a.0, &b.0).then(a.1.cmp(&b.1)));

    let zero = T::widen(T::zero());
    let cut = rest
        .iter()
        .position(|(d, _)| *d >= zero)
        .unwrap_or(rest.len());
    // Left holds i plus rest[..cut]; both sides need at least `min`.
    let cut = cut.clamp(min - 1, rest.len() + 1 - min);

    let mut left = Vec::with_capacity(cut + 1);
    left.push(i);
    left.extend(rest[..cut].iter().map(|(_, k)| *k));
    let mut right = Vec::with_capacity(rest.len() - cut + 1);
    right.push(j);
    right.extend(rest[cut..].iter().map(|(_, k)| *k));
    (left, right)
}

fn quadratic<T: Scalar>(boxes: &[Aabb2D<T>], min: usize) -> (Vec<usize>, Vec<usize>) {
    let n = boxes.len();
    let mut seeds = (0, 1);
    let mut worst: Option<T::Acc> = None;
    for a in 0..n {
        for b in (a + 1)..n {
            let (ba, bb) = (&boxes[a], &boxes[b]);
            let waste = area(&union_aabb(*ba, *bb)) - area(ba) - area(bb) + area(&ba.intersect(bb));
            if worst.map(|w| waste > w).unwrap_or(true) {
                worst = Some(waste);
                seeds = (a, b);
            }
        }
    }

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    left.push(seeds.0);
    right.push(seeds.1);
    let mut lb = boxes[seeds.0];
    let mut rb = boxes[seeds.1];
    let mut pending: Vec<usize> = (0..n).filter(|&k| k != seeds.0 && k != seeds.1).collect();

    while !pending.is_empty() {
        // Hand everything to a group that needs it to reach the minimum.
        if left.len() + pending.len() <= min {
            left.append(&mut pending);
            break;
        }
        if right.len() + pending.len() <= min {
            right.append(&mut pending);
            break;
        }

        // Pick the entry with the strongest preference for one group.
        let growth = |k: usize| {
            let to_left = area(&union_aabb(lb, boxes[k])) - area(&lb);
            let to_right = area(&union_aabb(rb, boxes[k])) - area(&rb);
            (to_left, to_right)
        };
        let mut pick = 0;
        let mut best: Option<T::Acc> = None;
        for (pos, &k) in pending.iter().enumerate() {
            let (dl, dr) = growth(k);
            let preference = if dl > dr { dl - dr } else { dr - dl };
            if best.map(|b| preference > b).unwrap_or(true) {
                best = Some(preference);
                pick = pos;
            }
        }
        let k = pending.swap_remove(pick);
        let (dl, dr) = growth(k);
        let to_left = if dl != dr {
            dl < dr
        } else if area(&lb) != area(&rb) {
            area(&lb) < area(&rb)
        } else {
            left.len() <= right.len()
        };
        if to_left {
            left.push(k);
            lb = union_aabb(lb, boxes[k]);
        } else {
            right.push(k);
            rb = union_aabb(rb, boxes[k]);
        }
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn row(xs: &[i64]) -> Vec<Aabb2D<i64>> {
        xs.iter().map(|&x| Aabb2D::new(x, 0, x + 1, 1)).collect()
    }

    fn check(groups: &(Vec<usize>, Vec<usize>), n: usize, min: usize) {
        let (l, r) = groups;
        assert!(l.len() >= min && r.len() >= min, "underfilled split {groups:?}");
        let mut all: Vec<usize> = l.iter().chain(r.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn linear_separates_two_clusters() {
        let boxes = row(&[0, 1000, 1, 1001, 2, 1002]);
        let (mut l, mut r) = linear(&boxes, 2);
        l.sort_unstable();
        r.sort_unstable();
        assert_eq!((l, r), (vec![0, 2, 4], vec![1, 3, 5]));
    }

    #[test]
    fn linear_clamps_lopsided_partition() {
        // One far outlier: the bisector puts everything but the outlier on one side.
        let boxes = row(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 1000]);
        let groups = linear(&boxes, 4);
        check(&groups, boxes.len(), 4);
    }

    #[test]
    fn linear_handles_identical_centers() {
        let boxes = vec![Aabb2D::new(0.0, 0.0, 1.0, 1.0); 5];
        let groups = linear(&boxes, 2);
        check(&groups, 5, 2);
    }

    #[test]
    fn quadratic_separates_two_clusters() {
        let boxes = row(&[0, 1000, 1, 1001, 2, 1002]);
        let (mut l, mut r) = quadratic(&boxes, 2);
        l.sort_unstable();
        r.sort_unstable();
        assert_eq!((l, r), (vec![0, 2, 4], vec![1, 3, 5]));
    }

    #[test]
    fn quadratic_respects_minimum_fill() {
        let boxes = row(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 1000]);
        let groups = quadratic(&boxes, 4);
        check(&groups, boxes.len(), 4);
    }
}
