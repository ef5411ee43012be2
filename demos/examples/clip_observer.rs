// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch the kernel work through a path with a self-intersecting cubic.
//!
//! Run:
//! - `cargo run -p kerf_demos --example clip_observer`

use kerf_clip::{
    ClipObserver, ClipOptions, Clipper, ContourFlags, ContourId, EdgeId, IntersectionRecord, Segment,
};
use kurbo::BezPath;

struct Printer;

impl ClipObserver for Printer {
    fn segment_added(&mut self, segment: &Segment) {
        println!("segment  {:?} -> {:?}", segment.start(), segment.end());
    }

    fn intersections_resolved(&mut self, _: &Segment, records: &[IntersectionRecord]) {
        for r in records {
            println!(
                "  crosses {:?} at ({:.3}, {:.3}), t = {:.4}",
                r.crossed, r.point.x, r.point.y, r.t_new
            );
        }
    }

    fn edge_split(&mut self, edge: EdgeId, pieces: &[EdgeId]) {
        println!("  split {edge:?} into {pieces:?}");
    }

    fn self_intersection(&mut self, _: &Segment, s: f64, t: f64) {
        println!("  loops back on itself between t = {s:.4} and t = {t:.4}");
    }

    fn contour_finished(&mut self, contour: ContourId, flags: ContourFlags) {
        println!("contour  {contour:?} finished: {flags:?}");
    }
}

fn main() {
    env_logger::init();

    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.curve_to((15.0, 10.0), (-5.0, 10.0), (10.0, 0.0));
    path.line_to((10.0, 8.0));
    path.line_to((0.0, 2.0));

    let mut clipper = Clipper::with_options(ClipOptions::default()).unwrap();
    let summary = clipper.add_path_observed(path, &mut Printer).unwrap();
    println!("{summary:?}");
    clipper.validate().unwrap();
}
