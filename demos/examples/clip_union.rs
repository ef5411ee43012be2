// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip two overlapping shapes against each other and print the resulting
//! strips and loops as SVG path data.
//!
//! Run:
//! - `RUST_LOG=kerf_clip=debug cargo run -p kerf_demos --example clip_union`

use kerf_clip::{ClipOptions, Clipper};
use kurbo::{BezPath, Circle, Rect, Shape};

fn main() {
    env_logger::init();

    let mut clipper = Clipper::with_options(ClipOptions {
        isolate_subpaths: false,
        ..ClipOptions::default()
    })
    .unwrap();

    let mut path = BezPath::new();
    path.extend(Rect::new(0.0, 0.0, 100.0, 60.0).path_elements(0.1));
    path.extend(Circle::new((90.0, 50.0), 40.0).path_elements(0.1));

    let summary = clipper.add_path(path).unwrap();
    println!(
        "{} sub-paths, {} segments, {} crossings",
        summary.subpaths, summary.segments, summary.intersections
    );
    clipper.validate_simple().unwrap();

    for (id, contour) in clipper.contours() {
        let kind = if contour.is_closed() { "loop" } else { "strip" };
        let edges = clipper.mesh().contour_edges(id).len();
        println!("{kind} {id:?} ({edges} edges, {:?})", contour.flags());
        if let Some(p) = clipper.contour_path(id) {
            println!("  {}", p.to_svg());
        }
    }
}
