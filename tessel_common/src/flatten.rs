// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening paths into line segments.
//!
//! Curves are split uniformly in their parameter, with the segment count from
//! [Wang's formula](crate::wangs_formula). Quadratics are evaluated as their cubic elevation and
//! lines as a single step, exactly as the GPU patches are.

use crate::curve::{self, Segment};
use crate::geometry::Point;
use crate::matrix::Matrix;
use crate::path_data::PathData;
use crate::wangs_formula;
use log::warn;

/// A line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    /// The start point of the line.
    pub p0: Point,
    /// The end point of the line.
    pub p1: Point,
}

impl Line {
    /// Create a new line.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
}

/// Tolerance and budget for flattening.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlattenParams {
    /// The inverse of the flatness tolerance, in device pixels.
    pub precision: f32,
    /// The most segments a single curve is split into.
    pub max_segments: u32,
}

impl Default for FlattenParams {
    fn default() -> Self {
        Self {
            precision: wangs_formula::DEFAULT_PRECISION,
            max_segments: wangs_formula::DEFAULT_MAX_SEGMENTS,
        }
    }
}

/// Whether a cubic is exactly the elevation of a line made by [`curve::line_to_cubic`].
pub fn is_line_cubic(p: &[Point; 4]) -> bool {
    curve::line_to_cubic(&[p[0], p[3]]) == *p
}

/// The number of segments a device space segment is split into, at least one.
pub fn segment_count(seg: &Segment, params: &FlattenParams) -> u32 {
    let n = match seg {
        Segment::Line(_) => return 1,
        Segment::Quad(p) => wangs_formula::cubic(
            params.precision,
            &curve::quad_to_cubic(p),
            &Matrix::IDENTITY,
        ),
        Segment::Conic(p, w) => wangs_formula::conic(params.precision, p, *w, &Matrix::IDENTITY),
        Segment::Cubic(p) => {
            if is_line_cubic(p) {
                return 1;
            }
            wangs_formula::cubic(params.precision, p, &Matrix::IDENTITY)
        }
    };
    if n.is_nan() {
        return 1;
    }
    (n.ceil() as u32).clamp(1, params.max_segments.max(1))
}

/// Emit the points at `t = i / n` for `i` in `1..=n`. The last point is the exact end point.
pub fn flatten_segment(seg: &Segment, n: u32, mut f: impl FnMut(Point)) {
    let n = n.max(1);
    let step = 1. / n as f32;
    for i in 1..n {
        f(seg.eval(i as f32 * step));
    }
    f(seg.end());
}

/// Flatten a device space path for filling. Every contour is closed.
pub fn fill(path: &PathData, params: &FlattenParams, line_buf: &mut Vec<Line>) {
    line_buf.clear();
    let mut is_nan = false;
    for contour in curve::contours(path) {
        let closing = contour.closing_line();
        for seg in contour.segments.iter().chain(closing.iter()) {
            let mut p0 = seg.start();
            flatten_segment(seg, segment_count(seg, params), |p1| {
                is_nan |= !p1.is_finite();
                line_buf.push(Line::new(p0, p1));
                p0 = p1;
            });
        }
    }

    // A path that contains NaN is ill-defined, so ignore it.
    if is_nan {
        warn!("A path contains NaN, ignoring it.");

        line_buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PathDirection, Rect};

    #[test]
    fn contours_are_closed() {
        let tri = PathData::polygon(
            &[Point::new(0., 0.), Point::new(10., 0.), Point::new(0., 10.)],
            false,
        )
        .unwrap();
        let mut lines = Vec::new();
        fill(&tri, &FlattenParams::default(), &mut lines);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], Line::new(Point::new(0., 10.), Point::new(0., 0.)));
    }

    #[test]
    fn curves_flatten_into_connected_lines() {
        let oval =
            PathData::oval(&Rect::from_ltrb(0., 0., 100., 50.), PathDirection::Cw, 1).unwrap();
        let mut lines = Vec::new();
        fill(&oval, &FlattenParams::default(), &mut lines);
        assert!(lines.len() > 8);
        for pair in lines.windows(2) {
            assert_eq!(pair[0].p1, pair[1].p0);
        }
        assert_eq!(lines.first().unwrap().p0, lines.last().unwrap().p1);
    }

    #[test]
    fn segment_budget_is_respected() {
        let params = FlattenParams {
            max_segments: 8,
            ..FlattenParams::default()
        };
        let seg = Segment::Cubic([
            Point::new(0., 0.),
            Point::new(0., 5000.),
            Point::new(5000., -5000.),
            Point::new(5000., 0.),
        ]);
        assert_eq!(segment_count(&seg, &params), 8);
    }

    #[test]
    fn line_cubics_take_one_step() {
        let line = curve::line_to_cubic(&[Point::new(0.3, 0.7), Point::new(911.1, 47.9)]);
        assert!(is_line_cubic(&line));
        assert_eq!(
            segment_count(&Segment::Cubic(line), &FlattenParams::default()),
            1
        );
    }
}
