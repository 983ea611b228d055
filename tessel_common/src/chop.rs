// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Preparing paths for tessellation with a fixed per-curve segment budget.
//!
//! GPU tessellation evaluates every curve with at most a fixed number of segments. Before a path
//! is handed to it, [`pre_chop`] maps it to device space and
//!
//! - replaces curves whose control hull lies outside the viewport with their chords, since the
//!   region between a curve and its chord is then invisible,
//! - splits the remaining curves in half until each needs no more than the budget, and
//! - linearises every curve when the matrix has perspective, failing if any point maps behind
//!   the viewer.
//!
//! [`needs_pre_chop`] is a cheap, conservative test on the device space bounds alone.

use crate::curve::{self, Segment};
use crate::error::PathError;
use crate::flatten::{self, FlattenParams};
use crate::geometry::{Point, Rect};
use crate::matrix::Matrix;
use crate::path_builder::PathBuilder;
use crate::path_data::PathData;
use crate::wangs_formula;
use smallvec::SmallVec;

/// Chopping a curve in half at most this many times is enough for any finite budget in practice.
const MAX_CHOP_DEPTH: u32 = 16;

/// Whether any curve inside `device_bounds` could need more segments than the budget allows.
pub fn needs_pre_chop(device_bounds: &Rect, params: &FlattenParams) -> bool {
    let max = params.max_segments as f32;
    let worst = wangs_formula::worst_case_cubic_pow4(
        params.precision,
        device_bounds.width(),
        device_bounds.height(),
    );
    !(worst <= max * max * max * max)
}

/// The segment count of a device space segment before clamping to the budget.
fn raw_segment_count(seg: &Segment, precision: f32) -> f32 {
    match seg {
        Segment::Line(_) => 1.,
        Segment::Quad(p) => {
            wangs_formula::cubic(precision, &curve::quad_to_cubic(p), &Matrix::IDENTITY)
        }
        Segment::Conic(p, w) => wangs_formula::conic(precision, p, *w, &Matrix::IDENTITY),
        Segment::Cubic(p) => wangs_formula::cubic(precision, p, &Matrix::IDENTITY),
    }
}

fn push_segment(builder: &mut PathBuilder, seg: &Segment) {
    match *seg {
        Segment::Line([_, p]) => builder.line_to(p),
        Segment::Quad([_, c, p]) => builder.quad_to(c, p),
        Segment::Conic([_, c, p], w) => builder.conic_to(c, p, w),
        Segment::Cubic([_, c1, c2, p]) => builder.cubic_to(c1, c2, p),
    };
}

/// Map `path` to device space so that every curve fits the segment budget.
///
/// Returns lines only when `matrix` has perspective.
pub fn pre_chop(
    path: &PathData,
    matrix: &Matrix,
    viewport: &Rect,
    params: &FlattenParams,
) -> Result<PathData, PathError> {
    if matrix.has_perspective() {
        return linearize_perspective(path, matrix, params);
    }
    let max = params.max_segments.max(1) as f32;
    let mut builder = PathBuilder::new();
    for contour in curve::contours(path) {
        let Some(start) = contour.start() else {
            continue;
        };
        builder.move_to(matrix.map_point_affine(start));
        for seg in &contour.segments {
            let seg = seg.map(|p| matrix.map_point_affine(p));
            if !seg.points().iter().all(|p| p.is_finite()) {
                return Err(PathError::NonFinite);
            }
            if !seg.is_line() && !seg.hull_bounds().touches(viewport) {
                builder.line_to(seg.end());
                continue;
            }
            let mut stack: SmallVec<[(Segment, u32); 16]> = SmallVec::new();
            stack.push((seg, 0));
            while let Some((seg, depth)) = stack.pop() {
                if depth < MAX_CHOP_DEPTH && raw_segment_count(&seg, params.precision) > max {
                    let (first, second) = curve::chop_segment_in_half(&seg);
                    // The first half must come out first.
                    stack.push((second, depth + 1));
                    stack.push((first, depth + 1));
                } else {
                    push_segment(&mut builder, &seg);
                }
            }
        }
        if contour.closed {
            builder.close();
        }
    }
    builder.try_build()
}

fn linearize_perspective(
    path: &PathData,
    matrix: &Matrix,
    params: &FlattenParams,
) -> Result<PathData, PathError> {
    let project = |p: Point| -> Result<Point, PathError> {
        let [x, y, w] = matrix.map_homogeneous(p);
        if !(w > 0.) {
            return Err(PathError::BehindViewer);
        }
        let q = Point::new(x / w, y / w);
        if q.is_finite() {
            Ok(q)
        } else {
            Err(PathError::NonFinite)
        }
    };
    let mut builder = PathBuilder::new();
    for contour in curve::contours(path) {
        let Some(start) = contour.start() else {
            continue;
        };
        builder.move_to(project(start)?);
        for seg in &contour.segments {
            let mut projected = [Point::ZERO; 4];
            for (dst, src) in projected.iter_mut().zip(seg.points()) {
                *dst = project(*src)?;
            }
            // The projected control polygon stands in for the curve when counting segments.
            let device = match seg {
                Segment::Line(_) => Segment::Line([projected[0], projected[1]]),
                Segment::Quad(_) => Segment::Quad([projected[0], projected[1], projected[2]]),
                Segment::Conic(_, w) => {
                    Segment::Conic([projected[0], projected[1], projected[2]], *w)
                }
                Segment::Cubic(_) => Segment::Cubic(projected),
            };
            let n = flatten::segment_count(&device, params);
            let step = 1. / n as f32;
            for i in 1..n {
                builder.line_to(project(seg.eval(i as f32 * step))?);
            }
            builder.line_to(project(seg.end())?);
        }
        if contour.closed {
            builder.close();
        }
    }
    builder.try_build()
}
