// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing fill patches and evaluating them the way the tessellation shaders do.
//!
//! A wedge is a fan from a point inside its contour over one flattened segment; the wedges of a
//! closed contour add up to its winding number. A curve patch is a fan from the curve's first
//! point, covering the region between the curve and its chord.

use crate::caps::Caps;
use crate::draw::{Draw, DrawCall, DrawData, PrimitiveType, Program};
use crate::patch::{Patch, PatchWriter};
use crate::stencil::StencilSettings;
use smallvec::SmallVec;
use tessel_common::color::PremulRgba8;
use tessel_common::curve::{self, Segment};
use tessel_common::flatten::{self, FlattenParams};
use tessel_common::geometry::{IntRect, Point};
use tessel_common::path_data::PathData;
use tessel_common::wangs_formula;

/// The apex of the wedges of a contour: the mean of its on-curve points.
pub(crate) fn fan_point(on_curve: &[Point]) -> Point {
    let (mut x, mut y) = (0_f64, 0_f64);
    for p in on_curve {
        x += f64::from(p.x);
        y += f64::from(p.y);
    }
    let n = on_curve.len().max(1) as f64;
    Point::new((x / n) as f32, (y / n) as f32)
}

/// Write one wedge per segment of every contour of a device space path, closing contours with
/// a line where needed.
pub fn write_wedges(path: &PathData, writer: &mut PatchWriter) {
    for contour in curve::contours(path) {
        let on_curve: SmallVec<[Point; 16]> = contour
            .start()
            .into_iter()
            .chain(contour.segments.iter().map(Segment::end))
            .collect();
        let fan = fan_point(&on_curve);
        let closing = contour.closing_line();
        for seg in contour.segments.iter().chain(closing.iter()) {
            writer.write_wedge(seg, fan);
        }
    }
}

/// Write a curve patch for every curved segment of a device space path and return the inner
/// polygon: the on-curve points of every contour.
pub fn write_curves(path: &PathData, writer: &mut PatchWriter) -> Vec<Vec<Point>> {
    let mut polygon = Vec::new();
    for contour in curve::contours(path) {
        let mut points = Vec::with_capacity(contour.segments.len() + 1);
        points.extend(contour.start());
        for seg in &contour.segments {
            if !seg.is_line() {
                writer.write_curve(seg);
            }
            points.push(seg.end());
        }
        polygon.push(points);
    }
    polygon
}

/// The resolve level of a patch draw: `2^level` segments fit every patch.
fn resolve_level(max_segments: u32) -> u32 {
    wangs_formula::nextlog2(max_segments as f32)
}

/// Vertices per instance of a fixed-count curve draw.
pub fn curve_vertex_count(max_segments: u32) -> u32 {
    let segments = 1_u32 << resolve_level(max_segments).min(16);
    3 * segments.saturating_sub(1).max(1)
}

/// Vertices per instance of a fixed-count wedge draw.
pub fn wedge_vertex_count(max_segments: u32) -> u32 {
    3 * (1_u32 << resolve_level(max_segments).min(16))
}

/// Turn written patches into a draw, instanced with a fixed vertex count where the target
/// supports it and as hardware patches otherwise.
pub(crate) fn patch_draw(
    caps: &Caps,
    program: Program,
    writer: PatchWriter,
    stencil: StencilSettings,
    color_write: bool,
    color: PremulRgba8,
    scissor: IntRect,
) -> Draw {
    let max_segments = writer.max_segments();
    let patches = writer.finish();
    let count = u32::try_from(patches.len()).unwrap_or(u32::MAX);
    let control_points = if program == Program::Wedge { 5 } else { 4 };
    let (primitive, call) = if caps.instanced_draws {
        let vertex_count = if program == Program::Wedge {
            wedge_vertex_count(max_segments)
        } else {
            curve_vertex_count(max_segments)
        };
        (
            PrimitiveType::Triangles,
            DrawCall {
                vertex_count,
                instance_count: count,
            },
        )
    } else {
        (
            PrimitiveType::Patches { control_points },
            DrawCall {
                vertex_count: control_points * count,
                instance_count: 1,
            },
        )
    };
    Draw {
        program,
        primitive,
        call,
        stencil,
        color_write,
        color,
        scissor: Some(scissor),
        data: DrawData::Patches(patches),
    }
}

/// Evaluate a curve patch into its fan triangles `(q0, qi, qi+1)`.
pub fn curve_triangles(
    patch: &Patch,
    infinity_support: bool,
    params: &FlattenParams,
    out: &mut Vec<[Point; 3]>,
) {
    let seg = patch.segment(infinity_support);
    let q0 = seg.start();
    let mut prev: Option<Point> = None;
    flatten::flatten_segment(&seg, flatten::segment_count(&seg, params), |p| {
        if let Some(a) = prev {
            out.push([q0, a, p]);
        }
        prev = Some(p);
    });
}

/// Evaluate a wedge patch into its fan triangles `(fan, qi, qi+1)`.
pub fn wedge_triangles(
    patch: &Patch,
    infinity_support: bool,
    params: &FlattenParams,
    out: &mut Vec<[Point; 3]>,
) {
    let seg = patch.segment(infinity_support);
    let fan = patch.fan_point();
    let mut prev = seg.start();
    flatten::flatten_segment(&seg, flatten::segment_count(&seg, params), |p| {
        out.push([fan, prev, p]);
        prev = p;
    });
}
