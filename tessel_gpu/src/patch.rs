// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessellation patches: the fixed-size records handed to the command layer.
//!
//! A patch holds one device space curve as four points. Quadratics and lines are stored as their
//! cubic elevation, which is also how the CPU flattener evaluates them, so both produce the same
//! vertices. A conic stores its weight in the fourth point; when the target can test for infinity
//! the fourth point is `(w, inf)`, otherwise an explicit curve type tells conics apart.

use crate::caps::Caps;
use bytemuck::{Pod, Zeroable};
use tessel_common::color::PremulRgba8;
use tessel_common::curve::{self, Segment};
use tessel_common::flatten::{self, FlattenParams};
use tessel_common::geometry::Point;

/// The explicit curve type of a cubic patch, including elevated quadratics and lines.
pub const CURVE_TYPE_CUBIC: f32 = 0.;
/// The explicit curve type of a conic patch.
pub const CURVE_TYPE_CONIC: f32 = 1.;

/// A curve or wedge patch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Patch {
    /// The control points.
    pub points: [[f32; 2]; 4],
    /// The apex of a wedge. Unused by curve patches.
    pub fan_point: [f32; 2],
    /// [`CURVE_TYPE_CUBIC`] or [`CURVE_TYPE_CONIC`] on targets without infinity support.
    pub curve_type: f32,
    /// Packed premultiplied color, or zero when the draw has a single color.
    pub color: u32,
}

static_assertions::const_assert_eq!(size_of::<Patch>(), 48);

pub(crate) fn pack(p: Point) -> [f32; 2] {
    [p.x, p.y]
}

pub(crate) fn unpack(p: [f32; 2]) -> Point {
    Point::new(p[0], p[1])
}

/// Encode a segment as four points and a curve type.
pub(crate) fn encode_segment(seg: &Segment, infinity_support: bool) -> ([[f32; 2]; 4], f32) {
    match seg {
        Segment::Line(p) => (curve::line_to_cubic(p).map(pack), CURVE_TYPE_CUBIC),
        Segment::Quad(p) => (curve::quad_to_cubic(p).map(pack), CURVE_TYPE_CUBIC),
        Segment::Cubic(p) => (p.map(pack), CURVE_TYPE_CUBIC),
        Segment::Conic(p, w) => {
            let tag = if infinity_support { f32::INFINITY } else { 0. };
            (
                [pack(p[0]), pack(p[1]), pack(p[2]), [*w, tag]],
                CURVE_TYPE_CONIC,
            )
        }
    }
}

/// Recover the segment a patch was encoded from.
pub(crate) fn decode_segment(
    points: &[[f32; 2]; 4],
    curve_type: f32,
    infinity_support: bool,
) -> Segment {
    let is_conic = if infinity_support {
        points[3][1].is_infinite()
    } else {
        curve_type == CURVE_TYPE_CONIC
    };
    if is_conic {
        Segment::Conic(
            [unpack(points[0]), unpack(points[1]), unpack(points[2])],
            points[3][0],
        )
    } else {
        Segment::Cubic(points.map(unpack))
    }
}

impl Patch {
    /// The curve of this patch.
    pub fn segment(&self, infinity_support: bool) -> Segment {
        decode_segment(&self.points, self.curve_type, infinity_support)
    }

    /// The apex of the wedge.
    pub fn fan_point(&self) -> Point {
        unpack(self.fan_point)
    }
}

/// Collects patches for one draw and tracks the segment counts they need.
#[derive(Debug)]
pub struct PatchWriter {
    infinity_support: bool,
    params: FlattenParams,
    color: Option<PremulRgba8>,
    patches: Vec<Patch>,
    max_segments: u32,
}

impl PatchWriter {
    /// Create a writer for a target with `caps`. A `color` is written into every patch.
    pub fn new(caps: &Caps, params: FlattenParams, color: Option<PremulRgba8>) -> Self {
        Self {
            infinity_support: caps.infinity_support,
            params,
            color,
            patches: Vec::new(),
            max_segments: 1,
        }
    }

    /// Write a curve patch.
    pub fn write_curve(&mut self, seg: &Segment) {
        self.write(seg, Point::ZERO);
    }

    /// Write a wedge patch with its apex at `fan_point`.
    pub fn write_wedge(&mut self, seg: &Segment, fan_point: Point) {
        self.write(seg, fan_point);
    }

    fn write(&mut self, seg: &Segment, fan_point: Point) {
        let (points, curve_type) = encode_segment(seg, self.infinity_support);
        let patch = Patch {
            points,
            fan_point: pack(fan_point),
            curve_type: if self.infinity_support {
                0.
            } else {
                curve_type
            },
            color: self.color.map_or(0, PremulRgba8::to_u32),
        };
        // Count what the shader will count, from the stored points.
        let n = flatten::segment_count(&patch.segment(self.infinity_support), &self.params);
        self.max_segments = self.max_segments.max(n);
        self.patches.push(patch);
    }

    /// The largest segment count of any patch written.
    pub fn max_segments(&self) -> u32 {
        self.max_segments
    }

    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// The patches written so far.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Take the patches.
    pub fn finish(self) -> Vec<Patch> {
        self.patches
    }
}
