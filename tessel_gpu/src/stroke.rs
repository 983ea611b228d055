// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke tessellation.
//!
//! A stroke is recorded as one patch per segment, carrying the control point the stroke arrives
//! from so the join at the start of the segment can be built with it, plus one patch per cap.
//! Patches stay in the path's local space; the view matrix is applied to the expanded geometry.
//! Hairlines are the exception: they are one device pixel wide whatever the matrix, so they are
//! recorded in device space.
//!
//! Expansion follows the edges a stroke tessellation shader emits: every parametric piece of a
//! curve (counted with Wang's formula) is split further wherever its tangent turns by more than
//! the radial step, the angle at which an arc of the device space radius deviates from its chord
//! by the flatness tolerance.

use crate::patch::{decode_segment, encode_segment, pack, unpack};
use bytemuck::{Pod, Zeroable};
use core::f32::consts::PI;
use smallvec::SmallVec;
use tessel_common::color::PremulRgba8;
use tessel_common::curve::{self, Segment};
use tessel_common::error::PathError;
use tessel_common::flatten::{self, FlattenParams};
use tessel_common::geometry::Point;
use tessel_common::matrix::Matrix;
use tessel_common::path::{FillType, Path};
use tessel_common::path_builder::PathBuilder;
use tessel_common::path_data::PathData;
use tessel_common::style::{Cap, Join, StrokeStyle};
use tessel_common::wangs_formula;

/// The join value of round joins.
pub const JOIN_ROUND: f32 = -1.;
/// The join value of bevel joins. Miter joins store their limit, which is always above one.
pub const JOIN_BEVEL: f32 = 0.;

/// A patch stroking one segment.
pub const KIND_SEGMENT: f32 = 0.;
/// A patch drawing a round cap.
pub const KIND_ROUND_CAP: f32 = 1.;
/// A patch drawing a square cap.
pub const KIND_SQUARE_CAP: f32 = 2.;

/// Half the width of a hairline, in device pixels.
pub const HAIRLINE_RADIUS: f32 = 0.5;

/// One stroked segment or cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct StrokePatch {
    /// The segment, encoded like a fill patch. A cap stores its end point first and the control
    /// point the stroke arrives from second.
    pub points: [[f32; 2]; 4],
    /// The control point before the start of the segment; equal to the start when there is no
    /// join.
    pub prev_control: [f32; 2],
    /// Half the stroke width.
    pub radius: f32,
    /// [`JOIN_ROUND`], [`JOIN_BEVEL`] or a miter limit.
    pub join: f32,
    /// The explicit curve type on targets without infinity support.
    pub curve_type: f32,
    /// [`KIND_SEGMENT`], [`KIND_ROUND_CAP`] or [`KIND_SQUARE_CAP`].
    pub kind: f32,
    /// Packed premultiplied color, or zero when the draw has a single color.
    pub color: u32,
    /// Unused.
    pub padding: u32,
}

static_assertions::const_assert_eq!(size_of::<StrokePatch>(), 64);

fn join_value(style: &StrokeStyle) -> f32 {
    match style.join {
        Join::Round => JOIN_ROUND,
        Join::Bevel => JOIN_BEVEL,
        Join::Miter if style.miter_limit > 1. => style.miter_limit,
        Join::Miter => JOIN_BEVEL,
    }
}

/// The last control point of `seg` that differs from its end.
fn prev_control_point(seg: &Segment) -> Option<Point> {
    let (&end, rest) = seg.points().split_last()?;
    rest.iter().rev().copied().find(|&q| q != end)
}

/// The first control point of `seg` that differs from its start.
fn next_control_point(seg: &Segment) -> Option<Point> {
    let (&start, rest) = seg.points().split_first()?;
    rest.iter().copied().find(|&q| q != start)
}

fn is_degenerate(seg: &Segment) -> bool {
    let p = seg.points();
    p.iter().all(|&q| q == p[0])
}

fn cubic_derivative(p: &[Point; 4], t: f32) -> Point {
    let mt = 1. - t;
    ((p[1] - p[0]) * (mt * mt) + (p[2] - p[1]) * (2. * t * mt) + (p[3] - p[2]) * (t * t)) * 3.
}

/// A vector along the derivative of a conic: with the conic written as `A(t) / B(t)`, the
/// derivative is `(A'B - AB') / B^2`, and `B^2` is positive.
fn conic_derivative(p: &[Point; 3], w: f32, t: f32) -> Point {
    let mt = 1. - t;
    let a = p[0] * (mt * mt) + p[1] * (2. * t * mt * w) + p[2] * (t * t);
    let b = mt * mt + 2. * t * mt * w + t * t;
    let da = p[0] * (-2. * mt) + p[1] * (2. * w * (1. - 2. * t)) + p[2] * (2. * t);
    let db = -2. * mt + 2. * w * (1. - 2. * t) + 2. * t;
    da * b - a * db
}

/// The direction of travel at `t`, falling back to the chords of the control polygon where the
/// derivative vanishes.
fn tangent(seg: &Segment, t: f32) -> Point {
    let d = match seg {
        Segment::Line([a, b]) => *b - *a,
        Segment::Quad(p) => cubic_derivative(&curve::quad_to_cubic(p), t),
        Segment::Cubic(p) => cubic_derivative(p, t),
        Segment::Conic(p, w) => conic_derivative(p, *w, t),
    };
    if d != Point::ZERO && d.is_finite() {
        return d;
    }
    let fallback = if t < 0.5 {
        next_control_point(seg).map(|q| q - seg.start())
    } else {
        prev_control_point(seg).map(|q| seg.end() - q)
    };
    fallback.unwrap_or(Point::ZERO)
}

/// The signed angle that rotates `a` onto `b`.
fn turn(a: Point, b: Point) -> f32 {
    a.cross(b).atan2(a.dot(b))
}

fn rotate(v: Point, angle: f32) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// The largest angle an arc of `device_radius` may span while staying within the flatness
/// tolerance of its chord.
fn radial_step(device_radius: f32, params: &FlattenParams) -> f32 {
    let tolerance = 1. / params.precision;
    let c = 1. - tolerance / device_radius.max(f32::MIN_POSITIVE);
    let min_step = 2. * PI / params.max_segments.max(1) as f32;
    let step = 2. * c.clamp(-1., 1.).acos();
    if step.is_nan() {
        PI
    } else {
        step.clamp(min_step, PI)
    }
}

/// The number of parametric pieces a local space segment needs under `matrix`.
fn parametric_segments(seg: &Segment, matrix: &Matrix, params: &FlattenParams) -> u32 {
    let precision = params.precision;
    let n = match seg {
        Segment::Line(_) => return 1,
        Segment::Quad(p) => wangs_formula::cubic(precision, &curve::quad_to_cubic(p), matrix),
        Segment::Cubic(p) => {
            if flatten::is_line_cubic(p) {
                return 1;
            }
            wangs_formula::cubic(precision, p, matrix)
        }
        Segment::Conic(p, w) => wangs_formula::conic(precision, p, *w, matrix),
    };
    if n.is_nan() {
        return 1;
    }
    (n.ceil() as u32).clamp(1, params.max_segments.max(1))
}

/// Records stroke patches.
#[derive(Debug)]
pub struct StrokeWriter {
    radius: f32,
    join: f32,
    cap: Cap,
    infinity_support: bool,
    color: u32,
    patches: Vec<StrokePatch>,
}

impl StrokeWriter {
    /// Create a writer for strokes of the given radius.
    pub fn new(
        style: &StrokeStyle,
        radius: f32,
        infinity_support: bool,
        color: Option<PremulRgba8>,
    ) -> Self {
        Self {
            radius,
            join: join_value(style),
            cap: style.cap,
            infinity_support,
            color: color.map_or(0, PremulRgba8::to_u32),
            patches: Vec::new(),
        }
    }

    /// Record the stroke of every contour of `path`.
    pub fn write_path(&mut self, path: &PathData) {
        for contour in curve::contours(path) {
            let mut segments: SmallVec<[Segment; 8]> = contour
                .segments
                .iter()
                .filter(|s| !is_degenerate(s))
                .copied()
                .collect();
            if contour.closed {
                segments.extend(contour.closing_line());
            }
            let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
                if let Some(p) = contour.start() {
                    self.write_dot(p);
                }
                continue;
            };
            let (first, last) = (*first, *last);
            for (i, seg) in segments.iter().enumerate() {
                let prev = if i > 0 {
                    prev_control_point(&segments[i - 1])
                } else if contour.closed {
                    prev_control_point(&last)
                } else {
                    None
                };
                self.write_segment(seg, prev);
            }
            if !contour.closed {
                if let Some(q) = next_control_point(&first) {
                    self.write_cap(first.start(), q);
                }
                if let Some(q) = prev_control_point(&last) {
                    self.write_cap(last.end(), q);
                }
            }
        }
    }

    fn write_segment(&mut self, seg: &Segment, prev_control: Option<Point>) {
        let (points, curve_type) = encode_segment(seg, self.infinity_support);
        self.patches.push(StrokePatch {
            points,
            prev_control: pack(prev_control.unwrap_or(seg.start())),
            radius: self.radius,
            join: self.join,
            curve_type: if self.infinity_support {
                0.
            } else {
                curve_type
            },
            kind: KIND_SEGMENT,
            color: self.color,
            padding: 0,
        });
    }

    /// A cap at `p` for a stroke arriving from `from`.
    fn write_cap(&mut self, p: Point, from: Point) {
        let kind = match self.cap {
            Cap::Butt => return,
            Cap::Round => KIND_ROUND_CAP,
            Cap::Square => KIND_SQUARE_CAP,
        };
        self.patches.push(StrokePatch {
            points: [pack(p), pack(from), pack(p), pack(p)],
            prev_control: pack(p),
            radius: self.radius,
            join: self.join,
            curve_type: 0.,
            kind,
            color: self.color,
            padding: 0,
        });
    }

    /// A zero length contour: two caps back to back, facing along the x axis.
    fn write_dot(&mut self, p: Point) {
        self.write_cap(p, p - Point::new(1., 0.));
        self.write_cap(p, p + Point::new(1., 0.));
    }

    /// The patches recorded so far.
    pub fn patches(&self) -> &[StrokePatch] {
        &self.patches
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Take the patches.
    pub fn finish(self) -> Vec<StrokePatch> {
        self.patches
    }
}

struct Expander<'a> {
    matrix: &'a Matrix,
    params: &'a FlattenParams,
    radius: f32,
    step: f32,
    out: &'a mut Vec<[Point; 3]>,
}

impl Expander<'_> {
    fn triangle(&mut self, a: Point, b: Point, c: Point) {
        if (b - a).cross(c - a) != 0. {
            let m = self.matrix;
            self.out.push([m.map_point(a), m.map_point(b), m.map_point(c)]);
        }
    }

    /// A fan around `center`, starting at the unit vector `from` and turning by `sweep`.
    fn arc(&mut self, center: Point, from: Point, sweep: f32) {
        let steps = (sweep.abs() / self.step).ceil().clamp(1., 4096.) as u32;
        let r = self.radius;
        let mut prev = center + from * r;
        for j in 1..=steps {
            let p = center + rotate(from, sweep * j as f32 / steps as f32) * r;
            self.triangle(center, prev, p);
            prev = p;
        }
    }

    fn join(&mut self, p: Point, t_in: Point, t_out: Point, join: f32) {
        let (Some(d_in), Some(d_out)) = (t_in.normalize(), t_out.normalize()) else {
            return;
        };
        let cross = d_in.cross(d_out);
        let dot = d_in.dot(d_out);
        if cross == 0. && dot >= 0. {
            return;
        }
        // Normals on the outer side of the turn.
        let mut a = d_in.perp();
        if a.dot(d_out) > 0. {
            a = -a;
        }
        let mut b = d_out.perp();
        if b.dot(d_in) < 0. {
            b = -b;
        }
        let r = self.radius;
        if join == JOIN_ROUND {
            let sweep = if cross == 0. {
                2. * turn(a, d_in)
            } else {
                turn(a, b)
            };
            self.arc(p, a, sweep);
            return;
        }
        if join > JOIN_BEVEL {
            if let Some(m) = (a + b).normalize() {
                let cos_half = m.dot(a);
                if cos_half > 0. && cos_half * join >= 1. {
                    let tip = p + m * (r / cos_half);
                    self.triangle(p, p + a * r, tip);
                    self.triangle(p, tip, p + b * r);
                    return;
                }
            }
        }
        self.triangle(p, p + a * r, p + b * r);
    }

    fn cap(&mut self, p: Point, dir: Point, square: bool) {
        let n = dir.perp();
        let r = self.radius;
        if square {
            let c0 = p + n * r;
            let c1 = c0 + dir * r;
            let c3 = p - n * r;
            let c2 = c3 + dir * r;
            self.triangle(c0, c1, c2);
            self.triangle(c0, c2, c3);
        } else {
            self.arc(p, n, 2. * turn(n, dir));
        }
    }

    fn segment(&mut self, seg: &Segment, t_in: Option<Point>, join: f32) {
        if let Some(t_in) = t_in {
            self.join(seg.start(), t_in, tangent(seg, 0.), join);
        }
        let n = parametric_segments(seg, self.matrix, self.params);
        let mut samples: SmallVec<[f32; 32]> = SmallVec::new();
        samples.push(0.);
        for i in 0..n {
            let (ta, tb) = (i as f32 / n as f32, (i + 1) as f32 / n as f32);
            let rotation = turn(tangent(seg, ta), tangent(seg, tb)).abs();
            let k = (rotation / self.step).ceil().clamp(1., 1024.) as u32;
            for j in 1..=k {
                samples.push(ta + (tb - ta) * j as f32 / k as f32);
            }
        }

        let r = self.radius;
        let mut prev: Option<(Point, Point)> = None;
        let last = samples.len() - 1;
        for (i, &t) in samples.iter().enumerate() {
            let p = match i {
                0 => seg.start(),
                _ if i == last => seg.end(),
                _ => seg.eval(t),
            };
            let normal = tangent(seg, t).normalize().map(Point::perp);
            let Some(normal) = normal.or(prev.map(|(_, n)| n)) else {
                continue;
            };
            if let Some((q, m)) = prev {
                self.triangle(q + m * r, p + normal * r, p - normal * r);
                self.triangle(q + m * r, p - normal * r, q - m * r);
                // A cusp flips the normal; round it over.
                if m.dot(normal) < 0. {
                    self.arc(p, normal, 2. * PI);
                }
            }
            prev = Some((p, normal));
        }
    }
}

/// Expand a stroke patch into triangles, mapped through `matrix`.
pub fn stroke_triangles(
    patch: &StrokePatch,
    infinity_support: bool,
    matrix: &Matrix,
    params: &FlattenParams,
    out: &mut Vec<[Point; 3]>,
) {
    let device_radius = patch.radius * matrix.max_scale().unwrap_or(1.);
    let mut expander = Expander {
        matrix,
        params,
        radius: patch.radius,
        step: radial_step(device_radius, params),
        out,
    };
    let p0 = unpack(patch.points[0]);
    if patch.kind == KIND_SEGMENT {
        let seg = decode_segment(&patch.points, patch.curve_type, infinity_support);
        let prev = unpack(patch.prev_control);
        let t_in = (prev != p0).then(|| p0 - prev);
        expander.segment(&seg, t_in, patch.join);
    } else if let Some(dir) = (p0 - unpack(patch.points[1])).normalize() {
        expander.cap(p0, dir, patch.kind == KIND_SQUARE_CAP);
    }
}

/// The geometry a stroke is recorded from: the path in the space its patches live in, the
/// stroke radius there, and the matrix that maps it to device space.
pub fn stroke_geometry(
    path: &PathData,
    style: &StrokeStyle,
    matrix: &Matrix,
) -> Result<(PathData, f32, Matrix), PathError> {
    if style.is_hairline() {
        Ok((
            path.try_make_transform(matrix)?,
            HAIRLINE_RADIUS,
            Matrix::IDENTITY,
        ))
    } else {
        Ok((path.clone(), style.width * 0.5, *matrix))
    }
}

/// The device space width of a stroke.
pub fn device_stroke_width(style: &StrokeStyle, matrix: &Matrix) -> f32 {
    if style.is_hairline() {
        2. * HAIRLINE_RADIUS
    } else {
        style.width * matrix.max_scale().unwrap_or(f32::INFINITY)
    }
}

/// The area a stroke covers as a device space fill: one clockwise triangle per contour, filled
/// with the winding rule so overlaps count once.
pub fn stroke_to_fill(
    path: &PathData,
    style: &StrokeStyle,
    matrix: &Matrix,
    params: &FlattenParams,
) -> Result<Path, PathError> {
    let (local, radius, matrix) = stroke_geometry(path, style, matrix)?;
    let mut writer = StrokeWriter::new(style, radius, true, None);
    writer.write_path(&local);
    let mut triangles = Vec::new();
    for patch in writer.patches() {
        stroke_triangles(patch, true, &matrix, params, &mut triangles);
    }
    let mut builder = PathBuilder::new();
    for [a, b, c] in triangles {
        let cross = (b - a).cross(c - a);
        if cross == 0. || !cross.is_finite() {
            continue;
        }
        let (b, c) = if cross > 0. { (b, c) } else { (c, b) };
        builder.move_to(a).line_to(b).line_to(c).close();
    }
    Ok(Path::new(builder.try_build()?, FillType::Winding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_common::sample;

    fn style(width: f32, join: Join, cap: Cap) -> StrokeStyle {
        StrokeStyle {
            width,
            join,
            cap,
            miter_limit: 4.,
        }
    }

    fn expand(path: &PathData, style: &StrokeStyle) -> Vec<[Point; 3]> {
        expand_with(path, style, &Matrix::IDENTITY)
    }

    fn expand_with(path: &PathData, style: &StrokeStyle, matrix: &Matrix) -> Vec<[Point; 3]> {
        let (local, radius, matrix) = stroke_geometry(path, style, matrix).unwrap();
        let mut writer = StrokeWriter::new(style, radius, true, None);
        writer.write_path(&local);
        let mut out = Vec::new();
        for patch in writer.patches() {
            stroke_triangles(patch, true, &matrix, &FlattenParams::default(), &mut out);
        }
        out
    }

    fn covered(tris: &[[Point; 3]], x: i32, y: i32) -> bool {
        tris.iter()
            .any(|t| sample::triangle_winding(t[0], t[1], t[2], x, y) != 0)
    }

    #[test]
    fn horizontal_line_with_butt_caps() {
        let line = PathData::line(Point::new(10., 20.), Point::new(50., 20.)).unwrap();
        let tris = expand(&line, &style(4., Join::Miter, Cap::Butt));
        for y in 10..30 {
            for x in 0..60 {
                let inside = (10..50).contains(&x) && (18..22).contains(&y);
                assert_eq!(covered(&tris, x, y), inside, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn square_caps_extend_by_the_radius() {
        let line = PathData::line(Point::new(10., 20.), Point::new(50., 20.)).unwrap();
        let tris = expand(&line, &style(4., Join::Miter, Cap::Square));
        assert!(covered(&tris, 8, 20));
        assert!(covered(&tris, 51, 19));
        assert!(!covered(&tris, 7, 20));
        assert!(!covered(&tris, 52, 20));
    }

    #[test]
    fn joins_fill_the_outer_corner() {
        let corner = PathData::polygon(
            &[
                Point::new(10., 10.),
                Point::new(40., 10.),
                Point::new(40., 40.),
            ],
            false,
        )
        .unwrap();
        let miter = expand(&corner, &style(10., Join::Miter, Cap::Butt));
        let bevel = expand(&corner, &style(10., Join::Bevel, Cap::Butt));
        let round = expand(&corner, &style(10., Join::Round, Cap::Butt));
        // The miter reaches the corner of the offset square, the bevel cuts it off.
        assert!(covered(&miter, 44, 5));
        assert!(!covered(&bevel, 44, 5));
        assert!(!covered(&round, 44, 5));
        // All three cover the points near the join on the outer side.
        for tris in [&miter, &bevel, &round] {
            assert!(covered(tris, 41, 8));
        }
        assert!(covered(&round, 43, 7));
        assert!(!covered(&bevel, 43, 7));
    }

    #[test]
    fn miter_limit_falls_back_to_bevel() {
        let sharp = PathData::polygon(
            &[
                Point::new(0., 0.),
                Point::new(100., 10.),
                Point::new(0., 20.),
            ],
            false,
        )
        .unwrap();
        // The miter is about ten times as long as the radius.
        let mut s = style(4., Join::Miter, Cap::Butt);
        s.miter_limit = 20.;
        let long = expand(&sharp, &s);
        s.miter_limit = 1.5;
        let short = expand(&sharp, &s);
        assert!(covered(&long, 110, 9));
        assert!(!covered(&short, 110, 9));
    }

    #[test]
    fn zero_length_contours_draw_dots() {
        let dot = PathData::line(Point::new(20., 20.), Point::new(20., 20.)).unwrap();
        let butt = expand(&dot, &style(6., Join::Miter, Cap::Butt));
        assert!(butt.is_empty());
        let round = expand(&dot, &style(6., Join::Miter, Cap::Round));
        assert!(covered(&round, 19, 19));
        assert!(covered(&round, 21, 21));
        assert!(!covered(&round, 23, 23));
        let square = expand(&dot, &style(6., Join::Miter, Cap::Square));
        assert!(covered(&square, 22, 22));
        assert!(covered(&square, 17, 17));
    }

    #[test]
    fn hairlines_are_one_device_pixel_wide() {
        let line = PathData::line(Point::new(1., 5.), Point::new(9., 5.)).unwrap();
        let scale = Matrix::scale(4., 4.);
        let tris = expand_with(&line, &StrokeStyle::hairline(Cap::Butt), &scale);
        for x in 4..36 {
            assert!(covered(&tris, x, 19), "pixel ({x}, 19)");
            assert!(!covered(&tris, x, 18));
            assert!(!covered(&tris, x, 21));
        }
    }

    #[test]
    fn curves_get_more_edges_when_zoomed() {
        let circle = {
            let mut b = PathBuilder::new();
            b.add_circle(Point::ZERO, 10., tessel_common::geometry::PathDirection::Cw);
            b.build().unwrap()
        };
        let s = style(2., Join::Round, Cap::Butt);
        let small = expand(&circle, &s).len();
        let large = expand_with(&circle, &s, &Matrix::scale(20., 20.)).len();
        assert!(large > small, "{large} <= {small}");
    }

    #[test]
    fn patch_layout_and_explicit_curve_types() {
        let conic = {
            let mut b = PathBuilder::new();
            b.move_to(Point::new(0., 0.))
                .conic_to(Point::new(10., 0.), Point::new(10., 10.), 0.7);
            b.build().unwrap()
        };
        let mut writer = StrokeWriter::new(&style(2., Join::Bevel, Cap::Round), 1., false, None);
        writer.write_path(&conic);
        let patches = writer.finish();
        assert_eq!(patches.len(), 3);
        assert_eq!(patches[0].kind, KIND_SEGMENT);
        assert_eq!(patches[0].curve_type, crate::patch::CURVE_TYPE_CONIC);
        assert_eq!(patches[0].join, JOIN_BEVEL);
        assert!(patches[1..].iter().all(|p| p.kind == KIND_ROUND_CAP));
        let bytes: &[u8] = bytemuck::cast_slice(&patches);
        assert_eq!(bytes.len(), 3 * 64);
    }

    #[test]
    fn fill_fallback_covers_what_the_triangles_cover() {
        let corner = PathData::polygon(
            &[
                Point::new(5., 5.),
                Point::new(30., 8.),
                Point::new(12., 30.),
            ],
            true,
        )
        .unwrap();
        let s = style(3., Join::Round, Cap::Butt);
        let tris = expand(&corner, &s);
        let fill =
            stroke_to_fill(&corner, &s, &Matrix::IDENTITY, &FlattenParams::default()).unwrap();
        assert_eq!(fill.fill_type(), FillType::Winding);
        assert!(fill.data().verbs().len() >= tris.len() * 4);
    }
}
