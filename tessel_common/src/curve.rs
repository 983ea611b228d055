// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve segments, evaluation and subdivision.
//!
//! Every rasterisation path in Tessel evaluates curves through the functions in this module, so
//! that the same curve always produces the same vertices no matter which renderer draws it.

use crate::geometry::{Point, Rect};
use crate::path_data::{PathData, PathElement};
use smallvec::SmallVec;

/// One segment of a contour, with its start point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// A line.
    Line([Point; 2]),
    /// A quadratic Bézier.
    Quad([Point; 3]),
    /// A conic with its weight.
    Conic([Point; 3], f32),
    /// A cubic Bézier.
    Cubic([Point; 4]),
}

impl Segment {
    /// The start point.
    pub fn start(&self) -> Point {
        self.points()[0]
    }

    /// The end point.
    pub fn end(&self) -> Point {
        let pts = self.points();
        pts[pts.len() - 1]
    }

    /// All control points, including both ends.
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Line(p) => p.as_slice(),
            Self::Quad(p) | Self::Conic(p, _) => p.as_slice(),
            Self::Cubic(p) => p.as_slice(),
        }
    }

    /// Whether this is a line.
    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line(_))
    }

    /// The bounds of the control points, which contain the curve.
    pub fn hull_bounds(&self) -> Rect {
        Rect::from_points(self.points())
    }

    /// The segment with every point mapped by `f`.
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Self {
        match *self {
            Self::Line(p) => Self::Line(p.map(&mut f)),
            Self::Quad(p) => Self::Quad(p.map(&mut f)),
            Self::Conic(p, w) => Self::Conic(p.map(&mut f), w),
            Self::Cubic(p) => Self::Cubic(p.map(&mut f)),
        }
    }

    /// The point at parameter `t`.
    ///
    /// `t == 0` and `t == 1` return the end points exactly.
    pub fn eval(&self, t: f32) -> Point {
        if t <= 0. {
            return self.start();
        }
        if t >= 1. {
            return self.end();
        }
        match self {
            Self::Line([p0, p1]) => p0.lerp(*p1, t),
            Self::Quad(p) => eval_cubic(&quad_to_cubic(p), t),
            Self::Conic(p, w) => eval_conic(p, *w, t),
            Self::Cubic(p) => eval_cubic(p, t),
        }
    }
}

/// The cubic that traces the same curve as a quadratic.
pub fn quad_to_cubic(p: &[Point; 3]) -> [Point; 4] {
    const TWO_THIRDS: f32 = 2. / 3.;
    [
        p[0],
        p[0] + (p[1] - p[0]) * TWO_THIRDS,
        p[2] + (p[1] - p[2]) * TWO_THIRDS,
        p[2],
    ]
}

/// The cubic that traces a line, with its control points at the thirds.
pub fn line_to_cubic(p: &[Point; 2]) -> [Point; 4] {
    [
        p[0],
        p[0].lerp(p[1], 1. / 3.),
        p[0].lerp(p[1], 2. / 3.),
        p[1],
    ]
}

/// Evaluate a cubic Bézier in Bernstein form.
pub fn eval_cubic(p: &[Point; 4], t: f32) -> Point {
    let mt = 1. - t;
    let a = mt * mt * mt;
    let b = 3. * mt * mt * t;
    let c = 3. * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p[0].x + b * p[1].x + c * p[2].x + d * p[3].x,
        a * p[0].y + b * p[1].y + c * p[2].y + d * p[3].y,
    )
}

/// Evaluate a conic.
pub fn eval_conic(p: &[Point; 3], w: f32, t: f32) -> Point {
    let mt = 1. - t;
    let a = mt * mt;
    let b = 2. * mt * t * w;
    let c = t * t;
    let denom = a + b + c;
    Point::new(
        (a * p[0].x + b * p[1].x + c * p[2].x) / denom,
        (a * p[0].y + b * p[1].y + c * p[2].y) / denom,
    )
}

/// Split a cubic at `t`.
pub fn chop_cubic_at(p: &[Point; 4], t: f32) -> ([Point; 4], [Point; 4]) {
    let ab = p[0].lerp(p[1], t);
    let bc = p[1].lerp(p[2], t);
    let cd = p[2].lerp(p[3], t);
    let abc = ab.lerp(bc, t);
    let bcd = bc.lerp(cd, t);
    let mid = abc.lerp(bcd, t);
    ([p[0], ab, abc, mid], [mid, bcd, cd, p[3]])
}

/// Split a quadratic at `t`.
pub fn chop_quad_at(p: &[Point; 3], t: f32) -> ([Point; 3], [Point; 3]) {
    let ab = p[0].lerp(p[1], t);
    let bc = p[1].lerp(p[2], t);
    let mid = ab.lerp(bc, t);
    ([p[0], ab, mid], [mid, bc, p[2]])
}

/// Split a conic in half. Both halves share the weight `sqrt((1 + w) / 2)`.
pub fn chop_conic_in_half(p: &[Point; 3], w: f32) -> (([Point; 3], f32), ([Point; 3], f32)) {
    let scale = 1. / (1. + w);
    let q0 = (p[0] + p[1] * w) * scale;
    let q1 = (p[1] * w + p[2]) * scale;
    let mid = q0.midpoint(q1);
    let new_w = (0.5 + 0.5 * w).sqrt();
    (([p[0], q0, mid], new_w), ([mid, q1, p[2]], new_w))
}

/// Split a segment in half.
pub fn chop_segment_in_half(seg: &Segment) -> (Segment, Segment) {
    match seg {
        Segment::Line([p0, p1]) => {
            let mid = p0.midpoint(*p1);
            (Segment::Line([*p0, mid]), Segment::Line([mid, *p1]))
        }
        Segment::Quad(p) => {
            let (a, b) = chop_quad_at(p, 0.5);
            (Segment::Quad(a), Segment::Quad(b))
        }
        Segment::Conic(p, w) => {
            let ((a, wa), (b, wb)) = chop_conic_in_half(p, *w);
            (Segment::Conic(a, wa), Segment::Conic(b, wb))
        }
        Segment::Cubic(p) => {
            let (a, b) = chop_cubic_at(p, 0.5);
            (Segment::Cubic(a), Segment::Cubic(b))
        }
    }
}

/// A contour of a path as a list of segments.
#[derive(Clone, Debug, Default)]
pub struct Contour {
    /// The segments, in order. Consecutive segments share their end points.
    pub segments: SmallVec<[Segment; 8]>,
    /// Whether the contour ended with a close verb.
    pub closed: bool,
}

impl Contour {
    /// The first point of the contour.
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(Segment::start)
    }

    /// The last point of the contour.
    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(Segment::end)
    }

    /// The line that closes the contour, if its ends differ.
    pub fn closing_line(&self) -> Option<Segment> {
        let (start, end) = (self.start()?, self.end()?);
        (start != end).then_some(Segment::Line([end, start]))
    }
}

/// Split a path into its contours. Contours without segments are skipped.
pub fn contours(path: &PathData) -> Vec<Contour> {
    let mut out = Vec::new();
    let mut current = Contour::default();
    let mut last = Point::ZERO;
    let mut flush = |current: &mut Contour| {
        if !current.segments.is_empty() {
            out.push(core::mem::take(current));
        } else {
            current.closed = false;
        }
    };
    for el in path.iter() {
        match el {
            PathElement::MoveTo(p) => {
                flush(&mut current);
                last = p;
            }
            PathElement::LineTo(p) => {
                current.segments.push(Segment::Line([last, p]));
                last = p;
            }
            PathElement::QuadTo(c, p) => {
                current.segments.push(Segment::Quad([last, c, p]));
                last = p;
            }
            PathElement::ConicTo(c, p, w) => {
                current.segments.push(Segment::Conic([last, c, p], w));
                last = p;
            }
            PathElement::CubicTo(c1, c2, p) => {
                current.segments.push(Segment::Cubic([last, c1, c2, p]));
                last = p;
            }
            PathElement::Close => {
                current.closed = true;
                if let Some(start) = current.start() {
                    last = start;
                }
            }
        }
    }
    flush(&mut current);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathDirection;

    #[test]
    fn evaluation_hits_end_points_exactly() {
        let seg = Segment::Cubic([
            Point::new(0.1, 0.2),
            Point::new(3.3, 7.7),
            Point::new(9.1, -4.),
            Point::new(10.3, 0.7),
        ]);
        assert_eq!(seg.eval(0.), Point::new(0.1, 0.2));
        assert_eq!(seg.eval(1.), Point::new(10.3, 0.7));
    }

    #[test]
    fn quad_elevation_traces_the_same_curve() {
        let q = [Point::ZERO, Point::new(10., 20.), Point::new(20., 0.)];
        let c = quad_to_cubic(&q);
        let p = eval_cubic(&c, 0.5);
        assert!((p.x - 10.).abs() < 1e-4 && (p.y - 10.).abs() < 1e-4);
    }

    #[test]
    fn conic_halves_stay_on_the_circle() {
        let p = [Point::new(1., 0.), Point::new(1., 1.), Point::new(0., 1.)];
        let ((a, wa), (b, wb)) = chop_conic_in_half(&p, core::f32::consts::FRAC_1_SQRT_2);
        for (pts, w) in [(a, wa), (b, wb)] {
            for t in [0.25, 0.5, 0.75] {
                let q = eval_conic(&pts, w, t);
                assert!((q.length() - 1.).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn contours_split_on_moves() {
        let path = PathData::make(
            &[
                Point::new(0., 0.),
                Point::new(1., 0.),
                Point::new(5., 5.),
                Point::new(6., 5.),
                Point::new(6., 6.),
                Point::new(9., 9.),
            ],
            &[
                crate::path_data::Verb::Move,
                crate::path_data::Verb::Line,
                crate::path_data::Verb::Close,
                crate::path_data::Verb::Move,
                crate::path_data::Verb::Quad,
                crate::path_data::Verb::Move,
            ],
            &[],
        )
        .unwrap();
        let contours = contours(&path);
        assert_eq!(contours.len(), 2);
        assert!(contours[0].closed);
        assert_eq!(
            contours[0].closing_line(),
            Some(Segment::Line([Point::new(1., 0.), Point::new(0., 0.)]))
        );
        assert!(!contours[1].closed);
        assert_eq!(
            contours[1].segments[0],
            Segment::Quad([Point::new(5., 5.), Point::new(6., 5.), Point::new(6., 6.)])
        );
    }

    #[test]
    fn oval_contour_is_closed() {
        let oval = PathData::oval(&Rect::from_ltrb(0., 0., 4., 4.), PathDirection::Cw, 1).unwrap();
        let contours = contours(&oval);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].segments.len(), 4);
        assert_eq!(contours[0].closing_line(), None);
    }
}
