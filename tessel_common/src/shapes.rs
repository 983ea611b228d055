// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical point orders for rectangles, ovals and rounded rectangles.
//!
//! The factories and the recognisers both go through these layouts, so recognising a shape is
//! a comparison against a regenerated layout rather than a geometric search.

use crate::geometry::{PathDirection, Point, Rect};
use crate::path_data::Verb;
use crate::rrect::{RRect, RRectKind};
use smallvec::SmallVec;

/// The weight of a conic that traces a quarter of an ellipse.
pub const QUARTER_ARC_WEIGHT: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// The start index used when none is given for an oval.
pub const DEFAULT_OVAL_START: usize = 1;

/// Verbs, points and weights of one closed contour.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapeContour {
    pub(crate) verbs: SmallVec<[Verb; 10]>,
    pub(crate) points: SmallVec<[Point; 13]>,
    pub(crate) weights: SmallVec<[f32; 4]>,
}

/// The start index used when none is given for a rounded rectangle.
pub fn default_rrect_start(dir: PathDirection) -> usize {
    match dir {
        PathDirection::Cw => 6,
        PathDirection::Ccw => 7,
    }
}

/// Walks `n` indices starting at `start`, forwards for clockwise and backwards otherwise.
struct IndexWalk {
    n: usize,
    current: usize,
    forward: bool,
}

impl IndexWalk {
    fn new(n: usize, start: usize, dir: PathDirection) -> Self {
        Self {
            n,
            current: start % n,
            forward: dir == PathDirection::Cw,
        }
    }

    fn current(&self) -> usize {
        self.current
    }

    fn next(&mut self) -> usize {
        self.current = if self.forward {
            (self.current + 1) % self.n
        } else {
            (self.current + self.n - 1) % self.n
        };
        self.current
    }
}

/// Corners in clockwise order, starting at the upper left.
fn rect_corner(rect: &Rect, index: usize) -> Point {
    rect.corners()[index % 4]
}

/// On-curve points of an oval, clockwise from the top center.
fn oval_point(rect: &Rect, index: usize) -> Point {
    let c = rect.center();
    match index % 4 {
        0 => Point::new(c.x, rect.top),
        1 => Point::new(rect.right, c.y),
        2 => Point::new(c.x, rect.bottom),
        _ => Point::new(rect.left, c.y),
    }
}

/// On-curve points of a rounded rectangle, clockwise from the left end of the top edge.
fn rrect_point(rrect: &RRect, index: usize) -> Point {
    let r = rrect.rect();
    let [ul, ur, lr, ll] = rrect.radii();
    match index % 8 {
        0 => Point::new(r.left + ul.x, r.top),
        1 => Point::new(r.right - ur.x, r.top),
        2 => Point::new(r.right, r.top + ur.y),
        3 => Point::new(r.right, r.bottom - lr.y),
        4 => Point::new(r.right - lr.x, r.bottom),
        5 => Point::new(r.left + ll.x, r.bottom),
        6 => Point::new(r.left, r.bottom - ll.y),
        _ => Point::new(r.left, r.top + ul.y),
    }
}

pub(crate) fn rect_contour(rect: &Rect, dir: PathDirection, start: usize) -> ShapeContour {
    let mut out = ShapeContour::default();
    let mut walk = IndexWalk::new(4, start, dir);
    out.verbs.push(Verb::Move);
    out.points.push(rect_corner(rect, walk.current()));
    for _ in 0..3 {
        out.verbs.push(Verb::Line);
        out.points.push(rect_corner(rect, walk.next()));
    }
    out.verbs.push(Verb::Close);
    out
}

pub(crate) fn oval_contour(rect: &Rect, dir: PathDirection, start: usize) -> ShapeContour {
    let mut out = ShapeContour::default();
    let start = start % 4;
    let mut on_curve = IndexWalk::new(4, start, dir);
    let corner_start = match dir {
        PathDirection::Cw => start,
        PathDirection::Ccw => start + 1,
    };
    let mut corners = IndexWalk::new(4, corner_start, dir);
    out.verbs.push(Verb::Move);
    out.points.push(oval_point(rect, on_curve.current()));
    for _ in 0..4 {
        out.verbs.push(Verb::Conic);
        out.points.push(rect_corner(rect, corners.next()));
        out.points.push(oval_point(rect, on_curve.next()));
        out.weights.push(QUARTER_ARC_WEIGHT);
    }
    out.verbs.push(Verb::Close);
    out
}

/// The layout of a rounded rectangle. Degenerate rounded rectangles use the rect or oval
/// layout instead, with the start index mapped onto the corresponding vertex.
pub(crate) fn rrect_contour(rrect: &RRect, dir: PathDirection, start: usize) -> ShapeContour {
    let start = start % 8;
    match rrect.kind() {
        RRectKind::Empty | RRectKind::Rect => {
            return rect_contour(&rrect.rect(), dir, (start + 1) / 2);
        }
        RRectKind::Oval => return oval_contour(&rrect.rect(), dir, start / 2),
        RRectKind::Complex => {}
    }
    let mut out = ShapeContour::default();
    let starts_with_conic = ((start & 1) == 1) == (dir == PathDirection::Cw);
    let corner_start = match dir {
        PathDirection::Cw => start / 2,
        PathDirection::Ccw => start / 2 + 1,
    };
    let rect = rrect.rect();
    let mut on_curve = IndexWalk::new(8, start, dir);
    let mut corners = IndexWalk::new(4, corner_start, dir);
    let conic = |out: &mut ShapeContour, corners: &mut IndexWalk, on_curve: &mut IndexWalk| {
        out.verbs.push(Verb::Conic);
        out.points.push(rect_corner(&rect, corners.next()));
        out.points.push(rrect_point(rrect, on_curve.next()));
        out.weights.push(QUARTER_ARC_WEIGHT);
    };
    out.verbs.push(Verb::Move);
    out.points.push(rrect_point(rrect, on_curve.current()));
    if starts_with_conic {
        for _ in 0..3 {
            conic(&mut out, &mut corners, &mut on_curve);
            out.verbs.push(Verb::Line);
            out.points.push(rrect_point(rrect, on_curve.next()));
        }
        // The closing line is implied by the close verb.
        conic(&mut out, &mut corners, &mut on_curve);
    } else {
        for _ in 0..4 {
            out.verbs.push(Verb::Line);
            out.points.push(rrect_point(rrect, on_curve.next()));
            conic(&mut out, &mut corners, &mut on_curve);
        }
    }
    out.verbs.push(Verb::Close);
    out
}

/// Whether the given contour data matches a layout.
pub(crate) fn matches(
    layout: &ShapeContour,
    verbs: &[Verb],
    points: &[Point],
    weights: &[f32],
) -> bool {
    layout.verbs.as_slice() == verbs
        && layout.points.as_slice() == points
        && layout.weights.as_slice() == weights
}

/// All direction and start index combinations for a shape with `starts` start indices.
pub(crate) fn orientations(starts: usize) -> impl Iterator<Item = (PathDirection, usize)> {
    [PathDirection::Cw, PathDirection::Ccw]
        .into_iter()
        .flat_map(move |dir| (0..starts).map(move |start| (dir, start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_starts_and_winds() {
        let r = Rect::from_ltrb(0., 0., 10., 20.);
        let cw = rect_contour(&r, PathDirection::Cw, 2);
        assert_eq!(
            cw.points.as_slice(),
            &[
                Point::new(10., 20.),
                Point::new(0., 20.),
                Point::new(0., 0.),
                Point::new(10., 0.)
            ]
        );
        let ccw = rect_contour(&r, PathDirection::Ccw, 0);
        assert_eq!(ccw.points[1], Point::new(0., 20.));
    }

    #[test]
    fn oval_controls_sit_on_corners() {
        let r = Rect::from_ltrb(0., 0., 10., 20.);
        let cw = oval_contour(&r, PathDirection::Cw, 1);
        // Right, then the lower right corner, then bottom.
        assert_eq!(cw.points[0], Point::new(10., 10.));
        assert_eq!(cw.points[1], Point::new(10., 20.));
        assert_eq!(cw.points[2], Point::new(5., 20.));
        let ccw = oval_contour(&r, PathDirection::Ccw, 0);
        // Top, then the upper left corner, then left.
        assert_eq!(ccw.points[1], Point::new(0., 0.));
        assert_eq!(ccw.points[2], Point::new(0., 10.));
    }

    #[test]
    fn rrect_verb_patterns() {
        let rr = RRect::from_rect_xy(Rect::from_ltrb(0., 0., 40., 20.), 4., 3.);
        let line_first = rrect_contour(&rr, PathDirection::Cw, 6);
        assert_eq!(line_first.verbs.len(), 10);
        assert_eq!(line_first.verbs[1], Verb::Line);
        assert_eq!(line_first.points.len(), 13);
        let conic_first = rrect_contour(&rr, PathDirection::Cw, 7);
        assert_eq!(conic_first.verbs[1], Verb::Conic);
        assert_eq!(conic_first.points.len(), 12);
        // Conic from (L, T + ry) through the upper left corner to (L + rx, T).
        assert_eq!(conic_first.points[1], Point::new(0., 0.));
        assert_eq!(conic_first.points[2], Point::new(4., 0.));
    }
}
