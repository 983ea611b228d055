// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building and editing path geometry.

use crate::error::PathError;
use crate::geometry::{PathDirection, Point, Rect};
use crate::kurbo;
use crate::path_data::{PathData, ShapeTag, Verb};
use crate::rrect::{RRect, RRectKind};
use crate::shapes::{self, ShapeContour};

/// Accumulates verbs, points and conic weights into a [`PathData`].
///
/// Segment verbs without a preceding move start at the last contour's start point (or the
/// origin), so the builder always produces a grammatical verb sequence.
#[derive(Clone, Debug)]
pub struct PathBuilder {
    verbs: Vec<Verb>,
    points: Vec<Point>,
    conic_weights: Vec<f32>,
    /// Index into `points` of the start of the last contour.
    last_move: Option<usize>,
    shape: ShapeTag,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            verbs: Vec::new(),
            points: Vec::new(),
            conic_weights: Vec::new(),
            last_move: None,
            shape: ShapeTag::General,
        }
    }

    /// A builder that continues from existing geometry.
    ///
    /// If `data` is the only handle to its buffer the buffer is reused and its identifier is
    /// retired (notifying its listeners); otherwise the geometry is copied.
    pub fn from_path_data(data: PathData) -> Self {
        let (verbs, points, conic_weights) = match data.try_recycle() {
            Ok(parts) => parts,
            Err(shared) => (
                shared.verbs().to_vec(),
                shared.points().to_vec(),
                shared.conic_weights().to_vec(),
            ),
        };
        let last_move = verbs.iter().rposition(|v| *v == Verb::Move).map(|verb_index| {
            verbs[..verb_index]
                .iter()
                .map(|v| v.point_count())
                .sum::<usize>()
        });
        Self {
            verbs,
            points,
            conic_weights,
            last_move,
            shape: ShapeTag::General,
        }
    }

    /// A builder holding the segments of `path`.
    ///
    /// Curves are kept as quadratics and cubics.
    pub fn from_kurbo(path: impl IntoIterator<Item = kurbo::PathEl>) -> Self {
        let mut builder = Self::new();
        for el in path {
            match el {
                kurbo::PathEl::MoveTo(p) => builder.move_to(p.into()),
                kurbo::PathEl::LineTo(p) => builder.line_to(p.into()),
                kurbo::PathEl::QuadTo(p1, p2) => builder.quad_to(p1.into(), p2.into()),
                kurbo::PathEl::CurveTo(p1, p2, p3) => {
                    builder.cubic_to(p1.into(), p2.into(), p3.into())
                }
                kurbo::PathEl::ClosePath => builder.close(),
            };
        }
        builder
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// The point the next segment starts from.
    pub fn current_point(&self) -> Option<Point> {
        match self.verbs.last()? {
            Verb::Close => self.last_move.map(|i| self.points[i]),
            _ => self.points.last().copied(),
        }
    }

    /// Start a new contour. Consecutive moves collapse into the last one.
    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.shape = ShapeTag::General;
        if self.verbs.last() == Some(&Verb::Move) {
            if let Some(last) = self.points.last_mut() {
                *last = p;
            }
            return self;
        }
        self.last_move = Some(self.points.len());
        self.verbs.push(Verb::Move);
        self.points.push(p);
        self
    }

    fn inject_move_if_needed(&mut self) {
        match self.verbs.last() {
            None => {
                self.move_to(Point::ZERO);
            }
            Some(Verb::Close) => {
                let start = self.last_move.map_or(Point::ZERO, |i| self.points[i]);
                self.move_to(start);
            }
            Some(_) => {}
        }
        self.shape = ShapeTag::General;
    }

    /// Add a line.
    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.inject_move_if_needed();
        self.verbs.push(Verb::Line);
        self.points.push(p);
        self
    }

    /// Add a quadratic Bézier.
    pub fn quad_to(&mut self, p1: Point, p2: Point) -> &mut Self {
        self.inject_move_if_needed();
        self.verbs.push(Verb::Quad);
        self.points.extend([p1, p2]);
        self
    }

    /// Add a conic.
    ///
    /// A unit weight adds a quadratic, a weight that is not positive adds a line to `p2` and an
    /// infinite weight adds lines through `p1`.
    pub fn conic_to(&mut self, p1: Point, p2: Point, w: f32) -> &mut Self {
        if !(w > 0.) {
            return self.line_to(p2);
        }
        if !w.is_finite() {
            self.line_to(p1);
            return self.line_to(p2);
        }
        if w == 1. {
            return self.quad_to(p1, p2);
        }
        self.inject_move_if_needed();
        self.verbs.push(Verb::Conic);
        self.points.extend([p1, p2]);
        self.conic_weights.push(w);
        self
    }

    /// Add a cubic Bézier.
    pub fn cubic_to(&mut self, p1: Point, p2: Point, p3: Point) -> &mut Self {
        self.inject_move_if_needed();
        self.verbs.push(Verb::Cubic);
        self.points.extend([p1, p2, p3]);
        self
    }

    /// Close the current contour. Does nothing if there is no open contour.
    pub fn close(&mut self) -> &mut Self {
        if matches!(self.verbs.last(), Some(v) if *v != Verb::Close) {
            self.verbs.push(Verb::Close);
            self.shape = ShapeTag::General;
        }
        self
    }

    fn append_shape(&mut self, contour: ShapeContour, shape: ShapeTag) -> &mut Self {
        let was_empty = self.is_empty();
        if self.verbs.last() == Some(&Verb::Move) {
            // A dangling move is replaced by the shape's own.
            self.verbs.pop();
            self.points.pop();
        }
        self.last_move = Some(self.points.len());
        self.verbs.extend_from_slice(&contour.verbs);
        self.points.extend_from_slice(&contour.points);
        self.conic_weights.extend_from_slice(&contour.weights);
        self.shape = if was_empty { shape } else { ShapeTag::General };
        self
    }

    /// Add a closed rectangle contour starting at corner `start`.
    pub fn add_rect(&mut self, rect: &Rect, dir: PathDirection, start: usize) -> &mut Self {
        let start = start % 4;
        self.append_shape(
            shapes::rect_contour(rect, dir, start),
            ShapeTag::Rect { dir, start },
        )
    }

    /// Add a closed oval contour starting at on-curve point `start`.
    pub fn add_oval(&mut self, rect: &Rect, dir: PathDirection, start: usize) -> &mut Self {
        let start = start % 4;
        self.append_shape(
            shapes::oval_contour(rect, dir, start),
            ShapeTag::Oval { dir, start },
        )
    }

    /// Add a circle, starting at its rightmost point.
    pub fn add_circle(&mut self, center: Point, radius: f32, dir: PathDirection) -> &mut Self {
        if !(radius >= 0.) {
            return self;
        }
        let rect = Rect::from_ltrb(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        );
        self.add_oval(&rect, dir, shapes::DEFAULT_OVAL_START)
    }

    /// Add a closed rounded rectangle contour starting at on-curve point `start`.
    pub fn add_rrect(&mut self, rrect: &RRect, dir: PathDirection, start: usize) -> &mut Self {
        let start = start % 8;
        match rrect.kind() {
            RRectKind::Empty | RRectKind::Rect => {
                self.add_rect(&rrect.rect(), dir, (start + 1) / 2)
            }
            RRectKind::Oval => self.add_oval(&rrect.rect(), dir, start / 2),
            RRectKind::Complex => self.append_shape(
                shapes::rrect_contour(rrect, dir, start),
                ShapeTag::RRect {
                    rrect: *rrect,
                    dir,
                    start,
                },
            ),
        }
    }

    /// Add a polyline through `points`, closed if `close` is set.
    pub fn add_polygon(&mut self, points: &[Point], close: bool) -> &mut Self {
        let Some((first, rest)) = points.split_first() else {
            return self;
        };
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        if close {
            self.close();
        }
        self
    }

    /// Validate the geometry and turn it into [`PathData`].
    pub fn try_build(self) -> Result<PathData, PathError> {
        PathData::from_vecs(self.verbs, self.points, self.conic_weights, self.shape)
    }

    /// Like [`PathBuilder::try_build`], discarding the reason for a failure.
    pub fn build(self) -> Option<PathData> {
        self.try_build().ok()
    }
}
