// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable, shared path geometry.
//!
//! A [`PathData`] is a cheap handle to an immutable buffer of verbs, points and conic weights.
//! Handles are cloned freely; geometry is only ever edited through a
//! [`PathBuilder`](crate::path_builder::PathBuilder), which reuses the buffer in place when it
//! holds the only handle and copies otherwise.

use crate::error::PathError;
use crate::geometry::{PathDirection, Point, Rect};
use crate::matrix::Matrix;
use crate::rrect::{RRect, RRectKind};
use crate::shapes::{self, ShapeContour};
use log::warn;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub use crate::shapes::{default_rrect_start, DEFAULT_OVAL_START, QUARTER_ARC_WEIGHT};

/// A path opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Verb {
    /// Start a new contour.
    Move,
    /// A straight line.
    Line,
    /// A quadratic Bézier.
    Quad,
    /// A rational quadratic Bézier with one weight.
    Conic,
    /// A cubic Bézier.
    Cubic,
    /// Close the current contour with a line back to its start.
    Close,
}

impl Verb {
    /// The number of points the verb consumes.
    pub const fn point_count(self) -> usize {
        match self {
            Self::Move | Self::Line => 1,
            Self::Quad | Self::Conic => 2,
            Self::Cubic => 3,
            Self::Close => 0,
        }
    }

    /// The segment mask bit of the verb, zero for `Move` and `Close`.
    pub const fn segment_mask(self) -> SegmentMask {
        match self {
            Self::Line => SegmentMask::LINE,
            Self::Quad => SegmentMask::QUAD,
            Self::Conic => SegmentMask::CONIC,
            Self::Cubic => SegmentMask::CUBIC,
            Self::Move | Self::Close => SegmentMask::EMPTY,
        }
    }
}

/// The set of segment kinds present in a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SegmentMask(u8);

impl SegmentMask {
    /// No segments.
    pub const EMPTY: Self = Self(0);
    /// Lines.
    pub const LINE: Self = Self(1 << 0);
    /// Quadratic Béziers.
    pub const QUAD: Self = Self(1 << 1);
    /// Conics.
    pub const CONIC: Self = Self(1 << 2);
    /// Cubic Béziers.
    pub const CUBIC: Self = Self(1 << 3);

    /// The raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The union of two masks.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the path only contains lines (or nothing).
    pub const fn is_lines_only(self) -> bool {
        self.0 & !Self::LINE.0 == 0
    }
}

/// The convexity classification of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Convexity {
    /// A single contour that turns consistently in one direction and winds at most once.
    /// Degenerate paths (no area) are also convex.
    Convex,
    /// Everything else, including every path with more than one contour.
    Concave,
}

const CONVEXITY_UNKNOWN: u8 = 0;
const CONVEXITY_COMPUTING: u8 = 1;
const CONVEXITY_CONVEX: u8 = 2;
const CONVEXITY_CONCAVE: u8 = 3;

/// The number of low bits of a unique identifier left free for the fill type.
pub const FILL_TYPE_BITS: u32 = 2;

fn next_unique_id() -> u32 {
    static NEXT_ID: AtomicU32 = AtomicU32::new(1 << FILL_TYPE_BITS);
    loop {
        let id = NEXT_ID.fetch_add(1 << FILL_TYPE_BITS, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

/// Notified when the identifier of a [`PathData`] is about to become invalid.
///
/// This happens when the last handle is dropped, or when a builder recycles the buffer in place
/// for new content. Listeners are called at most once.
pub trait IdChangeListener: Send + Sync {
    /// The identifier `unique_id` will never describe this geometry again.
    fn changed(&self, unique_id: u32);
}

impl<F: Fn(u32) + Send + Sync> IdChangeListener for F {
    fn changed(&self, unique_id: u32) {
        self(unique_id);
    }
}

/// The shape a path was built as, recorded by the specialised factories.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ShapeTag {
    General,
    Line,
    Rect { dir: PathDirection, start: usize },
    Oval { dir: PathDirection, start: usize },
    RRect {
        rrect: RRect,
        dir: PathDirection,
        start: usize,
    },
}

#[derive(Debug)]
pub(crate) struct PathDataRepr {
    pub(crate) verbs: Vec<Verb>,
    pub(crate) points: Vec<Point>,
    pub(crate) conic_weights: Vec<f32>,
    bounds: Rect,
    segment_mask: SegmentMask,
    shape: ShapeTag,
    unique_id: u32,
    convexity: AtomicU8,
    listeners: Mutex<Vec<Box<dyn IdChangeListener>>>,
    #[cfg(test)]
    convexity_computations: AtomicU32,
}

impl core::fmt::Debug for dyn IdChangeListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("IdChangeListener")
    }
}

impl PathDataRepr {
    fn notify_listeners(&mut self) {
        let listeners = core::mem::take(
            self.listeners
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for listener in listeners {
            listener.changed(self.unique_id);
        }
    }
}

impl Drop for PathDataRepr {
    fn drop(&mut self) {
        self.notify_listeners();
    }
}

/// Immutable, reference counted path geometry.
///
/// Two handles are equal when their verbs, points and conic weights are equal, whatever their
/// identifiers are.
#[derive(Clone, Debug)]
pub struct PathData(Arc<PathDataRepr>);

impl PathData {
    /// Create path data from raw arrays.
    ///
    /// Fails when the verbs do not follow the contour grammar (each contour is one `Move`, any
    /// number of segment verbs and at most one `Close`), when the point or weight counts do not
    /// match the verbs, or when any value is not finite.
    pub fn try_make(points: &[Point], verbs: &[Verb], conics: &[f32]) -> Result<Self, PathError> {
        Self::from_vecs(
            verbs.to_vec(),
            points.to_vec(),
            conics.to_vec(),
            ShapeTag::General,
        )
    }

    /// Like [`PathData::try_make`], discarding the reason for a failure.
    pub fn make(points: &[Point], verbs: &[Verb], conics: &[f32]) -> Option<Self> {
        Self::try_make(points, verbs, conics).ok()
    }

    /// A path without any verbs.
    pub fn empty() -> Self {
        Self::new_unchecked(Vec::new(), Vec::new(), Vec::new(), ShapeTag::General)
    }

    /// A closed rectangle contour starting at corner `start` (0 is the upper left, continuing
    /// clockwise).
    pub fn rect(rect: &Rect, dir: PathDirection, start: usize) -> Option<Self> {
        let start = start % 4;
        Self::from_contour(
            shapes::rect_contour(rect, dir, start),
            ShapeTag::Rect { dir, start },
        )
    }

    /// A closed oval contour made of four conics, starting at on-curve point `start` (0 is the
    /// top center, continuing clockwise).
    pub fn oval(rect: &Rect, dir: PathDirection, start: usize) -> Option<Self> {
        let start = start % 4;
        Self::from_contour(
            shapes::oval_contour(rect, dir, start),
            ShapeTag::Oval { dir, start },
        )
    }

    /// A closed rounded rectangle contour starting at on-curve point `start` (0 is the left end
    /// of the top edge, continuing clockwise).
    ///
    /// Rounded rectangles without radii produce a rectangle and fully rounded ones an oval.
    pub fn rrect(rrect: &RRect, dir: PathDirection, start: usize) -> Option<Self> {
        let start = start % 8;
        let tag = match rrect.kind() {
            RRectKind::Empty | RRectKind::Rect => ShapeTag::Rect {
                dir,
                start: ((start + 1) / 2) % 4,
            },
            RRectKind::Oval => ShapeTag::Oval {
                dir,
                start: start / 2,
            },
            RRectKind::Complex => ShapeTag::RRect {
                rrect: *rrect,
                dir,
                start,
            },
        };
        Self::from_contour(shapes::rrect_contour(rrect, dir, start), tag)
    }

    /// A polyline through `points`, closed if `close` is set.
    pub fn polygon(points: &[Point], close: bool) -> Option<Self> {
        let Some((_, rest)) = points.split_first() else {
            return Some(Self::empty());
        };
        let mut verbs = Vec::with_capacity(points.len() + 1);
        verbs.push(Verb::Move);
        verbs.extend(rest.iter().map(|_| Verb::Line));
        if close {
            verbs.push(Verb::Close);
        }
        Self::from_vecs(verbs, points.to_vec(), Vec::new(), ShapeTag::General).ok()
    }

    /// A single open line segment.
    pub fn line(p0: Point, p1: Point) -> Option<Self> {
        Self::from_vecs(
            vec![Verb::Move, Verb::Line],
            vec![p0, p1],
            Vec::new(),
            ShapeTag::Line,
        )
        .ok()
    }

    fn from_contour(contour: ShapeContour, shape: ShapeTag) -> Option<Self> {
        Self::from_vecs(
            contour.verbs.into_vec(),
            contour.points.into_vec(),
            contour.weights.into_vec(),
            shape,
        )
        .ok()
    }

    /// Validate and wrap buffers.
    pub(crate) fn from_vecs(
        verbs: Vec<Verb>,
        points: Vec<Point>,
        conic_weights: Vec<f32>,
        shape: ShapeTag,
    ) -> Result<Self, PathError> {
        validate(&verbs, &points, &conic_weights)?;
        Ok(Self::new_unchecked(verbs, points, conic_weights, shape))
    }

    fn new_unchecked(
        verbs: Vec<Verb>,
        points: Vec<Point>,
        conic_weights: Vec<f32>,
        shape: ShapeTag,
    ) -> Self {
        let bounds = Rect::from_points(&points);
        let segment_mask = verbs
            .iter()
            .fold(SegmentMask::EMPTY, |mask, v| mask.union(v.segment_mask()));
        Self(Arc::new(PathDataRepr {
            verbs,
            points,
            conic_weights,
            bounds,
            segment_mask,
            shape,
            unique_id: next_unique_id(),
            convexity: AtomicU8::new(CONVEXITY_UNKNOWN),
            listeners: Mutex::new(Vec::new()),
            #[cfg(test)]
            convexity_computations: AtomicU32::new(0),
        }))
    }

    /// Take the buffers back if this is the only handle, notifying listeners that the
    /// identifier is retired. Otherwise the handle is returned unchanged.
    pub(crate) fn try_recycle(self) -> Result<(Vec<Verb>, Vec<Point>, Vec<f32>), Self> {
        let mut arc = self.0;
        match Arc::get_mut(&mut arc) {
            Some(repr) => {
                repr.notify_listeners();
                Ok((
                    core::mem::take(&mut repr.verbs),
                    core::mem::take(&mut repr.points),
                    core::mem::take(&mut repr.conic_weights),
                ))
            }
            None => Err(Self(arc)),
        }
    }

    /// The verbs.
    pub fn verbs(&self) -> &[Verb] {
        &self.0.verbs
    }

    /// The points, in verb order.
    pub fn points(&self) -> &[Point] {
        &self.0.points
    }

    /// One weight per conic verb.
    pub fn conic_weights(&self) -> &[f32] {
        &self.0.conic_weights
    }

    /// The bounds of all points, including control points.
    pub fn bounds(&self) -> Rect {
        self.0.bounds
    }

    /// The kinds of segments present.
    pub fn segment_mask(&self) -> SegmentMask {
        self.0.segment_mask
    }

    /// The identifier of this geometry, never zero and with the low [`FILL_TYPE_BITS`] clear.
    ///
    /// Equal geometry may carry different identifiers.
    pub fn unique_id(&self) -> u32 {
        self.0.unique_id
    }

    /// Whether the path has no verbs other than moves.
    pub fn is_empty(&self) -> bool {
        self.0.verbs.iter().all(|v| *v == Verb::Move)
    }

    /// Whether both handles refer to the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Iterate over the elements of the path.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            verbs: self.0.verbs.iter(),
            points: &self.0.points,
            weights: &self.0.conic_weights,
        }
    }

    /// Register a listener that is called when this identifier is retired.
    pub fn add_id_change_listener(&self, listener: impl IdChangeListener + 'static) {
        self.0
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// The convexity of the path, computed on first use.
    ///
    /// Concurrent callers wait for the single computation to finish rather than repeating it.
    pub fn convexity(&self) -> Convexity {
        let cell = &self.0.convexity;
        loop {
            match cell.load(Ordering::Acquire) {
                CONVEXITY_CONVEX => return Convexity::Convex,
                CONVEXITY_CONCAVE => return Convexity::Concave,
                CONVEXITY_UNKNOWN => {
                    if cell
                        .compare_exchange(
                            CONVEXITY_UNKNOWN,
                            CONVEXITY_COMPUTING,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        #[cfg(test)]
                        self.0.convexity_computations.fetch_add(1, Ordering::Relaxed);
                        let convexity = compute_convexity(self);
                        let code = match convexity {
                            Convexity::Convex => CONVEXITY_CONVEX,
                            Convexity::Concave => CONVEXITY_CONCAVE,
                        };
                        cell.store(code, Ordering::Release);
                        return convexity;
                    }
                }
                _ => std::thread::yield_now(),
            }
        }
    }

    /// Whether the path is convex.
    pub fn is_convex(&self) -> bool {
        self.convexity() == Convexity::Convex
    }

    /// The endpoints if the path is a single line segment.
    pub fn as_line(&self) -> Option<[Point; 2]> {
        match (self.0.shape, self.verbs(), self.points()) {
            (ShapeTag::Line, _, &[p0, p1]) | (_, [Verb::Move, Verb::Line], &[p0, p1]) => {
                Some([p0, p1])
            }
            _ => None,
        }
    }

    /// The rectangle, direction and start corner if the path is a rectangle contour.
    pub fn as_rect(&self) -> Option<(Rect, PathDirection, usize)> {
        if let ShapeTag::Rect { dir, start } = self.0.shape {
            return Some((self.bounds(), dir, start));
        }
        let verbs = self.verbs();
        let points = match verbs {
            [Verb::Move, Verb::Line, Verb::Line, Verb::Line, Verb::Close] => self.points(),
            // A rectangle may spell out its closing edge.
            [Verb::Move, Verb::Line, Verb::Line, Verb::Line, Verb::Line, Verb::Close]
                if self.points()[4] == self.points()[0] =>
            {
                &self.points()[..4]
            }
            _ => return None,
        };
        let bounds = self.bounds();
        shapes::orientations(4).find_map(|(dir, start)| {
            let layout = shapes::rect_contour(&bounds, dir, start);
            (layout.points.as_slice() == points).then_some((bounds, dir, start))
        })
    }

    /// The bounds, direction and start point if the path is an oval contour.
    pub fn as_oval(&self) -> Option<(Rect, PathDirection, usize)> {
        if let ShapeTag::Oval { dir, start } = self.0.shape {
            return Some((self.bounds(), dir, start));
        }
        if self.verbs().len() != 6 || self.segment_mask() != SegmentMask::CONIC {
            return None;
        }
        let bounds = self.bounds();
        shapes::orientations(4).find_map(|(dir, start)| {
            let layout = shapes::oval_contour(&bounds, dir, start);
            shapes::matches(&layout, self.verbs(), self.points(), self.conic_weights())
                .then_some((bounds, dir, start))
        })
    }

    /// The rounded rectangle, direction and start point if the path is a rounded rectangle
    /// contour with at least one rounded and one non-oval corner.
    pub fn as_rrect(&self) -> Option<(RRect, PathDirection, usize)> {
        if let ShapeTag::RRect { rrect, dir, start } = self.0.shape {
            return Some((rrect, dir, start));
        }
        let conic_first = self.verbs().len() == 9;
        if !(conic_first || self.verbs().len() == 10)
            || self.segment_mask() != SegmentMask::LINE.union(SegmentMask::CONIC)
            || self.conic_weights().len() != 4
        {
            return None;
        }
        let bounds = self.bounds();
        let mut radii = [Point::ZERO; 4];
        let mut prev = Point::ZERO;
        for el in self.iter() {
            match el {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => prev = p,
                PathElement::ConicTo(corner, end, _) => {
                    let index = corner_index(&bounds, corner)?;
                    radii[index] = Point::new(
                        (prev.x - corner.x).abs().max((end.x - corner.x).abs()),
                        (prev.y - corner.y).abs().max((end.y - corner.y).abs()),
                    );
                    prev = end;
                }
                _ => {}
            }
        }
        let rrect = RRect::new(bounds, radii);
        if rrect.kind() != RRectKind::Complex {
            return None;
        }
        shapes::orientations(8)
            .filter(|(dir, start)| {
                (((start & 1) == 1) == (*dir == PathDirection::Cw)) == conic_first
            })
            .find_map(|(dir, start)| {
                let layout = shapes::rrect_contour(&rrect, dir, start);
                shapes::matches(&layout, self.verbs(), self.points(), self.conic_weights())
                    .then_some((rrect, dir, start))
            })
    }

    /// The geometry mapped by `matrix`.
    ///
    /// The identity returns this handle. Perspective matrices map points with a divide, which
    /// is only exact for lines; curved paths under perspective should go through
    /// [`pre_chop`](crate::chop::pre_chop) first. Fails when a point maps behind the viewer or
    /// to a non-finite position.
    pub fn try_make_transform(&self, matrix: &Matrix) -> Result<Self, PathError> {
        if matrix.is_identity() {
            return Ok(self.clone());
        }
        let mut points = Vec::with_capacity(self.points().len());
        for p in self.points() {
            if matrix.has_perspective() && matrix.map_homogeneous(*p)[2] <= 0. {
                return Err(PathError::BehindViewer);
            }
            let mapped = matrix.map_point(*p);
            if !mapped.is_finite() {
                warn!("A transformed path contains non-finite coordinates, ignoring it.");
                return Err(PathError::NonFinite);
            }
            points.push(mapped);
        }
        Ok(Self::new_unchecked(
            self.verbs().to_vec(),
            points,
            self.conic_weights().to_vec(),
            ShapeTag::General,
        ))
    }

    /// Like [`PathData::try_make_transform`], discarding the reason for a failure.
    pub fn make_transform(&self, matrix: &Matrix) -> Option<Self> {
        self.try_make_transform(matrix).ok()
    }

    /// The geometry moved by `(dx, dy)`.
    pub fn make_offset(&self, dx: f32, dy: f32) -> Option<Self> {
        self.make_transform(&Matrix::translate(dx, dy))
    }

    /// The number of times the convexity was actually computed.
    #[cfg(test)]
    pub(crate) fn convexity_computations(&self) -> u32 {
        self.0.convexity_computations.load(Ordering::Relaxed)
    }
}

impl PartialEq for PathData {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.verbs() == other.verbs()
                && self.points() == other.points()
                && self.conic_weights() == other.conic_weights())
    }
}

fn corner_index(bounds: &Rect, corner: Point) -> Option<usize> {
    use crate::rrect::corner::*;
    match (
        corner.x == bounds.left,
        corner.x == bounds.right,
        corner.y == bounds.top,
        corner.y == bounds.bottom,
    ) {
        (true, _, true, _) => Some(UPPER_LEFT),
        (_, true, true, _) => Some(UPPER_RIGHT),
        (_, true, _, true) => Some(LOWER_RIGHT),
        (true, _, _, true) => Some(LOWER_LEFT),
        _ => None,
    }
}

fn validate(verbs: &[Verb], points: &[Point], conic_weights: &[f32]) -> Result<(), PathError> {
    #[derive(PartialEq)]
    enum State {
        NeedMove,
        InContour,
        Closed,
    }
    let mut state = State::NeedMove;
    let mut point_count = 0;
    let mut conic_count = 0;
    for (index, verb) in verbs.iter().enumerate() {
        state = match (state, verb) {
            (_, Verb::Move) => State::InContour,
            (State::InContour, Verb::Close) => State::Closed,
            (State::InContour, _) => State::InContour,
            _ => return Err(PathError::InvalidVerbSequence { index }),
        };
        point_count += verb.point_count();
        conic_count += usize::from(*verb == Verb::Conic);
    }
    if point_count != points.len() {
        return Err(PathError::PointCountMismatch {
            expected: point_count,
            actual: points.len(),
        });
    }
    if conic_count != conic_weights.len() {
        return Err(PathError::ConicWeightCountMismatch {
            expected: conic_count,
            actual: conic_weights.len(),
        });
    }
    if !points.iter().all(|p| p.is_finite()) || !conic_weights.iter().all(|w| w.is_finite()) {
        return Err(PathError::NonFinite);
    }
    if conic_weights.iter().any(|w| *w <= 0.) {
        return Err(PathError::InvalidConicWeight);
    }
    Ok(())
}

/// One element of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathElement {
    /// Start a new contour.
    MoveTo(Point),
    /// A line to the point.
    LineTo(Point),
    /// A quadratic Bézier with a control point and an end point.
    QuadTo(Point, Point),
    /// A conic with a control point, an end point and a weight.
    ConicTo(Point, Point, f32),
    /// A cubic Bézier with two control points and an end point.
    CubicTo(Point, Point, Point),
    /// Close the contour.
    Close,
}

/// An iterator over the elements of a [`PathData`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    verbs: core::slice::Iter<'a, Verb>,
    points: &'a [Point],
    weights: &'a [f32],
}

impl Iterator for Iter<'_> {
    type Item = PathElement;

    fn next(&mut self) -> Option<PathElement> {
        let verb = *self.verbs.next()?;
        let (pts, rest) = self.points.split_at(verb.point_count());
        self.points = rest;
        Some(match verb {
            Verb::Move => PathElement::MoveTo(pts[0]),
            Verb::Line => PathElement::LineTo(pts[0]),
            Verb::Quad => PathElement::QuadTo(pts[0], pts[1]),
            Verb::Conic => {
                let (w, rest) = self.weights.split_first()?;
                self.weights = rest;
                PathElement::ConicTo(pts[0], pts[1], *w)
            }
            Verb::Cubic => PathElement::CubicTo(pts[0], pts[1], pts[2]),
            Verb::Close => PathElement::Close,
        })
    }
}

/// Convexity of the control polygon.
///
/// A path is convex when it has at most one contour with segments, all turns along its control
/// polygon (including the implicit closing edge) have the same sign, no edge doubles back on
/// the previous one and each coordinate changes direction at most twice around the loop.
fn compute_convexity(path: &PathData) -> Convexity {
    let mut contours = 0;
    let mut polygon: SmallVec<[Point; 16]> = SmallVec::new();
    let mut pending_move = None;
    for el in path.iter() {
        match el {
            PathElement::MoveTo(p) => pending_move = Some(p),
            PathElement::Close => {}
            PathElement::LineTo(p)
            | PathElement::QuadTo(_, p)
            | PathElement::ConicTo(_, p, _)
            | PathElement::CubicTo(_, _, p) => {
                if let Some(start) = pending_move.take() {
                    contours += 1;
                    if contours > 1 {
                        return Convexity::Concave;
                    }
                    polygon.push(start);
                }
                match el {
                    PathElement::QuadTo(c, _) | PathElement::ConicTo(c, _, _) => polygon.push(c),
                    PathElement::CubicTo(c1, c2, _) => polygon.extend([c1, c2]),
                    _ => {}
                }
                polygon.push(p);
            }
        }
    }
    polygon.dedup();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() < 3 {
        return Convexity::Convex;
    }

    let edges: SmallVec<[(f64, f64); 16]> = (0..polygon.len())
        .map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            (b.x as f64 - a.x as f64, b.y as f64 - a.y as f64)
        })
        .collect();

    let mut turn_sign = 0.0_f64;
    let mut reversals = false;
    for i in 0..edges.len() {
        let (ax, ay) = edges[i];
        let (bx, by) = edges[(i + 1) % edges.len()];
        let cross = ax * by - ay * bx;
        if cross == 0. {
            if ax * bx + ay * by < 0. {
                reversals = true;
            }
            continue;
        }
        if turn_sign == 0. {
            turn_sign = cross.signum();
        } else if cross.signum() != turn_sign {
            return Convexity::Concave;
        }
    }
    if turn_sign == 0. {
        // All points are collinear.
        return Convexity::Convex;
    }
    if reversals {
        return Convexity::Concave;
    }
    let direction_changes = |component: fn(&(f64, f64)) -> f64| {
        let signs: SmallVec<[f64; 16]> = edges
            .iter()
            .map(component)
            .filter(|v| *v != 0.)
            .map(f64::signum)
            .collect();
        (0..signs.len())
            .filter(|i| signs[*i] != signs[(i + 1) % signs.len()])
            .count()
    };
    if direction_changes(|e| e.0) > 2 || direction_changes(|e| e.1) > 2 {
        return Convexity::Concave;
    }
    Convexity::Convex
}
