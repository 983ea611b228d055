// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic geometry primitives.

use crate::kurbo;
use bytemuck::{Pod, Zeroable};

/// A point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    /// The x coordinate of the point.
    pub x: f32,
    /// The y coordinate of the point.
    pub y: f32,
}

impl Point {
    /// The point `(0, 0)`.
    pub const ZERO: Self = Self::new(0., 0.);

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Dot product, treating both points as vectors.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// The z component of the cross product, treating both points as vectors.
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Length of the vector from the origin to this point.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Squared length.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Linear interpolation, exact at `t == 0` and `t == 1`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// The midpoint between `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// The vector rotated by 90 degrees, pointing to the right in a y-down coordinate system.
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// The vector scaled to unit length, or `None` if it has zero length.
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len > 0. && len.is_finite() {
            Some(self * (1. / len))
        } else {
            None
        }
    }
}

impl core::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl core::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl core::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl core::ops::Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// The winding direction of a contour built by one of the shape factories.
///
/// The coordinate system is y-down, so clockwise means "right along the top edge".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PathDirection {
    /// Clockwise.
    #[default]
    Cw,
    /// Counter-clockwise.
    Ccw,
}

impl PathDirection {
    /// The other direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Cw => Self::Ccw,
            Self::Ccw => Self::Cw,
        }
    }
}

/// An axis-aligned rectangle with floating point edges.
///
/// A rectangle is empty when `left >= right` or `top >= bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// The left edge.
    pub left: f32,
    /// The top edge.
    pub top: f32,
    /// The right edge.
    pub right: f32,
    /// The bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self::from_ltrb(0., 0., 0., 0.);

    /// Create a rectangle from its edges.
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from its origin and size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_ltrb(x, y, x + width, y + height)
    }

    /// The tight bounds of a set of points, or [`Rect::EMPTY`] for an empty set.
    pub fn from_points(points: &[Point]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::EMPTY;
        };
        let mut r = Self::from_ltrb(first.x, first.y, first.x, first.y);
        for p in rest {
            r.left = r.left.min(p.x);
            r.top = r.top.min(p.y);
            r.right = r.right.max(p.x);
            r.bottom = r.bottom.max(p.y);
        }
        r
    }

    /// The width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// The height of the rectangle.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// The center of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// The area covered by the rectangle, zero when empty.
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            0.
        } else {
            self.width() * self.height()
        }
    }

    /// Whether the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        // Written this way so that NaN edges count as empty.
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Whether all edges are finite.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Whether the rectangle has edges sorted so that `left <= right` and `top <= bottom`.
    pub fn is_sorted(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// The rectangle with its edges swapped where needed to be sorted.
    pub fn sorted(&self) -> Self {
        Self::from_ltrb(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    /// The overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let r = Self::from_ltrb(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Whether the two rectangles overlap or touch. Degenerate rectangles are allowed.
    pub fn touches(&self, other: &Self) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// The smallest rectangle containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_ltrb(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Whether `p` lies inside, with the right and bottom edges excluded.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Move the rectangle.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::from_ltrb(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Grow the rectangle by `d` on every side.
    pub fn outset(&self, d: f32) -> Self {
        Self::from_ltrb(self.left - d, self.top - d, self.right + d, self.bottom + d)
    }

    /// The smallest integer rectangle containing this one.
    pub fn round_out(&self) -> IntRect {
        IntRect::from_ltrb(
            saturate_i32(self.left.floor()),
            saturate_i32(self.top.floor()),
            saturate_i32(self.right.ceil()),
            saturate_i32(self.bottom.ceil()),
        )
    }

    /// The four corners, clockwise starting from the top left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }
}

impl From<kurbo::Rect> for Rect {
    fn from(r: kurbo::Rect) -> Self {
        Self::from_ltrb(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
    }
}

fn saturate_i32(v: f32) -> i32 {
    // `as` saturates and maps NaN to zero.
    v as i32
}

/// An axis-aligned rectangle with integer edges, used for device bounds, clips and scissors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// The left edge.
    pub left: i32,
    /// The top edge.
    pub top: i32,
    /// The right edge (exclusive).
    pub right: i32,
    /// The bottom edge (exclusive).
    pub bottom: i32,
}

impl IntRect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self::from_ltrb(0, 0, 0, 0);

    /// Create a rectangle from its edges.
    pub const fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from its origin and size.
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::from_ltrb(x, y, x + width, y + height)
    }

    /// The width, zero when empty.
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// The height, zero when empty.
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    /// The number of pixels covered.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// The overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let r = Self::from_ltrb(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Whether `other` lies completely inside this rectangle.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Move the rectangle, or `None` if an edge would leave the `i32` range.
    pub fn checked_offset(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::from_ltrb(
            self.left.checked_add(dx)?,
            self.top.checked_add(dy)?,
            self.right.checked_add(dx)?,
            self.bottom.checked_add(dy)?,
        ))
    }

    /// Convert to a floating point rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::from_ltrb(
            self.left as f32,
            self.top as f32,
            self.right as f32,
            self.bottom as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_of_points() {
        let r = Rect::from_points(&[Point::new(3., 4.), Point::new(-1., 7.), Point::new(2., -2.)]);
        assert_eq!(r, Rect::from_ltrb(-1., -2., 3., 7.));
        assert_eq!(Rect::from_points(&[]), Rect::EMPTY);
    }

    #[test]
    fn nan_rect_is_empty() {
        assert!(Rect::from_ltrb(0., 0., f32::NAN, 10.).is_empty());
    }

    #[test]
    fn round_out_covers_fractions() {
        let r = Rect::from_ltrb(0.5, -0.5, 10.25, 3.0).round_out();
        assert_eq!(r, IntRect::from_ltrb(0, -1, 11, 3));
    }

    #[test]
    fn int_rect_intersection() {
        let a = IntRect::from_xywh(0, 0, 10, 10);
        let b = IntRect::from_xywh(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(IntRect::from_ltrb(5, 5, 10, 10)));
        assert_eq!(a.intersect(&IntRect::from_xywh(10, 0, 5, 5)), None);
    }

    #[test]
    fn int_rect_offsets_stay_in_range() {
        let r = IntRect::from_ltrb(0, 0, 10, 10);
        assert_eq!(
            r.checked_offset(-3, 4),
            Some(IntRect::from_ltrb(-3, 4, 7, 14))
        );
        assert_eq!(r.checked_offset(i32::MAX - 5, 0), None);
        assert_eq!(
            r.checked_offset(0, i32::MIN),
            Some(IntRect::from_ltrb(0, i32::MIN, 10, i32::MIN + 10))
        );
    }
}
