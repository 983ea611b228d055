// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A 3x3 transformation matrix with optional perspective.

use crate::geometry::{Point, Rect};
use crate::kurbo;

/// A 3x3 matrix, stored in row-major order.
///
/// A point `(x, y)` maps to `((sx * x + kx * y + tx) / w, (ky * x + sy * y + ty) / w)` where
/// `w = p0 * x + p1 * y + p2`. For affine matrices the last row is `[0, 0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    m: [f32; 9],
}

const SX: usize = 0;
const KX: usize = 1;
const TX: usize = 2;
const KY: usize = 3;
const SY: usize = 4;
const TY: usize = 5;
const P0: usize = 6;
const P1: usize = 7;
const P2: usize = 8;

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        m: [1., 0., 0., 0., 1., 0., 0., 0., 1.],
    };

    /// Create an affine matrix.
    pub const fn from_row(sx: f32, kx: f32, tx: f32, ky: f32, sy: f32, ty: f32) -> Self {
        Self {
            m: [sx, kx, tx, ky, sy, ty, 0., 0., 1.],
        }
    }

    /// Create a matrix from all nine entries, in row-major order.
    pub const fn from_rows(m: [f32; 9]) -> Self {
        Self { m }
    }

    /// A translation.
    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self::from_row(1., 0., dx, 0., 1., dy)
    }

    /// A scale about the origin.
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::from_row(sx, 0., 0., 0., sy, 0.)
    }

    /// A rotation about the origin, in radians.
    pub fn rotate(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_row(c, -s, 0., s, c, 0.)
    }

    /// The nine entries, in row-major order.
    pub fn as_rows(&self) -> [f32; 9] {
        self.m
    }

    /// The horizontal scale factor.
    pub fn scale_x(&self) -> f32 {
        self.m[SX]
    }

    /// The vertical scale factor.
    pub fn scale_y(&self) -> f32 {
        self.m[SY]
    }

    /// The horizontal skew factor.
    pub fn skew_x(&self) -> f32 {
        self.m[KX]
    }

    /// The vertical skew factor.
    pub fn skew_y(&self) -> f32 {
        self.m[KY]
    }

    /// The horizontal translation.
    pub fn translate_x(&self) -> f32 {
        self.m[TX]
    }

    /// The vertical translation.
    pub fn translate_y(&self) -> f32 {
        self.m[TY]
    }

    /// The upper-left 2x2 sub-matrix as `[sx, kx, ky, sy]`.
    pub fn linear_part(&self) -> [f32; 4] {
        [self.m[SX], self.m[KX], self.m[KY], self.m[SY]]
    }

    /// Whether this is exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether the last row differs from `[0, 0, 1]`.
    pub fn has_perspective(&self) -> bool {
        self.m[P0] != 0. || self.m[P1] != 0. || self.m[P2] != 1.
    }

    /// Whether the matrix only translates.
    pub fn is_translate(&self) -> bool {
        self.is_scale_translate() && self.m[SX] == 1. && self.m[SY] == 1.
    }

    /// Whether the matrix only scales and translates.
    pub fn is_scale_translate(&self) -> bool {
        !self.has_perspective() && self.m[KX] == 0. && self.m[KY] == 0.
    }

    /// Whether every axis-aligned rectangle maps to an axis-aligned rectangle.
    pub fn rect_stays_rect(&self) -> bool {
        if self.has_perspective() {
            return false;
        }
        let [sx, kx, ky, sy] = self.linear_part();
        (kx == 0. && ky == 0. && sx != 0. && sy != 0.)
            || (sx == 0. && sy == 0. && kx != 0. && ky != 0.)
    }

    /// Whether all entries are finite.
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// The matrix that applies `other` first and then `self`.
    pub fn concat(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut m = [0.; 9];
        for row in 0..3 {
            for col in 0..3 {
                m[row * 3 + col] =
                    a[row * 3] * b[col] + a[row * 3 + 1] * b[3 + col] + a[row * 3 + 2] * b[6 + col];
            }
        }
        Self { m }
    }

    /// The same matrix followed by a translation.
    pub fn post_translate(&self, dx: f32, dy: f32) -> Self {
        Self::translate(dx, dy).concat(self)
    }

    /// The inverse matrix, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        let m = &self.m;
        let c00 = m[4] * m[8] - m[5] * m[7];
        let c01 = m[5] * m[6] - m[3] * m[8];
        let c02 = m[3] * m[7] - m[4] * m[6];
        let det = m[0] * c00 + m[1] * c01 + m[2] * c02;
        if det == 0. || !det.is_finite() {
            return None;
        }
        let inv_det = 1. / det;
        let inv = Self {
            m: [
                c00 * inv_det,
                (m[2] * m[7] - m[1] * m[8]) * inv_det,
                (m[1] * m[5] - m[2] * m[4]) * inv_det,
                c01 * inv_det,
                (m[0] * m[8] - m[2] * m[6]) * inv_det,
                (m[2] * m[3] - m[0] * m[5]) * inv_det,
                c02 * inv_det,
                (m[1] * m[6] - m[0] * m[7]) * inv_det,
                (m[0] * m[4] - m[1] * m[3]) * inv_det,
            ],
        };
        inv.is_finite().then_some(inv)
    }

    /// Map a point, including the perspective divide.
    pub fn map_point(&self, p: Point) -> Point {
        if !self.has_perspective() {
            return self.map_point_affine(p);
        }
        let [x, y, w] = self.map_homogeneous(p);
        let inv_w = 1. / w;
        Point::new(x * inv_w, y * inv_w)
    }

    /// Map a point with the affine part only.
    pub fn map_point_affine(&self, p: Point) -> Point {
        let m = &self.m;
        Point::new(
            m[SX] * p.x + m[KX] * p.y + m[TX],
            m[KY] * p.x + m[SY] * p.y + m[TY],
        )
    }

    /// Map a point to homogeneous coordinates without dividing by `w`.
    pub fn map_homogeneous(&self, p: Point) -> [f32; 3] {
        let m = &self.m;
        [
            m[SX] * p.x + m[KX] * p.y + m[TX],
            m[KY] * p.x + m[SY] * p.y + m[TY],
            m[P0] * p.x + m[P1] * p.y + m[P2],
        ]
    }

    /// Map a vector through the 2x2 linear part, ignoring translation and perspective.
    pub fn map_vector(&self, v: Point) -> Point {
        let m = &self.m;
        Point::new(m[SX] * v.x + m[KX] * v.y, m[KY] * v.x + m[SY] * v.y)
    }

    /// The bounds of the four mapped corners of `r`.
    pub fn map_rect(&self, r: &Rect) -> Rect {
        if self.is_identity() {
            return *r;
        }
        let corners = r.corners().map(|p| self.map_point(p));
        Rect::from_points(&corners)
    }

    /// The smallest and largest factor by which the linear part scales a unit vector.
    ///
    /// Returns `None` for perspective matrices, which have no single scale.
    pub fn min_max_scales(&self) -> Option<(f32, f32)> {
        if self.has_perspective() {
            return None;
        }
        let [a, b, c, d] = self.linear_part();
        let half_sum = 0.5 * (a * a + b * b + c * c + d * d);
        let det = a * d - b * c;
        let disc = (half_sum * half_sum - det * det).max(0.).sqrt();
        let max = (half_sum + disc).sqrt();
        let min = (half_sum - disc).max(0.).sqrt();
        (min.is_finite() && max.is_finite()).then_some((min, max))
    }

    /// The largest scale factor of the linear part.
    pub fn max_scale(&self) -> Option<f32> {
        self.min_max_scales().map(|(_, max)| max)
    }
}

impl From<kurbo::Affine> for Matrix {
    fn from(a: kurbo::Affine) -> Self {
        let [a, b, c, d, e, f] = a.as_coeffs();
        Self::from_row(a as f32, c as f32, e as f32, b as f32, d as f32, f as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_applies_right_first() {
        let m = Matrix::translate(10., 0.).concat(&Matrix::scale(2., 2.));
        assert_eq!(m.map_point(Point::new(1., 1.)), Point::new(12., 2.));
    }

    #[test]
    fn invert_round_trips() {
        let m = Matrix::from_row(2., 1., 3., 0.5, 4., -2.);
        let inv = m.invert().unwrap();
        let p = inv.map_point(m.map_point(Point::new(3., 7.)));
        assert!((p.x - 3.).abs() < 1e-4 && (p.y - 7.).abs() < 1e-4);
        assert!(Matrix::scale(0., 1.).invert().is_none());
    }

    #[test]
    fn perspective_divides() {
        let m = Matrix::from_rows([1., 0., 0., 0., 1., 0., 0., 0., 2.]);
        assert!(m.has_perspective());
        assert_eq!(m.map_point(Point::new(4., 6.)), Point::new(2., 3.));
        assert_eq!(m.min_max_scales(), None);
    }

    #[test]
    fn scales_of_rotation_are_unit() {
        let (min, max) = Matrix::rotate(0.7)
            .concat(&Matrix::scale(3., 3.))
            .min_max_scales()
            .unwrap();
        assert!((min - 3.).abs() < 1e-4 && (max - 3.).abs() < 1e-4);
    }

    #[test]
    fn classification() {
        assert!(Matrix::scale(2., 3.).rect_stays_rect());
        assert!(Matrix::from_row(0., 1., 0., 1., 0., 0.).rect_stays_rect());
        assert!(!Matrix::rotate(0.3).rect_stays_rect());
        assert!(Matrix::translate(3., 4.).is_translate());
    }

    #[test]
    fn from_kurbo_affine() {
        let a = kurbo::Affine::new([1., 2., 3., 4., 5., 6.]);
        let m = Matrix::from(a);
        let p = kurbo::Point::new(1., 1.);
        let expected = a * p;
        assert_eq!(m.map_point(Point::new(1., 1.)), Point::from(expected));
    }
}
