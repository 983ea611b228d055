// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wang's formula: the number of uniform parametric segments needed to flatten a curve.
//!
//! Given a curve of degree `n` and a flatness tolerance `tol` (in device pixels), uniformly
//! subdividing it into
//!
//! ```text
//!     ceil(sqrt(n * (n - 1) / 8 * max |P[i-1] - 2 P[i] + P[i+1]| / tol))
//! ```
//!
//! segments keeps every segment within `tol` of the curve. Here the tolerance is expressed as a
//! `precision`, which is `1 / tol`. The functions come in `pow4` (or `pow2`) forms that skip the
//! roots, which lets callers compare against a budget without taking them.
//!
//! The CPU scan converter, the GPU patch evaluation and the pre-chop pass all count segments
//! with these functions, so a curve split at a chop boundary flattens the same way on both
//! sides.

use crate::geometry::Point;
use crate::matrix::Matrix;

/// Four segments per pixel of deviation, i.e. a tolerance of a quarter pixel.
pub const DEFAULT_PRECISION: f32 = 4.;

/// The most segments a single curve is ever split into when it is tessellated.
pub const DEFAULT_MAX_SEGMENTS: u32 = 1024;

// The curve degree term (n * (n - 1) / 8) squared, for quadratics:
//
//    (2 * (2 - 1) / 8)^2
//
fn length_term_pow2_quad(precision: f32) -> f32 {
    let t = 0.25 * precision;
    t * t
}

// The same term for cubics:
//
//    (3 * (3 - 1) / 8)^2
//
fn length_term_pow2_cubic(precision: f32) -> f32 {
    let t = 0.75 * precision;
    t * t
}

/// The fourth root.
pub fn root4(x: f32) -> f32 {
    x.sqrt().sqrt()
}

/// `ceil(log2(x))`, with zero for values at or below one.
pub fn nextlog2(x: f32) -> u32 {
    if x <= 1. {
        0
    } else {
        x.log2().ceil() as u32
    }
}

/// The fourth power of the segment count for a quadratic, with its difference vectors mapped
/// through the linear part of `xform`.
pub fn quadratic_pow4(precision: f32, p: &[Point; 3], xform: &Matrix) -> f32 {
    let v = xform.map_vector(p[0] - p[1] * 2. + p[2]);
    v.length_squared() * length_term_pow2_quad(precision)
}

/// The segment count for a quadratic, not rounded.
pub fn quadratic(precision: f32, p: &[Point; 3], xform: &Matrix) -> f32 {
    root4(quadratic_pow4(precision, p, xform))
}

/// The fourth power of the segment count for a cubic, with its difference vectors mapped
/// through the linear part of `xform`.
pub fn cubic_pow4(precision: f32, p: &[Point; 4], xform: &Matrix) -> f32 {
    let v1 = xform.map_vector(p[0] - p[1] * 2. + p[2]);
    let v2 = xform.map_vector(p[1] - p[2] * 2. + p[3]);
    v1.length_squared().max(v2.length_squared()) * length_term_pow2_cubic(precision)
}

/// The segment count for a cubic, not rounded.
pub fn cubic(precision: f32, p: &[Point; 4], xform: &Matrix) -> f32 {
    root4(cubic_pow4(precision, p, xform))
}

/// The fourth power of the segment count that suffices for any cubic whose device space
/// bounding box is `width` by `height`.
pub fn worst_case_cubic_pow4(precision: f32, width: f32, height: f32) -> f32 {
    4. * length_term_pow2_cubic(precision) * (width * width + height * height)
}

/// The segment count that suffices for any cubic inside a `width` by `height` box.
pub fn worst_case_cubic(precision: f32, width: f32, height: f32) -> f32 {
    root4(worst_case_cubic_pow4(precision, width, height))
}

/// The square of the segment count for a conic.
///
/// Conics are rational, so the bound of the polynomial curves does not apply directly. The
/// points are first centred on their bounding box, which keeps the estimate independent of
/// translation, then the bound uses both the difference vector and the weight deviation.
pub fn conic_pow2(precision: f32, p: &[Point; 3], w: f32, xform: &Matrix) -> f32 {
    let p = p.map(|q| xform.map_vector(q));
    let min = Point::new(
        p[0].x.min(p[1].x).min(p[2].x),
        p[0].y.min(p[1].y).min(p[2].y),
    );
    let max = Point::new(
        p[0].x.max(p[1].x).max(p[2].x),
        p[0].y.max(p[1].y).max(p[2].y),
    );
    let center = min.midpoint(max);
    let p = p.map(|q| q - center);
    let max_len = p
        .iter()
        .map(|q| q.length_squared())
        .fold(0., f32::max)
        .sqrt();
    let dp = p[0] - p[1] * (2. * w) + p[2];
    let dw = (2. - 2. * w).abs();
    let rp_minus_1 = (max_len * precision - 1.).max(0.);
    let numer = dp.length() * precision + rp_minus_1 * dw;
    let denom = 4. * w.min(1.);
    numer / denom
}

/// The segment count for a conic, not rounded.
pub fn conic(precision: f32, p: &[Point; 3], w: f32, xform: &Matrix) -> f32 {
    conic_pow2(precision, p, w, xform).sqrt()
}
