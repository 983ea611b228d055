// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sampling rule for aliased rasterisation.
//!
//! A pixel `(x, y)` is sampled at its center `(x + 0.5, y + 0.5)`, nudged by a symbolic
//! perturbation to `(x + 0.5 - ε, y + 0.5 + ε²)`. The perturbed point never lies on an edge or
//! at the height of a vertex, so every sample is unambiguously inside or outside every edge, and
//! a sample on an edge shared by two triangles belongs to exactly one of them.
//!
//! The scan converter (which counts edge crossings) and the triangle rasteriser of the reference
//! replay (which tests edge functions) both decide coverage with these predicates, which makes
//! them agree pixel for pixel.

use crate::geometry::Point;

/// The sample position of a pixel, before perturbation.
pub fn sample_center(x: i32, y: i32) -> (f64, f64) {
    (x as f64 + 0.5, y as f64 + 0.5)
}

/// The sign of the edge function of the directed edge `a -> b` at the perturbed sample of pixel
/// `(x, y)`.
///
/// Positive means the sample is on the side that makes a clockwise (on screen, with y pointing
/// down) triangle contain it. Zero only for a degenerate edge with `a == b`.
pub fn orient(a: Point, b: Point, x: i32, y: i32) -> i8 {
    // Evaluate every edge in a canonical order so that `orient(a, b)` is exactly
    // `-orient(b, a)` even after rounding.
    let swapped = (b.y, b.x) < (a.y, a.x);
    let (a, b) = if swapped { (b, a) } else { (a, b) };
    let (sx, sy) = sample_center(x, y);
    let dx = b.x as f64 - a.x as f64;
    let dy = b.y as f64 - a.y as f64;
    let e = dx * (sy - a.y as f64) - dy * (sx - a.x as f64);
    let sign = if e != 0. {
        e.signum()
    } else if dy != 0. {
        dy.signum()
    } else {
        dx.signum()
    } as i8;
    if swapped { -sign } else { sign }
}

/// Whether the edge between `a` and `b` crosses the perturbed sample row `y`.
///
/// Horizontal edges never do.
pub fn spans_row(a: Point, b: Point, y: i32) -> bool {
    let sy = y as f64 + 0.5;
    let (top, bottom) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };
    (top as f64) <= sy && sy < bottom as f64
}

/// Whether the edge from `top` to `bottom` (with `top.y < bottom.y`) passes to the left of the
/// perturbed sample of pixel `(x, y)`.
pub fn edge_is_left(top: Point, bottom: Point, x: i32, y: i32) -> bool {
    orient(top, bottom, x, y) < 0
}

const PIXEL_LIMIT: f64 = (1 << 30) as f64;

/// The leftmost pixel in row `y` whose sample lies to the right of the edge from `top` to
/// `bottom`. The edge must span the row.
pub fn first_pixel_right_of(top: Point, bottom: Point, y: i32) -> i32 {
    let sy = y as f64 + 0.5;
    let (tx, ty) = (top.x as f64, top.y as f64);
    let (bx, by) = (bottom.x as f64, bottom.y as f64);
    let cross_x = tx + (sy - ty) * (bx - tx) / (by - ty);
    let mut x = (cross_x - 0.5).ceil().clamp(-PIXEL_LIMIT, PIXEL_LIMIT) as i32;
    // The interpolated crossing can be off by one; the exact predicate settles it.
    for _ in 0..4 {
        if edge_is_left(top, bottom, x - 1, y) {
            x -= 1;
        } else if !edge_is_left(top, bottom, x, y) {
            x += 1;
        } else {
            break;
        }
    }
    x
}

/// The signed coverage of pixel `(x, y)` by the triangle `a, b, c`: `1` for a clockwise
/// triangle that contains the sample, `-1` for a counter-clockwise one, `0` otherwise.
pub fn triangle_winding(a: Point, b: Point, c: Point, x: i32, y: i32) -> i32 {
    let o1 = orient(a, b, x, y);
    let o2 = orient(b, c, x, y);
    let o3 = orient(c, a, x, y);
    if o1 > 0 && o2 > 0 && o3 > 0 {
        1
    } else if o1 < 0 && o2 < 0 && o3 < 0 {
        -1
    } else {
        0
    }
}
