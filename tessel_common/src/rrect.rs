// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rounded rectangles.

use crate::geometry::{Point, Rect};

/// Corner indices into [`RRect::radii`].
pub mod corner {
    /// Upper left.
    pub const UPPER_LEFT: usize = 0;
    /// Upper right.
    pub const UPPER_RIGHT: usize = 1;
    /// Lower right.
    pub const LOWER_RIGHT: usize = 2;
    /// Lower left.
    pub const LOWER_LEFT: usize = 3;
}

/// The degenerate forms a rounded rectangle can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RRectKind {
    /// Zero width or height.
    Empty,
    /// All radii are zero.
    Rect,
    /// The radii span the whole rectangle.
    Oval,
    /// Anything else.
    Complex,
}

/// A rectangle with an elliptical radius at each corner.
///
/// Radii are normalised on construction: negative or non-finite radii become zero, a corner
/// with one zero component becomes square, and radii that would overlap along an edge are
/// scaled down uniformly until they fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RRect {
    rect: Rect,
    radii: [Point; 4],
}

impl RRect {
    /// Create a rounded rectangle with per-corner radii, in [`corner`] order.
    pub fn new(rect: Rect, radii: [Point; 4]) -> Self {
        let rect = rect.sorted();
        let mut radii = radii.map(|r| {
            let x = if r.x.is_finite() { r.x.max(0.) } else { 0. };
            let y = if r.y.is_finite() { r.y.max(0.) } else { 0. };
            if x == 0. || y == 0. {
                Point::ZERO
            } else {
                Point::new(x, y)
            }
        });
        let w = rect.width();
        let h = rect.height();
        let mut scale = 1.0_f32;
        let mut fit = |limit: f32, a: f32, b: f32| {
            if a + b > limit && a + b > 0. {
                scale = scale.min(limit / (a + b));
            }
        };
        fit(w, radii[0].x, radii[1].x);
        fit(h, radii[1].y, radii[2].y);
        fit(w, radii[2].x, radii[3].x);
        fit(h, radii[3].y, radii[0].y);
        if scale < 1. {
            for r in &mut radii {
                *r = *r * scale;
            }
        }
        Self { rect, radii }
    }

    /// Create a rounded rectangle with the same radii at every corner.
    pub fn from_rect_xy(rect: Rect, rx: f32, ry: f32) -> Self {
        Self::new(rect, [Point::new(rx, ry); 4])
    }

    /// Create the oval inscribed in `rect`.
    pub fn oval(rect: Rect) -> Self {
        let rect = rect.sorted();
        Self::from_rect_xy(rect, rect.width() * 0.5, rect.height() * 0.5)
    }

    /// The bounding rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The radii of each corner, in [`corner`] order.
    pub fn radii(&self) -> [Point; 4] {
        self.radii
    }

    /// Classify the rounded rectangle.
    pub fn kind(&self) -> RRectKind {
        if self.rect.is_empty() {
            return RRectKind::Empty;
        }
        if self.radii.iter().all(|r| *r == Point::ZERO) {
            return RRectKind::Rect;
        }
        let half = Point::new(self.rect.width() * 0.5, self.rect.height() * 0.5);
        if self.radii.iter().all(|r| *r == half) {
            return RRectKind::Oval;
        }
        RRectKind::Complex
    }
}
