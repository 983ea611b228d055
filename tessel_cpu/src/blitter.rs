// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sinks for coverage spans.

use tessel_common::color::PremulRgba8;
use tessel_common::geometry::IntRect;
use tessel_common::pixmap::{AlphaMask, Pixmap};

/// A sink for the spans produced by the scan converter.
///
/// Spans within one fill never overlap, and rows arrive in increasing order.
pub trait Blitter {
    /// Fully cover `width` pixels of row `y`, starting at `x`.
    fn blit_h(&mut self, x: i32, y: i32, width: u32);

    /// Cover the pixels of row `y` starting at `x` with one coverage value each.
    fn blit_anti_h(&mut self, x: i32, y: i32, coverage: &[u8]);

    /// Fully cover a rectangle.
    fn blit_rect(&mut self, x: i32, y: i32, width: u32, height: u32) {
        for row in 0..height as i32 {
            self.blit_h(x, y + row, width);
        }
    }
}

/// Writes coverage into an 8-bit mask covering a device space rectangle.
#[derive(Debug)]
pub struct MaskBlitter {
    bounds: IntRect,
    data: Vec<u8>,
}

impl MaskBlitter {
    /// A blank mask over `bounds`.
    ///
    /// # Panics
    ///
    /// Panics if `bounds` is wider or taller than `u16::MAX`.
    pub fn new(bounds: IntRect) -> Self {
        assert!(
            bounds.width() <= u32::from(u16::MAX) && bounds.height() <= u32::from(u16::MAX),
            "mask bounds must fit in 16 bits"
        );
        Self {
            bounds,
            data: vec![0; bounds.area() as usize],
        }
    }

    /// The device space rectangle covered by the mask.
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    /// Finish the mask.
    pub fn into_mask(self) -> AlphaMask {
        AlphaMask::from_parts(
            self.data,
            self.bounds.width() as u16,
            self.bounds.height() as u16,
        )
    }

    fn row(&mut self, x: i32, y: i32, len: usize) -> Option<(&mut [u8], usize)> {
        if y < self.bounds.top || y >= self.bounds.bottom {
            return None;
        }
        let start = x.max(self.bounds.left);
        let end = (x.saturating_add(len as i32)).min(self.bounds.right);
        if start >= end {
            return None;
        }
        let width = self.bounds.width() as usize;
        let row = (y - self.bounds.top) as usize * width;
        let lo = row + (start - self.bounds.left) as usize;
        let hi = row + (end - self.bounds.left) as usize;
        Some((&mut self.data[lo..hi], (start - x) as usize))
    }
}

impl Blitter for MaskBlitter {
    fn blit_h(&mut self, x: i32, y: i32, width: u32) {
        if let Some((row, _)) = self.row(x, y, width as usize) {
            row.fill(255);
        }
    }

    fn blit_anti_h(&mut self, x: i32, y: i32, coverage: &[u8]) {
        if let Some((row, skip)) = self.row(x, y, coverage.len()) {
            row.copy_from_slice(&coverage[skip..skip + row.len()]);
        }
    }
}

/// Composites a solid color over a pixmap.
#[derive(Debug)]
pub struct PixmapBlitter<'a> {
    pixmap: &'a mut Pixmap,
    color: PremulRgba8,
}

impl<'a> PixmapBlitter<'a> {
    /// Blend `color` into `pixmap`.
    pub fn new(pixmap: &'a mut Pixmap, color: PremulRgba8) -> Self {
        Self { pixmap, color }
    }
}

impl Blitter for PixmapBlitter<'_> {
    fn blit_h(&mut self, x: i32, y: i32, width: u32) {
        for i in 0..width as i32 {
            self.pixmap.blend_pixel(x + i, y, self.color, 255);
        }
    }

    fn blit_anti_h(&mut self, x: i32, y: i32, coverage: &[u8]) {
        for (i, &c) in coverage.iter().enumerate() {
            self.pixmap.blend_pixel(x + i as i32, y, self.color, c);
        }
    }
}
