// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers and the blend shared by all rasterisers.

use crate::color::PremulRgba8;
use std::sync::Arc;

/// A pixmap of premultiplied RGBA8 values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    /// Width of the pixmap in pixels.
    width: u16,
    /// Height of the pixmap in pixels.
    height: u16,
    /// Buffer of the pixmap in RGBA8 format.
    buf: Vec<PremulRgba8>,
}

impl Pixmap {
    /// Create a new pixmap with the given width and height in pixels.
    ///
    /// All pixels are initialized to transparent black.
    pub fn new(width: u16, height: u16) -> Self {
        let buf = vec![PremulRgba8::from_u32(0); width as usize * height as usize];
        Self { width, height, buf }
    }

    /// Return the width of the pixmap.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Return the height of the pixmap.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns a reference to the underlying data as premultiplied RGBA8.
    ///
    /// The pixels are in row-major order.
    pub fn data(&self) -> &[PremulRgba8] {
        &self.buf
    }

    /// Returns a mutable reference to the underlying data as premultiplied RGBA8.
    pub fn data_mut(&mut self) -> &mut [PremulRgba8] {
        &mut self.buf
    }

    /// Sample a pixel from the pixmap.
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline(always)]
    pub fn sample(&self, x: u16, y: u16) -> PremulRgba8 {
        self.buf[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }

    /// The pixel at `(x, y)`, or `None` outside the pixmap.
    pub fn get(&self, x: i32, y: i32) -> Option<PremulRgba8> {
        let (x, y) = self.index(x, y)?;
        Some(self.sample(x, y))
    }

    /// Composite `color` over the pixel at `(x, y)` with the given coverage. Pixels outside the
    /// pixmap are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: PremulRgba8, coverage: u8) {
        if let Some((x, y)) = self.index(x, y) {
            let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
            self.buf[idx] = src_over(self.buf[idx], color, coverage);
        }
    }

    /// Set every pixel to `color`.
    pub fn clear(&mut self, color: PremulRgba8) {
        self.buf.fill(color);
    }

    fn index(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        let x = u16::try_from(x).ok()?;
        let y = u16::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }
}

/// `round(a * b / 255)` for bytes.
#[inline(always)]
pub fn mul_div_255(a: u8, b: u8) -> u8 {
    let t = u32::from(a) * u32::from(b) + 128;
    ((t + (t >> 8)) >> 8) as u8
}

/// Source-over composition of `src` scaled by `coverage` onto `dst`.
///
/// Both colors are premultiplied.
#[inline(always)]
pub fn src_over(dst: PremulRgba8, src: PremulRgba8, coverage: u8) -> PremulRgba8 {
    if coverage == 0 {
        return dst;
    }
    let src = if coverage == 255 {
        src
    } else {
        PremulRgba8 {
            r: mul_div_255(src.r, coverage),
            g: mul_div_255(src.g, coverage),
            b: mul_div_255(src.b, coverage),
            a: mul_div_255(src.a, coverage),
        }
    };
    let inv_a = 255 - src.a;
    PremulRgba8 {
        r: src.r.saturating_add(mul_div_255(dst.r, inv_a)),
        g: src.g.saturating_add(mul_div_255(dst.g, inv_a)),
        b: src.b.saturating_add(mul_div_255(dst.b, inv_a)),
        a: src.a.saturating_add(mul_div_255(dst.a, inv_a)),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct AlphaMaskRepr {
    data: Vec<u8>,
    width: u16,
    height: u16,
}

/// An immutable 8-bit coverage mask, shared by reference counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask(Arc<AlphaMaskRepr>);

impl AlphaMask {
    /// Create a new alpha mask from the given coverage data.
    ///
    /// The `data` vector must be of length `width * height` exactly.
    ///
    /// The pixels are in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the `data` vector is not of length `width * height`.
    pub fn from_parts(data: Vec<u8>, width: u16, height: u16) -> Self {
        assert_eq!(
            data.len(),
            usize::from(width) * usize::from(height),
            "Expected `data` to have length of exactly `width * height`"
        );

        Self(Arc::new(AlphaMaskRepr {
            data,
            width,
            height,
        }))
    }

    /// Return the width of the mask.
    pub fn width(&self) -> u16 {
        self.0.width
    }

    /// Return the height of the mask.
    pub fn height(&self) -> u16 {
        self.0.height
    }

    /// The coverage values, in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    /// The number of bytes of coverage held.
    pub fn byte_size(&self) -> usize {
        self.0.data.len()
    }

    /// Sample the coverage at `(x, y)`, zero outside the mask.
    #[inline(always)]
    pub fn sample(&self, x: i32, y: i32) -> u8 {
        match (u16::try_from(x), u16::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.0.width && y < self.0.height => {
                self.0.data[usize::from(y) * usize::from(self.0.width) + usize::from(x)]
            }
            _ => 0,
        }
    }
}
