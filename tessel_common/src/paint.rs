// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Solid paints.

use crate::color::{AlphaColor, PremulRgba8, Srgb};

/// The paint of a draw: a solid color and whether edges are anti-aliased.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// The color, not premultiplied.
    pub color: AlphaColor<Srgb>,
    /// Whether edges get fractional coverage.
    pub anti_alias: bool,
}

impl Paint {
    /// An aliased paint of the given color.
    pub fn new(color: AlphaColor<Srgb>) -> Self {
        Self {
            color,
            anti_alias: false,
        }
    }

    /// The same paint with anti-aliasing turned on or off.
    #[must_use]
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    /// The color as premultiplied bytes.
    pub fn premul_rgba8(&self) -> PremulRgba8 {
        self.color.premultiply().to_rgba8()
    }

    /// Whether drawing a pixel twice gives the same result as drawing it once.
    pub fn is_opaque(&self) -> bool {
        self.color.components[3] >= 1.
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::new(AlphaColor::BLACK)
    }
}
