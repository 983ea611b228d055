// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// What the target device supports, as far as path rendering is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caps {
    /// The render target has an 8-bit stencil buffer.
    pub stencil_support: bool,
    /// Patches can be drawn as instances of a fixed vertex count. Without this, patches are
    /// submitted as hardware tessellation patches.
    pub instanced_draws: bool,
    /// Shaders can test for infinity, so the curve type of a patch can be encoded in its points.
    /// Without this, every patch carries an explicit curve type.
    pub infinity_support: bool,
    /// The largest width or height of a texture, in pixels.
    pub max_texture_size: u32,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            stencil_support: true,
            instanced_draws: true,
            infinity_support: true,
            max_texture_size: 8192,
        }
    }
}
