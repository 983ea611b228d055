// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path renderers and the chain that picks one per draw.
//!
//! Every renderer answers [`PathRenderer::can_draw`] before it is asked to
//! [`draw`](PathRenderer::draw). A renderer that accepted a draw may still fail; the caller then
//! drops the draw and discards everything it staged.

mod software;
mod stroke;
mod tessellation;

use crate::caps::Caps;
use crate::config::TessellationConfig;
use crate::draw::Draw;
use crate::error::DrawError;
use crate::mask_cache::MaskCache;
use crate::stencil::StencilSettings;
use tessel_common::geometry::IntRect;
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::Path;
use tessel_common::style::Style;

/// The answer of a renderer asked whether it can draw a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanDrawPath {
    /// The renderer cannot draw the path.
    No,
    /// The renderer can draw the path, but only if nothing else can.
    AsBackup,
    /// The renderer can draw the path.
    Yes,
}

/// What a renderer may use while drawing.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    /// The target's capabilities.
    pub caps: &'a Caps,
    /// Tessellation parameters.
    pub config: &'a TessellationConfig,
    /// The cache of software masks.
    pub mask_cache: &'a MaskCache,
}

/// One draw request.
#[derive(Clone, Copy, Debug)]
pub struct DrawArgs<'a> {
    /// The path.
    pub path: &'a Path,
    /// Fill or stroke.
    pub style: &'a Style,
    /// The local to device transform.
    pub matrix: &'a Matrix,
    /// The device pixels that may be touched.
    pub clip: IntRect,
    /// The paint.
    pub paint: &'a Paint,
    /// Stencil settings the caller wants applied to the color pass. A renderer that needs the
    /// stencil buffer for itself declines when these are set.
    pub user_stencil: Option<StencilSettings>,
}

impl DrawArgs<'_> {
    /// The stencil settings of a pass that needs none of its own.
    pub(crate) fn color_stencil(&self) -> StencilSettings {
        self.user_stencil.unwrap_or_default()
    }
}

/// The strategy a draw took, or why it drew nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawOutcome {
    /// A stroke drawn straight to the color buffer.
    StrokeSinglePass,
    /// A stroke marked in the stencil buffer and then covered, so overlaps blend once.
    StrokeTwoPass,
    /// A convex fill drawn straight to the color buffer.
    ConvexFill,
    /// A fill whose inner polygon was triangulated on the CPU.
    InnerFan,
    /// A fill stencilled by its wedges and then covered.
    StencilCover,
    /// A software mask, either found in the cache or rasterised for this draw.
    SoftwareMask {
        /// Whether the mask was already cached.
        cache_hit: bool,
    },
    /// An inverse fill of an empty path, which covers the whole clip.
    InverseClipFill,
    /// Nothing to draw.
    Empty,
    /// No renderer could draw the path, or the chosen one failed.
    Dropped,
}

/// The path renderers, in the order of the default chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathRenderer {
    /// Strokes expanded from stroke patches.
    StrokeTessellate,
    /// Fills from curve and wedge patches, with or without a CPU triangulated inner fan.
    Tessellation,
    /// Anything, from a CPU rasterised mask.
    Software,
}

impl PathRenderer {
    /// A name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::StrokeTessellate => "StrokeTessellate",
            Self::Tessellation => "Tessellation",
            Self::Software => "Software",
        }
    }

    /// Whether the renderer can draw the request.
    pub fn can_draw(self, ctx: &RenderContext<'_>, args: &DrawArgs<'_>) -> CanDrawPath {
        match self {
            Self::StrokeTessellate => stroke::can_draw(ctx, args),
            Self::Tessellation => tessellation::can_draw(ctx, args),
            Self::Software => software::can_draw(ctx, args),
        }
    }

    /// Record the draws of the request into `out`.
    ///
    /// On error, `out` may hold a partial recording the caller must discard.
    pub fn draw(
        self,
        ctx: &RenderContext<'_>,
        args: &DrawArgs<'_>,
        out: &mut Vec<Draw>,
    ) -> Result<DrawOutcome, DrawError> {
        match self {
            Self::StrokeTessellate => stroke::draw(ctx, args, out),
            Self::Tessellation => tessellation::draw(ctx, args, out),
            Self::Software => software::draw(ctx, args, out),
        }
    }
}

/// Renderers in priority order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRendererChain {
    renderers: Vec<PathRenderer>,
}

impl Default for PathRendererChain {
    fn default() -> Self {
        Self::new(vec![
            PathRenderer::StrokeTessellate,
            PathRenderer::Tessellation,
            PathRenderer::Software,
        ])
    }
}

impl PathRendererChain {
    /// A chain trying `renderers` in order.
    pub fn new(renderers: Vec<PathRenderer>) -> Self {
        Self { renderers }
    }

    /// The renderers in priority order.
    pub fn renderers(&self) -> &[PathRenderer] {
        &self.renderers
    }

    /// The first renderer answering [`CanDrawPath::Yes`], or else the first answering
    /// [`CanDrawPath::AsBackup`].
    pub fn select(&self, ctx: &RenderContext<'_>, args: &DrawArgs<'_>) -> Option<PathRenderer> {
        let mut backup = None;
        for &renderer in &self.renderers {
            match renderer.can_draw(ctx, args) {
                CanDrawPath::Yes => return Some(renderer),
                CanDrawPath::AsBackup => {
                    backup.get_or_insert(renderer);
                }
                CanDrawPath::No => {}
            }
        }
        backup
    }
}
