// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The entry point for recording path draws.

use crate::caps::Caps;
use crate::config::{MaskCacheConfig, TessellationConfig};
use crate::draw::{Draw, DrawList};
use crate::mask_cache::MaskCache;
use crate::renderer::{DrawArgs, DrawOutcome, PathRendererChain, RenderContext};
use crate::stencil::StencilSettings;
use log::{debug, warn};
use tessel_common::geometry::IntRect;
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::Path;
use tessel_common::style::Style;

/// Records path draws for one target, choosing a renderer per draw.
///
/// The mask cache lives as long as the context, so masks are reused across frames.
#[derive(Debug)]
pub struct DrawContext {
    caps: Caps,
    config: TessellationConfig,
    mask_cache: MaskCache,
    chain: PathRendererChain,
    draws: DrawList,
}

impl DrawContext {
    /// A context with the default renderer chain.
    pub fn new(caps: Caps, config: TessellationConfig, cache_config: MaskCacheConfig) -> Self {
        Self {
            caps,
            config,
            mask_cache: MaskCache::new(cache_config, caps.max_texture_size),
            chain: PathRendererChain::default(),
            draws: DrawList::new(),
        }
    }

    /// Replace the renderer chain.
    #[must_use]
    pub fn with_chain(mut self, chain: PathRendererChain) -> Self {
        self.chain = chain;
        self
    }

    /// The target's capabilities.
    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    /// The tessellation parameters.
    pub fn config(&self) -> &TessellationConfig {
        &self.config
    }

    /// The mask cache.
    pub fn mask_cache(&self) -> &MaskCache {
        &self.mask_cache
    }

    /// The renderer chain.
    pub fn chain(&self) -> &PathRendererChain {
        &self.chain
    }

    /// The draws recorded so far.
    pub fn draws(&self) -> &DrawList {
        &self.draws
    }

    /// Take the recorded draws, leaving the list empty.
    pub fn take_draws(&mut self) -> DrawList {
        core::mem::take(&mut self.draws)
    }

    /// Record `path` drawn with `style` and `paint` through `matrix`, touching only `clip`.
    pub fn draw_path(
        &mut self,
        path: &Path,
        style: &Style,
        matrix: &Matrix,
        clip: IntRect,
        paint: &Paint,
    ) -> DrawOutcome {
        self.draw(&DrawArgs {
            path,
            style,
            matrix,
            clip,
            paint,
            user_stencil: None,
        })
    }

    /// Record a draw request.
    ///
    /// Never fails: a draw no renderer can handle, or whose renderer fails, is dropped with a
    /// warning and leaves the recorded draws unchanged.
    pub fn draw(&mut self, args: &DrawArgs<'_>) -> DrawOutcome {
        if args.clip.is_empty() {
            return DrawOutcome::Empty;
        }
        if let Some(stroke) = args.style.stroke() {
            if !stroke.is_valid() {
                warn!(
                    "Dropping path {} stroked with width {}",
                    args.path.generation_id(),
                    stroke.width
                );
                return DrawOutcome::Dropped;
            }
        }
        let color = args.paint.premul_rgba8();
        if args.style.is_fill() && args.path.bounds().is_empty() {
            if !args.path.is_inverse_fill() {
                return DrawOutcome::Empty;
            }
            self.draws.push(Draw::rects(
                vec![args.clip.to_rect()],
                args.user_stencil.unwrap_or(StencilSettings::Disabled),
                color,
                args.clip,
            ));
            return DrawOutcome::InverseClipFill;
        }

        let ctx = RenderContext {
            caps: &self.caps,
            config: &self.config,
            mask_cache: &self.mask_cache,
        };
        let Some(renderer) = self.chain.select(&ctx, args) else {
            warn!(
                "No path renderer can draw path {}",
                args.path.generation_id()
            );
            return DrawOutcome::Dropped;
        };
        debug!(
            "Drawing path {} with the {} renderer",
            args.path.generation_id(),
            renderer.name()
        );
        let mut staged = Vec::new();
        match renderer.draw(&ctx, args, &mut staged) {
            Ok(outcome) => {
                for draw in staged {
                    self.draws.push(draw);
                }
                outcome
            }
            Err(e) => {
                warn!(
                    "Dropping path {} after the {} renderer failed: {e}",
                    args.path.generation_id(),
                    renderer.name()
                );
                DrawOutcome::Dropped
            }
        }
    }
}
