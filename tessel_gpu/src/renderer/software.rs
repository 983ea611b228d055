// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fallback: coverage rasterised on the CPU and drawn as a textured rectangle.

use super::{CanDrawPath, DrawArgs, DrawOutcome, RenderContext};
use crate::draw::{Draw, DrawCall, DrawData, PrimitiveType, Program};
use crate::error::DrawError;
use crate::mask_cache::MaskRequest;
use log::trace;
use tessel_common::geometry::IntRect;

pub(super) fn can_draw(_ctx: &RenderContext<'_>, _args: &DrawArgs<'_>) -> CanDrawPath {
    CanDrawPath::AsBackup
}

/// The rectangles of `clip` outside `bounds`: above, below, left and right of it.
fn surrounding_rects(clip: IntRect, bounds: Option<IntRect>) -> Vec<IntRect> {
    let Some(b) = bounds.and_then(|b| b.intersect(&clip)) else {
        return vec![clip];
    };
    [
        IntRect::from_ltrb(clip.left, clip.top, clip.right, b.top),
        IntRect::from_ltrb(clip.left, b.bottom, clip.right, clip.bottom),
        IntRect::from_ltrb(clip.left, b.top, b.left, b.bottom),
        IntRect::from_ltrb(b.right, b.top, clip.right, b.bottom),
    ]
    .into_iter()
    .filter(|r| !r.is_empty())
    .collect()
}

pub(super) fn draw(
    ctx: &RenderContext<'_>,
    args: &DrawArgs<'_>,
    out: &mut Vec<Draw>,
) -> Result<DrawOutcome, DrawError> {
    let request = MaskRequest {
        path: args.path,
        style: args.style,
        matrix: args.matrix,
        clip: args.clip,
        anti_alias: args.paint.anti_alias,
        params: ctx.config.flatten_params(),
    };
    let lookup = ctx.mask_cache.get_or_create(&request)?;
    let color = args.paint.premul_rgba8();
    let stencil = args.color_stencil();
    let cache_hit = lookup.as_ref().is_some_and(|l| l.cache_hit);
    let bounds = lookup.as_ref().map(|l| l.bounds);

    if let Some(lookup) = lookup {
        trace!(
            "Drawing a {}x{} mask at {:?}",
            lookup.texture.width(),
            lookup.texture.height(),
            lookup.origin
        );
        out.push(Draw {
            program: Program::TextureMask,
            primitive: PrimitiveType::TriangleStrip,
            call: DrawCall {
                vertex_count: 4,
                instance_count: 1,
            },
            stencil,
            color_write: true,
            color,
            scissor: Some(args.clip),
            data: DrawData::Mask {
                texture: lookup.texture,
                origin: lookup.origin,
                rect: lookup.rect,
            },
        });
    }

    // A stroke's inverse covers the outside of the stroke, like a fill's.
    if args.path.is_inverse_fill() {
        let rects: Vec<_> = surrounding_rects(args.clip, bounds)
            .iter()
            .map(IntRect::to_rect)
            .collect();
        if !rects.is_empty() {
            out.push(Draw::rects(rects, stencil, color, args.clip));
        }
    }
    Ok(DrawOutcome::SoftwareMask { cache_hit })
}
