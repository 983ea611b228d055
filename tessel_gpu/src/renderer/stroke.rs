// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strokes from stroke patches.

use super::{CanDrawPath, DrawArgs, DrawOutcome, RenderContext};
use crate::draw::{Draw, DrawCall, DrawData, PrimitiveType, Program};
use crate::error::DrawError;
use crate::stencil::{self, StencilSettings};
use crate::stroke::{self, StrokePatch, StrokeWriter};
use log::trace;
use tessel_common::flatten::FlattenParams;
use tessel_common::matrix::Matrix;

pub(super) fn can_draw(ctx: &RenderContext<'_>, args: &DrawArgs<'_>) -> CanDrawPath {
    let Some(style) = args.style.stroke() else {
        return CanDrawPath::No;
    };
    if !style.is_valid() {
        return CanDrawPath::No;
    }
    if args.paint.anti_alias || args.path.is_inverse_fill() || args.matrix.has_perspective() {
        return CanDrawPath::No;
    }
    // Also rejects NaN widths.
    if !(stroke::device_stroke_width(style, args.matrix) <= ctx.config.max_device_stroke_width) {
        return CanDrawPath::No;
    }
    if !args.paint.is_opaque() && (!ctx.caps.stencil_support || args.user_stencil.is_some()) {
        return CanDrawPath::No;
    }
    CanDrawPath::Yes
}

/// The vertices of the longest strip any of `patches` expands to.
fn max_strip_vertices(
    patches: &[StrokePatch],
    infinity_support: bool,
    matrix: &Matrix,
    params: &FlattenParams,
) -> u32 {
    let mut scratch = Vec::new();
    let mut max = 0;
    for patch in patches {
        scratch.clear();
        stroke::stroke_triangles(patch, infinity_support, matrix, params, &mut scratch);
        max = max.max(scratch.len());
    }
    u32::try_from(max + 2).unwrap_or(u32::MAX)
}

pub(super) fn draw(
    ctx: &RenderContext<'_>,
    args: &DrawArgs<'_>,
    out: &mut Vec<Draw>,
) -> Result<DrawOutcome, DrawError> {
    let style = args.style.stroke().ok_or(DrawError::Unsupported)?;
    let (local, radius, matrix) = stroke::stroke_geometry(args.path.data(), style, args.matrix)?;
    let infinity_support = ctx.caps.infinity_support;
    let color = args.paint.premul_rgba8();
    let mut writer = StrokeWriter::new(style, radius, infinity_support, Some(color));
    writer.write_path(&local);
    if writer.is_empty() {
        return Ok(DrawOutcome::Empty);
    }
    let params = ctx.config.flatten_params();
    let vertex_count = max_strip_vertices(writer.patches(), infinity_support, &matrix, &params);
    let patches = writer.finish();
    let instance_count = u32::try_from(patches.len()).unwrap_or(u32::MAX);
    let strip = |stencil: StencilSettings, color_write: bool| Draw {
        program: Program::StrokeStrip,
        primitive: PrimitiveType::TriangleStrip,
        call: DrawCall {
            vertex_count,
            instance_count,
        },
        stencil,
        color_write,
        color,
        scissor: Some(args.clip),
        data: DrawData::StrokePatches {
            patches: patches.clone(),
            matrix,
        },
    };

    if args.paint.is_opaque() {
        trace!("Stroking {instance_count} patches in one pass");
        out.push(strip(args.color_stencil(), true));
        Ok(DrawOutcome::StrokeSinglePass)
    } else {
        if !ctx.caps.stencil_support {
            return Err(DrawError::NoStencil);
        }
        trace!("Stroking {instance_count} patches in two passes");
        out.push(strip(stencil::MARK, false));
        out.push(strip(stencil::TEST_AND_RESET, true));
        Ok(DrawOutcome::StrokeTwoPass)
    }
}
