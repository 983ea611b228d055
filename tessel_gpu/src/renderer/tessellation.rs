// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fills from tessellation patches.
//!
//! Convex fills are drawn as wedges straight to the color buffer. Other fills either stencil
//! their curves and triangulate the inner polygon on the CPU, or stencil every wedge and cover
//! the bounds, whichever the cost model prefers.

use super::{CanDrawPath, DrawArgs, DrawOutcome, RenderContext};
use crate::draw::{Draw, Program};
use crate::error::{DrawError, TriangulationError};
use crate::patch::PatchWriter;
use crate::stencil::{self, StencilSettings};
use crate::tessellate;
use crate::triangulator::{self, Triangulation, TriangulationMode};
use log::{debug, trace};
use tessel_common::chop;
use tessel_common::color::PremulRgba8;
use tessel_common::error::PathError;
use tessel_common::geometry::Rect;
use tessel_common::path::FillType;
use tessel_common::path_data::PathData;

pub(super) fn can_draw(ctx: &RenderContext<'_>, args: &DrawArgs<'_>) -> CanDrawPath {
    if !args.style.is_fill() || args.paint.anti_alias {
        return CanDrawPath::No;
    }
    if args.matrix.has_perspective()
        && args
            .path
            .data()
            .points()
            .iter()
            .any(|&p| !(args.matrix.map_homogeneous(p)[2] > 0.))
    {
        return CanDrawPath::No;
    }
    if args.path.data().is_convex() && !args.path.is_inverse_fill() {
        return CanDrawPath::Yes;
    }
    if ctx.caps.stencil_support && args.user_stencil.is_none() {
        CanDrawPath::Yes
    } else {
        CanDrawPath::No
    }
}

/// The path in device space, chopped where a curve would exceed the segment budget.
fn device_path(ctx: &RenderContext<'_>, args: &DrawArgs<'_>) -> Result<PathData, PathError> {
    let data = args.path.data();
    let params = ctx.config.flatten_params();
    let viewport = args.clip.to_rect();
    if args.matrix.has_perspective() {
        return chop::pre_chop(data, args.matrix, &viewport, &params);
    }
    let bounds = args.matrix.map_rect(&data.bounds());
    if chop::needs_pre_chop(&bounds, &params) {
        trace!("Pre-chopping a path with device bounds {bounds:?}");
        chop::pre_chop(data, args.matrix, &viewport, &params)
    } else {
        data.try_make_transform(args.matrix)
    }
}

/// The rectangle a stencilled fill is covered with.
fn cover_rect(device: &PathData) -> Rect {
    device.bounds().outset(1.)
}

pub(super) fn draw(
    ctx: &RenderContext<'_>,
    args: &DrawArgs<'_>,
    out: &mut Vec<Draw>,
) -> Result<DrawOutcome, DrawError> {
    if !args.style.is_fill() {
        return Err(DrawError::Unsupported);
    }
    let device = device_path(ctx, args)?;
    let fill = args.path.fill_type();
    let color = args.paint.premul_rgba8();

    if args.path.data().is_convex() && !fill.is_inverse() {
        let mut writer = PatchWriter::new(ctx.caps, ctx.config.flatten_params(), None);
        tessellate::write_wedges(&device, &mut writer);
        if writer.is_empty() {
            return Ok(DrawOutcome::Empty);
        }
        out.push(tessellate::patch_draw(
            ctx.caps,
            Program::Wedge,
            writer,
            args.color_stencil(),
            true,
            color,
            args.clip,
        ));
        return Ok(DrawOutcome::ConvexFill);
    }

    if !ctx.caps.stencil_support {
        return Err(DrawError::NoStencil);
    }

    if !fill.is_inverse() {
        let pixels = device
            .bounds()
            .intersect(&args.clip.to_rect())
            .map_or(0., |r| r.area());
        if ctx
            .config
            .prefers_triangulation(device.verbs().len(), pixels)
        {
            match draw_inner_fan(ctx, args, &device, fill, color, out) {
                Ok(()) => return Ok(DrawOutcome::InnerFan),
                Err(e) => debug!("Inner fan triangulation failed ({e}), stencilling instead"),
            }
        }
    }

    draw_stencil_cover(ctx, args, &device, fill, color, out);
    Ok(DrawOutcome::StencilCover)
}

/// The stencil settings that accumulate the winding of `fill` in the stencil buffer.
fn winding_stencil(fill: FillType) -> StencilSettings {
    if fill.is_even_odd() {
        stencil::INVERT
    } else {
        stencil::INCR_DECR
    }
}

fn draw_inner_fan(
    ctx: &RenderContext<'_>,
    args: &DrawArgs<'_>,
    device: &PathData,
    fill: FillType,
    color: PremulRgba8,
    out: &mut Vec<Draw>,
) -> Result<(), TriangulationError> {
    let mut curves = PatchWriter::new(ctx.caps, ctx.config.flatten_params(), None);
    let polygons = tessellate::write_curves(device, &mut curves);

    if curves.is_empty() {
        if let Ok(Triangulation::Clean(triangles)) =
            triangulator::triangulate(&polygons, fill, TriangulationMode::Simple)
        {
            trace!("Filling {} triangles in one pass", triangles.len());
            out.push(Draw::triangles(triangles, StencilSettings::Disabled, true, color, args.clip));
            return Ok(());
        }
    }

    let (triangles, breadcrumbs) =
        triangulator::triangulate(&polygons, fill, TriangulationMode::Breadcrumbs)?.into_parts();
    trace!(
        "Inner fan of {} triangles, {} breadcrumbs, {} curves",
        triangles.len(),
        breadcrumbs.len(),
        curves.patches().len()
    );
    if curves.is_empty() && breadcrumbs.is_empty() {
        // Nothing to stencil, so the fan alone is the fill.
        out.push(Draw::triangles(triangles, StencilSettings::Disabled, true, color, args.clip));
        return Ok(());
    }
    let winding = winding_stencil(fill);
    if !curves.is_empty() {
        out.push(tessellate::patch_draw(
            ctx.caps,
            Program::CurveStencil,
            curves,
            winding,
            false,
            color,
            args.clip,
        ));
    }
    if !breadcrumbs.is_empty() {
        out.push(Draw::triangles(breadcrumbs, winding, false, color, args.clip));
    }
    let fill_or = if fill.is_even_odd() {
        stencil::FILL_OR_INVERT
    } else {
        stencil::FILL_OR_INCR_DECR
    };
    if !triangles.is_empty() {
        out.push(Draw::triangles(triangles, fill_or, true, color, args.clip));
    }
    out.push(Draw::rects(
        vec![cover_rect(device)],
        stencil::TEST_AND_RESET,
        color,
        args.clip,
    ));
    Ok(())
}

fn draw_stencil_cover(
    ctx: &RenderContext<'_>,
    args: &DrawArgs<'_>,
    device: &PathData,
    fill: FillType,
    color: PremulRgba8,
    out: &mut Vec<Draw>,
) {
    let mut writer = PatchWriter::new(ctx.caps, ctx.config.flatten_params(), None);
    tessellate::write_wedges(device, &mut writer);
    if !writer.is_empty() {
        out.push(tessellate::patch_draw(
            ctx.caps,
            Program::Wedge,
            writer,
            winding_stencil(fill),
            false,
            color,
            args.clip,
        ));
    }
    let cover = if fill.is_inverse() {
        (args.clip.to_rect(), stencil::INVERTED_TEST_AND_RESET)
    } else {
        (cover_rect(device), stencil::TEST_AND_RESET)
    };
    out.push(Draw::rects(vec![cover.0], cover.1, color, args.clip));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::Caps;
    use crate::config::{MaskCacheConfig, TessellationConfig};
    use crate::draw::DrawData;
    use crate::mask_cache::MaskCache;
    use tessel_common::color::palette::css;
    use tessel_common::geometry::{IntRect, PathDirection, Point};
    use tessel_common::matrix::Matrix;
    use tessel_common::paint::Paint;
    use tessel_common::path::Path;
    use tessel_common::path_builder::PathBuilder;
    use tessel_common::style::Style;

    fn run(config: TessellationConfig, path: &Path) -> (DrawOutcome, Vec<Draw>) {
        let caps = Caps::default();
        let cache = MaskCache::new(MaskCacheConfig::default(), caps.max_texture_size);
        let ctx = RenderContext {
            caps: &caps,
            config: &config,
            mask_cache: &cache,
        };
        let paint = Paint::new(css::BLUE);
        let args = DrawArgs {
            path,
            style: &Style::Fill,
            matrix: &Matrix::IDENTITY,
            clip: IntRect::from_ltrb(0, 0, 200, 200),
            paint: &paint,
            user_stencil: None,
        };
        let mut out = Vec::new();
        let outcome = draw(&ctx, &args, &mut out).unwrap();
        (outcome, out)
    }

    fn hybrid() -> TessellationConfig {
        TessellationConfig {
            cpu_weight: 0.,
            min_pixel_count: 0.,
            ..TessellationConfig::default()
        }
    }

    fn arrow() -> Path {
        let data = PathData::polygon(
            &[
                Point::new(10., 10.),
                Point::new(100., 50.),
                Point::new(10., 90.),
                Point::new(40., 50.),
            ],
            true,
        )
        .unwrap();
        Path::new(data, FillType::Winding)
    }

    #[test]
    fn convex_fills_draw_wedges_without_stencil() {
        let data =
            PathData::oval(&Rect::from_ltrb(10., 10., 90., 60.), PathDirection::Ccw, 0).unwrap();
        let (outcome, draws) = run(hybrid(), &Path::new(data, FillType::Winding));
        assert_eq!(outcome, DrawOutcome::ConvexFill);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, Program::Wedge);
        assert!(draws[0].stencil.is_disabled());
        assert!(draws[0].color_write);
    }

    #[test]
    fn concave_polygons_triangulate_in_one_pass() {
        let (outcome, draws) = run(hybrid(), &arrow());
        assert_eq!(outcome, DrawOutcome::InnerFan);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, Program::Triangles);
        assert!(draws[0].stencil.is_disabled());
        let DrawData::Triangles(triangles) = &draws[0].data else {
            panic!("expected triangles");
        };
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn curved_concave_fills_stencil_curves_then_fill_the_fan() {
        let mut builder = PathBuilder::new();
        builder
            .move_to(Point::new(10., 10.))
            .line_to(Point::new(100., 10.))
            .quad_to(Point::new(130., 55.), Point::new(100., 100.))
            .line_to(Point::new(10., 100.))
            .line_to(Point::new(50., 55.))
            .close();
        let path = Path::new(builder.build().unwrap(), FillType::Winding);
        let (outcome, draws) = run(hybrid(), &path);
        assert_eq!(outcome, DrawOutcome::InnerFan);
        let programs: Vec<_> = draws.iter().map(|d| (d.program, d.color_write)).collect();
        assert_eq!(
            programs,
            [
                (Program::CurveStencil, false),
                (Program::Triangles, true),
                (Program::BoundingBox, true),
            ]
        );
        assert_eq!(draws[0].stencil, stencil::INCR_DECR);
        assert_eq!(draws[1].stencil, stencil::FILL_OR_INCR_DECR);
        assert_eq!(draws[2].stencil, stencil::TEST_AND_RESET);
    }

    #[test]
    fn small_paths_stencil_and_cover() {
        let (outcome, draws) = run(TessellationConfig::default(), &arrow());
        assert_eq!(outcome, DrawOutcome::StencilCover);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program, Program::Wedge);
        assert_eq!(draws[0].stencil, stencil::INCR_DECR);
        assert!(!draws[0].color_write);
        assert_eq!(draws[1].stencil, stencil::TEST_AND_RESET);
    }

    #[test]
    fn inverse_fills_cover_the_clip() {
        let path = arrow().with_fill_type(FillType::InverseEvenOdd);
        let (outcome, draws) = run(hybrid(), &path);
        assert_eq!(outcome, DrawOutcome::StencilCover);
        assert_eq!(draws[0].stencil, stencil::INVERT);
        assert_eq!(draws[1].stencil, stencil::INVERTED_TEST_AND_RESET);
        let DrawData::Rects(rects) = &draws[1].data else {
            panic!("expected rects");
        };
        assert_eq!(rects, &[Rect::from_ltrb(0., 0., 200., 200.)]);
    }
}
