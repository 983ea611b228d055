// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessel tests.
//!
//! Scenes are recorded through a [`DrawContext`], replayed with the reference executor, and
//! compared pixel for pixel against the aliased scan converter.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
#![allow(
    missing_debug_implementations,
    unreachable_pub,
    missing_docs,
    clippy::missing_assert_message,
    clippy::allow_attributes_without_reason
)]

use anyhow::{bail, Result};
use tessel_common::chop;
use tessel_common::color::palette::css;
use tessel_common::color::PremulRgba8;
use tessel_common::geometry::{IntRect, Point};
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::{FillType, Path};
use tessel_common::path_builder::PathBuilder;
use tessel_common::path_data::PathData;
use tessel_common::pixmap::Pixmap;
use tessel_common::style::Style;
use tessel_cpu::{PixmapBlitter, ScanConverter};
use tessel_gpu::stroke;
use tessel_gpu::{
    Caps, DrawContext, DrawOutcome, MaskCacheConfig, Replay, TessellationConfig,
};

pub const WHITE: PremulRgba8 = PremulRgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};

pub struct TestParams {
    pub name: String,
    pub width: u16,
    pub height: u16,
    pub base_color: PremulRgba8,
    pub caps: Caps,
    pub config: TessellationConfig,
    pub cache_config: MaskCacheConfig,
}

impl TestParams {
    pub fn new(name: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            base_color: WHITE,
            caps: Caps::default(),
            config: TessellationConfig::default(),
            cache_config: MaskCacheConfig::default(),
        }
    }

    /// Never triangulate on the CPU.
    #[must_use]
    pub fn stencil_cover(mut self) -> Self {
        self.config.min_pixel_count = f32::INFINITY;
        self
    }

    /// Always triangulate on the CPU when the fill allows it.
    #[must_use]
    pub fn inner_fan(mut self) -> Self {
        self.config.cpu_weight = 0.;
        self.config.min_pixel_count = 0.;
        self
    }

    pub fn clip(&self) -> IntRect {
        IntRect::from_ltrb(0, 0, i32::from(self.width), i32::from(self.height))
    }
}

/// One path draw of a test scene.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub path: Path,
    pub style: Style,
    pub matrix: Matrix,
    pub paint: Paint,
}

impl DrawItem {
    pub fn fill(path: Path, paint: Paint) -> Self {
        Self {
            path,
            style: Style::Fill,
            matrix: Matrix::IDENTITY,
            paint,
        }
    }

    pub fn stroke(path: Path, style: Style, paint: Paint) -> Self {
        Self {
            path,
            style,
            matrix: Matrix::IDENTITY,
            paint,
        }
    }

    #[must_use]
    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }
}

/// The result of recording and replaying a scene.
pub struct Rendered {
    pub pixmap: Pixmap,
    pub outcomes: Vec<DrawOutcome>,
    pub context: DrawContext,
}

/// Record `items` through a [`DrawContext`] and replay the draws.
pub fn render_gpu(items: &[DrawItem], params: &TestParams) -> Result<Rendered> {
    let mut context = DrawContext::new(params.caps, params.config, params.cache_config);
    render_gpu_with(&mut context, items, params).map(|(pixmap, outcomes)| Rendered {
        pixmap,
        outcomes,
        context,
    })
}

/// Like [`render_gpu`], with an existing context, so masks cached by earlier scenes are reused.
pub fn render_gpu_with(
    context: &mut DrawContext,
    items: &[DrawItem],
    params: &TestParams,
) -> Result<(Pixmap, Vec<DrawOutcome>)> {
    let outcomes = items
        .iter()
        .map(|item| {
            context.draw_path(
                &item.path,
                &item.style,
                &item.matrix,
                params.clip(),
                &item.paint,
            )
        })
        .collect();
    let draws = context.take_draws();
    let mut replay = Replay::new(
        params.width,
        params.height,
        &params.caps,
        params.config.flatten_params(),
    );
    replay.clear(params.base_color);
    replay.replay(&draws);
    if let Some(i) = replay.stencil().iter().position(|&s| s != 0) {
        bail!(
            "{}: stencil not reset at pixel ({}, {})",
            params.name,
            i % usize::from(params.width),
            i / usize::from(params.width)
        );
    }
    Ok((replay.into_pixmap(), outcomes))
}

/// Render `items` with the scan converter alone.
pub fn render_cpu(items: &[DrawItem], params: &TestParams) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(params.width, params.height);
    pixmap.clear(params.base_color);
    let clip = params.clip();
    let flatten = params.config.flatten_params();
    let mut scan = ScanConverter::new(flatten);
    for item in items {
        let device = match &item.style {
            Style::Fill => {
                let data = if item.matrix.has_perspective() {
                    chop::pre_chop(item.path.data(), &item.matrix, &clip.to_rect(), &flatten)?
                } else {
                    item.path.data().try_make_transform(&item.matrix)?
                };
                Path::new(data, item.path.fill_type())
            }
            Style::Stroke(style) => {
                let fill =
                    stroke::stroke_to_fill(item.path.data(), style, &item.matrix, &flatten)?;
                if item.path.is_inverse_fill() {
                    fill.with_fill_type(FillType::InverseWinding)
                } else {
                    fill
                }
            }
        };
        let mut blitter = PixmapBlitter::new(&mut pixmap, item.paint.premul_rgba8());
        if item.paint.anti_alias {
            scan.anti_fill_path(&device, &clip, &mut blitter);
        } else {
            scan.fill_path(&device, &clip, &mut blitter);
        }
    }
    Ok(pixmap)
}

/// A pixel by pixel comparison of two renderings.
#[must_use]
pub struct Comparison {
    pub name: String,
    pub width: u16,
    pub differing: Vec<(u16, u16)>,
    pub painted: usize,
}

impl Comparison {
    pub fn assert_identical(&self) -> Result<()> {
        if let Some(&(x, y)) = self.differing.first() {
            bail!(
                "{}: {} pixels differ, the first at ({x}, {y})",
                self.name,
                self.differing.len()
            );
        }
        Ok(())
    }
}

/// Compare two renderings of the same size.
pub fn compare(expected: &Pixmap, actual: &Pixmap, params: &TestParams) -> Result<Comparison> {
    if (expected.width(), expected.height()) != (actual.width(), actual.height()) {
        bail!("{}: renderings differ in size", params.name);
    }
    let mut differing = Vec::new();
    let mut painted = 0;
    for y in 0..expected.height() {
        for x in 0..expected.width() {
            let (e, a) = (expected.sample(x, y), actual.sample(x, y));
            if e != a {
                differing.push((x, y));
            }
            if e != params.base_color {
                painted += 1;
            }
        }
    }
    Ok(Comparison {
        name: params.name.clone(),
        width: expected.width(),
        differing,
        painted,
    })
}

/// Render `items` both ways and compare.
pub fn compare_gpu_cpu(items: &[DrawItem], params: &TestParams) -> Result<(Comparison, Rendered)> {
    let gpu = render_gpu(items, params)?;
    let cpu = render_cpu(items, params)?;
    let comparison = compare(&cpu, &gpu.pixmap, params)?;
    Ok((comparison, gpu))
}

pub fn translucent() -> Paint {
    Paint::new(css::BLUE.with_alpha(0.5))
}

pub fn polygon(points: &[(f32, f32)], fill: FillType) -> Path {
    let points: Vec<_> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
    Path::new(
        PathData::polygon(&points, true).unwrap_or_else(PathData::empty),
        fill,
    )
}

/// A figure eight: two triangles of opposite orientation meeting at a crossing.
pub fn bowtie(x0: f32, y0: f32, size: f32, fill: FillType) -> Path {
    polygon(
        &[
            (x0, y0),
            (x0 + size, y0 + size),
            (x0 + size, y0),
            (x0, y0 + size),
        ],
        fill,
    )
}

/// A five pointed star drawn in one stroke, so its center is wound twice.
pub fn star(cx: f32, cy: f32, radius: f32, fill: FillType) -> Path {
    let points: Vec<_> = (0..5)
        .map(|i| {
            let angle = -core::f32::consts::FRAC_PI_2 + i as f32 * 4. * core::f32::consts::PI / 5.;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect();
    polygon(&points, fill)
}

/// A concave shape with curved and straight edges, about `size` pixels across.
pub fn blob(x0: f32, y0: f32, size: f32, fill: FillType) -> Path {
    let s = size;
    let p = |x: f32, y: f32| Point::new(x0 + x * s, y0 + y * s);
    let mut builder = PathBuilder::new();
    builder
        .move_to(p(0.03, 0.05))
        .cubic_to(p(0.35, -0.02), p(0.62, 0.21), p(0.97, 0.04))
        .quad_to(p(0.83, 0.52), p(0.96, 0.97))
        .line_to(p(0.61, 0.93))
        .conic_to(p(0.49, 0.41), p(0.37, 0.95), 0.7071)
        .line_to(p(0.02, 0.91))
        .line_to(p(0.31, 0.47))
        .close();
    Path::new(builder.build().unwrap_or_else(PathData::empty), fill)
}
