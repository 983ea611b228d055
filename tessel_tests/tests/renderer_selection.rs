// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which renderer takes which draw.

use tessel_common::color::palette::css;
use tessel_common::geometry::{PathDirection, Rect};
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::{FillType, Path};
use tessel_common::path_data::PathData;
use tessel_common::style::{Cap, Join, StrokeStyle, Style};
use tessel_gpu::{Caps, DrawContext, DrawOutcome};
use tessel_tests::{bowtie, compare_gpu_cpu, render_gpu, translucent, DrawItem, TestParams};

fn square() -> Path {
    Path::new(
        PathData::rect(&Rect::from_ltrb(10., 10., 50., 50.), PathDirection::Cw, 0).unwrap(),
        FillType::Winding,
    )
}

fn thin() -> Style {
    Style::Stroke(StrokeStyle {
        width: 2.,
        join: Join::Miter,
        cap: Cap::Square,
        miter_limit: 4.,
    })
}

fn outcomes(items: &[DrawItem], params: &TestParams) -> Vec<DrawOutcome> {
    render_gpu(items, params).unwrap().outcomes
}

#[test]
fn each_draw_takes_the_first_renderer_that_accepts_it() {
    let params = TestParams::new("each_draw_takes_the_first_renderer", 64, 64);
    let opaque = Paint::new(css::RED);
    let items = [
        DrawItem::fill(square(), opaque),
        DrawItem::fill(bowtie(5., 5., 50., FillType::Winding), opaque),
        DrawItem::fill(square(), opaque.with_anti_alias(true)),
        DrawItem::stroke(square(), thin(), opaque),
        DrawItem::stroke(square(), thin(), translucent()),
    ];
    assert_eq!(
        outcomes(&items, &params),
        [
            DrawOutcome::ConvexFill,
            DrawOutcome::StencilCover,
            DrawOutcome::SoftwareMask { cache_hit: false },
            DrawOutcome::StrokeSinglePass,
            DrawOutcome::StrokeTwoPass,
        ]
    );
}

#[test]
fn strokes_too_wide_or_in_perspective_use_masks() {
    let mut params = TestParams::new("strokes_too_wide_or_in_perspective", 64, 64);
    params.config.max_device_stroke_width = 4.;
    let opaque = Paint::new(css::RED);
    let perspective = Matrix::from_rows([1., 0., 0., 0., 1., 0., 0.001, 0., 1.]);
    let items = [
        DrawItem::stroke(square(), thin(), opaque).with_matrix(Matrix::scale(1.5, 1.5)),
        DrawItem::stroke(square(), thin(), opaque).with_matrix(Matrix::scale(2.5, 1.)),
        DrawItem::stroke(square(), thin(), opaque).with_matrix(perspective),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [
            DrawOutcome::StrokeSinglePass,
            DrawOutcome::SoftwareMask { cache_hit: false },
            DrawOutcome::SoftwareMask { cache_hit: false },
        ]
    );
}

#[test]
fn without_a_stencil_buffer_only_single_pass_draws_stay_on_the_gpu() {
    let mut params = TestParams::new("without_a_stencil_buffer", 64, 64);
    params.caps = Caps {
        stencil_support: false,
        ..Caps::default()
    };
    let opaque = Paint::new(css::RED);
    let items = [
        DrawItem::fill(square(), opaque),
        DrawItem::fill(bowtie(5., 5., 50., FillType::EvenOdd), opaque),
        DrawItem::stroke(square(), thin(), opaque),
        DrawItem::stroke(square(), thin(), translucent()),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [
            DrawOutcome::ConvexFill,
            DrawOutcome::SoftwareMask { cache_hit: false },
            DrawOutcome::StrokeSinglePass,
            DrawOutcome::SoftwareMask { cache_hit: false },
        ]
    );
}

#[test]
fn masks_outside_the_clip_record_nothing() {
    let params = TestParams::new("masks_outside_the_clip", 64, 64);
    let far = Matrix::translate(500., 500.);
    let aa = Paint::new(css::RED).with_anti_alias(true);
    let mut context = DrawContext::new(params.caps, params.config, params.cache_config);
    let outcome = context.draw_path(&square(), &Style::Fill, &far, params.clip(), &aa);
    assert_eq!(outcome, DrawOutcome::SoftwareMask { cache_hit: false });
    assert!(context.draws().is_empty());

    // The inverse still covers the whole clip.
    let items = [
        DrawItem::fill(square().with_fill_type(FillType::InverseWinding), aa).with_matrix(far),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(comparison.painted, 64 * 64);
    assert_eq!(
        gpu.outcomes,
        [DrawOutcome::SoftwareMask { cache_hit: false }]
    );
}
