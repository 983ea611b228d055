// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strokes: tessellated strokes against the scan converted fill of the same outline.

use tessel_common::color::palette::css;
use tessel_common::geometry::{PathDirection, Point, Rect};
use tessel_common::kurbo::{Cap, Join};
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::{FillType, Path};
use tessel_common::path_builder::PathBuilder;
use tessel_common::path_data::PathData;
use tessel_common::style::{StrokeStyle, Style};
use tessel_gpu::DrawOutcome;
use tessel_tests::{
    blob, compare_gpu_cpu, render_cpu, render_gpu, star, translucent, DrawItem, TestParams,
};

fn stroke(width: f32, join: Join, cap: Cap) -> Style {
    Style::Stroke(StrokeStyle {
        width,
        join,
        cap,
        miter_limit: 4.,
    })
}

fn zigzag() -> Path {
    let mut builder = PathBuilder::new();
    builder
        .move_to(Point::new(15., 80.))
        .line_to(Point::new(45., 20.))
        .line_to(Point::new(75., 85.))
        .quad_to(Point::new(110., 10.), Point::new(140., 70.))
        .line_to(Point::new(140.5, 70.3));
    Path::new(builder.build().unwrap(), FillType::Winding)
}

fn segment(from: (f32, f32), to: (f32, f32)) -> Path {
    let data = PathData::line(Point::new(from.0, from.1), Point::new(to.0, to.1)).unwrap();
    Path::new(data, FillType::Winding)
}

#[test]
fn capped_segments_cover_their_outline() {
    let params = TestParams::new("capped_segments_cover_their_outline", 60, 40);
    let black = Paint::new(css::BLACK);
    // The outlines avoid pixel centres, so coverage follows from the geometry alone.
    let items = [
        // Butt caps end at the points: columns 10..30 and rows 18..22.
        DrawItem::stroke(
            segment((10.25, 20.25), (30.25, 20.25)),
            stroke(4., Join::Miter, Cap::Butt),
            black,
        ),
        // Square caps reach three pixels past the points: columns 37..43 and rows 7..33.
        DrawItem::stroke(
            segment((40.25, 10.25), (40.25, 30.25)),
            stroke(6., Join::Miter, Cap::Square),
            black,
        ),
    ];
    let inside = |x: i32, y: i32| {
        ((10..30).contains(&x) && (18..22).contains(&y))
            || ((37..43).contains(&x) && (7..33).contains(&y))
    };

    let gpu = render_gpu(&items, &params).unwrap();
    assert_eq!(gpu.outcomes, [DrawOutcome::StrokeSinglePass; 2]);
    let cpu = render_cpu(&items, &params).unwrap();
    let color = black.premul_rgba8();
    let mut painted = 0;
    for y in 0..i32::from(params.height) {
        for x in 0..i32::from(params.width) {
            let expected = inside(x, y);
            assert_eq!(gpu.pixmap.get(x, y) == Some(color), expected, "gpu ({x}, {y})");
            assert_eq!(cpu.get(x, y) == Some(color), expected, "cpu ({x}, {y})");
            painted += usize::from(expected);
        }
    }
    assert_eq!(painted, 20 * 4 + 6 * 26);
}

#[test]
fn opaque_strokes_take_one_pass() {
    let params = TestParams::new("opaque_strokes_take_one_pass", 160, 100);
    for (join, cap) in [
        (Join::Miter, Cap::Butt),
        (Join::Round, Cap::Round),
        (Join::Bevel, Cap::Square),
    ] {
        let style = stroke(9., join, cap);
        let items = [DrawItem::stroke(zigzag(), style, Paint::new(css::BLACK))];
        let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
        comparison.assert_identical().unwrap();
        assert_eq!(gpu.outcomes, [DrawOutcome::StrokeSinglePass]);
        assert!(comparison.painted > 1000, "{join:?} {cap:?}");
    }
}

#[test]
fn translucent_strokes_blend_once() {
    let params = TestParams::new("translucent_strokes_blend_once", 160, 120);
    let items = [
        DrawItem::stroke(
            zigzag(),
            stroke(12., Join::Round, Cap::Round),
            translucent(),
        ),
        DrawItem::stroke(
            star(80., 60., 50., FillType::Winding),
            stroke(5., Join::Miter, Cap::Butt),
            translucent(),
        ),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [DrawOutcome::StrokeTwoPass, DrawOutcome::StrokeTwoPass]
    );
}

#[test]
fn closed_curved_strokes() {
    let params = TestParams::new("closed_curved_strokes", 140, 140);
    let oval = PathData::oval(
        &Rect::from_ltrb(20., 30., 120., 100.),
        PathDirection::Ccw,
        0,
    )
    .unwrap();
    let items = [
        DrawItem::stroke(
            Path::new(oval, FillType::Winding),
            stroke(6., Join::Miter, Cap::Butt),
            Paint::new(css::RED),
        ),
        DrawItem::stroke(
            blob(10., 10., 120., FillType::EvenOdd),
            stroke(3., Join::Round, Cap::Butt),
            translucent(),
        ),
    ];
    let (comparison, _) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
}

#[test]
fn transformed_strokes_and_hairlines() {
    let params = TestParams::new("transformed_strokes_and_hairlines", 200, 200);
    let matrix = Matrix::from_row(1.5, 0.4, 12., -0.3, 1.2, 40.);
    let items = [
        DrawItem::stroke(
            zigzag(),
            stroke(4., Join::Miter, Cap::Square),
            translucent(),
        )
        .with_matrix(matrix),
        DrawItem::stroke(
            zigzag(),
            Style::Stroke(StrokeStyle::hairline(Cap::Butt)),
            Paint::new(css::BLACK),
        )
        .with_matrix(Matrix::scale(1.2, 2.)),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [DrawOutcome::StrokeTwoPass, DrawOutcome::StrokeSinglePass]
    );
}

#[test]
fn strokes_the_tessellator_declines_use_masks() {
    let params = TestParams::new("strokes_the_tessellator_declines", 160, 100);
    let perspective = Matrix::from_rows([1., 0., 0., 0., 1., 0., 0.0004, 0.0002, 1.]);
    let items = [
        DrawItem::stroke(
            zigzag(),
            stroke(5., Join::Round, Cap::Round),
            Paint::new(css::BLACK).with_anti_alias(true),
        ),
        DrawItem::stroke(zigzag(), stroke(3., Join::Bevel, Cap::Butt), translucent())
            .with_matrix(perspective),
        DrawItem::stroke(
            zigzag().with_fill_type(FillType::InverseWinding),
            stroke(7., Join::Miter, Cap::Butt),
            translucent(),
        ),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert!(gpu
        .outcomes
        .iter()
        .all(|o| matches!(o, DrawOutcome::SoftwareMask { .. })));
}
