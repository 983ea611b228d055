// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fills recorded by the path renderers must match the scan converter pixel for pixel.

use tessel_common::color::palette::css;
use tessel_common::geometry::{PathDirection, Rect};
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::{FillType, Path};
use tessel_common::path_data::PathData;
use tessel_gpu::{Caps, DrawOutcome};
use tessel_tests::{
    blob, bowtie, compare, compare_gpu_cpu, render_gpu, star, translucent, DrawItem, TestParams,
};

fn red() -> Paint {
    Paint::new(css::RED)
}

#[test]
fn simple_square_fill() {
    let params = TestParams::new("simple_square_fill", 100, 100);
    let square =
        PathData::rect(&Rect::from_ltrb(0., 0., 100., 100.), PathDirection::Cw, 0).unwrap();
    let items = [DrawItem::fill(Path::new(square, FillType::Winding), red())];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(gpu.outcomes, [DrawOutcome::ConvexFill]);
    let color = red().premul_rgba8();
    assert!(gpu.pixmap.data().iter().all(|&p| p == color));
}

#[test]
fn square_with_fractional_edges() {
    let params = TestParams::new("square_with_fractional_edges", 40, 40);
    let rect = Rect::from_ltrb(5.3, 7.6, 30.7, 20.2);
    let square = PathData::rect(&rect, PathDirection::Ccw, 2).unwrap();
    let items = [DrawItem::fill(Path::new(square, FillType::Winding), red())];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(gpu.pixmap.get(4, 10).map(|p| p.g), Some(255));
    assert_eq!(gpu.pixmap.get(5, 10), Some(red().premul_rgba8()));
    assert_eq!(comparison.painted, 26 * 12);
}

#[test]
fn bowtie_stencil_cover_matches_cpu() {
    let params = TestParams::new("bowtie_stencil_cover_matches_cpu", 100, 100).stencil_cover();
    let shape = bowtie(10., 10., 80., FillType::Winding);
    let items = [DrawItem::fill(shape, red())];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(gpu.outcomes, [DrawOutcome::StencilCover]);
    let color = red().premul_rgba8();
    // Both lobes are filled, the regions between them are not.
    assert_eq!(gpu.pixmap.get(20, 50), Some(color));
    assert_eq!(gpu.pixmap.get(80, 50), Some(color));
    assert_ne!(gpu.pixmap.get(50, 20), Some(color));
    assert_ne!(gpu.pixmap.get(50, 80), Some(color));
}

#[test]
fn bowtie_inner_fan_matches_cpu() {
    let params = TestParams::new("bowtie_inner_fan_matches_cpu", 100, 100).inner_fan();
    for fill in [FillType::Winding, FillType::EvenOdd] {
        let items = [DrawItem::fill(bowtie(10., 10., 80., fill), red())];
        let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
        comparison.assert_identical().unwrap();
        assert_eq!(gpu.outcomes, [DrawOutcome::InnerFan]);
    }
}

#[test]
fn star_fill_rules() {
    for (fill, center_painted) in [(FillType::Winding, true), (FillType::EvenOdd, false)] {
        for params in [
            TestParams::new("star_fill_rules_stencil", 120, 120).stencil_cover(),
            TestParams::new("star_fill_rules_inner_fan", 120, 120).inner_fan(),
        ] {
            let items = [DrawItem::fill(star(60.3, 61.7, 55., fill), red())];
            let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
            comparison.assert_identical().unwrap();
            assert_eq!(
                gpu.pixmap.get(60, 61) == Some(red().premul_rgba8()),
                center_painted,
                "{fill:?}"
            );
        }
    }
}

#[test]
fn inner_fan_and_stencil_cover_agree_on_large_paths() {
    let stencil = TestParams::new("large_stencil_cover", 520, 520).stencil_cover();
    let fan = TestParams::new("large_inner_fan", 520, 520).inner_fan();
    for item in [
        DrawItem::fill(blob(10., 10., 500., FillType::Winding), translucent()),
        DrawItem::fill(blob(10., 10., 500., FillType::EvenOdd), translucent()),
        DrawItem::fill(star(260.5, 262.25, 250., FillType::Winding), translucent()),
    ] {
        let items = [item];
        let by_stencil = render_gpu(&items, &stencil).unwrap();
        let by_fan = render_gpu(&items, &fan).unwrap();
        assert_eq!(by_stencil.outcomes, [DrawOutcome::StencilCover]);
        assert_eq!(by_fan.outcomes, [DrawOutcome::InnerFan]);
        let comparison = compare(&by_stencil.pixmap, &by_fan.pixmap, &fan).unwrap();
        comparison.assert_identical().unwrap();
        assert!(comparison.painted > 50_000);

        let (comparison, _) = compare_gpu_cpu(&items, &fan).unwrap();
        comparison.assert_identical().unwrap();
    }
}

#[test]
fn curved_fills_match_cpu() {
    let params = TestParams::new("curved_fills_match_cpu", 160, 140);
    let bounds = Rect::from_ltrb(3.2, 4.9, 150.6, 90.1);
    let oval = PathData::oval(&bounds, PathDirection::Cw, 1).unwrap();
    let items = [
        DrawItem::fill(Path::new(oval, FillType::Winding), red()),
        DrawItem::fill(blob(20., 15., 110., FillType::EvenOdd), translucent()),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [DrawOutcome::ConvexFill, DrawOutcome::StencilCover]
    );
}

#[test]
fn inverse_fills_match_cpu() {
    let params = TestParams::new("inverse_fills_match_cpu", 120, 120);
    let items = [
        DrawItem::fill(star(60., 60., 50., FillType::InverseEvenOdd), translucent()),
        DrawItem::fill(blob(5., 5., 100., FillType::InverseWinding), translucent()),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [DrawOutcome::StencilCover, DrawOutcome::StencilCover]
    );
}

#[test]
fn fills_without_a_stencil_buffer_fall_back_to_masks() {
    let mut params = TestParams::new("fills_without_a_stencil_buffer", 120, 120);
    params.caps = Caps {
        stencil_support: false,
        ..Caps::default()
    };
    let items = [
        DrawItem::fill(blob(5., 5., 100., FillType::Winding), translucent()),
        DrawItem::fill(star(60., 60., 50., FillType::InverseWinding), translucent()),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(
        gpu.outcomes,
        [
            DrawOutcome::SoftwareMask { cache_hit: false },
            DrawOutcome::SoftwareMask { cache_hit: false }
        ]
    );
}

#[test]
fn perspective_fills_match_cpu() {
    let params = TestParams::new("perspective_fills_match_cpu", 160, 160);
    let matrix = Matrix::from_rows([1.1, 0.2, 10., 0.05, 0.9, 12., 0.001, 0.0005, 1.]);
    let item = DrawItem::fill(blob(0., 0., 110., FillType::Winding), red());
    let items = [item.with_matrix(matrix)];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert_eq!(gpu.outcomes, [DrawOutcome::StencilCover]);
    assert!(comparison.painted > 1000);
}

#[test]
fn anti_aliased_fills_match_cpu() {
    let params = TestParams::new("anti_aliased_fills_match_cpu", 120, 120);
    let items = [
        DrawItem::fill(
            blob(5., 5., 100., FillType::Winding),
            Paint::new(css::GREEN).with_anti_alias(true),
        ),
        DrawItem::fill(
            bowtie(7.5, 3.25, 90., FillType::InverseWinding),
            translucent().with_anti_alias(true),
        ),
    ];
    let (comparison, gpu) = compare_gpu_cpu(&items, &params).unwrap();
    comparison.assert_identical().unwrap();
    assert!(matches!(gpu.outcomes[0], DrawOutcome::SoftwareMask { .. }));
    assert!(matches!(gpu.outcomes[1], DrawOutcome::SoftwareMask { .. }));
}
