// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software masks reused across scenes drawn through one context.

use tessel_common::color::palette::css;
use tessel_common::matrix::Matrix;
use tessel_common::paint::Paint;
use tessel_common::path::FillType;
use tessel_common::style::{Cap, Join, StrokeStyle, Style};
use tessel_gpu::{DrawContext, DrawOutcome};
use tessel_tests::{blob, compare, render_gpu, render_gpu_with, star, DrawItem, TestParams};

fn shapes() -> Vec<DrawItem> {
    let aa = Paint::new(css::DARK_GREEN).with_anti_alias(true);
    vec![
        DrawItem::fill(blob(5., 5., 60., FillType::Winding), aa),
        DrawItem::stroke(
            star(40., 40., 30., FillType::Winding),
            Style::Stroke(StrokeStyle {
                width: 3.,
                join: Join::Round,
                cap: Cap::Butt,
                miter_limit: 4.,
            }),
            aa,
        ),
    ]
}

/// The shapes drawn through `matrix`. Clones share the path data, so they share cache entries.
fn scene(shapes: &[DrawItem], matrix: Matrix) -> Vec<DrawItem> {
    shapes
        .iter()
        .map(|item| item.clone().with_matrix(matrix))
        .collect()
}

fn context(params: &TestParams) -> DrawContext {
    DrawContext::new(params.caps, params.config, params.cache_config)
}

#[test]
fn integer_translations_reuse_masks() {
    let params = TestParams::new("integer_translations_reuse_masks", 120, 100);
    let mut context = context(&params);
    let shapes = shapes();
    let first = scene(&shapes, Matrix::translate(0.25, 0.5));
    let (_, outcomes) = render_gpu_with(&mut context, &first, &params).unwrap();
    assert_eq!(
        outcomes,
        [DrawOutcome::SoftwareMask { cache_hit: false }; 2]
    );

    let moved = scene(&shapes, Matrix::translate(30.25, 17.5));
    let (reused, outcomes) = render_gpu_with(&mut context, &moved, &params).unwrap();
    assert_eq!(outcomes, [DrawOutcome::SoftwareMask { cache_hit: true }; 2]);
    let stats = context.mask_cache().stats();
    assert_eq!((stats.hits, stats.misses), (2, 2));
    assert_eq!(stats.entries, 2);

    // The same scene from a cold cache.
    let fresh = render_gpu(&moved, &params).unwrap();
    assert!(fresh
        .outcomes
        .iter()
        .all(|o| *o == DrawOutcome::SoftwareMask { cache_hit: false }));
    compare(&fresh.pixmap, &reused, &params)
        .unwrap()
        .assert_identical()
        .unwrap();
}

#[test]
fn other_transforms_miss() {
    let params = TestParams::new("other_transforms_miss", 120, 100);
    let mut context = context(&params);
    let shapes = shapes();
    render_gpu_with(&mut context, &scene(&shapes, Matrix::IDENTITY), &params).unwrap();
    for matrix in [
        Matrix::translate(0.5, 0.),
        Matrix::scale(1.25, 1.),
        Matrix::from_row(1., 0.1, 0., 0., 1., 0.),
    ] {
        let (_, outcomes) =
            render_gpu_with(&mut context, &scene(&shapes, matrix), &params).unwrap();
        assert_eq!(
            outcomes,
            [DrawOutcome::SoftwareMask { cache_hit: false }; 2],
            "{matrix:?}"
        );
    }
    let stats = context.mask_cache().stats();
    assert_eq!((stats.hits, stats.misses), (0, 8));
}

#[test]
fn dropped_paths_leave_the_cache() {
    let params = TestParams::new("dropped_paths_leave_the_cache", 120, 100);
    let mut context = context(&params);
    let items = shapes();
    render_gpu_with(&mut context, &items, &params).unwrap();
    assert_eq!(context.mask_cache().stats().entries, 2);
    context.mask_cache().purge_invalidated();
    assert_eq!(context.mask_cache().stats().invalidations, 0);

    drop(items);
    context.mask_cache().purge_invalidated();
    let stats = context.mask_cache().stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.invalidations, 2);
    assert_eq!(stats.bytes, 0);
}
