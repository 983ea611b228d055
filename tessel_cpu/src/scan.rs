// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filling paths.

use crate::blitter::Blitter;
use crate::edge::EdgeList;
use log::trace;
use tessel_common::flatten::{self, FlattenParams, Line};
use tessel_common::geometry::{IntRect, Point};
use tessel_common::path::Path;

/// Supersampling factor of anti-aliased fills, per axis, as a shift.
const SUPERSAMPLE_SHIFT: u32 = 2;
const SCALE: i32 = 1 << SUPERSAMPLE_SHIFT;
const MAX_COVERAGE: u16 = (SCALE * SCALE) as u16;
/// Pixels whose supersampled coordinates fit in an `i32`, with room for one more pixel.
const ANTI_ALIAS_LIMIT: i32 = i32::MAX >> (SUPERSAMPLE_SHIFT + 1);
const ANTI_ALIAS_RANGE: IntRect = IntRect::from_ltrb(
    -ANTI_ALIAS_LIMIT,
    -ANTI_ALIAS_LIMIT,
    ANTI_ALIAS_LIMIT,
    ANTI_ALIAS_LIMIT,
);

/// Converts device space paths into spans, reusing its buffers between fills.
#[derive(Debug, Default)]
pub struct ScanConverter {
    params: FlattenParams,
    lines: Vec<Line>,
    edges: EdgeList,
    coverage: Vec<u16>,
    alphas: Vec<u8>,
}

impl ScanConverter {
    /// A scan converter flattening curves with `params`.
    ///
    /// Use the same parameters as the GPU renderers to get the same polygons.
    pub fn new(params: FlattenParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// The flattening parameters.
    pub fn params(&self) -> &FlattenParams {
        &self.params
    }

    /// The rows and columns a fill of `path` can touch within `clip`.
    fn fill_bounds(path: &Path, clip: &IntRect) -> Option<IntRect> {
        if path.is_inverse_fill() {
            (!clip.is_empty()).then_some(*clip)
        } else {
            path.bounds().round_out().intersect(clip)
        }
    }

    /// Fill `path`, in device space, with one sample per pixel.
    ///
    /// Pixels whose center lies inside the path according to its fill type are reported to
    /// `blitter` as full spans. Inverse fills cover the rest of `clip`. Nothing is reported when
    /// the path and the clip do not overlap.
    pub fn fill_path(&mut self, path: &Path, clip: &IntRect, blitter: &mut impl Blitter) {
        let Some(bounds) = Self::fill_bounds(path, clip) else {
            trace!("Fill outside of the clip, skipping it.");
            return;
        };
        flatten::fill(path.data(), &self.params, &mut self.lines);
        self.edges.reset(self.lines.iter().copied());
        let fill = path.fill_type();
        self.edges.start(bounds.top);
        for y in bounds.top..bounds.bottom {
            self.edges
                .row_spans(y, bounds.left, bounds.right, fill, |x0, x1| {
                    blitter.blit_h(x0, y, (x1 - x0) as u32);
                });
        }
    }

    /// Fill `path`, in device space, with 16 samples per pixel.
    ///
    /// Fully covered runs are reported with [`Blitter::blit_h`], partially covered ones with
    /// [`Blitter::blit_anti_h`].
    pub fn anti_fill_path(&mut self, path: &Path, clip: &IntRect, blitter: &mut impl Blitter) {
        let Some(bounds) =
            Self::fill_bounds(path, clip).and_then(|b| b.intersect(&ANTI_ALIAS_RANGE))
        else {
            trace!("Anti-aliased fill outside of the clip, skipping it.");
            return;
        };
        flatten::fill(path.data(), &self.params, &mut self.lines);
        let scale = SCALE as f32;
        let up = |p: Point| Point::new(p.x * scale, p.y * scale);
        self.edges
            .reset(self.lines.iter().map(|l| Line::new(up(l.p0), up(l.p1))));

        let fill = path.fill_type();
        let width = bounds.width() as usize;
        let (left, right) = (bounds.left * SCALE, bounds.right * SCALE);
        self.coverage.clear();
        self.coverage.resize(width, 0);
        self.edges.start(bounds.top * SCALE);
        for y in bounds.top..bounds.bottom {
            for sub in 0..SCALE {
                let coverage = &mut self.coverage;
                self.edges
                    .row_spans(y * SCALE + sub, left, right, fill, |x0, x1| {
                        accumulate(coverage, x0 - left, x1 - left);
                    });
            }
            emit_row(
                &mut self.coverage,
                &mut self.alphas,
                bounds.left,
                y,
                blitter,
            );
        }
    }
}

/// Add the supersampled span `x0..x1`, relative to the row start, to per-pixel sample counts.
fn accumulate(coverage: &mut [u16], x0: i32, x1: i32) {
    let (first, last) = (x0 >> SUPERSAMPLE_SHIFT, (x1 - 1) >> SUPERSAMPLE_SHIFT);
    if first == last {
        coverage[first as usize] += (x1 - x0) as u16;
        return;
    }
    coverage[first as usize] += (SCALE - (x0 & (SCALE - 1))) as u16;
    for c in &mut coverage[first as usize + 1..last as usize] {
        *c += SCALE as u16;
    }
    coverage[last as usize] += (x1 - (last << SUPERSAMPLE_SHIFT)) as u16;
}

fn to_alpha(samples: u16) -> u8 {
    ((u32::from(samples) * 255 + u32::from(MAX_COVERAGE) / 2) / u32::from(MAX_COVERAGE)) as u8
}

/// Report one row of accumulated sample counts and reset them.
fn emit_row(
    coverage: &mut [u16],
    alphas: &mut Vec<u8>,
    left: i32,
    y: i32,
    blitter: &mut impl Blitter,
) {
    let mut x = 0;
    while x < coverage.len() {
        let c = coverage[x];
        let start = x;
        if c == 0 {
            x += 1;
            continue;
        }
        if c == MAX_COVERAGE {
            while x < coverage.len() && coverage[x] == MAX_COVERAGE {
                x += 1;
            }
            blitter.blit_h(left + start as i32, y, (x - start) as u32);
        } else {
            alphas.clear();
            while x < coverage.len() && coverage[x] != 0 && coverage[x] != MAX_COVERAGE {
                alphas.push(to_alpha(coverage[x]));
                x += 1;
            }
            blitter.blit_anti_h(left + start as i32, y, alphas);
        }
    }
    coverage.fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blitter::MaskBlitter;
    use tessel_common::geometry::{PathDirection, Rect};
    use tessel_common::path::FillType;
    use tessel_common::path_builder::PathBuilder;
    use tessel_common::path_data::PathData;
    use tessel_common::pixmap::AlphaMask;

    fn fill(path: &Path, clip: IntRect, aa: bool) -> AlphaMask {
        let mut blitter = MaskBlitter::new(clip);
        let mut scan = ScanConverter::default();
        if aa {
            scan.anti_fill_path(path, &clip, &mut blitter);
        } else {
            scan.fill_path(path, &clip, &mut blitter);
        }
        blitter.into_mask()
    }

    fn rect_path(r: Rect, fill_type: FillType) -> Path {
        Path::new(PathData::rect(&r, PathDirection::Cw, 0).unwrap(), fill_type)
    }

    #[derive(Default)]
    struct Recorder(Vec<(i32, i32, u32)>);

    impl Blitter for Recorder {
        fn blit_h(&mut self, x: i32, y: i32, width: u32) {
            self.0.push((x, y, width));
        }

        fn blit_anti_h(&mut self, x: i32, y: i32, coverage: &[u8]) {
            self.0.push((x, y, coverage.len() as u32));
        }
    }

    #[test]
    fn aliased_rect_covers_exact_pixels() {
        let path = rect_path(Rect::from_ltrb(1., 1., 4., 3.), FillType::Winding);
        let mask = fill(&path, IntRect::from_ltrb(0, 0, 5, 4), false);
        #[rustfmt::skip]
        let expected = [
            0, 0, 0, 0, 0,
            0, 255, 255, 255, 0,
            0, 255, 255, 255, 0,
            0, 0, 0, 0, 0,
        ];
        assert_eq!(mask.data(), &expected);
    }

    #[test]
    fn pixel_centers_decide_aliased_coverage() {
        // Covers the centers of pixels 1 and 2 only.
        let path = rect_path(Rect::from_ltrb(0.6, 0., 2.5, 1.), FillType::Winding);
        let mask = fill(&path, IntRect::from_ltrb(0, 0, 4, 1), false);
        assert_eq!(mask.data(), &[0, 255, 255, 0]);
    }

    #[test]
    fn anti_aliased_edges_get_partial_coverage() {
        let path = rect_path(Rect::from_ltrb(0.5, 0., 2., 1.), FillType::Winding);
        let mask = fill(&path, IntRect::from_ltrb(0, 0, 3, 1), true);
        assert_eq!(mask.data(), &[128, 255, 0]);
    }

    #[test]
    fn outside_the_clip_is_a_no_op() {
        let path = rect_path(Rect::from_ltrb(50., 50., 60., 60.), FillType::Winding);
        let mut recorder = Recorder::default();
        let mut scan = ScanConverter::default();
        scan.fill_path(&path, &IntRect::from_ltrb(0, 0, 10, 10), &mut recorder);
        scan.anti_fill_path(&path, &IntRect::from_ltrb(0, 0, 10, 10), &mut recorder);
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn inverse_fill_covers_the_rest_of_the_clip() {
        let path = rect_path(Rect::from_ltrb(1., 1., 2., 2.), FillType::InverseWinding);
        let mask = fill(&path, IntRect::from_ltrb(0, 0, 3, 3), false);
        assert_eq!(mask.data(), &[255, 255, 255, 255, 0, 255, 255, 255, 255]);
        let far = rect_path(
            Rect::from_ltrb(50., 50., 60., 60.),
            FillType::InverseWinding,
        );
        let mask = fill(&far, IntRect::from_ltrb(0, 0, 2, 2), true);
        assert_eq!(mask.data(), &[255; 4]);
    }

    #[test]
    fn opposing_loops_cancel_under_winding() {
        // A figure eight whose loops overlap in 40..60 with opposite orientation.
        let mut b = PathBuilder::new();
        b.add_rect(&Rect::from_ltrb(0., 0., 60., 10.), PathDirection::Cw, 0)
            .add_rect(&Rect::from_ltrb(40., 0., 100., 10.), PathDirection::Ccw, 0);
        let path = Path::new(b.build().unwrap(), FillType::Winding);
        let mut recorder = Recorder::default();
        ScanConverter::default().fill_path(&path, &IntRect::from_ltrb(0, 0, 100, 1), &mut recorder);
        assert_eq!(recorder.0, [(0, 0, 40), (60, 0, 40)]);
    }

    #[test]
    fn spans_do_not_overlap_on_shared_edges() {
        // Two squares sharing the vertical edge x = 5 fill every pixel once.
        let mut b = PathBuilder::new();
        b.add_rect(&Rect::from_ltrb(0., 0., 5., 4.), PathDirection::Cw, 0)
            .add_rect(&Rect::from_ltrb(5., 0., 10., 4.), PathDirection::Cw, 0);
        let path = Path::new(b.build().unwrap(), FillType::EvenOdd);
        let mut recorder = Recorder::default();
        ScanConverter::default().fill_path(&path, &IntRect::from_ltrb(0, 0, 10, 4), &mut recorder);
        assert_eq!(recorder.0.len(), 4);
        assert!(recorder.0.iter().all(|&(x, _, w)| x == 0 && w == 10));
    }

    #[test]
    fn circle_coverage_is_symmetric() {
        let circle = {
            let mut b = PathBuilder::new();
            b.add_circle(Point::new(16., 16.), 10., PathDirection::Cw);
            Path::new(b.build().unwrap(), FillType::Winding)
        };
        let mask = fill(&circle, IntRect::from_ltrb(0, 0, 32, 32), true);
        // Mirrored pixels differ by at most one sample.
        for y in 0..32 {
            for x in 0..32 {
                let (a, b) = (mask.sample(x, y), mask.sample(31 - x, y));
                assert!(a.abs_diff(b) <= 16, "({x}, {y}): {a} vs {b}");
            }
        }
        assert_eq!(mask.sample(16, 16), 255);
        assert_eq!(mask.sample(0, 0), 0);
    }

    #[test]
    fn anti_aliased_fills_stop_at_the_supersampled_range() {
        let path = rect_path(Rect::from_ltrb(0., 0., 1., 1.), FillType::InverseWinding);
        let mut scan = ScanConverter::default();

        let mut spans = Recorder::default();
        let far = IntRect::from_ltrb(i32::MAX - 8, 0, i32::MAX, 4);
        scan.anti_fill_path(&path, &far, &mut spans);
        assert!(spans.0.is_empty());

        let mut spans = Recorder::default();
        let edge = IntRect::from_ltrb(ANTI_ALIAS_LIMIT - 2, 2, ANTI_ALIAS_LIMIT + 2, 3);
        scan.anti_fill_path(&path, &edge, &mut spans);
        assert_eq!(spans.0, [(ANTI_ALIAS_LIMIT - 2, 2, 2)]);
    }
}
