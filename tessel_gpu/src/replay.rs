// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reference executor for draw lists.
//!
//! The replay runs every draw on a color and an 8-bit stencil buffer the way a GPU with one
//! sample per pixel would: patches are evaluated like the tessellation shaders evaluate them, and
//! a pixel belongs to a triangle when its sample point is inside according to the same rule the
//! aliased scan converter uses. The stencil test of a fragment runs before its color write, per
//! triangle, in submission order.

use crate::caps::Caps;
use crate::draw::{Draw, DrawData, DrawList, Program};
use crate::stroke;
use crate::tessellate;
use log::warn;
use tessel_common::color::PremulRgba8;
use tessel_common::flatten::FlattenParams;
use tessel_common::geometry::{IntRect, Point, Rect};
use tessel_common::pixmap::Pixmap;
use tessel_common::sample;

/// A color target with a stencil buffer, written by replaying draws.
#[derive(Debug)]
pub struct Replay {
    target: Pixmap,
    stencil: Vec<u8>,
    infinity_support: bool,
    params: FlattenParams,
    scratch: Vec<[Point; 3]>,
}

impl Replay {
    /// A cleared target. Patches are evaluated with `params`, which must match the parameters
    /// they were written with.
    pub fn new(width: u16, height: u16, caps: &Caps, params: FlattenParams) -> Self {
        Self {
            target: Pixmap::new(width, height),
            stencil: vec![0; usize::from(width) * usize::from(height)],
            infinity_support: caps.infinity_support,
            params,
            scratch: Vec::new(),
        }
    }

    /// The color buffer.
    pub fn pixmap(&self) -> &Pixmap {
        &self.target
    }

    /// Take the color buffer.
    pub fn into_pixmap(self) -> Pixmap {
        self.target
    }

    /// The stencil buffer, in row-major order.
    pub fn stencil(&self) -> &[u8] {
        &self.stencil
    }

    /// Set every color to `color` and every stencil value to zero.
    pub fn clear(&mut self, color: PremulRgba8) {
        self.target.clear(color);
        self.stencil.fill(0);
    }

    fn bounds(&self) -> IntRect {
        IntRect::from_ltrb(
            0,
            0,
            i32::from(self.target.width()),
            i32::from(self.target.height()),
        )
    }

    /// Wait for the masks the list samples, then run every draw.
    pub fn replay(&mut self, list: &DrawList) {
        list.wait_for_uploads();
        for draw in list.draws() {
            self.draw(draw);
        }
    }

    /// Run one draw. Masks it samples must be ready.
    pub fn draw(&mut self, draw: &Draw) {
        let bounds = match draw.scissor {
            Some(scissor) => scissor.intersect(&self.bounds()),
            None => Some(self.bounds()),
        };
        let Some(bounds) = bounds else {
            return;
        };
        let mut triangles = core::mem::take(&mut self.scratch);
        triangles.clear();
        match &draw.data {
            DrawData::Triangles(t) => triangles.extend_from_slice(t),
            DrawData::Patches(patches) => {
                for patch in patches {
                    if draw.program == Program::Wedge {
                        tessellate::wedge_triangles(
                            patch,
                            self.infinity_support,
                            &self.params,
                            &mut triangles,
                        );
                    } else {
                        tessellate::curve_triangles(
                            patch,
                            self.infinity_support,
                            &self.params,
                            &mut triangles,
                        );
                    }
                }
            }
            DrawData::StrokePatches { patches, matrix } => {
                for patch in patches {
                    stroke::stroke_triangles(
                        patch,
                        self.infinity_support,
                        matrix,
                        &self.params,
                        &mut triangles,
                    );
                }
            }
            DrawData::Rects(rects) => {
                for rect in rects {
                    let [tl, tr, br, bl] = rect.corners();
                    triangles.push([tl, tr, br]);
                    triangles.push([tl, br, bl]);
                }
            }
            DrawData::Mask {
                texture,
                origin,
                rect,
            } => {
                let Some(mask) = texture.mask() else {
                    warn!("Skipping a draw of a mask that was never written");
                    return;
                };
                let Some(rect) = rect.intersect(&bounds) else {
                    return;
                };
                for y in rect.top..rect.bottom {
                    for x in rect.left..rect.right {
                        let coverage = mask.sample(x - origin.0, y - origin.1);
                        self.fragment(draw, x, y, true, coverage);
                    }
                }
                return;
            }
        }
        for triangle in &triangles {
            self.triangle(draw, triangle, bounds);
        }
        self.scratch = triangles;
    }

    fn triangle(&mut self, draw: &Draw, &[a, b, c]: &[Point; 3], bounds: IntRect) {
        let area = (f64::from(b.x) - f64::from(a.x)) * (f64::from(c.y) - f64::from(a.y))
            - (f64::from(b.y) - f64::from(a.y)) * (f64::from(c.x) - f64::from(a.x));
        if area == 0. || !area.is_finite() {
            return;
        }
        let Some(rect) = Rect::from_points(&[a, b, c]).round_out().intersect(&bounds) else {
            return;
        };
        for y in rect.top..rect.bottom {
            let mut entered = false;
            for x in rect.left..rect.right {
                let winding = sample::triangle_winding(a, b, c, x, y);
                if winding == 0 {
                    // Triangles are convex, so a row's coverage is one run.
                    if entered {
                        break;
                    }
                    continue;
                }
                entered = true;
                self.fragment(draw, x, y, winding > 0, 255);
            }
        }
    }

    fn fragment(&mut self, draw: &Draw, x: i32, y: i32, clockwise: bool, coverage: u8) {
        let idx = y as usize * usize::from(self.target.width()) + x as usize;
        let passed = match draw.stencil.face(clockwise) {
            Some(face) => {
                let (passed, value) = face.run(self.stencil[idx]);
                self.stencil[idx] = value;
                passed
            }
            None => true,
        };
        if passed && draw.color_write && coverage > 0 {
            self.target.blend_pixel(x, y, draw.color, coverage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::{self, StencilSettings};

    const RED: PremulRgba8 = PremulRgba8 {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };

    fn replay_target() -> Replay {
        Replay::new(16, 16, &Caps::default(), FlattenParams::default())
    }

    fn covered(replay: &Replay) -> usize {
        replay.pixmap().data().iter().filter(|p| p.a != 0).count()
    }

    #[test]
    fn rects_cover_pixel_centers() {
        let mut replay = replay_target();
        replay.draw(&Draw::rects(
            vec![Rect::from_ltrb(2., 2., 6.25, 4.)],
            StencilSettings::Disabled,
            RED,
            IntRect::from_ltrb(0, 0, 16, 16),
        ));
        assert_eq!(covered(&replay), 4 * 2);
        assert_eq!(replay.pixmap().get(5, 2), Some(RED));
        assert_eq!(replay.pixmap().get(6, 2).map(|p| p.a), Some(0));
    }

    #[test]
    fn scissor_discards_fragments() {
        let mut replay = replay_target();
        replay.draw(&Draw::rects(
            vec![Rect::from_ltrb(0., 0., 16., 16.)],
            StencilSettings::Disabled,
            RED,
            IntRect::from_ltrb(4, 4, 8, 6),
        ));
        assert_eq!(covered(&replay), 4 * 2);
    }

    #[test]
    fn opposite_triangles_cancel_in_the_stencil() {
        let mut replay = replay_target();
        let clip = IntRect::from_ltrb(0, 0, 16, 16);
        let cw = [Point::new(0., 0.), Point::new(16., 0.), Point::new(0., 15.)];
        let ccw = [cw[0], cw[2], cw[1]];
        replay.draw(&Draw::triangles(vec![cw, ccw], stencil::INCR_DECR, false, RED, clip));
        assert!(replay.stencil().iter().all(|&s| s == 0));
        assert_eq!(covered(&replay), 0);

        replay.draw(&Draw::triangles(vec![cw], stencil::INCR_DECR, false, RED, clip));
        replay.draw(&Draw::rects(
            vec![Rect::from_ltrb(0., 0., 16., 16.)],
            stencil::TEST_AND_RESET,
            RED,
            clip,
        ));
        assert!(replay.stencil().iter().all(|&s| s == 0));

        let mut direct = replay_target();
        direct.draw(&Draw::triangles(vec![cw], StencilSettings::Disabled, true, RED, clip));
        assert!(covered(&direct) > 100);
        assert_eq!(replay.pixmap().data(), direct.pixmap().data());
    }
}
