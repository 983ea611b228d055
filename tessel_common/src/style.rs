// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill and stroke styles.

use crate::kurbo;
use log::warn;

pub use kurbo::{Cap, Join};

/// The outline of a stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Width in local coordinates. Zero draws a hairline one device pixel wide.
    pub width: f32,
    /// How segments meet.
    pub join: Join,
    /// How open contours end.
    pub cap: Cap,
    /// The longest miter, as a multiple of half the width, before falling back to a bevel.
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.,
            join: Join::Miter,
            cap: Cap::Butt,
            miter_limit: 4.,
        }
    }
}

impl StrokeStyle {
    /// A hairline with the given cap.
    pub fn hairline(cap: Cap) -> Self {
        Self {
            width: 0.,
            cap,
            ..Self::default()
        }
    }

    /// Whether this is a hairline.
    pub fn is_hairline(&self) -> bool {
        self.width == 0.
    }

    /// Whether the stroke can be drawn at all: a finite width that is not negative.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.width >= 0.
    }
}

impl From<&kurbo::Stroke> for StrokeStyle {
    fn from(stroke: &kurbo::Stroke) -> Self {
        if !stroke.dash_pattern.is_empty() {
            warn!("Dashed strokes are not supported, drawing the stroke solid.");
        }
        Self {
            width: stroke.width as f32,
            join: stroke.join,
            cap: stroke.start_cap,
            miter_limit: stroke.miter_limit as f32,
        }
    }
}

/// How a path is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Style {
    /// Fill the interior according to the path's fill type.
    #[default]
    Fill,
    /// Stroke the outline.
    Stroke(StrokeStyle),
}

impl Style {
    /// Whether this is a fill.
    pub fn is_fill(&self) -> bool {
        matches!(self, Self::Fill)
    }

    /// The stroke parameters, if this is a stroke.
    pub fn stroke(&self) -> Option<&StrokeStyle> {
        match self {
            Self::Fill => None,
            Self::Stroke(stroke) => Some(stroke),
        }
    }

    /// A compact description of the style, equal for styles that rasterise identically.
    pub fn key(&self) -> StyleKey {
        match self {
            Self::Fill => StyleKey::Fill,
            Self::Stroke(s) => StyleKey::Stroke {
                width_bits: s.width.to_bits(),
                join: join_bits(s.join),
                cap: cap_bits(s.cap),
                miter_bits: if s.join == Join::Miter {
                    s.miter_limit.to_bits()
                } else {
                    0
                },
            },
        }
    }
}

fn join_bits(join: Join) -> u8 {
    match join {
        Join::Bevel => 0,
        Join::Miter => 1,
        Join::Round => 2,
    }
}

fn cap_bits(cap: Cap) -> u8 {
    match cap {
        Cap::Butt => 0,
        Cap::Square => 1,
        Cap::Round => 2,
    }
}

/// The hashable part of a [`Style`] that influences coverage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKey {
    /// A fill.
    Fill,
    /// A stroke, with its parameters as raw bits.
    Stroke {
        /// The width as `f32` bits.
        width_bits: u32,
        /// The join.
        join: u8,
        /// The cap.
        cap: u8,
        /// The miter limit as `f32` bits, zero for other joins.
        miter_bits: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miter_limit_only_matters_for_miters() {
        let a = Style::Stroke(StrokeStyle {
            join: Join::Round,
            miter_limit: 2.,
            ..StrokeStyle::default()
        });
        let b = Style::Stroke(StrokeStyle {
            join: Join::Round,
            miter_limit: 9.,
            ..StrokeStyle::default()
        });
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Style::Fill.key());
    }

    #[test]
    fn from_kurbo_stroke() {
        let stroke = kurbo::Stroke::new(3.).with_caps(Cap::Round).with_join(Join::Bevel);
        let style = StrokeStyle::from(&stroke);
        assert_eq!(style.width, 3.);
        assert_eq!(style.cap, Cap::Round);
        assert_eq!(style.join, Join::Bevel);
        assert!(StrokeStyle::hairline(Cap::Butt).is_hairline());
    }

    #[test]
    fn negative_and_non_finite_widths_are_invalid() {
        let width = |width| StrokeStyle {
            width,
            ..StrokeStyle::default()
        };
        assert!(width(0.).is_valid());
        assert!(width(2.5).is_valid());
        assert!(!width(-1.).is_valid());
        assert!(!width(f32::NAN).is_valid());
        assert!(!width(f32::INFINITY).is_valid());
    }
}
