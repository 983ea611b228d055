// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A path: shared geometry plus a fill type.

use crate::geometry::Rect;
use crate::path_data::{PathData, FILL_TYPE_BITS};
use peniko::Fill;

/// Which points a filled path covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FillType {
    /// Inside where the winding number is non-zero.
    #[default]
    Winding,
    /// Inside where the winding number is odd.
    EvenOdd,
    /// Outside of [`FillType::Winding`].
    InverseWinding,
    /// Outside of [`FillType::EvenOdd`].
    InverseEvenOdd,
}

impl FillType {
    /// Whether the fill covers the outside of the path.
    pub fn is_inverse(self) -> bool {
        matches!(self, Self::InverseWinding | Self::InverseEvenOdd)
    }

    /// Whether the winding number is taken modulo two.
    pub fn is_even_odd(self) -> bool {
        matches!(self, Self::EvenOdd | Self::InverseEvenOdd)
    }

    /// The same rule without inversion.
    #[must_use]
    pub fn to_non_inverse(self) -> Self {
        match self {
            Self::Winding | Self::InverseWinding => Self::Winding,
            Self::EvenOdd | Self::InverseEvenOdd => Self::EvenOdd,
        }
    }

    /// The same rule with inversion toggled.
    #[must_use]
    pub fn toggle_inverse(self) -> Self {
        match self {
            Self::Winding => Self::InverseWinding,
            Self::EvenOdd => Self::InverseEvenOdd,
            Self::InverseWinding => Self::Winding,
            Self::InverseEvenOdd => Self::EvenOdd,
        }
    }

    /// Whether a winding number is inside.
    pub fn contains(self, winding: i32) -> bool {
        let inside = if self.is_even_odd() {
            winding & 1 != 0
        } else {
            winding != 0
        };
        inside != self.is_inverse()
    }

    fn bits(self) -> u32 {
        match self {
            Self::Winding => 0,
            Self::EvenOdd => 1,
            Self::InverseWinding => 2,
            Self::InverseEvenOdd => 3,
        }
    }
}

impl From<Fill> for FillType {
    fn from(fill: Fill) -> Self {
        match fill {
            Fill::NonZero => Self::Winding,
            Fill::EvenOdd => Self::EvenOdd,
        }
    }
}

/// Geometry and fill type.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    data: PathData,
    fill_type: FillType,
}

impl Path {
    /// Create a path.
    pub fn new(data: PathData, fill_type: FillType) -> Self {
        Self { data, fill_type }
    }

    /// The geometry.
    pub fn data(&self) -> &PathData {
        &self.data
    }

    /// The fill type.
    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    /// The same geometry with another fill type.
    #[must_use]
    pub fn with_fill_type(&self, fill_type: FillType) -> Self {
        Self::new(self.data.clone(), fill_type)
    }

    /// Whether the fill covers the outside.
    pub fn is_inverse_fill(&self) -> bool {
        self.fill_type.is_inverse()
    }

    /// The bounds of all points.
    pub fn bounds(&self) -> Rect {
        self.data.bounds()
    }

    /// An identifier of the geometry and fill type together, never zero.
    ///
    /// Changes whenever either changes, so it can key cached renderings.
    pub fn generation_id(&self) -> u32 {
        debug_assert_eq!(self.data.unique_id() & ((1 << FILL_TYPE_BITS) - 1), 0);
        self.data.unique_id() | self.fill_type.bits()
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new(PathData::empty(), FillType::Winding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn generation_id_tracks_fill_type() {
        let data = PathData::line(Point::ZERO, Point::new(1., 1.)).unwrap();
        let a = Path::new(data.clone(), FillType::Winding);
        let b = a.with_fill_type(FillType::InverseEvenOdd);
        assert_ne!(a.generation_id(), b.generation_id());
        assert_eq!(a.generation_id() & !3, b.generation_id() & !3);
        assert_eq!(
            a.generation_id(),
            Path::new(data, FillType::Winding).generation_id()
        );
    }

    #[test]
    fn fill_rules() {
        assert!(FillType::Winding.contains(-2));
        assert!(!FillType::EvenOdd.contains(-2));
        assert!(FillType::InverseWinding.contains(0));
        assert!(!FillType::InverseEvenOdd.contains(3));
        assert_eq!(FillType::from(Fill::EvenOdd), FillType::EvenOdd);
    }
}
