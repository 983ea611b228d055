// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tessel_common::error::PathError;
use thiserror::Error;

/// Why a renderer failed to record a draw it had accepted.
///
/// The draw is dropped; nothing it recorded is kept.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    /// The geometry could not be brought into device space.
    #[error("Couldn't prepare the path: {0}")]
    Path(#[from] PathError),
    /// A mask would be larger than the largest texture.
    #[error("Mask of {width}x{height} exceeds the maximum texture size of {max}")]
    MaskTooLarge {
        /// The width of the mask.
        width: u32,
        /// The height of the mask.
        height: u32,
        /// The maximum texture size.
        max: u32,
    },
    /// The draw lands outside the addressable device space.
    #[error("The draw lies outside of the device coordinate range")]
    OutOfRange,
    /// The draw needs a stencil buffer, but the target has none.
    #[error("The draw needs a stencil buffer")]
    NoStencil,
    /// The renderer was asked to draw something it declines.
    #[error("The renderer cannot draw this path")]
    Unsupported,
}

/// Why the inner fan of a path could not be triangulated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangulationError {
    /// Edges cross, and breadcrumbs were not requested.
    #[error("The polygon intersects itself")]
    SelfIntersection,
    /// A region is wound more than once, and breadcrumbs were not requested.
    #[error("A region of the polygon has winding number {0}")]
    ComplexWinding(i32),
    /// Splitting edges at their crossings did not converge.
    #[error("Couldn't resolve the crossings of the polygon")]
    Unresolved,
    /// A vertex is not finite.
    #[error("The polygon has a non-finite vertex")]
    NonFinite,
}
