// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while constructing or transforming path geometry.

use thiserror::Error;

/// The reason a [`PathData`](crate::path_data::PathData) could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// A verb appeared where the contour grammar does not allow it.
    #[error("verb {index} does not follow the contour grammar")]
    InvalidVerbSequence {
        /// Index of the offending verb.
        index: usize,
    },
    /// The number of points does not match the verbs.
    #[error("verbs require {expected} points, got {actual}")]
    PointCountMismatch {
        /// Points implied by the verbs.
        expected: usize,
        /// Points supplied.
        actual: usize,
    },
    /// The number of conic weights does not match the conic verbs.
    #[error("verbs require {expected} conic weights, got {actual}")]
    ConicWeightCountMismatch {
        /// Weights implied by the verbs.
        expected: usize,
        /// Weights supplied.
        actual: usize,
    },
    /// A point coordinate or a conic weight is NaN or infinite.
    #[error("path contains a non-finite value")]
    NonFinite,
    /// A conic weight is zero or negative.
    #[error("conic weight must be positive")]
    InvalidConicWeight,
    /// A perspective matrix maps part of the path behind the viewer.
    #[error("path maps behind the viewer")]
    BehindViewer,
}
