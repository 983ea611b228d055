// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate includes the path geometry model and the numerical building blocks shared by
//! the Tessel CPU scan converter and the Tessel GPU path renderers.
//!
//! # Contents
//!
//! - [`PathData`][path_data::PathData]: an immutable, reference counted store of verbs, points and
//!   conic weights with cached bounds, segment mask and lazily computed convexity.
//! - [`PathBuilder`][path_builder::PathBuilder]: the only way to edit geometry, reusing a uniquely
//!   owned buffer in place and copying otherwise.
//! - [Wang's formula](wangs_formula), curve evaluation and [flattening](flatten), and the
//!   [pre-chop](chop) pass for oversized or perspective paths.
//! - Pixel buffers ([`Pixmap`][pixmap::Pixmap], [`AlphaMask`][pixmap::AlphaMask]) and the
//!   source-over blend shared by every rasterisation path so that they agree pixel for pixel.
//!
//! This crate acts as a foundation for `tessel_cpu` and `tessel_gpu`.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    reason = "We temporarily ignore those because the casts\
only break in edge cases, and some of them are also only related to conversions from f64 to f32."
)]

pub mod chop;
pub mod curve;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod matrix;
pub mod paint;
pub mod path;
pub mod path_builder;
pub mod path_data;
pub mod pixmap;
pub mod rrect;
pub mod sample;
pub(crate) mod shapes;
pub mod style;
pub mod wangs_formula;

pub use peniko;
pub use peniko::color;
pub use peniko::kurbo;
