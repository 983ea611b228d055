// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate converts device space paths into coverage spans.
//!
//! The [`ScanConverter`] walks an edge list sorted by top, then x at the top, then slope, and
//! hands the covered x-intervals of every row to a [`Blitter`]. Aliased fills sample each pixel
//! once at its center using the rule in [`tessel_common::sample`]; anti-aliased fills sample a
//! 4×4 grid per pixel and report fractional coverage.
//!
//! Blitters for 8-bit masks ([`MaskBlitter`]) and RGBA pixmaps ([`PixmapBlitter`]) are included;
//! any other pixel format only needs to implement [`Blitter`].

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    reason = "We cast coverage sums to u8 in places where we know for sure that they're < 256"
)]

mod blitter;
pub mod edge;
mod mask;
mod scan;

pub use blitter::{Blitter, MaskBlitter, PixmapBlitter};
pub use mask::rasterize_mask;
pub use scan::ScanConverter;
