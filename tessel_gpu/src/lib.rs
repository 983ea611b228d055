// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path rendering for GPUs, down to the draw commands.
//!
//! A [`DrawContext`] takes one path draw at a time and records the [`Draw`]s a GPU would run
//! for it. Each draw is handled by the first renderer of a [`PathRendererChain`] that accepts it:
//!
//! - strokes are expanded from [stroke patches](stroke::StrokePatch), in one pass when the
//!   paint is opaque and otherwise marked in the stencil buffer first so overlaps blend once,
//! - convex fills are drawn as wedge [patches](patch::Patch) straight to the color buffer,
//! - other fills either stencil their curves and fill a CPU [triangulation](triangulator) of
//!   the inner polygon, or stencil every wedge and cover the bounds,
//! - everything else is rasterised on the CPU into an 8-bit mask, kept in a [`MaskCache`].
//!
//! Nothing here talks to a GPU. [`Replay`] executes a [`DrawList`] on the CPU with the stencil
//! semantics of the command layer, which is how the renderers are tested against the scan
//! converter of `tessel_cpu`.
//!
//! ## Features
//!
//! - `multithreading`: Rasterise software masks on the `rayon` thread pool. Draws sampling a
//!   mask must wait for it with [`DrawList::wait_for_uploads`] before they are submitted.

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
    reason = "Counts and pixel positions are clamped before narrowing"
)]

pub mod caps;
pub mod config;
mod context;
pub mod draw;
pub mod error;
pub mod mask_cache;
pub mod patch;
mod renderer;
mod replay;
pub mod stencil;
pub mod stroke;
pub mod tessellate;
pub mod triangulator;

pub use caps::Caps;
pub use config::{MaskCacheConfig, TessellationConfig};
pub use context::DrawContext;
pub use draw::{Draw, DrawList};
pub use error::{DrawError, TriangulationError};
pub use mask_cache::{MaskCache, MaskTexture};
pub use renderer::{
    CanDrawPath, DrawArgs, DrawOutcome, PathRenderer, PathRendererChain, RenderContext,
};
pub use replay::Replay;

static_assertions::assert_impl_all!(MaskCache: Send, Sync);
static_assertions::assert_impl_all!(MaskTexture: Send, Sync);
static_assertions::assert_impl_all!(DrawList: Send);
