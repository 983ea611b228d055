// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning parameters.
//!
//! None of these affect which pixels are drawn; they only move work between the CPU and the GPU
//! or bound memory use.

use tessel_common::flatten::FlattenParams;
use tessel_common::wangs_formula;

/// Parameters of curve tessellation and of the choice between fill strategies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TessellationConfig {
    /// The inverse of the flatness tolerance, in device pixels.
    pub precision: f32,
    /// The most segments a single curve is tessellated into. Longer curves are chopped first.
    pub max_segments_per_curve: u32,
    /// The cost of one unit of triangulation work (`n log n` in the verb count), in pixels.
    pub cpu_weight: f32,
    /// Paths covering fewer pixels than this are never triangulated on the CPU.
    pub min_pixel_count: f32,
    /// Strokes wider than this in device space are left to the software renderer.
    pub max_device_stroke_width: f32,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            precision: wangs_formula::DEFAULT_PRECISION,
            max_segments_per_curve: wangs_formula::DEFAULT_MAX_SEGMENTS,
            cpu_weight: 512.,
            min_pixel_count: 256. * 256.,
            max_device_stroke_width: 8192.,
        }
    }
}

impl TessellationConfig {
    /// The flattening parameters shared by every renderer.
    pub fn flatten_params(&self) -> FlattenParams {
        FlattenParams {
            precision: self.precision,
            max_segments: self.max_segments_per_curve,
        }
    }

    /// Whether triangulating the inner fan of a path with `verb_count` verbs on the CPU is
    /// cheaper than stencilling `pixel_count` pixels.
    pub fn prefers_triangulation(&self, verb_count: usize, pixel_count: f32) -> bool {
        let n = verb_count as f32;
        let cpu_work = n * wangs_formula::nextlog2(n) as f32;
        cpu_work * self.cpu_weight + self.min_pixel_count < pixel_count
    }
}

/// Parameters of the software mask cache.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskCacheConfig {
    /// The most bytes of mask data kept alive by the cache.
    pub max_bytes: usize,
    /// A mask is only cached when its full size is at most this multiple of its visible size.
    pub oversize_factor: f32,
    /// Rasterise masks on a worker thread when the `multithreading` feature is enabled.
    pub deferred: bool,
}

impl Default for MaskCacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 16 << 20,
            oversize_factor: 2.,
            deferred: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_paths_prefer_triangulation() {
        let config = TessellationConfig::default();
        assert!(!config.prefers_triangulation(20, 100. * 100.));
        assert!(config.prefers_triangulation(20, 1000. * 1000.));
        let never = TessellationConfig {
            min_pixel_count: f32::INFINITY,
            ..config
        };
        assert!(!never.prefers_triangulation(1, 1e12));
        let always = TessellationConfig {
            cpu_weight: 0.,
            min_pixel_count: 0.,
            ..config
        };
        assert!(always.prefers_triangulation(1000, 1.));
    }
}
