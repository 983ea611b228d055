// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The draw commands recorded by the path renderers.
//!
//! A [`DrawList`] is the whole interface to the command layer: each [`Draw`] names a program,
//! a primitive type with its vertex and instance counts, the stencil and color-write state, the
//! scissor, and the data the program consumes.

use crate::mask_cache::MaskTexture;
use crate::patch::Patch;
use crate::stencil::StencilSettings;
use crate::stroke::StrokePatch;
use tessel_common::color::PremulRgba8;
use tessel_common::geometry::{IntRect, Point, Rect};
use tessel_common::matrix::Matrix;

/// The shader program of a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Plain triangles from the CPU.
    Triangles,
    /// Curve patches, each filled as a fan from its first point.
    CurveStencil,
    /// Wedge patches, each filled as a fan from its apex.
    Wedge,
    /// Rectangles covering stencilled regions.
    BoundingBox,
    /// Stroke patches expanded into triangle strips.
    StrokeStrip,
    /// A rectangle sampling an alpha mask.
    TextureMask,
}

/// How vertices form primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Independent triangles.
    Triangles,
    /// A triangle strip.
    TriangleStrip,
    /// Hardware tessellation patches of the given size.
    Patches {
        /// Control points per patch.
        control_points: u32,
    },
}

/// The counts of a draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DrawCall {
    /// Vertices per instance.
    pub vertex_count: u32,
    /// Instances, one for non-instanced draws.
    pub instance_count: u32,
}

/// The data a program consumes.
#[derive(Clone, Debug)]
pub enum DrawData {
    /// Triangles in device space.
    Triangles(Vec<[Point; 3]>),
    /// Curve or wedge patches.
    Patches(Vec<Patch>),
    /// Stroke patches, expanded in their local space and mapped by `matrix`.
    StrokePatches {
        /// The patches.
        patches: Vec<StrokePatch>,
        /// The local to device transform.
        matrix: Matrix,
    },
    /// Device space rectangles.
    Rects(Vec<Rect>),
    /// An alpha mask placed with its origin at `origin`, drawn over `rect`.
    Mask {
        /// The mask.
        texture: MaskTexture,
        /// The device position of the mask's upper left pixel.
        origin: (i32, i32),
        /// The pixels to draw.
        rect: IntRect,
    },
}

/// One draw command.
#[derive(Clone, Debug)]
pub struct Draw {
    /// The program.
    pub program: Program,
    /// The primitive type.
    pub primitive: PrimitiveType,
    /// Vertex and instance counts.
    pub call: DrawCall,
    /// Stencil state.
    pub stencil: StencilSettings,
    /// Whether fragments passing the stencil test write color.
    pub color_write: bool,
    /// The color of every fragment.
    pub color: PremulRgba8,
    /// Fragments outside are discarded.
    pub scissor: Option<IntRect>,
    /// The data.
    pub data: DrawData,
}

impl Draw {
    /// A draw of plain triangles.
    pub fn triangles(
        triangles: Vec<[Point; 3]>,
        stencil: StencilSettings,
        color_write: bool,
        color: PremulRgba8,
        scissor: IntRect,
    ) -> Self {
        let count = u32::try_from(triangles.len() * 3).unwrap_or(u32::MAX);
        Self {
            program: Program::Triangles,
            primitive: PrimitiveType::Triangles,
            call: DrawCall {
                vertex_count: count,
                instance_count: 1,
            },
            stencil,
            color_write,
            color,
            scissor: Some(scissor),
            data: DrawData::Triangles(triangles),
        }
    }

    /// A draw covering rectangles, two triangles each.
    pub fn rects(
        rects: Vec<Rect>,
        stencil: StencilSettings,
        color: PremulRgba8,
        scissor: IntRect,
    ) -> Self {
        let instance_count = u32::try_from(rects.len()).unwrap_or(u32::MAX);
        Self {
            program: Program::BoundingBox,
            primitive: PrimitiveType::TriangleStrip,
            call: DrawCall {
                vertex_count: 4,
                instance_count,
            },
            stencil,
            color_write: true,
            color,
            scissor: Some(scissor),
            data: DrawData::Rects(rects),
        }
    }

    /// The number of vertices the command layer processes.
    pub fn vertex_total(&self) -> u64 {
        u64::from(self.call.vertex_count) * u64::from(self.call.instance_count)
    }
}

/// The draws of a frame, in submission order.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    draws: Vec<Draw>,
    uploads: Vec<MaskTexture>,
}

impl DrawList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a draw. Masks it samples are registered as pending uploads.
    pub fn push(&mut self, draw: Draw) {
        if let DrawData::Mask { texture, .. } = &draw.data {
            if !self.uploads.iter().any(|t| t.ptr_eq(texture)) {
                self.uploads.push(texture.clone());
            }
        }
        self.draws.push(draw);
    }

    /// The draws.
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    /// Whether there are no draws.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// The masks the draws sample.
    pub fn uploads(&self) -> &[MaskTexture] {
        &self.uploads
    }

    /// Block until every mask the draws sample has been written.
    ///
    /// The command layer must call this before submitting draws that read masks.
    pub fn wait_for_uploads(&self) {
        for upload in &self.uploads {
            upload.wait();
        }
    }

    /// Remove all draws.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.uploads.clear();
    }
}
