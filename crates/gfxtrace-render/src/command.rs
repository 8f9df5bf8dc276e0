// SPDX-License-Identifier: CEPL-1.0
use crate::handle::{Resource, ResourceView};
use crate::resource::{ResourceUsage, SubresourceBox};
use bytemuck::{Pod, Zeroable};

u32_enum!(RenderPassLoadOp {
    LOAD = 0,
    CLEAR = 1,
    DISCARD = 2,
    NO_ACCESS = 3,
});

u32_enum!(RenderPassStoreOp {
    STORE = 0,
    DISCARD = 1,
    NO_ACCESS = 2,
});

u32_enum!(IndirectCommand {
    UNKNOWN = 0,
    DRAW = 1,
    DRAW_INDEXED = 2,
    DISPATCH = 3,
});

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// State transition of one resource.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Barrier {
    pub resource: Resource,
    pub old_state: ResourceUsage,
    pub new_state: ResourceUsage,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderPassRenderTargetDesc {
    pub view: ResourceView,
    pub load_op: RenderPassLoadOp,
    pub store_op: RenderPassStoreOp,
    pub clear_color: [f32; 4],
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderPassDepthStencilDesc {
    pub view: ResourceView,
    pub depth_load_op: RenderPassLoadOp,
    pub depth_store_op: RenderPassStoreOp,
    pub stencil_load_op: RenderPassLoadOp,
    pub stencil_store_op: RenderPassStoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub buffer: Resource,
    pub offset: u64,
    pub stride: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct StreamOutputBinding {
    pub buffer: Resource,
    pub offset: u64,
    pub max_size: u64,
    pub counter_buffer: Resource,
    pub counter_offset: u64,
}

/// A texture subresource, optionally restricted to a box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureRegion {
    pub resource: Resource,
    pub subresource: u32,
    pub region: Option<SubresourceBox>,
}

/// Linear texel layout inside a buffer. Zero row length or slice height means tightly packed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferFootprint {
    pub buffer: Resource,
    pub offset: u64,
    pub row_length: u32,
    pub slice_height: u32,
}
