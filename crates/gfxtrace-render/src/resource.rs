// SPDX-License-Identifier: CEPL-1.0
use crate::format::Format;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use std::ptr::NonNull;

/// Size argument meaning "up to the end of the buffer".
pub const WHOLE_SIZE: u64 = u64::MAX;

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceType {
    #[default]
    Unknown = 0,
    Buffer = 1,
    Texture1d = 2,
    Texture2d = 3,
    Texture3d = 4,
    Surface = 5,
}

impl TryFrom<u32> for ResourceType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => ResourceType::Unknown,
            1 => ResourceType::Buffer,
            2 => ResourceType::Texture1d,
            3 => ResourceType::Texture2d,
            4 => ResourceType::Texture3d,
            5 => ResourceType::Surface,
            other => return Err(other),
        })
    }
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct MemoryHeap(pub u32);

impl MemoryHeap {
    pub const UNKNOWN: Self = Self(0);
    pub const GPU_ONLY: Self = Self(1);
    pub const CPU_TO_GPU: Self = Self(2);
    pub const GPU_TO_CPU: Self = Self(3);
    pub const CPU_ONLY: Self = Self(4);
    pub const CUSTOM: Self = Self(5);
}

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    pub struct ResourceUsage: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const RENDER_TARGET = 0x4;
        const UNORDERED_ACCESS = 0x8;
        const DEPTH_STENCIL_WRITE = 0x10;
        const DEPTH_STENCIL_READ = 0x20;
        const DEPTH_STENCIL = 0x30;
        const SHADER_RESOURCE_NON_PIXEL = 0x40;
        const SHADER_RESOURCE_PIXEL = 0x80;
        const SHADER_RESOURCE = 0xC0;
        const STREAM_OUTPUT = 0x100;
        const INDIRECT_ARGUMENT = 0x200;
        const COPY_DEST = 0x400;
        const COPY_SOURCE = 0x800;
        const RESOLVE_DEST = 0x1000;
        const RESOLVE_SOURCE = 0x2000;
        const CONSTANT_BUFFER = 0x8000;
        const ACCELERATION_STRUCTURE = 0x40_0000;
        const GENERAL = 0x8000_0000;
        const PRESENT = 0x8000_0000 | 0x4 | 0x800;

        const _ = !0;
    }
}

impl ResourceUsage {
    pub const UNDEFINED: Self = Self::empty();
}

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    pub struct ResourceFlags: u32 {
        const GENERATE_MIPMAPS = 0x1;
        const CUBE_COMPATIBLE = 0x4;
        const DYNAMIC = 0x8;
        const SHARED = 0x2000;
        const SPARSE_BINDING = 0x2_0000;

        const _ = !0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub stride: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u16,
    /// Zero means "full mip chain" on backends that allow it.
    pub levels: u16,
    pub format: Format,
    pub samples: u16,
}

/// Description of a buffer or texture. Only the half selected by `ty` is meaningful.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceDesc {
    pub ty: ResourceType,
    pub buffer: BufferDesc,
    pub texture: TextureDesc,
    pub heap: MemoryHeap,
    pub usage: ResourceUsage,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    pub fn buffer(size: u64, heap: MemoryHeap, usage: ResourceUsage) -> Self {
        ResourceDesc {
            ty: ResourceType::Buffer,
            buffer: BufferDesc { size, stride: 0 },
            heap,
            usage,
            ..Default::default()
        }
    }

    pub fn texture(
        ty: ResourceType,
        width: u32,
        height: u32,
        depth_or_layers: u16,
        levels: u16,
        format: Format,
        usage: ResourceUsage,
    ) -> Self {
        ResourceDesc {
            ty,
            texture: TextureDesc {
                width,
                height,
                depth_or_layers,
                levels,
                format,
                samples: 1,
            },
            heap: MemoryHeap::GPU_ONLY,
            usage,
            ..Default::default()
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(
            self.ty,
            ResourceType::Texture1d
                | ResourceType::Texture2d
                | ResourceType::Texture3d
                | ResourceType::Surface
        )
    }

    /// Mip levels and array layers that carry initial data, in that order.
    pub fn subresource_extent(&self) -> (u32, u32) {
        let levels = u32::from(self.texture.levels).max(1);
        let layers = if self.ty == ResourceType::Texture3d {
            1
        } else {
            u32::from(self.texture.depth_or_layers)
        };
        (levels, layers)
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceViewType {
    #[default]
    Unknown = 0,
    Buffer = 1,
    Texture1d = 2,
    Texture1dArray = 3,
    Texture2d = 4,
    Texture2dArray = 5,
    Texture2dMultisample = 6,
    Texture2dMultisampleArray = 7,
    Texture3d = 8,
    TextureCube = 9,
    TextureCubeArray = 10,
    AccelerationStructure = 11,
}

impl TryFrom<u32> for ResourceViewType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        use ResourceViewType::*;
        Ok(match value {
            0 => Unknown,
            1 => Buffer,
            2 => Texture1d,
            3 => Texture1dArray,
            4 => Texture2d,
            5 => Texture2dArray,
            6 => Texture2dMultisample,
            7 => Texture2dMultisampleArray,
            8 => Texture3d,
            9 => TextureCube,
            10 => TextureCubeArray,
            11 => AccelerationStructure,
            other => return Err(other),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferViewRange {
    pub offset: u64,
    pub size: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureViewRange {
    pub first_level: u32,
    pub level_count: u32,
    pub first_layer: u32,
    pub layer_count: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceViewDesc {
    pub ty: ResourceViewType,
    pub format: Format,
    pub buffer: BufferViewRange,
    pub texture: TextureViewRange,
}

impl ResourceViewDesc {
    pub fn uses_buffer_range(&self) -> bool {
        matches!(
            self.ty,
            ResourceViewType::Buffer | ResourceViewType::AccelerationStructure
        )
    }
}

/// Axis-aligned texel region; right/bottom/back are exclusive.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct SubresourceBox {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

impl SubresourceBox {
    pub fn width(&self) -> u32 {
        self.right.wrapping_sub(self.left)
    }
    pub fn height(&self) -> u32 {
        self.bottom.wrapping_sub(self.top)
    }
    pub fn depth(&self) -> u32 {
        self.back.wrapping_sub(self.front)
    }
}

/// Initial or update contents of one subresource.
#[derive(Clone, Copy, Debug)]
pub struct SubresourceData<'a> {
    pub data: &'a [u8],
    pub row_pitch: u32,
    pub slice_pitch: u32,
}

/// CPU-visible memory of a mapped texture subresource.
#[derive(Clone, Copy, Debug)]
pub struct MappedSubresource {
    pub data: NonNull<u8>,
    pub row_pitch: u32,
    pub slice_pitch: u32,
    /// Bytes addressable from `data` until the unmap.
    pub len: usize,
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MapAccess {
    #[default]
    ReadOnly = 1,
    WriteOnly = 2,
    ReadWrite = 3,
    WriteDiscard = 4,
}

impl MapAccess {
    /// Whether the mapped memory may have been modified by the time it is unmapped.
    pub fn writes(self) -> bool {
        self != MapAccess::ReadOnly
    }
}

impl TryFrom<u32> for MapAccess {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            1 => MapAccess::ReadOnly,
            2 => MapAccess::WriteOnly,
            3 => MapAccess::ReadWrite,
            4 => MapAccess::WriteDiscard,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subresource_extent_of_array_and_volume() {
        let array = ResourceDesc::texture(
            ResourceType::Texture2d,
            64,
            64,
            6,
            0,
            Format::R8G8B8A8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        assert_eq!(array.subresource_extent(), (1, 6));

        let volume = ResourceDesc::texture(
            ResourceType::Texture3d,
            16,
            16,
            16,
            4,
            Format::R8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        assert_eq!(volume.subresource_extent(), (4, 1));
    }

    #[test]
    fn present_contains_render_target_and_copy_source() {
        assert!(ResourceUsage::PRESENT.contains(ResourceUsage::RENDER_TARGET));
        assert!(ResourceUsage::PRESENT.contains(ResourceUsage::COPY_SOURCE));
        assert!(MapAccess::WriteDiscard.writes());
        assert!(!MapAccess::ReadOnly.writes());
    }
}
