// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::*;

/// Internal format, pixel format and pixel type of a texture format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexelFormat {
    pub internal: u32,
    pub format: u32,
    pub ty: u32,
}

const fn texel(internal: u32, format: u32, ty: u32) -> Option<TexelFormat> {
    Some(TexelFormat {
        internal,
        format,
        ty,
    })
}

pub fn texel_format(format: Format) -> Option<TexelFormat> {
    match format {
        Format::R8G8B8A8_TYPELESS | Format::R8G8B8A8_UNORM => {
            texel(glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE)
        }
        Format::R8G8B8A8_UNORM_SRGB => texel(glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
        Format::R8G8B8A8_UINT => texel(glow::RGBA8UI, glow::RGBA_INTEGER, glow::UNSIGNED_BYTE),
        Format::B8G8R8A8_UNORM | Format::B8G8R8X8_UNORM => {
            texel(glow::RGBA8, glow::BGRA, glow::UNSIGNED_BYTE)
        }
        Format::B8G8R8A8_UNORM_SRGB => texel(glow::SRGB8_ALPHA8, glow::BGRA, glow::UNSIGNED_BYTE),
        Format::R10G10B10A2_UNORM => {
            texel(glow::RGB10_A2, glow::RGBA, glow::UNSIGNED_INT_2_10_10_10_REV)
        }
        Format::R11G11B10_FLOAT => {
            texel(glow::R11F_G11F_B10F, glow::RGB, glow::UNSIGNED_INT_10F_11F_11F_REV)
        }
        Format::R16G16B16A16_FLOAT => texel(glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        Format::R16G16B16A16_UNORM => texel(glow::RGBA16, glow::RGBA, glow::UNSIGNED_SHORT),
        Format::R32G32B32A32_TYPELESS | Format::R32G32B32A32_FLOAT => {
            texel(glow::RGBA32F, glow::RGBA, glow::FLOAT)
        }
        Format::R32G32B32A32_UINT => texel(glow::RGBA32UI, glow::RGBA_INTEGER, glow::UNSIGNED_INT),
        Format::R32G32B32_FLOAT => texel(glow::RGB32F, glow::RGB, glow::FLOAT),
        Format::R32G32_FLOAT => texel(glow::RG32F, glow::RG, glow::FLOAT),
        Format::R16G16_FLOAT => texel(glow::RG16F, glow::RG, glow::HALF_FLOAT),
        Format::R8G8_UNORM => texel(glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
        Format::R32_TYPELESS | Format::R32_FLOAT => texel(glow::R32F, glow::RED, glow::FLOAT),
        Format::R32_UINT => texel(glow::R32UI, glow::RED_INTEGER, glow::UNSIGNED_INT),
        Format::R16_FLOAT => texel(glow::R16F, glow::RED, glow::HALF_FLOAT),
        Format::R16_UNORM => texel(glow::R16, glow::RED, glow::UNSIGNED_SHORT),
        Format::R16_UINT => texel(glow::R16UI, glow::RED_INTEGER, glow::UNSIGNED_SHORT),
        Format::R8_UNORM | Format::A8_UNORM => texel(glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        Format::B5G6R5_UNORM => texel(glow::RGB565, glow::RGB, glow::UNSIGNED_SHORT_5_6_5),
        Format::D32_FLOAT => texel(glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
        Format::D24_UNORM_S8_UINT => {
            texel(glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8)
        }
        Format::D16_UNORM => {
            texel(glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT)
        }
        _ => None,
    }
}

/// Component count, component type and normalization of a vertex attribute format.
pub fn vertex_format(format: Format) -> Option<(i32, u32, bool)> {
    Some(match format {
        Format::R32G32B32A32_FLOAT => (4, glow::FLOAT, false),
        Format::R32G32B32_FLOAT => (3, glow::FLOAT, false),
        Format::R32G32_FLOAT => (2, glow::FLOAT, false),
        Format::R32_FLOAT => (1, glow::FLOAT, false),
        Format::R16G16B16A16_FLOAT => (4, glow::HALF_FLOAT, false),
        Format::R16G16_FLOAT => (2, glow::HALF_FLOAT, false),
        Format::R8G8B8A8_UNORM | Format::B8G8R8A8_UNORM => (4, glow::UNSIGNED_BYTE, true),
        Format::R8G8B8A8_UINT => (4, glow::UNSIGNED_BYTE, false),
        Format::R16G16B16A16_UNORM => (4, glow::UNSIGNED_SHORT, true),
        Format::R10G10B10A2_UNORM => (4, glow::UNSIGNED_INT_2_10_10_10_REV, true),
        _ => return None,
    })
}

pub fn shader_type(stage: ShaderStage) -> Option<u32> {
    [
        (ShaderStage::VERTEX, glow::VERTEX_SHADER),
        (ShaderStage::HULL, glow::TESS_CONTROL_SHADER),
        (ShaderStage::DOMAIN, glow::TESS_EVALUATION_SHADER),
        (ShaderStage::GEOMETRY, glow::GEOMETRY_SHADER),
        (ShaderStage::PIXEL, glow::FRAGMENT_SHADER),
        (ShaderStage::COMPUTE, glow::COMPUTE_SHADER),
    ]
    .into_iter()
    .find_map(|(s, ty)| (s == stage).then_some(ty))
}

pub fn primitive_topology(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::POINT_LIST => glow::POINTS,
        PrimitiveTopology::LINE_LIST => glow::LINES,
        PrimitiveTopology::LINE_STRIP => glow::LINE_STRIP,
        PrimitiveTopology::TRIANGLE_STRIP => glow::TRIANGLE_STRIP,
        PrimitiveTopology::TRIANGLE_FAN => glow::TRIANGLE_FAN,
        _ => glow::TRIANGLES,
    }
}

pub fn index_type(index_size: u32) -> Option<u32> {
    match index_size {
        1 => Some(glow::UNSIGNED_BYTE),
        2 => Some(glow::UNSIGNED_SHORT),
        4 => Some(glow::UNSIGNED_INT),
        _ => None,
    }
}

pub fn map_access(access: MapAccess) -> u32 {
    match access {
        MapAccess::ReadOnly => glow::MAP_READ_BIT,
        MapAccess::WriteOnly => glow::MAP_WRITE_BIT,
        MapAccess::ReadWrite => glow::MAP_READ_BIT | glow::MAP_WRITE_BIT,
        MapAccess::WriteDiscard => glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_BUFFER_BIT,
    }
}

pub fn buffer_usage(heap: MemoryHeap) -> u32 {
    match heap {
        MemoryHeap::CPU_TO_GPU => glow::DYNAMIC_DRAW,
        MemoryHeap::GPU_TO_CPU => glow::STREAM_READ,
        MemoryHeap::CPU_ONLY => glow::STREAM_DRAW,
        _ => glow::STATIC_DRAW,
    }
}

pub fn compare_func(op: CompareOp) -> u32 {
    match op {
        CompareOp::NEVER => glow::NEVER,
        CompareOp::LESS => glow::LESS,
        CompareOp::EQUAL => glow::EQUAL,
        CompareOp::LESS_EQUAL => glow::LEQUAL,
        CompareOp::GREATER => glow::GREATER,
        CompareOp::NOT_EQUAL => glow::NOTEQUAL,
        CompareOp::GREATER_EQUAL => glow::GEQUAL,
        _ => glow::ALWAYS,
    }
}

pub fn address_mode(mode: TextureAddressMode) -> u32 {
    match mode {
        TextureAddressMode::MIRROR => glow::MIRRORED_REPEAT,
        TextureAddressMode::CLAMP => glow::CLAMP_TO_EDGE,
        TextureAddressMode::BORDER => glow::CLAMP_TO_BORDER,
        TextureAddressMode::MIRROR_ONCE => glow::MIRROR_CLAMP_TO_EDGE,
        _ => glow::REPEAT,
    }
}

/// Minification and magnification filters. The filter value packs mip (bit 0), magnification
/// (bit 2) and minification (bit 4) linearity.
pub fn filter(mode: FilterMode) -> (u32, u32) {
    let mip_linear = mode.0 & 0x1 != 0;
    let mag_linear = mode.0 & 0x4 != 0;
    let min_linear = mode.0 & 0x10 != 0;
    let min = match (min_linear, mip_linear) {
        (false, false) => glow::NEAREST_MIPMAP_NEAREST,
        (false, true) => glow::NEAREST_MIPMAP_LINEAR,
        (true, false) => glow::LINEAR_MIPMAP_NEAREST,
        (true, true) => glow::LINEAR_MIPMAP_LINEAR,
    };
    let mag = if mag_linear { glow::LINEAR } else { glow::NEAREST };
    (min, mag)
}

pub fn is_anisotropic(mode: FilterMode) -> bool {
    mode.0 & 0x40 != 0
}

pub fn is_comparison(mode: FilterMode) -> bool {
    mode.0 & 0x80 != 0
}

/// Mip level and array layer addressed by a flat subresource index.
pub fn split_subresource(desc: &ResourceDesc, subresource: u32) -> (u32, u32) {
    let levels = u32::from(desc.texture.levels).max(1);
    (subresource % levels, subresource / levels)
}

pub fn mip_extent(desc: &ResourceDesc, level: u32) -> (u32, u32) {
    (
        (desc.texture.width >> level).max(1),
        (desc.texture.height >> level).max(1),
    )
}

/// The whole of one mip level as a box.
pub fn level_region(desc: &ResourceDesc, level: u32) -> SubresourceBox {
    let (w, h) = mip_extent(desc, level);
    SubresourceBox {
        right: w,
        bottom: h,
        back: 1,
        ..Default::default()
    }
}

/// Byte distance between indirect argument records; 0 means tightly packed.
pub fn indirect_stride(ty: IndirectCommand, stride: u32) -> u64 {
    if stride != 0 {
        return u64::from(stride);
    }
    match ty {
        IndirectCommand::DRAW => 16,
        IndirectCommand::DRAW_INDEXED => 20,
        IndirectCommand::DISPATCH => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_indirect_records_use_their_argument_size() {
        assert_eq!(indirect_stride(IndirectCommand::DRAW, 0), 16);
        assert_eq!(indirect_stride(IndirectCommand::DRAW_INDEXED, 0), 20);
        assert_eq!(indirect_stride(IndirectCommand::DISPATCH, 0), 12);
        assert_eq!(indirect_stride(IndirectCommand::DRAW, 32), 32);
    }

    #[test]
    fn level_region_covers_the_mip() {
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            64,
            16,
            1,
            4,
            Format::R8G8B8A8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        let region = level_region(&desc, 3);
        assert_eq!((region.width(), region.height(), region.back), (8, 2, 1));
    }

    #[test]
    fn bgra_back_buffers_upload_as_rgba8() {
        let t = texel_format(Format::B8G8R8A8_UNORM).unwrap();
        assert_eq!(t.internal, glow::RGBA8);
        assert_eq!(t.format, glow::BGRA);
        assert!(texel_format(Format::BC1_UNORM).is_none());
    }

    #[test]
    fn filters_decode_per_axis() {
        assert_eq!(
            filter(FilterMode::MIN_MAG_MIP_POINT),
            (glow::NEAREST_MIPMAP_NEAREST, glow::NEAREST)
        );
        assert_eq!(
            filter(FilterMode::MIN_MAG_MIP_LINEAR),
            (glow::LINEAR_MIPMAP_LINEAR, glow::LINEAR)
        );
        assert!(is_anisotropic(FilterMode::ANISOTROPIC));
        assert!(is_comparison(FilterMode::COMPARE_MIN_MAG_MIP_LINEAR));
        assert!(!is_comparison(FilterMode::ANISOTROPIC));
    }

    #[test]
    fn subresources_split_into_level_and_layer() {
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            64,
            32,
            6,
            3,
            Format::R8G8B8A8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        assert_eq!(split_subresource(&desc, 0), (0, 0));
        assert_eq!(split_subresource(&desc, 4), (1, 1));
        assert_eq!(mip_extent(&desc, 2), (16, 8));
        assert_eq!(mip_extent(&desc, 9), (1, 1));
    }

    #[test]
    fn discard_maps_invalidate() {
        assert_eq!(
            map_access(MapAccess::WriteDiscard),
            glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_BUFFER_BIT
        );
        assert_eq!(index_type(2), Some(glow::UNSIGNED_SHORT));
        assert_eq!(index_type(3), None);
    }
}
