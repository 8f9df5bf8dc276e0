// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::{format_row_pitch, format_slice_pitch, ResourceDesc, ResourceType, SubresourceBox};

/// Number of bytes of texel data recorded for one texture subresource.
///
/// The mip level is `subresource % levels` (the subresource itself when the level count is
/// unknown). 2D sizes come from the caller's row pitch, 3D sizes from its slice pitch; the
/// depth of a volume is not reduced by the mip level. Buffers and unknown types yield 0.
pub fn calc_texture_size(
    desc: &ResourceDesc,
    subresource: u32,
    row_pitch: u32,
    slice_pitch: u32,
    region: Option<&SubresourceBox>,
) -> u64 {
    let t = &desc.texture;
    let level = if t.levels != 0 {
        subresource % u32::from(t.levels)
    } else {
        subresource
    };
    let mip = |extent: u32| extent.checked_shr(level).unwrap_or(0).max(1);

    match desc.ty {
        ResourceType::Texture1d => {
            let width = region.map_or_else(|| mip(t.width), SubresourceBox::width);
            u64::from(format_row_pitch(t.format, width))
        }
        ResourceType::Texture2d => {
            let height = region.map_or_else(|| mip(t.height), SubresourceBox::height);
            u64::from(format_slice_pitch(t.format, row_pitch, height))
        }
        ResourceType::Texture3d => {
            let depth = region.map_or(u32::from(t.depth_or_layers), SubresourceBox::depth);
            u64::from(slice_pitch) * u64::from(depth)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfxtrace_render::{Format, ResourceUsage};

    fn tex(ty: ResourceType, w: u32, h: u32, d: u16, levels: u16, format: Format) -> ResourceDesc {
        ResourceDesc::texture(ty, w, h, d, levels, format, ResourceUsage::SHADER_RESOURCE)
    }

    #[test]
    fn mip_chain_of_2d_texture() {
        let desc = tex(ResourceType::Texture2d, 256, 128, 1, 9, Format::R8G8B8A8_UNORM);
        assert_eq!(calc_texture_size(&desc, 0, 1024, 0, None), 1024 * 128);
        assert_eq!(calc_texture_size(&desc, 1, 512, 0, None), 512 * 64);
        // height clamps to one row past the end of the chain
        assert_eq!(calc_texture_size(&desc, 8, 4, 0, None), 4);
    }

    #[test]
    fn level_wraps_per_array_layer() {
        let desc = tex(ResourceType::Texture2d, 64, 64, 4, 3, Format::R8_UNORM);
        // subresource 4 = layer 1, level 1
        assert_eq!(
            calc_texture_size(&desc, 4, 32, 0, None),
            calc_texture_size(&desc, 1, 32, 0, None)
        );
    }

    #[test]
    fn unknown_level_count_uses_subresource_as_level() {
        let desc = tex(ResourceType::Texture1d, 64, 1, 1, 0, Format::R8G8B8A8_UNORM);
        assert_eq!(calc_texture_size(&desc, 2, 0, 0, None), 16 * 4);
        // a shift past the width still yields one texel
        assert_eq!(calc_texture_size(&desc, 40, 0, 0, None), 4);
    }

    #[test]
    fn region_overrides_extent() {
        let desc = tex(ResourceType::Texture2d, 256, 256, 1, 1, Format::BC1_UNORM);
        let region = SubresourceBox {
            left: 0,
            top: 8,
            front: 0,
            right: 16,
            bottom: 24,
            back: 1,
        };
        // 16 rows of BC1 = 4 block rows
        assert_eq!(calc_texture_size(&desc, 0, 32, 0, Some(&region)), 32 * 4);
    }

    #[test]
    fn volume_ignores_mip_for_depth() {
        let desc = tex(ResourceType::Texture3d, 32, 32, 8, 4, Format::R8_UNORM);
        assert_eq!(calc_texture_size(&desc, 2, 8, 64, None), 64 * 8);
    }

    #[test]
    fn buffers_have_no_texture_size() {
        let desc = gfxtrace_render::ResourceDesc::buffer(
            64,
            gfxtrace_render::MemoryHeap::GPU_ONLY,
            ResourceUsage::VERTEX_BUFFER,
        );
        assert_eq!(calc_texture_size(&desc, 0, 64, 64, None), 0);
    }
}
