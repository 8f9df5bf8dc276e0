// SPDX-License-Identifier: CEPL-1.0
use bytemuck::{Pod, Zeroable};

u32_enum!(FilterMode {
    MIN_MAG_MIP_POINT = 0x0,
    MIN_MAG_POINT_MIP_LINEAR = 0x1,
    MIN_MAG_MIP_LINEAR = 0x15,
    ANISOTROPIC = 0x55,
    COMPARE_MIN_MAG_MIP_POINT = 0x80,
    COMPARE_MIN_MAG_MIP_LINEAR = 0x95,
    COMPARE_ANISOTROPIC = 0xd5,
});

u32_enum!(TextureAddressMode {
    WRAP = 1,
    MIRROR = 2,
    CLAMP = 3,
    BORDER = 4,
    MIRROR_ONCE = 5,
});

u32_enum!(CompareOp {
    NEVER = 0,
    LESS = 1,
    EQUAL = 2,
    LESS_EQUAL = 3,
    GREATER = 4,
    NOT_EQUAL = 5,
    GREATER_EQUAL = 6,
    ALWAYS = 7,
});

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SamplerDesc {
    pub filter: FilterMode,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub compare_op: CompareOp,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl SamplerDesc {
    pub fn linear_clamp() -> Self {
        SamplerDesc {
            filter: FilterMode::MIN_MAG_MIP_LINEAR,
            address_u: TextureAddressMode::CLAMP,
            address_v: TextureAddressMode::CLAMP,
            address_w: TextureAddressMode::CLAMP,
            max_anisotropy: 1.0,
            compare_op: CompareOp::NEVER,
            max_lod: f32::MAX,
            ..Default::default()
        }
    }
}
