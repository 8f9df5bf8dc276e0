// SPDX-License-Identifier: CEPL-1.0
use bytemuck::{Pod, Zeroable};

/// Texel format. Values follow the DXGI numbering, which every backend translates from.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Format(pub u32);

impl Format {
    pub const UNKNOWN: Self = Self(0);
    pub const R32G32B32A32_TYPELESS: Self = Self(1);
    pub const R32G32B32A32_FLOAT: Self = Self(2);
    pub const R32G32B32A32_UINT: Self = Self(3);
    pub const R32G32B32_FLOAT: Self = Self(6);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R16G16B16A16_UNORM: Self = Self(11);
    pub const R32G32_FLOAT: Self = Self(16);
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R11G11B10_FLOAT: Self = Self(26);
    pub const R8G8B8A8_TYPELESS: Self = Self(27);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R8G8B8A8_UINT: Self = Self(30);
    pub const R16G16_FLOAT: Self = Self(34);
    pub const R32_TYPELESS: Self = Self(39);
    pub const D32_FLOAT: Self = Self(40);
    pub const R32_FLOAT: Self = Self(41);
    pub const R32_UINT: Self = Self(42);
    pub const D24_UNORM_S8_UINT: Self = Self(45);
    pub const R8G8_UNORM: Self = Self(49);
    pub const R16_FLOAT: Self = Self(54);
    pub const D16_UNORM: Self = Self(55);
    pub const R16_UNORM: Self = Self(56);
    pub const R16_UINT: Self = Self(57);
    pub const R8_UNORM: Self = Self(61);
    pub const A8_UNORM: Self = Self(65);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC1_UNORM_SRGB: Self = Self(72);
    pub const BC2_UNORM: Self = Self(74);
    pub const BC3_UNORM: Self = Self(77);
    pub const BC4_UNORM: Self = Self(80);
    pub const BC5_UNORM: Self = Self(83);
    pub const B5G6R5_UNORM: Self = Self(85);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const BC6H_UF16: Self = Self(95);
    pub const BC7_UNORM: Self = Self(98);
    pub const BC7_UNORM_SRGB: Self = Self(99);
    pub const B4G4R4A4_UNORM: Self = Self(115);

    /// Size in bytes of one 4x4 block, for block-compressed formats.
    pub fn block_size(self) -> Option<u32> {
        match self.0 {
            70..=72 | 79..=81 => Some(8),
            73..=78 | 82..=84 | 94..=99 => Some(16),
            _ => None,
        }
    }

    pub fn is_block_compressed(self) -> bool {
        self.block_size().is_some()
    }

    /// Bytes per texel for uncompressed formats, zero for unknown ones.
    pub fn bytes_per_pixel(self) -> u32 {
        match self.0 {
            1..=4 => 16,
            5..=8 => 12,
            9..=22 => 8,
            23..=47 | 67..=69 | 87..=93 => 4,
            48..=59 | 85..=86 | 115 => 2,
            60..=66 => 1,
            _ => 0,
        }
    }

    pub fn is_depth_stencil(self) -> bool {
        matches!(self, Self::D32_FLOAT | Self::D24_UNORM_S8_UINT | Self::D16_UNORM)
            || self.0 == 20
    }
}

/// Number of bytes in one row of `width` texels (one row of blocks for compressed formats).
pub fn format_row_pitch(format: Format, width: u32) -> u32 {
    match format.block_size() {
        Some(block) => width.wrapping_add(3) / 4 * block,
        None => width.wrapping_mul(format.bytes_per_pixel()),
    }
}

/// Number of bytes in one slice of `height` rows laid out `row_pitch` bytes apart.
pub fn format_slice_pitch(format: Format, row_pitch: u32, height: u32) -> u32 {
    if format.is_block_compressed() {
        row_pitch.wrapping_mul(height.wrapping_add(3) / 4)
    } else {
        row_pitch.wrapping_mul(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_pitches() {
        assert_eq!(format_row_pitch(Format::R8G8B8A8_UNORM, 64), 256);
        assert_eq!(format_row_pitch(Format::R32G32B32A32_FLOAT, 3), 48);
        assert_eq!(format_row_pitch(Format::R16_FLOAT, 5), 10);
        assert_eq!(format_slice_pitch(Format::R8G8B8A8_UNORM, 256, 32), 8192);
    }

    #[test]
    fn block_compressed_pitches_round_up_to_blocks() {
        // 5 texels wide -> 2 blocks of 8 bytes
        assert_eq!(format_row_pitch(Format::BC1_UNORM, 5), 16);
        assert_eq!(format_row_pitch(Format::BC7_UNORM, 1), 16);
        assert_eq!(format_slice_pitch(Format::BC1_UNORM, 16, 5), 32);
        assert_eq!(format_slice_pitch(Format::BC3_UNORM, 64, 4), 64);
    }

    #[test]
    fn unknown_format_has_no_size() {
        assert_eq!(format_row_pitch(Format::UNKNOWN, 128), 0);
    }
}
