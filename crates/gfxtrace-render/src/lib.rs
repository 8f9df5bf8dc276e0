// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]

/// Transparent `u32` enumeration with associated constants, so unknown values survive a
/// round trip through a trace untouched.
macro_rules! u32_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
        pub struct $name(pub u32);

        impl $name {
            $(pub const $variant: Self = Self($value);)*
        }
    };
}

/// 32-bit boolean as stored in fixed-layout descriptors.
pub type Bool32 = u32;

pub mod command;
pub mod descriptor;
pub mod device;
pub mod format;
pub mod handle;
pub mod pipeline;
pub mod resource;
pub mod sampler;

pub use command::*;
pub use descriptor::*;
pub use device::*;
pub use format::{format_row_pitch, format_slice_pitch, Format};
pub use handle::*;
pub use pipeline::*;
pub use resource::*;
pub use sampler::*;

/// Graphics API a device was created for. Written as the backend tag of a trace header.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceApi {
    D3D9 = 0x9000,
    D3D10 = 0xa000,
    D3D11 = 0xb000,
    D3D12 = 0xc000,
    OpenGL = 0x10000,
    Vulkan = 0x20000,
}

impl DeviceApi {
    pub fn name(self) -> &'static str {
        match self {
            DeviceApi::D3D9 => "d3d9",
            DeviceApi::D3D10 => "d3d10",
            DeviceApi::D3D11 => "d3d11",
            DeviceApi::D3D12 => "d3d12",
            DeviceApi::OpenGL => "opengl",
            DeviceApi::Vulkan => "vulkan",
        }
    }
}

impl TryFrom<u32> for DeviceApi {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0x9000 => DeviceApi::D3D9,
            0xa000 => DeviceApi::D3D10,
            0xb000 => DeviceApi::D3D11,
            0xc000 => DeviceApi::D3D12,
            0x10000 => DeviceApi::OpenGL,
            0x20000 => DeviceApi::Vulkan,
            other => return Err(other),
        })
    }
}

impl std::fmt::Display for DeviceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
