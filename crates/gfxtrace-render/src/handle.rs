// SPDX-License-Identifier: CEPL-1.0
use bytemuck::{Pod, Zeroable};

/// Common view over the opaque 64-bit object handles.
pub trait Handle: Copy + Default + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_raw(raw: u64) -> Self;
    fn raw(self) -> u64;

    fn is_null(self) -> bool {
        self.raw() == 0
    }
}

macro_rules! handles {
    ($($name:ident),* $(,)?) => {$(
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
        pub struct $name(pub u64);

        impl $name {
            pub const NULL: Self = Self(0);
        }

        impl Handle for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }
            fn raw(self) -> u64 {
                self.0
            }
        }
    )*};
}

handles!(
    Sampler,
    Resource,
    ResourceView,
    Pipeline,
    PipelineLayout,
    DescriptorTable,
    QueryHeap,
);

/// `GL_FRAMEBUFFER_DEFAULT`, stored in bits 40..63 of OpenGL handles that name the
/// window-system framebuffer.
pub const GL_FRAMEBUFFER_DEFAULT: u64 = 0x8218;
pub const GL_BACK: u64 = 0x0405;

/// Builds an OpenGL handle out of an object target and name.
pub fn gl_handle(target: u64, object: u32) -> u64 {
    (target << 40) | u64::from(object)
}

pub fn is_gl_default_framebuffer(raw: u64) -> bool {
    (raw >> 40) == GL_FRAMEBUFFER_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_framebuffer_sentinel() {
        let back = gl_handle(GL_FRAMEBUFFER_DEFAULT, GL_BACK as u32);
        assert!(is_gl_default_framebuffer(back));
        assert!(!is_gl_default_framebuffer(gl_handle(0x0DE1, 7)));
        assert!(Resource::NULL.is_null());
        assert!(!Resource(back).is_null());
    }
}
