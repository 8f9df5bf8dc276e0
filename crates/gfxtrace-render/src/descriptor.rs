// SPDX-License-Identifier: CEPL-1.0
use crate::handle::{DescriptorTable, Resource, ResourceView, Sampler};
use crate::pipeline::ShaderStage;
use crate::sampler::SamplerDesc;
use bytemuck::{Pod, Zeroable};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler = 0,
    SamplerWithResourceView = 1,
    ShaderResourceView = 2,
    UnorderedAccessView = 3,
    ConstantBuffer = 6,
    ShaderStorageBuffer = 7,
}

impl TryFrom<u32> for DescriptorType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => DescriptorType::Sampler,
            1 => DescriptorType::SamplerWithResourceView,
            2 => DescriptorType::ShaderResourceView,
            3 => DescriptorType::UnorderedAccessView,
            6 => DescriptorType::ConstantBuffer,
            7 => DescriptorType::ShaderStorageBuffer,
            other => return Err(other),
        })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct SamplerWithResourceView {
    pub sampler: Sampler,
    pub view: ResourceView,
}

/// Constant buffer binding: a buffer plus a byte range inside it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct BufferRange {
    pub buffer: Resource,
    pub offset: u64,
    pub size: u64,
}

/// Descriptor payload of one update, homogeneous in type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptors {
    Samplers(Vec<Sampler>),
    SamplersWithResourceViews(Vec<SamplerWithResourceView>),
    ShaderResourceViews(Vec<ResourceView>),
    UnorderedAccessViews(Vec<ResourceView>),
    ConstantBuffers(Vec<BufferRange>),
    ShaderStorageBuffers(Vec<ResourceView>),
}

impl Descriptors {
    pub fn ty(&self) -> DescriptorType {
        match self {
            Descriptors::Samplers(_) => DescriptorType::Sampler,
            Descriptors::SamplersWithResourceViews(_) => DescriptorType::SamplerWithResourceView,
            Descriptors::ShaderResourceViews(_) => DescriptorType::ShaderResourceView,
            Descriptors::UnorderedAccessViews(_) => DescriptorType::UnorderedAccessView,
            Descriptors::ConstantBuffers(_) => DescriptorType::ConstantBuffer,
            Descriptors::ShaderStorageBuffers(_) => DescriptorType::ShaderStorageBuffer,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Descriptors::Samplers(v) => v.len(),
            Descriptors::SamplersWithResourceViews(v) => v.len(),
            Descriptors::ShaderResourceViews(v)
            | Descriptors::UnorderedAccessViews(v)
            | Descriptors::ShaderStorageBuffers(v) => v.len(),
            Descriptors::ConstantBuffers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorTableUpdate {
    pub table: DescriptorTable,
    pub binding: u32,
    pub array_offset: u32,
    pub descriptors: Descriptors,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptorTableCopy {
    pub source_table: DescriptorTable,
    pub source_binding: u32,
    pub source_array_offset: u32,
    pub dest_table: DescriptorTable,
    pub dest_binding: u32,
    pub dest_array_offset: u32,
    pub count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorRange {
    pub binding: u32,
    pub dx_register_index: u32,
    pub dx_register_space: u32,
    pub count: u32,
    pub visibility: ShaderStage,
    pub array_size: u32,
    pub ty: DescriptorType,
}

impl Default for DescriptorRange {
    fn default() -> Self {
        DescriptorRange {
            binding: 0,
            dx_register_index: 0,
            dx_register_space: 0,
            count: 1,
            visibility: ShaderStage::ALL,
            array_size: 1,
            ty: DescriptorType::ShaderResourceView,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DescriptorRangeWithStaticSamplers {
    pub range: DescriptorRange,
    pub static_samplers: Vec<SamplerDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_report_type_and_length() {
        let d = Descriptors::ConstantBuffers(vec![BufferRange::default(); 3]);
        assert_eq!(d.ty(), DescriptorType::ConstantBuffer);
        assert_eq!(d.len(), 3);
        assert!(Descriptors::Samplers(Vec::new()).is_empty());
        assert_eq!(DescriptorType::try_from(4), Err(4));
    }
}
