// SPDX-License-Identifier: CEPL-1.0
//! Field-level encoding. Everything is host endian; variable-length data always carries
//! its length first.
use crate::error::StreamError;
use bytemuck::Pod;
use gfxtrace_render::*;
use std::io::{self, Read, Write};

/// Upper bound on speculative allocation for counts read from a trace.
const PREALLOC_LIMIT: usize = 1024;

pub trait Encode {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()>;
}

pub trait Decode: Sized {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError>;
}

pub fn write_pod<T: Pod, W: Write + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    w.write_all(bytemuck::bytes_of(value))
}

pub fn read_pod<T: Pod, R: Read + ?Sized>(r: &mut R) -> Result<T, StreamError> {
    let mut value = T::zeroed();
    r.read_exact(bytemuck::bytes_of_mut(&mut value))
        .map_err(StreamError::from_read)?;
    Ok(value)
}

/// Reads exactly `len` bytes without trusting `len` for the allocation.
pub fn read_bytes<R: Read + ?Sized>(r: &mut R, len: u64) -> Result<Vec<u8>, StreamError> {
    let mut buf = Vec::new();
    (&mut *r).take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(StreamError::Truncated);
    }
    Ok(buf)
}

pub fn write_len<W: Write + ?Sized>(w: &mut W, len: usize) -> io::Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "array too long for a trace"))?;
    w.write_all(&len.to_ne_bytes())
}

pub fn read_len<R: Read + ?Sized>(r: &mut R) -> Result<u32, StreamError> {
    read_pod(r)
}

/// `u64` length followed by the bytes.
pub fn write_blob<W: Write + ?Sized>(w: &mut W, data: &[u8]) -> io::Result<()> {
    w.write_all(&(data.len() as u64).to_ne_bytes())?;
    w.write_all(data)
}

pub fn read_blob<R: Read + ?Sized>(r: &mut R) -> Result<Vec<u8>, StreamError> {
    let len: u64 = read_pod(r)?;
    read_bytes(r, len)
}

/// `u32` length followed by the bytes, no terminator. An absent string has length zero.
pub fn write_str<W: Write + ?Sized>(w: &mut W, s: Option<&str>) -> io::Result<()> {
    let s = s.unwrap_or_default();
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())
}

pub fn read_str<R: Read + ?Sized>(r: &mut R) -> Result<Option<String>, StreamError> {
    let len = read_len(r)?;
    if len == 0 {
        return Ok(None);
    }
    let bytes = read_bytes(r, u64::from(len))?;
    String::from_utf8(bytes).map(Some).map_err(StreamError::InvalidString)
}

pub fn decode_vec<T: Decode, R: Read + ?Sized>(r: &mut R, count: u32) -> Result<Vec<T>, StreamError> {
    let mut items = Vec::with_capacity((count as usize).min(PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(T::decode(r)?);
    }
    Ok(items)
}

macro_rules! pod_wire {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
                write_pod(w, self)
            }
        }

        impl Decode for $ty {
            fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
                read_pod(r)
            }
        }
    )*};
}

pod_wire!(
    u8,
    u16,
    u32,
    i32,
    u64,
    f32,
    [f32; 4],
    [u32; 4],
    [i32; 3],
    Format,
    Sampler,
    Resource,
    ResourceView,
    Pipeline,
    PipelineLayout,
    DescriptorTable,
    ResourceUsage,
    ResourceFlags,
    MemoryHeap,
    ShaderStage,
    PipelineStage,
    DynamicState,
    PrimitiveTopology,
    FilterMode,
    IndirectCommand,
    RenderPassLoadOp,
    RenderPassStoreOp,
    SamplerDesc,
    BlendDesc,
    RasterizerDesc,
    DepthStencilDesc,
    ConstantRange,
    SubresourceBox,
    Viewport,
    Rect,
    Barrier,
    RenderPassRenderTargetDesc,
    StreamOutputBinding,
    SamplerWithResourceView,
    BufferRange,
);

impl Encode for bool {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[u8::from(*self)])
    }
}

impl Decode for bool {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(read_pod::<u8, _>(r)? != 0)
    }
}

/// Presence flag, then the value if present.
impl<T: Encode> Encode for Option<T> {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.is_some().encode(w)?;
        match self {
            Some(v) => v.encode(w),
            None => Ok(()),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        if bool::decode(r)? {
            Ok(Some(T::decode(r)?))
        } else {
            Ok(None)
        }
    }
}

/// `u32` count, then the elements.
impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write_len(w, self.len())?;
        self.iter().try_for_each(|v| v.encode(w))
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        let count = read_len(r)?;
        decode_vec(r, count)
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.0.encode(w)?;
        self.1.encode(w)
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok((A::decode(r)?, B::decode(r)?))
    }
}

impl Encode for ResourceDesc {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.ty as u32).encode(w)?;
        match self.ty {
            ResourceType::Unknown => {}
            ResourceType::Buffer => {
                self.buffer.size.encode(w)?;
                self.buffer.stride.encode(w)?;
            }
            _ => {
                let t = &self.texture;
                t.width.encode(w)?;
                t.height.encode(w)?;
                t.depth_or_layers.encode(w)?;
                t.levels.encode(w)?;
                t.format.encode(w)?;
                t.samples.encode(w)?;
            }
        }
        self.heap.encode(w)?;
        self.usage.encode(w)?;
        self.flags.encode(w)
    }
}

impl Decode for ResourceDesc {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        let ty = ResourceType::try_from(u32::decode(r)?)
            .map_err(StreamError::discriminant("resource type"))?;
        let mut desc = ResourceDesc {
            ty,
            ..Default::default()
        };
        match ty {
            ResourceType::Unknown => {}
            ResourceType::Buffer => {
                desc.buffer.size = u64::decode(r)?;
                desc.buffer.stride = u32::decode(r)?;
            }
            _ => {
                let t = &mut desc.texture;
                t.width = u32::decode(r)?;
                t.height = u32::decode(r)?;
                t.depth_or_layers = u16::decode(r)?;
                t.levels = u16::decode(r)?;
                t.format = Format::decode(r)?;
                t.samples = u16::decode(r)?;
            }
        }
        desc.heap = MemoryHeap::decode(r)?;
        desc.usage = ResourceUsage::decode(r)?;
        desc.flags = ResourceFlags::decode(r)?;
        Ok(desc)
    }
}

impl Encode for ResourceViewDesc {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.ty as u32).encode(w)?;
        self.format.encode(w)?;
        if self.uses_buffer_range() {
            self.buffer.offset.encode(w)?;
            self.buffer.size.encode(w)
        } else {
            self.texture.first_level.encode(w)?;
            self.texture.level_count.encode(w)?;
            self.texture.first_layer.encode(w)?;
            self.texture.layer_count.encode(w)
        }
    }
}

impl Decode for ResourceViewDesc {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        let ty = ResourceViewType::try_from(u32::decode(r)?)
            .map_err(StreamError::discriminant("resource view type"))?;
        let mut desc = ResourceViewDesc {
            ty,
            format: Format::decode(r)?,
            ..Default::default()
        };
        if desc.uses_buffer_range() {
            desc.buffer.offset = u64::decode(r)?;
            desc.buffer.size = u64::decode(r)?;
        } else {
            desc.texture.first_level = u32::decode(r)?;
            desc.texture.level_count = u32::decode(r)?;
            desc.texture.first_layer = u32::decode(r)?;
            desc.texture.layer_count = u32::decode(r)?;
        }
        Ok(desc)
    }
}

impl Encode for MapAccess {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (*self as u32).encode(w)
    }
}

impl Decode for MapAccess {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        MapAccess::try_from(u32::decode(r)?).map_err(StreamError::discriminant("map access"))
    }
}

impl Encode for DescriptorType {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (*self as u32).encode(w)
    }
}

impl Decode for DescriptorType {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        DescriptorType::try_from(u32::decode(r)?)
            .map_err(StreamError::discriminant("descriptor type"))
    }
}

impl Encode for DescriptorRange {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.binding.encode(w)?;
        self.dx_register_index.encode(w)?;
        self.dx_register_space.encode(w)?;
        self.count.encode(w)?;
        self.visibility.encode(w)?;
        self.array_size.encode(w)?;
        self.ty.encode(w)
    }
}

impl Decode for DescriptorRange {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(DescriptorRange {
            binding: u32::decode(r)?,
            dx_register_index: u32::decode(r)?,
            dx_register_space: u32::decode(r)?,
            count: u32::decode(r)?,
            visibility: ShaderStage::decode(r)?,
            array_size: u32::decode(r)?,
            ty: DescriptorType::decode(r)?,
        })
    }
}

/// The range, then `{count, sampler descs}`.
impl Encode for DescriptorRangeWithStaticSamplers {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.range.encode(w)?;
        self.static_samplers.encode(w)
    }
}

impl Decode for DescriptorRangeWithStaticSamplers {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(DescriptorRangeWithStaticSamplers {
            range: DescriptorRange::decode(r)?,
            static_samplers: Vec::decode(r)?,
        })
    }
}

impl Encode for DescriptorTableCopy {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.source_table.encode(w)?;
        self.source_binding.encode(w)?;
        self.source_array_offset.encode(w)?;
        self.dest_table.encode(w)?;
        self.dest_binding.encode(w)?;
        self.dest_array_offset.encode(w)?;
        self.count.encode(w)
    }
}

impl Decode for DescriptorTableCopy {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(DescriptorTableCopy {
            source_table: DescriptorTable::decode(r)?,
            source_binding: u32::decode(r)?,
            source_array_offset: u32::decode(r)?,
            dest_table: DescriptorTable::decode(r)?,
            dest_binding: u32::decode(r)?,
            dest_array_offset: u32::decode(r)?,
            count: u32::decode(r)?,
        })
    }
}

/// `count`, `type`, then `count` descriptors whose shape depends on the type.
impl Encode for Descriptors {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write_len(w, self.len())?;
        self.ty().encode(w)?;
        match self {
            Descriptors::Samplers(v) => v.iter().try_for_each(|d| d.encode(w)),
            Descriptors::SamplersWithResourceViews(v) => v.iter().try_for_each(|d| d.encode(w)),
            Descriptors::ShaderResourceViews(v)
            | Descriptors::UnorderedAccessViews(v)
            | Descriptors::ShaderStorageBuffers(v) => v.iter().try_for_each(|d| d.encode(w)),
            Descriptors::ConstantBuffers(v) => v.iter().try_for_each(|d| d.encode(w)),
        }
    }
}

impl Decode for Descriptors {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        let count = read_len(r)?;
        Ok(match DescriptorType::decode(r)? {
            DescriptorType::Sampler => Descriptors::Samplers(decode_vec(r, count)?),
            DescriptorType::SamplerWithResourceView => {
                Descriptors::SamplersWithResourceViews(decode_vec(r, count)?)
            }
            DescriptorType::ShaderResourceView => {
                Descriptors::ShaderResourceViews(decode_vec(r, count)?)
            }
            DescriptorType::UnorderedAccessView => {
                Descriptors::UnorderedAccessViews(decode_vec(r, count)?)
            }
            DescriptorType::ConstantBuffer => Descriptors::ConstantBuffers(decode_vec(r, count)?),
            DescriptorType::ShaderStorageBuffer => {
                Descriptors::ShaderStorageBuffers(decode_vec(r, count)?)
            }
        })
    }
}

impl Encode for DescriptorTableUpdate {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.table.encode(w)?;
        self.binding.encode(w)?;
        self.array_offset.encode(w)?;
        self.descriptors.encode(w)
    }
}

impl Decode for DescriptorTableUpdate {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(DescriptorTableUpdate {
            table: DescriptorTable::decode(r)?,
            binding: u32::decode(r)?,
            array_offset: u32::decode(r)?,
            descriptors: Descriptors::decode(r)?,
        })
    }
}

impl Encode for PipelineLayoutParam {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        (self.ty() as u32).encode(w)?;
        match self {
            PipelineLayoutParam::PushConstants(range) => range.encode(w),
            PipelineLayoutParam::PushDescriptors(range) => range.encode(w),
            PipelineLayoutParam::DescriptorTable(ranges)
            | PipelineLayoutParam::PushDescriptorsWithRanges(ranges) => ranges.encode(w),
            PipelineLayoutParam::DescriptorTableWithStaticSamplers(ranges)
            | PipelineLayoutParam::PushDescriptorsWithStaticSamplers(ranges) => ranges.encode(w),
        }
    }
}

impl Decode for PipelineLayoutParam {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        let ty = PipelineLayoutParamType::try_from(u32::decode(r)?)
            .map_err(StreamError::discriminant("pipeline layout parameter type"))?;
        Ok(match ty {
            PipelineLayoutParamType::PushConstants => {
                PipelineLayoutParam::PushConstants(ConstantRange::decode(r)?)
            }
            PipelineLayoutParamType::PushDescriptors => {
                PipelineLayoutParam::PushDescriptors(DescriptorRange::decode(r)?)
            }
            PipelineLayoutParamType::DescriptorTable => {
                PipelineLayoutParam::DescriptorTable(Vec::decode(r)?)
            }
            PipelineLayoutParamType::PushDescriptorsWithRanges => {
                PipelineLayoutParam::PushDescriptorsWithRanges(Vec::decode(r)?)
            }
            PipelineLayoutParamType::DescriptorTableWithStaticSamplers => {
                PipelineLayoutParam::DescriptorTableWithStaticSamplers(Vec::decode(r)?)
            }
            PipelineLayoutParamType::PushDescriptorsWithStaticSamplers => {
                PipelineLayoutParam::PushDescriptorsWithStaticSamplers(Vec::decode(r)?)
            }
        })
    }
}

/// Code as a `u64`-length blob, then the entry point string.
impl Encode for ShaderDesc {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write_blob(w, &self.code)?;
        write_str(w, self.entry_point.as_deref())
    }
}

impl Decode for ShaderDesc {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(ShaderDesc {
            code: read_blob(r)?,
            entry_point: read_str(r)?,
        })
    }
}

impl Encode for InputElement {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.location.encode(w)?;
        write_str(w, self.semantic.as_deref())?;
        self.semantic_index.encode(w)?;
        self.format.encode(w)?;
        self.buffer_binding.encode(w)?;
        self.offset.encode(w)?;
        self.stride.encode(w)?;
        self.instance_step_rate.encode(w)
    }
}

impl Decode for InputElement {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(InputElement {
            location: u32::decode(r)?,
            semantic: read_str(r)?,
            semantic_index: u32::decode(r)?,
            format: Format::decode(r)?,
            buffer_binding: u32::decode(r)?,
            offset: u32::decode(r)?,
            stride: u32::decode(r)?,
            instance_step_rate: u32::decode(r)?,
        })
    }
}

impl Encode for PipelineSubobject {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        use PipelineSubobject as S;
        (self.ty() as u32).encode(w)?;
        match self {
            S::VertexShader(d)
            | S::HullShader(d)
            | S::DomainShader(d)
            | S::GeometryShader(d)
            | S::PixelShader(d)
            | S::ComputeShader(d) => d.encode(w),
            S::InputLayout(elements) => elements.encode(w),
            S::StreamOutputState => Ok(()),
            S::BlendState(d) => d.encode(w),
            S::RasterizerState(d) => d.encode(w),
            S::DepthStencilState(d) => d.encode(w),
            S::PrimitiveTopology(t) => t.encode(w),
            S::DepthStencilFormat(f) => f.encode(w),
            S::RenderTargetFormats(formats) => formats.encode(w),
            S::SampleMask(v) | S::SampleCount(v) | S::ViewportCount(v) | S::MaxVertexCount(v) => {
                v.encode(w)
            }
            S::DynamicPipelineStates(states) => states.encode(w),
        }
    }
}

impl Decode for PipelineSubobject {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        use PipelineSubobject as S;
        use PipelineSubobjectType as T;
        let ty = T::try_from(u32::decode(r)?)
            .map_err(StreamError::discriminant("pipeline subobject type"))?;
        Ok(match ty {
            T::VertexShader => S::VertexShader(ShaderDesc::decode(r)?),
            T::HullShader => S::HullShader(ShaderDesc::decode(r)?),
            T::DomainShader => S::DomainShader(ShaderDesc::decode(r)?),
            T::GeometryShader => S::GeometryShader(ShaderDesc::decode(r)?),
            T::PixelShader => S::PixelShader(ShaderDesc::decode(r)?),
            T::ComputeShader => S::ComputeShader(ShaderDesc::decode(r)?),
            T::InputLayout => S::InputLayout(Vec::decode(r)?),
            T::StreamOutputState => S::StreamOutputState,
            T::BlendState => S::BlendState(BlendDesc::decode(r)?),
            T::RasterizerState => S::RasterizerState(RasterizerDesc::decode(r)?),
            T::DepthStencilState => S::DepthStencilState(DepthStencilDesc::decode(r)?),
            T::PrimitiveTopology => S::PrimitiveTopology(PrimitiveTopology::decode(r)?),
            T::DepthStencilFormat => S::DepthStencilFormat(Format::decode(r)?),
            T::RenderTargetFormats => S::RenderTargetFormats(Vec::decode(r)?),
            T::SampleMask => S::SampleMask(u32::decode(r)?),
            T::SampleCount => S::SampleCount(u32::decode(r)?),
            T::ViewportCount => S::ViewportCount(u32::decode(r)?),
            T::DynamicPipelineStates => S::DynamicPipelineStates(Vec::decode(r)?),
            T::MaxVertexCount => S::MaxVertexCount(u32::decode(r)?),
        })
    }
}

impl Encode for RenderPassDepthStencilDesc {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.view.encode(w)?;
        self.depth_load_op.encode(w)?;
        self.depth_store_op.encode(w)?;
        self.stencil_load_op.encode(w)?;
        self.stencil_store_op.encode(w)?;
        self.clear_depth.encode(w)?;
        self.clear_stencil.encode(w)
    }
}

impl Decode for RenderPassDepthStencilDesc {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(RenderPassDepthStencilDesc {
            view: ResourceView::decode(r)?,
            depth_load_op: RenderPassLoadOp::decode(r)?,
            depth_store_op: RenderPassStoreOp::decode(r)?,
            stencil_load_op: RenderPassLoadOp::decode(r)?,
            stencil_store_op: RenderPassStoreOp::decode(r)?,
            clear_depth: f32::decode(r)?,
            clear_stencil: u8::decode(r)?,
        })
    }
}

impl Encode for VertexBufferBinding {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.buffer.encode(w)?;
        self.offset.encode(w)?;
        self.stride.encode(w)
    }
}

impl Decode for VertexBufferBinding {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(VertexBufferBinding {
            buffer: Resource::decode(r)?,
            offset: u64::decode(r)?,
            stride: u32::decode(r)?,
        })
    }
}

impl Encode for TextureRegion {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.resource.encode(w)?;
        self.subresource.encode(w)?;
        self.region.encode(w)
    }
}

impl Decode for TextureRegion {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(TextureRegion {
            resource: Resource::decode(r)?,
            subresource: u32::decode(r)?,
            region: Option::decode(r)?,
        })
    }
}

impl Encode for BufferFootprint {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.buffer.encode(w)?;
        self.offset.encode(w)?;
        self.row_length.encode(w)?;
        self.slice_height.encode(w)
    }
}

impl Decode for BufferFootprint {
    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, StreamError> {
        Ok(BufferFootprint {
            buffer: Resource::decode(r)?,
            offset: u64::decode(r)?,
            row_length: u32::decode(r)?,
            slice_height: u32::decode(r)?,
        })
    }
}
