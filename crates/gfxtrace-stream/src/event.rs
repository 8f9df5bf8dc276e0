// SPDX-License-Identifier: CEPL-1.0
use crate::error::StreamError;
use crate::wire::*;
use gfxtrace_render::*;
use std::io::{self, Read, Write};

macro_rules! event_tags {
    ($($name:ident = $value:literal),* $(,)?) => {
        /// Event kind, written before every payload.
        #[repr(u32)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EventTag {
            $($name = $value),*
        }

        impl EventTag {
            pub const ALL: &'static [EventTag] = &[$(EventTag::$name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(EventTag::$name => stringify!($name)),*
                }
            }
        }

        impl TryFrom<u32> for EventTag {
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, u32> {
                match value {
                    $($value => Ok(EventTag::$name),)*
                    other => Err(other),
                }
            }
        }
    };
}

event_tags!(
    InitSwapchain = 0,
    DestroySwapchain = 1,
    InitSampler = 2,
    DestroySampler = 3,
    InitResource = 4,
    DestroyResource = 5,
    InitResourceView = 6,
    DestroyResourceView = 7,
    InitPipeline = 8,
    DestroyPipeline = 9,
    InitPipelineLayout = 10,
    DestroyPipelineLayout = 11,
    AllocateDescriptorTables = 12,
    FreeDescriptorTables = 13,
    CopyDescriptorTables = 14,
    UpdateDescriptorTables = 15,
    InitQueryHeap = 16,
    DestroyQueryHeap = 17,
    GetQueryHeapResults = 18,
    MapBufferRegion = 19,
    UnmapBufferRegion = 20,
    MapTextureRegion = 21,
    UnmapTextureRegion = 22,
    UpdateBufferRegion = 23,
    UpdateTextureRegion = 24,
    Barrier = 25,
    BeginRenderPass = 26,
    EndRenderPass = 27,
    BindRenderTargetsAndDepthStencil = 28,
    BindPipeline = 29,
    BindPipelineStates = 30,
    BindViewports = 31,
    BindScissorRects = 32,
    PushConstants = 33,
    PushDescriptors = 34,
    BindDescriptorTables = 35,
    BindIndexBuffer = 36,
    BindVertexBuffers = 37,
    BindStreamOutputBuffers = 38,
    Draw = 39,
    DrawIndexed = 40,
    Dispatch = 41,
    DrawOrDispatchIndirect = 42,
    CopyResource = 43,
    CopyBufferRegion = 44,
    CopyBufferToTexture = 45,
    CopyTextureRegion = 46,
    CopyTextureToBuffer = 47,
    ResolveTextureRegion = 48,
    ClearDepthStencilView = 49,
    ClearRenderTargetView = 50,
    ClearUnorderedAccessViewUint = 51,
    ClearUnorderedAccessViewFloat = 52,
    GenerateMipmaps = 53,
    BeginQuery = 54,
    EndQuery = 55,
    CopyQueryHeapResults = 56,
    ResetCommandList = 57,
    CloseCommandList = 58,
    ExecuteCommandList = 59,
    ExecuteSecondaryCommandList = 60,
    Present = 61,
);

impl EventTag {
    /// Tags that are part of the catalog but never carry a payload and have no replay effect.
    pub fn is_unrecorded(self) -> bool {
        matches!(
            self,
            EventTag::InitQueryHeap
                | EventTag::DestroyQueryHeap
                | EventTag::GetQueryHeapResults
                | EventTag::BeginQuery
                | EventTag::EndQuery
                | EventTag::CopyQueryHeapResults
                | EventTag::ResetCommandList
                | EventTag::CloseCommandList
                | EventTag::ExecuteCommandList
                | EventTag::ExecuteSecondaryCommandList
        )
    }

    /// Tags applied to the immediate command list rather than to the device.
    pub fn is_command(self) -> bool {
        (EventTag::Barrier as u32..=EventTag::GenerateMipmaps as u32).contains(&(self as u32))
    }
}

/// Contents of one subresource in an `InitResource` event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubresourcePayload {
    pub row_pitch: u32,
    pub slice_pitch: u32,
    pub data: Vec<u8>,
}

impl SubresourcePayload {
    pub fn as_data(&self) -> SubresourceData<'_> {
        SubresourceData {
            data: &self.data,
            row_pitch: self.row_pitch,
            slice_pitch: self.slice_pitch,
        }
    }
}

/// Bytes written through a texture mapping, with the pitches of that mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappedTexels {
    pub row_pitch: u32,
    pub slice_pitch: u32,
    pub data: Vec<u8>,
}

/// One recorded API call. Handles are origin handles.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    InitSwapchain {
        back_buffers: Vec<Resource>,
    },
    DestroySwapchain {
        back_buffers: Vec<Resource>,
    },
    InitSampler {
        desc: SamplerDesc,
        handle: Sampler,
    },
    DestroySampler {
        handle: Sampler,
    },
    /// Buffers carry at most one payload of exactly `desc.buffer.size` bytes; textures carry
    /// either none or one per subresource, in subresource index order.
    InitResource {
        desc: ResourceDesc,
        initial_state: ResourceUsage,
        handle: Resource,
        initial_data: Vec<SubresourcePayload>,
    },
    DestroyResource {
        handle: Resource,
    },
    InitResourceView {
        resource: Resource,
        usage_type: ResourceUsage,
        desc: ResourceViewDesc,
        handle: ResourceView,
    },
    DestroyResourceView {
        handle: ResourceView,
    },
    InitPipeline {
        layout: PipelineLayout,
        subobjects: Vec<PipelineSubobject>,
        handle: Pipeline,
    },
    DestroyPipeline {
        handle: Pipeline,
    },
    InitPipelineLayout {
        params: Vec<PipelineLayoutParam>,
        handle: PipelineLayout,
    },
    DestroyPipelineLayout {
        handle: PipelineLayout,
    },
    AllocateDescriptorTables {
        layout: PipelineLayout,
        param: u32,
        tables: Vec<DescriptorTable>,
    },
    FreeDescriptorTables {
        tables: Vec<DescriptorTable>,
    },
    CopyDescriptorTables {
        copies: Vec<DescriptorTableCopy>,
    },
    UpdateDescriptorTables {
        updates: Vec<DescriptorTableUpdate>,
    },
    MapBufferRegion {
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    },
    /// `data` holds `size` bytes when the access writes, and is empty otherwise.
    UnmapBufferRegion {
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
        data: Vec<u8>,
    },
    MapTextureRegion {
        resource: Resource,
        subresource: u32,
        region: Option<SubresourceBox>,
        access: MapAccess,
    },
    /// `texels` is present exactly when the access writes.
    UnmapTextureRegion {
        resource: Resource,
        subresource: u32,
        region: Option<SubresourceBox>,
        access: MapAccess,
        texels: Option<MappedTexels>,
    },
    UpdateBufferRegion {
        resource: Resource,
        offset: u64,
        data: Vec<u8>,
    },
    UpdateTextureRegion {
        resource: Resource,
        subresource: u32,
        region: Option<SubresourceBox>,
        row_pitch: u32,
        slice_pitch: u32,
        data: Vec<u8>,
    },
    Barrier {
        barriers: Vec<Barrier>,
    },
    BeginRenderPass {
        render_targets: Vec<RenderPassRenderTargetDesc>,
        depth_stencil: Option<RenderPassDepthStencilDesc>,
    },
    EndRenderPass,
    BindRenderTargetsAndDepthStencil {
        rtvs: Vec<ResourceView>,
        dsv: ResourceView,
    },
    BindPipeline {
        stages: PipelineStage,
        pipeline: Pipeline,
    },
    BindPipelineStates {
        states: Vec<(DynamicState, u32)>,
    },
    BindViewports {
        first: u32,
        viewports: Vec<Viewport>,
    },
    BindScissorRects {
        first: u32,
        rects: Vec<Rect>,
    },
    PushConstants {
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        first: u32,
        values: Vec<u32>,
    },
    PushDescriptors {
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        binding: u32,
        array_offset: u32,
        descriptors: Descriptors,
    },
    BindDescriptorTables {
        stages: ShaderStage,
        layout: PipelineLayout,
        first: u32,
        tables: Vec<DescriptorTable>,
    },
    BindIndexBuffer {
        buffer: Resource,
        offset: u64,
        index_size: u32,
    },
    BindVertexBuffers {
        first: u32,
        bindings: Vec<VertexBufferBinding>,
    },
    BindStreamOutputBuffers {
        first: u32,
        bindings: Vec<StreamOutputBinding>,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch {
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    },
    DrawOrDispatchIndirect {
        ty: IndirectCommand,
        buffer: Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    CopyResource {
        src: Resource,
        dst: Resource,
    },
    CopyBufferRegion {
        src: Resource,
        src_offset: u64,
        dst: Resource,
        dst_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        src: BufferFootprint,
        dst: TextureRegion,
    },
    CopyTextureRegion {
        src: TextureRegion,
        dst: TextureRegion,
        filter: FilterMode,
    },
    CopyTextureToBuffer {
        src: TextureRegion,
        dst: BufferFootprint,
    },
    ResolveTextureRegion {
        src: TextureRegion,
        dst: Resource,
        dst_subresource: u32,
        dst_offset: [i32; 3],
        format: Format,
    },
    ClearDepthStencilView {
        dsv: ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: Vec<Rect>,
    },
    ClearRenderTargetView {
        rtv: ResourceView,
        color: [f32; 4],
        rects: Vec<Rect>,
    },
    ClearUnorderedAccessViewUint {
        uav: ResourceView,
        values: [u32; 4],
        rects: Vec<Rect>,
    },
    ClearUnorderedAccessViewFloat {
        uav: ResourceView,
        values: [f32; 4],
        rects: Vec<Rect>,
    },
    GenerateMipmaps {
        srv: ResourceView,
    },
    Present,
    /// A payload-free tag with no replay effect.
    Unrecorded(EventTag),
}

impl Event {
    pub fn tag(&self) -> EventTag {
        use Event as E;
        use EventTag as T;
        match self {
            E::InitSwapchain { .. } => T::InitSwapchain,
            E::DestroySwapchain { .. } => T::DestroySwapchain,
            E::InitSampler { .. } => T::InitSampler,
            E::DestroySampler { .. } => T::DestroySampler,
            E::InitResource { .. } => T::InitResource,
            E::DestroyResource { .. } => T::DestroyResource,
            E::InitResourceView { .. } => T::InitResourceView,
            E::DestroyResourceView { .. } => T::DestroyResourceView,
            E::InitPipeline { .. } => T::InitPipeline,
            E::DestroyPipeline { .. } => T::DestroyPipeline,
            E::InitPipelineLayout { .. } => T::InitPipelineLayout,
            E::DestroyPipelineLayout { .. } => T::DestroyPipelineLayout,
            E::AllocateDescriptorTables { .. } => T::AllocateDescriptorTables,
            E::FreeDescriptorTables { .. } => T::FreeDescriptorTables,
            E::CopyDescriptorTables { .. } => T::CopyDescriptorTables,
            E::UpdateDescriptorTables { .. } => T::UpdateDescriptorTables,
            E::MapBufferRegion { .. } => T::MapBufferRegion,
            E::UnmapBufferRegion { .. } => T::UnmapBufferRegion,
            E::MapTextureRegion { .. } => T::MapTextureRegion,
            E::UnmapTextureRegion { .. } => T::UnmapTextureRegion,
            E::UpdateBufferRegion { .. } => T::UpdateBufferRegion,
            E::UpdateTextureRegion { .. } => T::UpdateTextureRegion,
            E::Barrier { .. } => T::Barrier,
            E::BeginRenderPass { .. } => T::BeginRenderPass,
            E::EndRenderPass => T::EndRenderPass,
            E::BindRenderTargetsAndDepthStencil { .. } => T::BindRenderTargetsAndDepthStencil,
            E::BindPipeline { .. } => T::BindPipeline,
            E::BindPipelineStates { .. } => T::BindPipelineStates,
            E::BindViewports { .. } => T::BindViewports,
            E::BindScissorRects { .. } => T::BindScissorRects,
            E::PushConstants { .. } => T::PushConstants,
            E::PushDescriptors { .. } => T::PushDescriptors,
            E::BindDescriptorTables { .. } => T::BindDescriptorTables,
            E::BindIndexBuffer { .. } => T::BindIndexBuffer,
            E::BindVertexBuffers { .. } => T::BindVertexBuffers,
            E::BindStreamOutputBuffers { .. } => T::BindStreamOutputBuffers,
            E::Draw { .. } => T::Draw,
            E::DrawIndexed { .. } => T::DrawIndexed,
            E::Dispatch { .. } => T::Dispatch,
            E::DrawOrDispatchIndirect { .. } => T::DrawOrDispatchIndirect,
            E::CopyResource { .. } => T::CopyResource,
            E::CopyBufferRegion { .. } => T::CopyBufferRegion,
            E::CopyBufferToTexture { .. } => T::CopyBufferToTexture,
            E::CopyTextureRegion { .. } => T::CopyTextureRegion,
            E::CopyTextureToBuffer { .. } => T::CopyTextureToBuffer,
            E::ResolveTextureRegion { .. } => T::ResolveTextureRegion,
            E::ClearDepthStencilView { .. } => T::ClearDepthStencilView,
            E::ClearRenderTargetView { .. } => T::ClearRenderTargetView,
            E::ClearUnorderedAccessViewUint { .. } => T::ClearUnorderedAccessViewUint,
            E::ClearUnorderedAccessViewFloat { .. } => T::ClearUnorderedAccessViewFloat,
            E::GenerateMipmaps { .. } => T::GenerateMipmaps,
            E::Present => T::Present,
            E::Unrecorded(tag) => *tag,
        }
    }

    /// Writes the tag followed by the payload.
    pub fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        use Event as E;
        (self.tag() as u32).encode(w)?;
        match self {
            E::InitSwapchain { back_buffers } | E::DestroySwapchain { back_buffers } => {
                back_buffers.encode(w)
            }
            E::InitSampler { desc, handle } => {
                desc.encode(w)?;
                handle.encode(w)
            }
            E::DestroySampler { handle } => handle.encode(w),
            E::InitResource {
                desc,
                initial_state,
                handle,
                initial_data,
            } => {
                desc.encode(w)?;
                initial_state.encode(w)?;
                handle.encode(w)?;
                write_len(w, initial_data.len())?;
                if desc.ty == ResourceType::Buffer {
                    if let Some(payload) = initial_data.first() {
                        debug_assert_eq!(payload.data.len() as u64, desc.buffer.size);
                        w.write_all(&payload.data)?;
                    }
                } else {
                    for payload in initial_data {
                        payload.row_pitch.encode(w)?;
                        payload.slice_pitch.encode(w)?;
                        write_blob(w, &payload.data)?;
                    }
                }
                Ok(())
            }
            E::DestroyResource { handle } => handle.encode(w),
            E::InitResourceView {
                resource,
                usage_type,
                desc,
                handle,
            } => {
                resource.encode(w)?;
                usage_type.encode(w)?;
                desc.encode(w)?;
                handle.encode(w)
            }
            E::DestroyResourceView { handle } => handle.encode(w),
            E::InitPipeline {
                layout,
                subobjects,
                handle,
            } => {
                layout.encode(w)?;
                subobjects.encode(w)?;
                handle.encode(w)
            }
            E::DestroyPipeline { handle } => handle.encode(w),
            E::InitPipelineLayout { params, handle } => {
                params.encode(w)?;
                handle.encode(w)
            }
            E::DestroyPipelineLayout { handle } => handle.encode(w),
            E::AllocateDescriptorTables {
                layout,
                param,
                tables,
            } => {
                layout.encode(w)?;
                param.encode(w)?;
                tables.encode(w)
            }
            E::FreeDescriptorTables { tables } => tables.encode(w),
            E::CopyDescriptorTables { copies } => copies.encode(w),
            E::UpdateDescriptorTables { updates } => updates.encode(w),
            E::MapBufferRegion {
                resource,
                offset,
                size,
                access,
            } => {
                resource.encode(w)?;
                offset.encode(w)?;
                size.encode(w)?;
                access.encode(w)
            }
            E::UnmapBufferRegion {
                resource,
                offset,
                size,
                access,
                data,
            } => {
                resource.encode(w)?;
                offset.encode(w)?;
                size.encode(w)?;
                access.encode(w)?;
                if access.writes() {
                    debug_assert_eq!(data.len() as u64, *size);
                    w.write_all(data)?;
                }
                Ok(())
            }
            E::MapTextureRegion {
                resource,
                subresource,
                region,
                access,
            } => {
                resource.encode(w)?;
                subresource.encode(w)?;
                region.encode(w)?;
                access.encode(w)
            }
            E::UnmapTextureRegion {
                resource,
                subresource,
                region,
                access,
                texels,
            } => {
                resource.encode(w)?;
                subresource.encode(w)?;
                region.encode(w)?;
                access.encode(w)?;
                if access.writes() {
                    let texels = texels.as_ref().map(|t| (t.row_pitch, t.slice_pitch, &t.data[..]));
                    let (row_pitch, slice_pitch, data) = texels.unwrap_or((0, 0, &[]));
                    row_pitch.encode(w)?;
                    slice_pitch.encode(w)?;
                    write_blob(w, data)?;
                }
                Ok(())
            }
            E::UpdateBufferRegion {
                resource,
                offset,
                data,
            } => {
                resource.encode(w)?;
                offset.encode(w)?;
                write_blob(w, data)
            }
            E::UpdateTextureRegion {
                resource,
                subresource,
                region,
                row_pitch,
                slice_pitch,
                data,
            } => {
                resource.encode(w)?;
                subresource.encode(w)?;
                region.encode(w)?;
                row_pitch.encode(w)?;
                slice_pitch.encode(w)?;
                write_blob(w, data)
            }
            E::Barrier { barriers } => barriers.encode(w),
            E::BeginRenderPass {
                render_targets,
                depth_stencil,
            } => {
                render_targets.encode(w)?;
                depth_stencil.encode(w)
            }
            E::EndRenderPass | E::Present => Ok(()),
            E::BindRenderTargetsAndDepthStencil { rtvs, dsv } => {
                rtvs.encode(w)?;
                dsv.encode(w)
            }
            E::BindPipeline { stages, pipeline } => {
                stages.encode(w)?;
                pipeline.encode(w)
            }
            E::BindPipelineStates { states } => states.encode(w),
            E::BindViewports { first, viewports } => {
                first.encode(w)?;
                viewports.encode(w)
            }
            E::BindScissorRects { first, rects } => {
                first.encode(w)?;
                rects.encode(w)
            }
            E::PushConstants {
                stages,
                layout,
                param,
                first,
                values,
            } => {
                stages.encode(w)?;
                layout.encode(w)?;
                param.encode(w)?;
                first.encode(w)?;
                values.encode(w)
            }
            E::PushDescriptors {
                stages,
                layout,
                param,
                binding,
                array_offset,
                descriptors,
            } => {
                stages.encode(w)?;
                layout.encode(w)?;
                param.encode(w)?;
                binding.encode(w)?;
                array_offset.encode(w)?;
                descriptors.encode(w)
            }
            E::BindDescriptorTables {
                stages,
                layout,
                first,
                tables,
            } => {
                stages.encode(w)?;
                layout.encode(w)?;
                first.encode(w)?;
                tables.encode(w)
            }
            E::BindIndexBuffer {
                buffer,
                offset,
                index_size,
            } => {
                buffer.encode(w)?;
                offset.encode(w)?;
                index_size.encode(w)
            }
            E::BindVertexBuffers { first, bindings } => {
                first.encode(w)?;
                bindings.encode(w)
            }
            E::BindStreamOutputBuffers { first, bindings } => {
                first.encode(w)?;
                bindings.encode(w)
            }
            E::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => [vertex_count, instance_count, first_vertex, first_instance]
                .into_iter()
                .try_for_each(|v| v.encode(w)),
            E::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => {
                index_count.encode(w)?;
                instance_count.encode(w)?;
                first_index.encode(w)?;
                vertex_offset.encode(w)?;
                first_instance.encode(w)
            }
            E::Dispatch {
                group_count_x,
                group_count_y,
                group_count_z,
            } => [group_count_x, group_count_y, group_count_z]
                .into_iter()
                .try_for_each(|v| v.encode(w)),
            E::DrawOrDispatchIndirect {
                ty,
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                ty.encode(w)?;
                buffer.encode(w)?;
                offset.encode(w)?;
                draw_count.encode(w)?;
                stride.encode(w)
            }
            E::CopyResource { src, dst } => {
                src.encode(w)?;
                dst.encode(w)
            }
            E::CopyBufferRegion {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                src.encode(w)?;
                src_offset.encode(w)?;
                dst.encode(w)?;
                dst_offset.encode(w)?;
                size.encode(w)
            }
            E::CopyBufferToTexture { src, dst } => {
                src.encode(w)?;
                dst.encode(w)
            }
            E::CopyTextureRegion { src, dst, filter } => {
                src.encode(w)?;
                dst.encode(w)?;
                filter.encode(w)
            }
            E::CopyTextureToBuffer { src, dst } => {
                src.encode(w)?;
                dst.encode(w)
            }
            E::ResolveTextureRegion {
                src,
                dst,
                dst_subresource,
                dst_offset,
                format,
            } => {
                src.encode(w)?;
                dst.encode(w)?;
                dst_subresource.encode(w)?;
                dst_offset.encode(w)?;
                format.encode(w)
            }
            E::ClearDepthStencilView {
                dsv,
                depth,
                stencil,
                rects,
            } => {
                dsv.encode(w)?;
                depth.encode(w)?;
                stencil.encode(w)?;
                rects.encode(w)
            }
            E::ClearRenderTargetView { rtv, color, rects } => {
                rtv.encode(w)?;
                color.encode(w)?;
                rects.encode(w)
            }
            E::ClearUnorderedAccessViewUint { uav, values, rects } => {
                uav.encode(w)?;
                values.encode(w)?;
                rects.encode(w)
            }
            E::ClearUnorderedAccessViewFloat { uav, values, rects } => {
                uav.encode(w)?;
                values.encode(w)?;
                rects.encode(w)
            }
            E::GenerateMipmaps { srv } => srv.encode(w),
            E::Unrecorded(_) => Ok(()),
        }
    }

    /// Reads the payload of an event whose tag has already been consumed.
    pub fn decode_payload<R: Read + ?Sized>(tag: EventTag, r: &mut R) -> Result<Event, StreamError> {
        use Event as E;
        use EventTag as T;
        Ok(match tag {
            T::InitSwapchain => E::InitSwapchain {
                back_buffers: Vec::decode(r)?,
            },
            T::DestroySwapchain => E::DestroySwapchain {
                back_buffers: Vec::decode(r)?,
            },
            T::InitSampler => E::InitSampler {
                desc: SamplerDesc::decode(r)?,
                handle: Sampler::decode(r)?,
            },
            T::DestroySampler => E::DestroySampler {
                handle: Sampler::decode(r)?,
            },
            T::InitResource => {
                let desc = ResourceDesc::decode(r)?;
                let initial_state = ResourceUsage::decode(r)?;
                let handle = Resource::decode(r)?;
                let count = read_len(r)?;
                let mut initial_data = Vec::new();
                if desc.ty == ResourceType::Buffer {
                    if count != 0 {
                        initial_data.push(SubresourcePayload {
                            data: read_bytes(r, desc.buffer.size)?,
                            ..Default::default()
                        });
                    }
                } else {
                    for _ in 0..count {
                        initial_data.push(SubresourcePayload {
                            row_pitch: u32::decode(r)?,
                            slice_pitch: u32::decode(r)?,
                            data: read_blob(r)?,
                        });
                    }
                }
                E::InitResource {
                    desc,
                    initial_state,
                    handle,
                    initial_data,
                }
            }
            T::DestroyResource => E::DestroyResource {
                handle: Resource::decode(r)?,
            },
            T::InitResourceView => E::InitResourceView {
                resource: Resource::decode(r)?,
                usage_type: ResourceUsage::decode(r)?,
                desc: ResourceViewDesc::decode(r)?,
                handle: ResourceView::decode(r)?,
            },
            T::DestroyResourceView => E::DestroyResourceView {
                handle: ResourceView::decode(r)?,
            },
            T::InitPipeline => E::InitPipeline {
                layout: PipelineLayout::decode(r)?,
                subobjects: Vec::decode(r)?,
                handle: Pipeline::decode(r)?,
            },
            T::DestroyPipeline => E::DestroyPipeline {
                handle: Pipeline::decode(r)?,
            },
            T::InitPipelineLayout => E::InitPipelineLayout {
                params: Vec::decode(r)?,
                handle: PipelineLayout::decode(r)?,
            },
            T::DestroyPipelineLayout => E::DestroyPipelineLayout {
                handle: PipelineLayout::decode(r)?,
            },
            T::AllocateDescriptorTables => E::AllocateDescriptorTables {
                layout: PipelineLayout::decode(r)?,
                param: u32::decode(r)?,
                tables: Vec::decode(r)?,
            },
            T::FreeDescriptorTables => E::FreeDescriptorTables {
                tables: Vec::decode(r)?,
            },
            T::CopyDescriptorTables => E::CopyDescriptorTables {
                copies: Vec::decode(r)?,
            },
            T::UpdateDescriptorTables => E::UpdateDescriptorTables {
                updates: Vec::decode(r)?,
            },
            T::MapBufferRegion => E::MapBufferRegion {
                resource: Resource::decode(r)?,
                offset: u64::decode(r)?,
                size: u64::decode(r)?,
                access: MapAccess::decode(r)?,
            },
            T::UnmapBufferRegion => {
                let resource = Resource::decode(r)?;
                let offset = u64::decode(r)?;
                let size = u64::decode(r)?;
                let access = MapAccess::decode(r)?;
                let data = if access.writes() {
                    read_bytes(r, size)?
                } else {
                    Vec::new()
                };
                E::UnmapBufferRegion {
                    resource,
                    offset,
                    size,
                    access,
                    data,
                }
            }
            T::MapTextureRegion => E::MapTextureRegion {
                resource: Resource::decode(r)?,
                subresource: u32::decode(r)?,
                region: Option::decode(r)?,
                access: MapAccess::decode(r)?,
            },
            T::UnmapTextureRegion => {
                let resource = Resource::decode(r)?;
                let subresource = u32::decode(r)?;
                let region = Option::decode(r)?;
                let access = MapAccess::decode(r)?;
                let texels = if access.writes() {
                    Some(MappedTexels {
                        row_pitch: u32::decode(r)?,
                        slice_pitch: u32::decode(r)?,
                        data: read_blob(r)?,
                    })
                } else {
                    None
                };
                E::UnmapTextureRegion {
                    resource,
                    subresource,
                    region,
                    access,
                    texels,
                }
            }
            T::UpdateBufferRegion => E::UpdateBufferRegion {
                resource: Resource::decode(r)?,
                offset: u64::decode(r)?,
                data: read_blob(r)?,
            },
            T::UpdateTextureRegion => E::UpdateTextureRegion {
                resource: Resource::decode(r)?,
                subresource: u32::decode(r)?,
                region: Option::decode(r)?,
                row_pitch: u32::decode(r)?,
                slice_pitch: u32::decode(r)?,
                data: read_blob(r)?,
            },
            T::Barrier => E::Barrier {
                barriers: Vec::decode(r)?,
            },
            T::BeginRenderPass => E::BeginRenderPass {
                render_targets: Vec::decode(r)?,
                depth_stencil: Option::decode(r)?,
            },
            T::EndRenderPass => E::EndRenderPass,
            T::BindRenderTargetsAndDepthStencil => E::BindRenderTargetsAndDepthStencil {
                rtvs: Vec::decode(r)?,
                dsv: ResourceView::decode(r)?,
            },
            T::BindPipeline => E::BindPipeline {
                stages: PipelineStage::decode(r)?,
                pipeline: Pipeline::decode(r)?,
            },
            T::BindPipelineStates => E::BindPipelineStates {
                states: Vec::decode(r)?,
            },
            T::BindViewports => E::BindViewports {
                first: u32::decode(r)?,
                viewports: Vec::decode(r)?,
            },
            T::BindScissorRects => E::BindScissorRects {
                first: u32::decode(r)?,
                rects: Vec::decode(r)?,
            },
            T::PushConstants => E::PushConstants {
                stages: ShaderStage::decode(r)?,
                layout: PipelineLayout::decode(r)?,
                param: u32::decode(r)?,
                first: u32::decode(r)?,
                values: Vec::decode(r)?,
            },
            T::PushDescriptors => E::PushDescriptors {
                stages: ShaderStage::decode(r)?,
                layout: PipelineLayout::decode(r)?,
                param: u32::decode(r)?,
                binding: u32::decode(r)?,
                array_offset: u32::decode(r)?,
                descriptors: Descriptors::decode(r)?,
            },
            T::BindDescriptorTables => E::BindDescriptorTables {
                stages: ShaderStage::decode(r)?,
                layout: PipelineLayout::decode(r)?,
                first: u32::decode(r)?,
                tables: Vec::decode(r)?,
            },
            T::BindIndexBuffer => E::BindIndexBuffer {
                buffer: Resource::decode(r)?,
                offset: u64::decode(r)?,
                index_size: u32::decode(r)?,
            },
            T::BindVertexBuffers => E::BindVertexBuffers {
                first: u32::decode(r)?,
                bindings: Vec::decode(r)?,
            },
            T::BindStreamOutputBuffers => E::BindStreamOutputBuffers {
                first: u32::decode(r)?,
                bindings: Vec::decode(r)?,
            },
            T::Draw => E::Draw {
                vertex_count: u32::decode(r)?,
                instance_count: u32::decode(r)?,
                first_vertex: u32::decode(r)?,
                first_instance: u32::decode(r)?,
            },
            T::DrawIndexed => E::DrawIndexed {
                index_count: u32::decode(r)?,
                instance_count: u32::decode(r)?,
                first_index: u32::decode(r)?,
                vertex_offset: i32::decode(r)?,
                first_instance: u32::decode(r)?,
            },
            T::Dispatch => E::Dispatch {
                group_count_x: u32::decode(r)?,
                group_count_y: u32::decode(r)?,
                group_count_z: u32::decode(r)?,
            },
            T::DrawOrDispatchIndirect => E::DrawOrDispatchIndirect {
                ty: IndirectCommand::decode(r)?,
                buffer: Resource::decode(r)?,
                offset: u64::decode(r)?,
                draw_count: u32::decode(r)?,
                stride: u32::decode(r)?,
            },
            T::CopyResource => E::CopyResource {
                src: Resource::decode(r)?,
                dst: Resource::decode(r)?,
            },
            T::CopyBufferRegion => E::CopyBufferRegion {
                src: Resource::decode(r)?,
                src_offset: u64::decode(r)?,
                dst: Resource::decode(r)?,
                dst_offset: u64::decode(r)?,
                size: u64::decode(r)?,
            },
            T::CopyBufferToTexture => E::CopyBufferToTexture {
                src: BufferFootprint::decode(r)?,
                dst: TextureRegion::decode(r)?,
            },
            T::CopyTextureRegion => E::CopyTextureRegion {
                src: TextureRegion::decode(r)?,
                dst: TextureRegion::decode(r)?,
                filter: FilterMode::decode(r)?,
            },
            T::CopyTextureToBuffer => E::CopyTextureToBuffer {
                src: TextureRegion::decode(r)?,
                dst: BufferFootprint::decode(r)?,
            },
            T::ResolveTextureRegion => E::ResolveTextureRegion {
                src: TextureRegion::decode(r)?,
                dst: Resource::decode(r)?,
                dst_subresource: u32::decode(r)?,
                dst_offset: <[i32; 3]>::decode(r)?,
                format: Format::decode(r)?,
            },
            T::ClearDepthStencilView => E::ClearDepthStencilView {
                dsv: ResourceView::decode(r)?,
                depth: Option::decode(r)?,
                stencil: Option::decode(r)?,
                rects: Vec::decode(r)?,
            },
            T::ClearRenderTargetView => E::ClearRenderTargetView {
                rtv: ResourceView::decode(r)?,
                color: <[f32; 4]>::decode(r)?,
                rects: Vec::decode(r)?,
            },
            T::ClearUnorderedAccessViewUint => E::ClearUnorderedAccessViewUint {
                uav: ResourceView::decode(r)?,
                values: <[u32; 4]>::decode(r)?,
                rects: Vec::decode(r)?,
            },
            T::ClearUnorderedAccessViewFloat => E::ClearUnorderedAccessViewFloat {
                uav: ResourceView::decode(r)?,
                values: <[f32; 4]>::decode(r)?,
                rects: Vec::decode(r)?,
            },
            T::GenerateMipmaps => E::GenerateMipmaps {
                srv: ResourceView::decode(r)?,
            },
            T::Present => E::Present,
            T::InitQueryHeap
            | T::DestroyQueryHeap
            | T::GetQueryHeapResults
            | T::BeginQuery
            | T::EndQuery
            | T::CopyQueryHeapResults
            | T::ResetCommandList
            | T::CloseCommandList
            | T::ExecuteCommandList
            | T::ExecuteSecondaryCommandList => E::Unrecorded(tag),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tags_are_dense_and_named() {
        for (i, tag) in EventTag::ALL.iter().enumerate() {
            assert_eq!(*tag as u32, i as u32);
            assert_eq!(EventTag::try_from(i as u32), Ok(*tag));
        }
        assert_eq!(EventTag::try_from(EventTag::ALL.len() as u32), Err(62));
        assert_eq!(EventTag::Present.name(), "Present");
    }

    #[test]
    fn read_only_unmap_carries_no_bytes() {
        let ev = Event::UnmapBufferRegion {
            resource: Resource(3),
            offset: 0,
            size: 1 << 20,
            access: MapAccess::ReadOnly,
            data: Vec::new(),
        };
        let mut buf = Vec::new();
        ev.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 4 + 8 + 8 + 8 + 4);

        let tag = EventTag::try_from(u32::from_ne_bytes(buf[..4].try_into().unwrap())).unwrap();
        let decoded = Event::decode_payload(tag, &mut Cursor::new(&buf[4..])).unwrap();
        assert_eq!(decoded, ev);
    }

    #[test]
    fn unrecorded_tags_have_empty_payloads() {
        for tag in EventTag::ALL.iter().copied().filter(|t| t.is_unrecorded()) {
            let mut empty = Cursor::new(Vec::<u8>::new());
            assert_eq!(
                Event::decode_payload(tag, &mut empty).unwrap(),
                Event::Unrecorded(tag)
            );
        }
    }
}
