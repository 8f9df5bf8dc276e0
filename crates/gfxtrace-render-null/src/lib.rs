// SPDX-License-Identifier: CEPL-1.0
//! Headless backend. No GPU work is done; buffers and textures live in host memory and every
//! call is appended to a journal, so playback can be observed without a window.
use gfxtrace_render::*;
use gfxtrace_stream::{Event, EventTag};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ptr::NonNull;
use tracing::{debug, trace};

/// One call made against the headless device, with live handles.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateSampler {
        desc: SamplerDesc,
        handle: Sampler,
    },
    DestroySampler(Sampler),
    CreateResource {
        desc: ResourceDesc,
        initial_data: Vec<Vec<u8>>,
        initial_state: ResourceUsage,
        handle: Resource,
    },
    DestroyResource(Resource),
    CreateResourceView {
        resource: Resource,
        usage_type: ResourceUsage,
        desc: ResourceViewDesc,
        handle: ResourceView,
    },
    DestroyResourceView(ResourceView),
    CreatePipeline {
        layout: PipelineLayout,
        subobjects: Vec<PipelineSubobject>,
        handle: Pipeline,
    },
    DestroyPipeline(Pipeline),
    CreatePipelineLayout {
        params: Vec<PipelineLayoutParam>,
        handle: PipelineLayout,
    },
    DestroyPipelineLayout(PipelineLayout),
    AllocateDescriptorTables {
        layout: PipelineLayout,
        param: u32,
        tables: Vec<DescriptorTable>,
    },
    FreeDescriptorTables(Vec<DescriptorTable>),
    CopyDescriptorTables(Vec<DescriptorTableCopy>),
    UpdateDescriptorTables(Vec<DescriptorTableUpdate>),
    MapBufferRegion {
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    },
    UnmapBufferRegion(Resource),
    MapTextureRegion {
        resource: Resource,
        subresource: u32,
        region: Option<SubresourceBox>,
        access: MapAccess,
    },
    UnmapTextureRegion {
        resource: Resource,
        subresource: u32,
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
        data: Vec<u8>,
    },
    /// A command-list call, written in the event vocabulary.
    Command(Event),
    UpdateEffects,
    Present {
        back_buffer: Resource,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateSampler { .. } => "create_sampler",
            Call::DestroySampler(_) => "destroy_sampler",
            Call::CreateResource { .. } => "create_resource",
            Call::DestroyResource(_) => "destroy_resource",
            Call::CreateResourceView { .. } => "create_resource_view",
            Call::DestroyResourceView(_) => "destroy_resource_view",
            Call::CreatePipeline { .. } => "create_pipeline",
            Call::DestroyPipeline(_) => "destroy_pipeline",
            Call::CreatePipelineLayout { .. } => "create_pipeline_layout",
            Call::DestroyPipelineLayout(_) => "destroy_pipeline_layout",
            Call::AllocateDescriptorTables { .. } => "allocate_descriptor_tables",
            Call::FreeDescriptorTables(_) => "free_descriptor_tables",
            Call::CopyDescriptorTables(_) => "copy_descriptor_tables",
            Call::UpdateDescriptorTables(_) => "update_descriptor_tables",
            Call::MapBufferRegion { .. } => "map_buffer_region",
            Call::UnmapBufferRegion(_) => "unmap_buffer_region",
            Call::MapTextureRegion { .. } => "map_texture_region",
            Call::UnmapTextureRegion { .. } => "unmap_texture_region",
            Call::UpdateBufferRegion { .. } => "update_buffer_region",
            Call::UpdateTextureRegion { .. } => "update_texture_region",
            Call::Command(event) => event.tag().name(),
            Call::UpdateEffects => "update_effects",
            Call::Present { .. } => "present",
        }
    }
}

struct Subresource {
    row_pitch: u32,
    slice_pitch: u32,
    bytes: Vec<u8>,
}

struct Storage {
    desc: ResourceDesc,
    subresources: Vec<Subresource>,
}

fn mip(extent: u32, level: u32) -> u32 {
    extent.checked_shr(level).unwrap_or(0).max(1)
}

/// Tightly packed layout of one subresource.
fn texture_layout(desc: &ResourceDesc, subresource: u32) -> Subresource {
    let t = &desc.texture;
    let (levels, _) = desc.subresource_extent();
    let level = subresource % levels;
    let row_pitch = format_row_pitch(t.format, mip(t.width, level));
    let slice_pitch = format_slice_pitch(t.format, row_pitch, mip(t.height, level));
    let depth = if desc.ty == ResourceType::Texture3d {
        mip(u32::from(t.depth_or_layers), level)
    } else {
        1
    };
    Subresource {
        row_pitch,
        slice_pitch,
        bytes: vec![0; slice_pitch as usize * depth as usize],
    }
}

/// Copies rows between layouts with different pitches; equal pitches copy linearly.
fn copy_pitched(dst: &mut [u8], dst_row_pitch: u32, src: &[u8], src_row_pitch: u32) {
    if src_row_pitch == 0 || dst_row_pitch == 0 || src_row_pitch == dst_row_pitch {
        let n = dst.len().min(src.len());
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    let width = src_row_pitch.min(dst_row_pitch) as usize;
    for (d, s) in dst
        .chunks_mut(dst_row_pitch as usize)
        .zip(src.chunks(src_row_pitch as usize))
    {
        let n = width.min(d.len()).min(s.len());
        d[..n].copy_from_slice(&s[..n]);
    }
}

fn host_offset(value: u64) -> Result<usize, DeviceError> {
    usize::try_from(value).map_err(|_| DeviceError::Native(format!("offset {value} exceeds host memory")))
}

fn region_offset(format: Format, sub: &Subresource, region: Option<&SubresourceBox>) -> usize {
    let Some(region) = region else {
        return 0;
    };
    let block_height = if format.is_block_compressed() { 4 } else { 1 };
    region.front as usize * sub.slice_pitch as usize
        + (region.top / block_height) as usize * sub.row_pitch as usize
        + format_row_pitch(format, region.left) as usize
}

impl Storage {
    fn new(desc: &ResourceDesc) -> Result<Self, DeviceError> {
        let subresources = if desc.ty == ResourceType::Buffer {
            let len = usize::try_from(desc.buffer.size)
                .map_err(|_| DeviceError::Native(format!("buffer of {} bytes", desc.buffer.size)))?;
            vec![Subresource {
                row_pitch: 0,
                slice_pitch: 0,
                bytes: vec![0; len],
            }]
        } else if desc.is_texture() {
            let (levels, layers) = desc.subresource_extent();
            (0..levels * layers)
                .map(|i| texture_layout(desc, i))
                .collect()
        } else {
            return Err(DeviceError::Unsupported("resource type"));
        };
        Ok(Storage {
            desc: *desc,
            subresources,
        })
    }
}

/// The device and immediate command list of the headless backend.
pub struct NullDevice {
    api: DeviceApi,
    next_handle: u64,
    storage: HashMap<Resource, Storage>,
    objects: HashSet<u64>,
    journal: Vec<Call>,
    fail_creation: bool,
    refuse_texture_maps: bool,
    unsupported: HashSet<EventTag>,
    dropped: u64,
}

impl NullDevice {
    pub fn new(api: DeviceApi) -> Self {
        NullDevice {
            api,
            next_handle: 0,
            storage: HashMap::new(),
            objects: HashSet::new(),
            journal: Vec::new(),
            fail_creation: false,
            refuse_texture_maps: false,
            unsupported: HashSet::new(),
            dropped: 0,
        }
    }

    pub fn journal(&self) -> &[Call] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.journal)
    }

    /// Number of journal entries per call name.
    pub fn call_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for call in &self.journal {
            *counts.entry(call.name()).or_default() += 1;
        }
        counts
    }

    /// Makes every subsequent create and allocate call fail.
    pub fn set_fail_creation(&mut self, fail: bool) {
        self.fail_creation = fail;
    }

    /// Makes texture maps fail the way a backend without host-visible textures does.
    pub fn set_refuse_texture_maps(&mut self, refuse: bool) {
        self.refuse_texture_maps = refuse;
    }

    /// Commands with these tags are dropped and reported through `take_unsupported`.
    pub fn set_unsupported_commands(&mut self, tags: &[EventTag]) {
        self.unsupported = tags.iter().copied().collect();
    }

    /// Resources plus every other live object.
    pub fn live_objects(&self) -> usize {
        self.storage.len() + self.objects.len()
    }

    pub fn buffer_contents(&self, resource: Resource) -> Option<&[u8]> {
        let storage = self.storage.get(&resource)?;
        (storage.desc.ty == ResourceType::Buffer).then(|| &storage.subresources[0].bytes[..])
    }

    pub fn subresource_contents(&self, resource: Resource, subresource: u32) -> Option<&[u8]> {
        let storage = self.storage.get(&resource)?;
        storage
            .subresources
            .get(subresource as usize)
            .map(|s| &s.bytes[..])
    }

    fn allocate(&mut self) -> Result<u64, DeviceError> {
        if self.fail_creation {
            return Err(DeviceError::Native("object creation disabled".into()));
        }
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn create_object(&mut self) -> Result<u64, DeviceError> {
        let raw = self.allocate()?;
        self.objects.insert(raw);
        Ok(raw)
    }

    fn create_storage(&mut self, desc: &ResourceDesc) -> Result<Resource, DeviceError> {
        let storage = Storage::new(desc)?;
        let handle = Resource(self.allocate()?);
        self.storage.insert(handle, storage);
        Ok(handle)
    }

    fn subresource_mut(&mut self, resource: Resource, subresource: u32) -> Option<(Format, &mut Subresource)> {
        let storage = self.storage.get_mut(&resource)?;
        let format = storage.desc.texture.format;
        storage
            .subresources
            .get_mut(subresource as usize)
            .map(|s| (format, s))
    }

    fn command(&mut self, event: Event) {
        if self.unsupported.contains(&event.tag()) {
            debug!(call = event.tag().name(), "dropped");
            self.dropped += 1;
            return;
        }
        trace!(call = event.tag().name(), "null command");
        self.journal.push(Call::Command(event));
    }
}

impl Device for NullDevice {
    fn api(&self) -> DeviceApi {
        self.api
    }

    fn resource_desc(&self, resource: Resource) -> ResourceDesc {
        self.storage
            .get(&resource)
            .map(|s| s.desc)
            .unwrap_or_default()
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Sampler, DeviceError> {
        let handle = Sampler(self.create_object()?);
        self.journal.push(Call::CreateSampler {
            desc: *desc,
            handle,
        });
        Ok(handle)
    }

    fn destroy_sampler(&mut self, sampler: Sampler) {
        self.objects.remove(&sampler.0);
        self.journal.push(Call::DestroySampler(sampler));
    }

    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
        initial_state: ResourceUsage,
    ) -> Result<Resource, DeviceError> {
        let handle = self.create_storage(desc)?;
        if let Some(storage) = self.storage.get_mut(&handle) {
            for (dst, src) in storage.subresources.iter_mut().zip(initial_data) {
                copy_pitched(&mut dst.bytes, dst.row_pitch, src.data, src.row_pitch);
            }
        }
        self.journal.push(Call::CreateResource {
            desc: *desc,
            initial_data: initial_data.iter().map(|d| d.data.to_vec()).collect(),
            initial_state,
            handle,
        });
        Ok(handle)
    }

    fn destroy_resource(&mut self, resource: Resource) {
        self.storage.remove(&resource);
        self.journal.push(Call::DestroyResource(resource));
    }

    fn create_resource_view(
        &mut self,
        resource: Resource,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceView, DeviceError> {
        let handle = ResourceView(self.create_object()?);
        self.journal.push(Call::CreateResourceView {
            resource,
            usage_type,
            desc: *desc,
            handle,
        });
        Ok(handle)
    }

    fn destroy_resource_view(&mut self, view: ResourceView) {
        self.objects.remove(&view.0);
        self.journal.push(Call::DestroyResourceView(view));
    }

    fn create_pipeline(
        &mut self,
        layout: PipelineLayout,
        subobjects: &[PipelineSubobject],
    ) -> Result<Pipeline, DeviceError> {
        let handle = Pipeline(self.create_object()?);
        self.journal.push(Call::CreatePipeline {
            layout,
            subobjects: subobjects.to_vec(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: Pipeline) {
        self.objects.remove(&pipeline.0);
        self.journal.push(Call::DestroyPipeline(pipeline));
    }

    fn create_pipeline_layout(
        &mut self,
        params: &[PipelineLayoutParam],
    ) -> Result<PipelineLayout, DeviceError> {
        let handle = PipelineLayout(self.create_object()?);
        self.journal.push(Call::CreatePipelineLayout {
            params: params.to_vec(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayout) {
        self.objects.remove(&layout.0);
        self.journal.push(Call::DestroyPipelineLayout(layout));
    }

    fn allocate_descriptor_tables(
        &mut self,
        layout: PipelineLayout,
        param: u32,
        count: u32,
    ) -> Result<Vec<DescriptorTable>, DeviceError> {
        let tables = (0..count)
            .map(|_| self.create_object().map(DescriptorTable))
            .collect::<Result<Vec<_>, _>>()?;
        self.journal.push(Call::AllocateDescriptorTables {
            layout,
            param,
            tables: tables.clone(),
        });
        Ok(tables)
    }

    fn free_descriptor_tables(&mut self, tables: &[DescriptorTable]) {
        for table in tables {
            self.objects.remove(&table.0);
        }
        self.journal.push(Call::FreeDescriptorTables(tables.to_vec()));
    }

    fn copy_descriptor_tables(&mut self, copies: &[DescriptorTableCopy]) {
        self.journal.push(Call::CopyDescriptorTables(copies.to_vec()));
    }

    fn update_descriptor_tables(&mut self, updates: &[DescriptorTableUpdate]) {
        self.journal.push(Call::UpdateDescriptorTables(updates.to_vec()));
    }

    fn map_buffer_region(
        &mut self,
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    ) -> Result<NonNull<u8>, DeviceError> {
        self.journal.push(Call::MapBufferRegion {
            resource,
            offset,
            size,
            access,
        });
        let bytes = match self.storage.get_mut(&resource) {
            Some(s) if s.desc.ty == ResourceType::Buffer => &mut s.subresources[0].bytes,
            _ => return Err(DeviceError::InvalidHandle),
        };
        let len = bytes.len() as u64;
        let end = if size == WHOLE_SIZE {
            len
        } else {
            offset.saturating_add(size)
        };
        if offset > len || end > len {
            return Err(DeviceError::Native(format!(
                "map of {offset}..{end} exceeds buffer of {len} bytes"
            )));
        }
        let start = host_offset(offset)?;
        NonNull::new(bytes[start..].as_mut_ptr()).ok_or(DeviceError::InvalidHandle)
    }

    fn unmap_buffer_region(&mut self, resource: Resource) {
        self.journal.push(Call::UnmapBufferRegion(resource));
    }

    fn map_texture_region(
        &mut self,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
        access: MapAccess,
    ) -> Result<MappedSubresource, DeviceError> {
        self.journal.push(Call::MapTextureRegion {
            resource,
            subresource,
            region: region.copied(),
            access,
        });
        if self.refuse_texture_maps {
            return Err(DeviceError::Unsupported("texture mapping"));
        }
        let (format, sub) = self
            .subresource_mut(resource, subresource)
            .ok_or(DeviceError::InvalidHandle)?;
        let offset = region_offset(format, sub, region);
        if offset > sub.bytes.len() {
            return Err(DeviceError::Native("map region outside subresource".into()));
        }
        let data = NonNull::new(sub.bytes[offset..].as_mut_ptr()).ok_or(DeviceError::InvalidHandle)?;
        Ok(MappedSubresource {
            data,
            row_pitch: sub.row_pitch,
            slice_pitch: sub.slice_pitch,
            len: sub.bytes.len() - offset,
        })
    }

    fn unmap_texture_region(&mut self, resource: Resource, subresource: u32) {
        self.journal.push(Call::UnmapTextureRegion {
            resource,
            subresource,
        });
    }

    fn update_buffer_region(&mut self, data: &[u8], resource: Resource, offset: u64) {
        self.journal.push(Call::UpdateBufferRegion {
            resource,
            offset,
            data: data.to_vec(),
        });
        let Ok(offset) = host_offset(offset) else {
            debug!(offset, "buffer update past host memory");
            return;
        };
        if let Some((_, sub)) = self.subresource_mut(resource, 0) {
            if let Some(dst) = sub.bytes.get_mut(offset..) {
                let n = dst.len().min(data.len());
                dst[..n].copy_from_slice(&data[..n]);
            }
        }
    }

    fn update_texture_region(
        &mut self,
        data: &SubresourceData<'_>,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
    ) {
        self.journal.push(Call::UpdateTextureRegion {
            resource,
            subresource,
            region: region.copied(),
            data: data.data.to_vec(),
        });
        if let Some((format, sub)) = self.subresource_mut(resource, subresource) {
            let offset = region_offset(format, sub, region);
            let row_pitch = sub.row_pitch;
            if let Some(dst) = sub.bytes.get_mut(offset..) {
                copy_pitched(dst, row_pitch, data.data, data.row_pitch);
            }
        }
    }
}

impl CommandList for NullDevice {
    fn barrier(&mut self, barriers: &[Barrier]) {
        self.command(Event::Barrier {
            barriers: barriers.to_vec(),
        });
    }

    fn begin_render_pass(
        &mut self,
        render_targets: &[RenderPassRenderTargetDesc],
        depth_stencil: Option<&RenderPassDepthStencilDesc>,
    ) {
        self.command(Event::BeginRenderPass {
            render_targets: render_targets.to_vec(),
            depth_stencil: depth_stencil.copied(),
        });
    }

    fn end_render_pass(&mut self) {
        self.command(Event::EndRenderPass);
    }

    fn bind_render_targets_and_depth_stencil(&mut self, rtvs: &[ResourceView], dsv: ResourceView) {
        self.command(Event::BindRenderTargetsAndDepthStencil {
            rtvs: rtvs.to_vec(),
            dsv,
        });
    }

    fn bind_pipeline(&mut self, stages: PipelineStage, pipeline: Pipeline) {
        self.command(Event::BindPipeline { stages, pipeline });
    }

    fn bind_pipeline_states(&mut self, states: &[(DynamicState, u32)]) {
        self.command(Event::BindPipelineStates {
            states: states.to_vec(),
        });
    }

    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]) {
        self.command(Event::BindViewports {
            first,
            viewports: viewports.to_vec(),
        });
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]) {
        self.command(Event::BindScissorRects {
            first,
            rects: rects.to_vec(),
        });
    }

    fn push_constants(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        first: u32,
        values: &[u32],
    ) {
        self.command(Event::PushConstants {
            stages,
            layout,
            param,
            first,
            values: values.to_vec(),
        });
    }

    fn push_descriptors(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        update: &DescriptorTableUpdate,
    ) {
        self.command(Event::PushDescriptors {
            stages,
            layout,
            param,
            binding: update.binding,
            array_offset: update.array_offset,
            descriptors: update.descriptors.clone(),
        });
    }

    fn bind_descriptor_tables(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        first: u32,
        tables: &[DescriptorTable],
    ) {
        self.command(Event::BindDescriptorTables {
            stages,
            layout,
            first,
            tables: tables.to_vec(),
        });
    }

    fn bind_index_buffer(&mut self, buffer: Resource, offset: u64, index_size: u32) {
        self.command(Event::BindIndexBuffer {
            buffer,
            offset,
            index_size,
        });
    }

    fn bind_vertex_buffers(&mut self, first: u32, bindings: &[VertexBufferBinding]) {
        self.command(Event::BindVertexBuffers {
            first,
            bindings: bindings.to_vec(),
        });
    }

    fn bind_stream_output_buffers(&mut self, first: u32, bindings: &[StreamOutputBinding]) {
        self.command(Event::BindStreamOutputBuffers {
            first,
            bindings: bindings.to_vec(),
        });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.command(Event::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.command(Event::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.command(Event::Dispatch {
            group_count_x,
            group_count_y,
            group_count_z,
        });
    }

    fn draw_or_dispatch_indirect(
        &mut self,
        ty: IndirectCommand,
        buffer: Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.command(Event::DrawOrDispatchIndirect {
            ty,
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    fn copy_resource(&mut self, src: Resource, dst: Resource) {
        self.command(Event::CopyResource { src, dst });
        let Some(source) = self.storage.get(&src) else {
            return;
        };
        let copies: Vec<Vec<u8>> = source.subresources.iter().map(|s| s.bytes.clone()).collect();
        if let Some(dest) = self.storage.get_mut(&dst) {
            for (d, s) in dest.subresources.iter_mut().zip(copies) {
                let n = d.bytes.len().min(s.len());
                d.bytes[..n].copy_from_slice(&s[..n]);
            }
        }
    }

    fn copy_buffer_region(
        &mut self,
        src: Resource,
        src_offset: u64,
        dst: Resource,
        dst_offset: u64,
        size: u64,
    ) {
        self.command(Event::CopyBufferRegion {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        });
        let (Ok(src_offset), Ok(dst_offset)) = (host_offset(src_offset), host_offset(dst_offset)) else {
            debug!(?src, ?dst, "copy offsets past host memory");
            return;
        };
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        let bytes = self
            .buffer_contents(src)
            .and_then(|b| b.get(src_offset..))
            .map(|b| b[..b.len().min(size)].to_vec());
        let Some(bytes) = bytes else {
            debug!(?src, "copy from unknown buffer range");
            return;
        };
        if let Some((_, sub)) = self.subresource_mut(dst, 0) {
            if let Some(d) = sub.bytes.get_mut(dst_offset..) {
                let n = d.len().min(bytes.len());
                d[..n].copy_from_slice(&bytes[..n]);
            }
        }
    }

    fn copy_buffer_to_texture(&mut self, src: &BufferFootprint, dst: &TextureRegion) {
        self.command(Event::CopyBufferToTexture {
            src: *src,
            dst: *dst,
        });
    }

    fn copy_texture_region(&mut self, src: &TextureRegion, dst: &TextureRegion, filter: FilterMode) {
        self.command(Event::CopyTextureRegion {
            src: *src,
            dst: *dst,
            filter,
        });
    }

    fn copy_texture_to_buffer(&mut self, src: &TextureRegion, dst: &BufferFootprint) {
        self.command(Event::CopyTextureToBuffer {
            src: *src,
            dst: *dst,
        });
    }

    fn resolve_texture_region(
        &mut self,
        src: &TextureRegion,
        dst: Resource,
        dst_subresource: u32,
        dst_offset: [i32; 3],
        format: Format,
    ) {
        self.command(Event::ResolveTextureRegion {
            src: *src,
            dst,
            dst_subresource,
            dst_offset,
            format,
        });
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[Rect],
    ) {
        self.command(Event::ClearDepthStencilView {
            dsv,
            depth,
            stencil,
            rects: rects.to_vec(),
        });
    }

    fn clear_render_target_view(&mut self, rtv: ResourceView, color: [f32; 4], rects: &[Rect]) {
        self.command(Event::ClearRenderTargetView {
            rtv,
            color,
            rects: rects.to_vec(),
        });
    }

    fn clear_unordered_access_view_uint(&mut self, uav: ResourceView, values: [u32; 4], rects: &[Rect]) {
        self.command(Event::ClearUnorderedAccessViewUint {
            uav,
            values,
            rects: rects.to_vec(),
        });
    }

    fn clear_unordered_access_view_float(&mut self, uav: ResourceView, values: [f32; 4], rects: &[Rect]) {
        self.command(Event::ClearUnorderedAccessViewFloat {
            uav,
            values,
            rects: rects.to_vec(),
        });
    }

    fn generate_mipmaps(&mut self, srv: ResourceView) {
        self.command(Event::GenerateMipmaps { srv });
    }

    fn take_unsupported(&mut self) -> u64 {
        std::mem::take(&mut self.dropped)
    }
}

/// Headless stand-in for a windowed application: a [`NullDevice`] plus a ring of back buffers.
pub struct HeadlessApplication {
    device: NullDevice,
    back_buffers: Vec<Resource>,
    current: usize,
    presents: u64,
}

impl HeadlessApplication {
    pub const BACK_BUFFER_SIZE: u32 = 64;

    pub fn new(api: DeviceApi, back_buffer_count: u32) -> Self {
        let mut device = NullDevice::new(api);
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            Self::BACK_BUFFER_SIZE,
            Self::BACK_BUFFER_SIZE,
            1,
            1,
            Format::B8G8R8A8_UNORM,
            ResourceUsage::PRESENT,
        );
        let back_buffers = (0..back_buffer_count.max(1))
            .filter_map(|_| device.create_storage(&desc).ok())
            .collect();
        HeadlessApplication {
            device,
            back_buffers,
            current: 0,
            presents: 0,
        }
    }

    pub fn null_device(&self) -> &NullDevice {
        &self.device
    }

    pub fn null_device_mut(&mut self) -> &mut NullDevice {
        &mut self.device
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Application for HeadlessApplication {
    fn device(&mut self) -> &mut dyn Device {
        &mut self.device
    }

    fn command_list(&mut self) -> &mut dyn CommandList {
        &mut self.device
    }

    fn back_buffer_count(&self) -> u32 {
        self.back_buffers.len() as u32
    }

    fn back_buffer(&self, index: u32) -> Resource {
        self.back_buffers
            .get(index as usize)
            .copied()
            .unwrap_or(Resource::NULL)
    }

    fn current_back_buffer(&self) -> Resource {
        self.back_buffer(self.current as u32)
    }

    fn update_effects(&mut self) {
        self.device.journal.push(Call::UpdateEffects);
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        let back_buffer = self.current_back_buffer();
        self.device.journal.push(Call::Present { back_buffer });
        self.presents += 1;
        self.current = (self.current + 1) % self.back_buffers.len().max(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_map_writes_reach_storage() {
        let mut dev = NullDevice::new(DeviceApi::D3D11);
        let desc = ResourceDesc::buffer(32, MemoryHeap::CPU_TO_GPU, ResourceUsage::CONSTANT_BUFFER);
        let buf = dev.create_resource(&desc, &[], ResourceUsage::GENERAL).unwrap();

        let ptr = dev.map_buffer_region(buf, 8, 4, MapAccess::WriteOnly).unwrap();
        unsafe { std::ptr::copy_nonoverlapping([1u8, 2, 3, 4].as_ptr(), ptr.as_ptr(), 4) };
        dev.unmap_buffer_region(buf);

        assert_eq!(&dev.buffer_contents(buf).unwrap()[8..12], &[1, 2, 3, 4]);
        assert!(dev.map_buffer_region(buf, 30, 4, MapAccess::ReadOnly).is_err());
    }

    #[test]
    fn texture_initial_data_is_repacked() {
        let mut dev = NullDevice::new(DeviceApi::D3D12);
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            2,
            2,
            1,
            1,
            Format::R8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        // rows padded to 4 bytes on the way in
        let src = [1, 2, 0, 0, 3, 4, 0, 0];
        let tex = dev
            .create_resource(
                &desc,
                &[SubresourceData {
                    data: &src,
                    row_pitch: 4,
                    slice_pitch: 8,
                }],
                ResourceUsage::SHADER_RESOURCE,
            )
            .unwrap();
        assert_eq!(dev.subresource_contents(tex, 0), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn failing_creation_hands_out_nothing() {
        let mut dev = NullDevice::new(DeviceApi::Vulkan);
        dev.set_fail_creation(true);
        assert!(dev.create_sampler(&SamplerDesc::linear_clamp()).is_err());
        assert!(dev.allocate_descriptor_tables(PipelineLayout(1), 0, 2).is_err());
        assert_eq!(dev.live_objects(), 0);
        assert!(dev.journal().is_empty());
    }

    #[test]
    fn texture_maps_report_what_they_cover() {
        let mut dev = NullDevice::new(DeviceApi::D3D11);
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            4,
            4,
            1,
            1,
            Format::R8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        let tex = dev.create_resource(&desc, &[], ResourceUsage::GENERAL).unwrap();
        let region = SubresourceBox {
            left: 0,
            top: 2,
            front: 0,
            right: 4,
            bottom: 4,
            back: 1,
        };
        let mapped = dev
            .map_texture_region(tex, 0, Some(&region), MapAccess::WriteOnly)
            .unwrap();
        assert_eq!((mapped.row_pitch, mapped.len), (4, 8));

        dev.set_refuse_texture_maps(true);
        assert!(matches!(
            dev.map_texture_region(tex, 0, None, MapAccess::WriteOnly),
            Err(DeviceError::Unsupported(_))
        ));
    }

    #[test]
    fn unsupported_commands_are_counted_not_journaled() {
        let mut dev = NullDevice::new(DeviceApi::D3D12);
        dev.set_unsupported_commands(&[EventTag::PushConstants]);
        dev.push_constants(ShaderStage::VERTEX, PipelineLayout(1), 0, 0, &[1, 2]);
        dev.draw(3, 1, 0, 0);
        assert_eq!(dev.take_unsupported(), 1);
        assert_eq!(dev.take_unsupported(), 0);
        assert_eq!(dev.call_counts().get("Draw"), Some(&1));
        assert_eq!(dev.journal().len(), 1);
    }

    #[test]
    fn present_cycles_back_buffers() {
        let mut app = HeadlessApplication::new(DeviceApi::OpenGL, 2);
        let first = app.current_back_buffer();
        app.present().unwrap();
        assert_ne!(app.current_back_buffer(), first);
        app.present().unwrap();
        assert_eq!(app.current_back_buffer(), first);
        assert_eq!(app.null_device().call_counts().get("present"), Some(&2));
    }
}
