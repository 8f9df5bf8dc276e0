// SPDX-License-Identifier: CEPL-1.0
use crate::recorder::Recorder;
use gfxtrace_render::*;
use gfxtrace_stream::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ptr::NonNull;
use std::sync::Arc;

/// Wraps an application and records every call made through it.
///
/// Calls reach the wrapped device unmodified; the recorder only observes arguments and
/// results. Creation hooks run after a successful native call, unmap hooks before the native
/// unmap so the mapped bytes are still readable, and the frame boundary before the native
/// present.
pub struct CaptureLayer<A: Application, W: Write = BufWriter<File>> {
    inner: A,
    recorder: Arc<Recorder<W>>,
    back_buffers: Vec<Resource>,
    descs: HashMap<Resource, ResourceDesc>,
}

impl<A: Application, W: Write> CaptureLayer<A, W> {
    pub fn new(mut inner: A, recorder: Arc<Recorder<W>>) -> Self {
        let back_buffers: Vec<Resource> = (0..inner.back_buffer_count())
            .map(|i| inner.back_buffer(i))
            .collect();
        let descs = back_buffers
            .iter()
            .map(|&r| (r, inner.device().resource_desc(r)))
            .collect();
        recorder.on_init_swapchain(&back_buffers);
        CaptureLayer {
            inner,
            recorder,
            back_buffers,
            descs,
        }
    }

    pub fn recorder(&self) -> &Arc<Recorder<W>> {
        &self.recorder
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    fn cmd(&mut self) -> &mut dyn CommandList {
        self.inner.command_list()
    }

    fn desc_of(&mut self, resource: Resource) -> ResourceDesc {
        match self.descs.get(&resource) {
            Some(desc) => *desc,
            None => self.inner.device().resource_desc(resource),
        }
    }
}

impl<A: Application, W: Write> Drop for CaptureLayer<A, W> {
    fn drop(&mut self) {
        self.recorder.on_destroy_swapchain(&self.back_buffers);
        self.recorder.flush();
    }
}

impl<A: Application, W: Write> Device for CaptureLayer<A, W> {
    fn api(&self) -> DeviceApi {
        self.recorder.api()
    }

    fn resource_desc(&self, resource: Resource) -> ResourceDesc {
        self.descs.get(&resource).copied().unwrap_or_default()
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Sampler, DeviceError> {
        let handle = self.inner.device().create_sampler(desc)?;
        self.recorder.record(&Event::InitSampler {
            desc: *desc,
            handle,
        });
        Ok(handle)
    }

    fn destroy_sampler(&mut self, sampler: Sampler) {
        self.recorder.record(&Event::DestroySampler { handle: sampler });
        self.inner.device().destroy_sampler(sampler);
    }

    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
        initial_state: ResourceUsage,
    ) -> Result<Resource, DeviceError> {
        let handle = self
            .inner
            .device()
            .create_resource(desc, initial_data, initial_state)?;
        self.recorder
            .on_init_resource(desc, initial_data, initial_state, handle);
        self.descs.insert(handle, *desc);
        Ok(handle)
    }

    fn destroy_resource(&mut self, resource: Resource) {
        self.recorder.record(&Event::DestroyResource { handle: resource });
        self.descs.remove(&resource);
        self.inner.device().destroy_resource(resource);
    }

    fn create_resource_view(
        &mut self,
        resource: Resource,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceView, DeviceError> {
        let handle = self
            .inner
            .device()
            .create_resource_view(resource, usage_type, desc)?;
        self.recorder.record(&Event::InitResourceView {
            resource,
            usage_type,
            desc: *desc,
            handle,
        });
        Ok(handle)
    }

    fn destroy_resource_view(&mut self, view: ResourceView) {
        self.recorder.record(&Event::DestroyResourceView { handle: view });
        self.inner.device().destroy_resource_view(view);
    }

    fn create_pipeline(
        &mut self,
        layout: PipelineLayout,
        subobjects: &[PipelineSubobject],
    ) -> Result<Pipeline, DeviceError> {
        let handle = self.inner.device().create_pipeline(layout, subobjects)?;
        self.recorder.record(&Event::InitPipeline {
            layout,
            subobjects: subobjects.to_vec(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: Pipeline) {
        self.recorder.record(&Event::DestroyPipeline { handle: pipeline });
        self.inner.device().destroy_pipeline(pipeline);
    }

    fn create_pipeline_layout(
        &mut self,
        params: &[PipelineLayoutParam],
    ) -> Result<PipelineLayout, DeviceError> {
        let handle = self.inner.device().create_pipeline_layout(params)?;
        self.recorder.record(&Event::InitPipelineLayout {
            params: params.to_vec(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayout) {
        self.recorder
            .record(&Event::DestroyPipelineLayout { handle: layout });
        self.inner.device().destroy_pipeline_layout(layout);
    }

    fn allocate_descriptor_tables(
        &mut self,
        layout: PipelineLayout,
        param: u32,
        count: u32,
    ) -> Result<Vec<DescriptorTable>, DeviceError> {
        let tables = self
            .inner
            .device()
            .allocate_descriptor_tables(layout, param, count)?;
        self.recorder.record(&Event::AllocateDescriptorTables {
            layout,
            param,
            tables: tables.clone(),
        });
        Ok(tables)
    }

    fn free_descriptor_tables(&mut self, tables: &[DescriptorTable]) {
        self.recorder.record(&Event::FreeDescriptorTables {
            tables: tables.to_vec(),
        });
        self.inner.device().free_descriptor_tables(tables);
    }

    fn copy_descriptor_tables(&mut self, copies: &[DescriptorTableCopy]) {
        self.inner.device().copy_descriptor_tables(copies);
        self.recorder.record(&Event::CopyDescriptorTables {
            copies: copies.to_vec(),
        });
    }

    fn update_descriptor_tables(&mut self, updates: &[DescriptorTableUpdate]) {
        self.inner.device().update_descriptor_tables(updates);
        self.recorder.record(&Event::UpdateDescriptorTables {
            updates: updates.to_vec(),
        });
    }

    fn map_buffer_region(
        &mut self,
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    ) -> Result<NonNull<u8>, DeviceError> {
        let buffer_size = self.desc_of(resource).buffer.size;
        let data = self
            .inner
            .device()
            .map_buffer_region(resource, offset, size, access)?;
        self.recorder
            .on_map_buffer_region(resource, offset, size, access, buffer_size, data);
        Ok(data)
    }

    fn unmap_buffer_region(&mut self, resource: Resource) {
        // SAFETY: the native mapping is released only after the hook returns.
        unsafe { self.recorder.on_unmap_buffer_region(resource) };
        self.inner.device().unmap_buffer_region(resource);
    }

    fn map_texture_region(
        &mut self,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
        access: MapAccess,
    ) -> Result<MappedSubresource, DeviceError> {
        let mapped = self
            .inner
            .device()
            .map_texture_region(resource, subresource, region, access)?;
        self.recorder
            .on_map_texture_region(resource, subresource, region, access, &mapped);
        Ok(mapped)
    }

    fn unmap_texture_region(&mut self, resource: Resource, subresource: u32) {
        let desc = self.desc_of(resource);
        // SAFETY: the native mapping is released only after the hook returns.
        unsafe {
            self.recorder
                .on_unmap_texture_region(&desc, resource, subresource)
        };
        self.inner.device().unmap_texture_region(resource, subresource);
    }

    fn update_buffer_region(&mut self, data: &[u8], resource: Resource, offset: u64) {
        self.inner.device().update_buffer_region(data, resource, offset);
        self.recorder.on_update_buffer_region(data, resource, offset);
    }

    fn update_texture_region(
        &mut self,
        data: &SubresourceData<'_>,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
    ) {
        let desc = self.desc_of(resource);
        self.inner
            .device()
            .update_texture_region(data, resource, subresource, region);
        self.recorder
            .on_update_texture_region(&desc, data, resource, subresource, region);
    }
}

impl<A: Application, W: Write> CommandList for CaptureLayer<A, W> {
    fn barrier(&mut self, barriers: &[Barrier]) {
        self.cmd().barrier(barriers);
        self.recorder.record(&Event::Barrier {
            barriers: barriers.to_vec(),
        });
    }

    fn begin_render_pass(
        &mut self,
        render_targets: &[RenderPassRenderTargetDesc],
        depth_stencil: Option<&RenderPassDepthStencilDesc>,
    ) {
        self.cmd().begin_render_pass(render_targets, depth_stencil);
        self.recorder.record(&Event::BeginRenderPass {
            render_targets: render_targets.to_vec(),
            depth_stencil: depth_stencil.copied(),
        });
    }

    fn end_render_pass(&mut self) {
        self.cmd().end_render_pass();
        self.recorder.record(&Event::EndRenderPass);
    }

    fn bind_render_targets_and_depth_stencil(&mut self, rtvs: &[ResourceView], dsv: ResourceView) {
        self.cmd().bind_render_targets_and_depth_stencil(rtvs, dsv);
        self.recorder.record(&Event::BindRenderTargetsAndDepthStencil {
            rtvs: rtvs.to_vec(),
            dsv,
        });
    }

    fn bind_pipeline(&mut self, stages: PipelineStage, pipeline: Pipeline) {
        self.cmd().bind_pipeline(stages, pipeline);
        self.recorder
            .record(&Event::BindPipeline { stages, pipeline });
    }

    fn bind_pipeline_states(&mut self, states: &[(DynamicState, u32)]) {
        self.cmd().bind_pipeline_states(states);
        self.recorder.record(&Event::BindPipelineStates {
            states: states.to_vec(),
        });
    }

    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]) {
        self.cmd().bind_viewports(first, viewports);
        self.recorder.record(&Event::BindViewports {
            first,
            viewports: viewports.to_vec(),
        });
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]) {
        self.cmd().bind_scissor_rects(first, rects);
        self.recorder.record(&Event::BindScissorRects {
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
        self.cmd().push_constants(stages, layout, param, first, values);
        self.recorder.record(&Event::PushConstants {
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
        self.cmd().push_descriptors(stages, layout, param, update);
        self.recorder.record(&Event::PushDescriptors {
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
        self.cmd().bind_descriptor_tables(stages, layout, first, tables);
        self.recorder.record(&Event::BindDescriptorTables {
            stages,
            layout,
            first,
            tables: tables.to_vec(),
        });
    }

    fn bind_index_buffer(&mut self, buffer: Resource, offset: u64, index_size: u32) {
        self.cmd().bind_index_buffer(buffer, offset, index_size);
        self.recorder.record(&Event::BindIndexBuffer {
            buffer,
            offset,
            index_size,
        });
    }

    fn bind_vertex_buffers(&mut self, first: u32, bindings: &[VertexBufferBinding]) {
        self.cmd().bind_vertex_buffers(first, bindings);
        self.recorder.record(&Event::BindVertexBuffers {
            first,
            bindings: bindings.to_vec(),
        });
    }

    fn bind_stream_output_buffers(&mut self, first: u32, bindings: &[StreamOutputBinding]) {
        self.cmd().bind_stream_output_buffers(first, bindings);
        self.recorder.record(&Event::BindStreamOutputBuffers {
            first,
            bindings: bindings.to_vec(),
        });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.cmd()
            .draw(vertex_count, instance_count, first_vertex, first_instance);
        self.recorder.record(&Event::Draw {
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
        self.cmd().draw_indexed(
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
        self.recorder.record(&Event::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.cmd()
            .dispatch(group_count_x, group_count_y, group_count_z);
        self.recorder.record(&Event::Dispatch {
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
        self.cmd()
            .draw_or_dispatch_indirect(ty, buffer, offset, draw_count, stride);
        self.recorder.record(&Event::DrawOrDispatchIndirect {
            ty,
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    fn copy_resource(&mut self, src: Resource, dst: Resource) {
        self.cmd().copy_resource(src, dst);
        self.recorder.record(&Event::CopyResource { src, dst });
    }

    fn copy_buffer_region(
        &mut self,
        src: Resource,
        src_offset: u64,
        dst: Resource,
        dst_offset: u64,
        size: u64,
    ) {
        self.cmd()
            .copy_buffer_region(src, src_offset, dst, dst_offset, size);
        self.recorder.record(&Event::CopyBufferRegion {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        });
    }

    fn copy_buffer_to_texture(&mut self, src: &BufferFootprint, dst: &TextureRegion) {
        self.cmd().copy_buffer_to_texture(src, dst);
        self.recorder.record(&Event::CopyBufferToTexture {
            src: *src,
            dst: *dst,
        });
    }

    fn copy_texture_region(&mut self, src: &TextureRegion, dst: &TextureRegion, filter: FilterMode) {
        self.cmd().copy_texture_region(src, dst, filter);
        self.recorder.record(&Event::CopyTextureRegion {
            src: *src,
            dst: *dst,
            filter,
        });
    }

    fn copy_texture_to_buffer(&mut self, src: &TextureRegion, dst: &BufferFootprint) {
        self.cmd().copy_texture_to_buffer(src, dst);
        self.recorder.record(&Event::CopyTextureToBuffer {
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
        self.cmd()
            .resolve_texture_region(src, dst, dst_subresource, dst_offset, format);
        self.recorder.record(&Event::ResolveTextureRegion {
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
        self.cmd()
            .clear_depth_stencil_view(dsv, depth, stencil, rects);
        self.recorder.record(&Event::ClearDepthStencilView {
            dsv,
            depth,
            stencil,
            rects: rects.to_vec(),
        });
    }

    fn clear_render_target_view(&mut self, rtv: ResourceView, color: [f32; 4], rects: &[Rect]) {
        self.cmd().clear_render_target_view(rtv, color, rects);
        self.recorder.record(&Event::ClearRenderTargetView {
            rtv,
            color,
            rects: rects.to_vec(),
        });
    }

    fn clear_unordered_access_view_uint(&mut self, uav: ResourceView, values: [u32; 4], rects: &[Rect]) {
        self.cmd().clear_unordered_access_view_uint(uav, values, rects);
        self.recorder.record(&Event::ClearUnorderedAccessViewUint {
            uav,
            values,
            rects: rects.to_vec(),
        });
    }

    fn clear_unordered_access_view_float(&mut self, uav: ResourceView, values: [f32; 4], rects: &[Rect]) {
        self.cmd()
            .clear_unordered_access_view_float(uav, values, rects);
        self.recorder.record(&Event::ClearUnorderedAccessViewFloat {
            uav,
            values,
            rects: rects.to_vec(),
        });
    }

    fn generate_mipmaps(&mut self, srv: ResourceView) {
        self.cmd().generate_mipmaps(srv);
        self.recorder.record(&Event::GenerateMipmaps { srv });
    }

    fn take_unsupported(&mut self) -> u64 {
        self.cmd().take_unsupported()
    }
}

impl<A: Application, W: Write> Application for CaptureLayer<A, W> {
    fn device(&mut self) -> &mut dyn Device {
        self
    }

    fn command_list(&mut self) -> &mut dyn CommandList {
        self
    }

    fn back_buffer_count(&self) -> u32 {
        self.inner.back_buffer_count()
    }

    fn back_buffer(&self, index: u32) -> Resource {
        self.inner.back_buffer(index)
    }

    fn current_back_buffer(&self) -> Resource {
        self.inner.current_back_buffer()
    }

    fn update_effects(&mut self) {
        self.inner.update_effects();
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.recorder.on_present();
        self.inner.present()
    }
}
