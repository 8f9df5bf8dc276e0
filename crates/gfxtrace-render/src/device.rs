// SPDX-License-Identifier: CEPL-1.0
use crate::command::*;
use crate::descriptor::{DescriptorTableCopy, DescriptorTableUpdate};
use crate::format::Format;
use crate::handle::*;
use crate::pipeline::{DynamicState, PipelineLayoutParam, PipelineStage, PipelineSubobject, ShaderStage};
use crate::resource::*;
use crate::sampler::{FilterMode, SamplerDesc};
use crate::DeviceApi;
use std::ptr::NonNull;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
    #[error("native call failed: {0}")]
    Native(String),
    #[error("invalid object handle")]
    InvalidHandle,
}

/// Object creation, descriptor and memory operations of a graphics device.
///
/// Creation calls report failure instead of handing out a null handle. Destroying a null
/// or unknown handle is a no-op.
pub trait Device {
    fn api(&self) -> DeviceApi;

    /// Description of a live resource; the default description for unknown handles.
    fn resource_desc(&self, resource: Resource) -> ResourceDesc;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Sampler, DeviceError>;
    fn destroy_sampler(&mut self, sampler: Sampler);

    /// `initial_data` is either empty or holds one entry per subresource (one for buffers).
    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
        initial_state: ResourceUsage,
    ) -> Result<Resource, DeviceError>;
    fn destroy_resource(&mut self, resource: Resource);

    fn create_resource_view(
        &mut self,
        resource: Resource,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceView, DeviceError>;
    fn destroy_resource_view(&mut self, view: ResourceView);

    fn create_pipeline(
        &mut self,
        layout: PipelineLayout,
        subobjects: &[PipelineSubobject],
    ) -> Result<Pipeline, DeviceError>;
    fn destroy_pipeline(&mut self, pipeline: Pipeline);

    fn create_pipeline_layout(
        &mut self,
        params: &[PipelineLayoutParam],
    ) -> Result<PipelineLayout, DeviceError>;
    fn destroy_pipeline_layout(&mut self, layout: PipelineLayout);

    fn allocate_descriptor_tables(
        &mut self,
        layout: PipelineLayout,
        param: u32,
        count: u32,
    ) -> Result<Vec<DescriptorTable>, DeviceError>;
    fn free_descriptor_tables(&mut self, tables: &[DescriptorTable]);

    fn copy_descriptor_tables(&mut self, copies: &[DescriptorTableCopy]);
    fn update_descriptor_tables(&mut self, updates: &[DescriptorTableUpdate]);

    /// Maps `size` bytes at `offset` (`WHOLE_SIZE` for the rest of the buffer). The pointer
    /// stays valid until the matching `unmap_buffer_region`.
    fn map_buffer_region(
        &mut self,
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    ) -> Result<NonNull<u8>, DeviceError>;
    fn unmap_buffer_region(&mut self, resource: Resource);

    fn map_texture_region(
        &mut self,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
        access: MapAccess,
    ) -> Result<MappedSubresource, DeviceError>;
    fn unmap_texture_region(&mut self, resource: Resource, subresource: u32);

    fn update_buffer_region(&mut self, data: &[u8], resource: Resource, offset: u64);
    fn update_texture_region(
        &mut self,
        data: &SubresourceData<'_>,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
    );
}

/// Recording and state-binding operations of the immediate command list.
pub trait CommandList {
    fn barrier(&mut self, barriers: &[Barrier]);

    fn begin_render_pass(
        &mut self,
        render_targets: &[RenderPassRenderTargetDesc],
        depth_stencil: Option<&RenderPassDepthStencilDesc>,
    );
    fn end_render_pass(&mut self);
    fn bind_render_targets_and_depth_stencil(&mut self, rtvs: &[ResourceView], dsv: ResourceView);

    fn bind_pipeline(&mut self, stages: PipelineStage, pipeline: Pipeline);
    fn bind_pipeline_states(&mut self, states: &[(DynamicState, u32)]);
    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]);
    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]);

    fn push_constants(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        first: u32,
        values: &[u32],
    );
    fn push_descriptors(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        update: &DescriptorTableUpdate,
    );
    fn bind_descriptor_tables(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayout,
        first: u32,
        tables: &[DescriptorTable],
    );

    fn bind_index_buffer(&mut self, buffer: Resource, offset: u64, index_size: u32);
    fn bind_vertex_buffers(&mut self, first: u32, bindings: &[VertexBufferBinding]);
    fn bind_stream_output_buffers(&mut self, first: u32, bindings: &[StreamOutputBinding]);

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);
    fn draw_or_dispatch_indirect(
        &mut self,
        ty: IndirectCommand,
        buffer: Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );

    fn copy_resource(&mut self, src: Resource, dst: Resource);
    fn copy_buffer_region(
        &mut self,
        src: Resource,
        src_offset: u64,
        dst: Resource,
        dst_offset: u64,
        size: u64,
    );
    fn copy_buffer_to_texture(&mut self, src: &BufferFootprint, dst: &TextureRegion);
    fn copy_texture_region(&mut self, src: &TextureRegion, dst: &TextureRegion, filter: FilterMode);
    fn copy_texture_to_buffer(&mut self, src: &TextureRegion, dst: &BufferFootprint);
    fn resolve_texture_region(
        &mut self,
        src: &TextureRegion,
        dst: Resource,
        dst_subresource: u32,
        dst_offset: [i32; 3],
        format: Format,
    );

    fn clear_depth_stencil_view(
        &mut self,
        dsv: ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[Rect],
    );
    fn clear_render_target_view(&mut self, rtv: ResourceView, color: [f32; 4], rects: &[Rect]);
    fn clear_unordered_access_view_uint(&mut self, uav: ResourceView, values: [u32; 4], rects: &[Rect]);
    fn clear_unordered_access_view_float(&mut self, uav: ResourceView, values: [f32; 4], rects: &[Rect]);

    fn generate_mipmaps(&mut self, srv: ResourceView);

    /// Commands dropped since the last call because this backend cannot express them.
    fn take_unsupported(&mut self) -> u64 {
        0
    }
}

/// A live device with its immediate command list and swapchain.
pub trait Application {
    fn device(&mut self) -> &mut dyn Device;
    fn command_list(&mut self) -> &mut dyn CommandList;

    fn back_buffer_count(&self) -> u32;
    fn back_buffer(&self, index: u32) -> Resource;
    fn current_back_buffer(&self) -> Resource;

    /// Renders overlay effects onto the current back buffer before presenting.
    fn update_effects(&mut self) {}

    fn present(&mut self) -> Result<(), DeviceError>;
}
