// SPDX-License-Identifier: CEPL-1.0
use crate::convert;
use crate::device::{object_name, object_target, GlDevice};
use gfxtrace_render::*;
use glow::HasContext as _;
use std::collections::hash_map::Entry;
use tracing::{debug, trace, warn};

impl GlDevice {
    unsafe fn bind_draw_framebuffer(&mut self, view: ResourceView) -> bool {
        match self.framebuffer(view) {
            Some(fbo) => {
                unsafe { self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, fbo) };
                self.bound.draw_framebuffer = fbo;
                true
            }
            None => {
                debug!(view = view.0, "not a render target view");
                false
            }
        }
    }

    /// Runs `clear` once for the whole target, or once per rectangle under a scissor.
    unsafe fn clear_rects(&self, rects: &[Rect], clear: impl Fn(&glow::Context)) {
        if rects.is_empty() {
            clear(&self.gl);
            return;
        }
        unsafe {
            self.gl.enable(glow::SCISSOR_TEST);
            for r in rects {
                self.gl.scissor(r.left, r.top, r.width(), r.height());
                clear(&self.gl);
            }
            self.gl.disable(glow::SCISSOR_TEST);
        }
    }

    /// Points the vertex attributes of the bound program at the bound vertex buffers.
    unsafe fn apply_input_layout(&self) {
        for element in &self.bound.input_layout {
            let Some(binding) = self
                .bound
                .vertex_buffers
                .get(element.buffer_binding as usize)
            else {
                continue;
            };
            let Some((size, ty, normalized)) = convert::vertex_format(element.format) else {
                debug!(format = element.format.0, "vertex format not supported");
                continue;
            };
            let stride = if element.stride != 0 {
                element.stride
            } else {
                binding.stride
            };
            unsafe {
                self.gl
                    .bind_buffer(glow::ARRAY_BUFFER, self.buffer(binding.buffer));
                self.gl.enable_vertex_attrib_array(element.location);
                self.gl.vertex_attrib_pointer_f32(
                    element.location,
                    size,
                    ty,
                    normalized,
                    stride as i32,
                    (binding.offset + u64::from(element.offset)) as i32,
                );
                self.gl
                    .vertex_attrib_divisor(element.location, element.instance_step_rate);
            }
        }
    }

    fn texture_target_level(&self, region: &TextureRegion) -> Option<(glow::Texture, u32)> {
        let texture = self.texture(region.resource.0)?;
        let desc = self.resource_desc(region.resource);
        let (level, _) = convert::split_subresource(&desc, region.subresource);
        Some((texture, level))
    }

    fn region_or_level(&self, region: &TextureRegion, level: u32) -> SubresourceBox {
        region
            .region
            .unwrap_or_else(|| convert::level_region(&self.resource_desc(region.resource), level))
    }

    /// Clears the texture behind an unordered access view through the scratch draw framebuffer.
    fn clear_texture_view(&mut self, uav: ResourceView, rects: &[Rect], clear: impl Fn(&glow::Context)) {
        let Some(texture) = self.texture(uav.0) else {
            self.unsupported("buffer unordered access view clears");
            return;
        };
        let Some((_, draw)) = self.scratch_framebuffers() else {
            return;
        };
        unsafe {
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(draw));
            self.gl.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            self.clear_rects(rects, clear);
            self.gl
                .bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.bound.draw_framebuffer);
        }
    }
}

impl CommandList for GlDevice {
    fn barrier(&mut self, barriers: &[Barrier]) {
        // GL orders everything except image and storage writes on its own
        if barriers.iter().any(|b| {
            b.old_state.contains(ResourceUsage::UNORDERED_ACCESS)
                || b.new_state.contains(ResourceUsage::UNORDERED_ACCESS)
        }) {
            unsafe { self.gl.memory_barrier(glow::ALL_BARRIER_BITS) };
        }
    }

    fn begin_render_pass(
        &mut self,
        render_targets: &[RenderPassRenderTargetDesc],
        depth_stencil: Option<&RenderPassDepthStencilDesc>,
    ) {
        if render_targets.len() > 1 {
            debug!(count = render_targets.len(), "only the first render target is bound");
        }
        let view = render_targets
            .first()
            .map(|rt| rt.view)
            .or(depth_stencil.map(|ds| ds.view))
            .unwrap_or_default();
        unsafe {
            if !self.bind_draw_framebuffer(view) {
                return;
            }
            for rt in render_targets.iter().take(1) {
                if rt.load_op == RenderPassLoadOp::CLEAR {
                    self.gl
                        .clear_buffer_f32_slice(glow::COLOR, 0, &rt.clear_color);
                }
            }
            if let Some(ds) = depth_stencil {
                if ds.depth_load_op == RenderPassLoadOp::CLEAR {
                    self.gl
                        .clear_buffer_f32_slice(glow::DEPTH, 0, &[ds.clear_depth]);
                }
                if ds.stencil_load_op == RenderPassLoadOp::CLEAR {
                    self.gl
                        .clear_buffer_i32_slice(glow::STENCIL, 0, &[i32::from(ds.clear_stencil)]);
                }
            }
        }
    }

    fn end_render_pass(&mut self) {
        trace!("end render pass");
    }

    fn bind_render_targets_and_depth_stencil(&mut self, rtvs: &[ResourceView], dsv: ResourceView) {
        let view = rtvs.first().copied().unwrap_or(dsv);
        if view.is_null() {
            unsafe { self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None) };
            self.bound.draw_framebuffer = None;
            return;
        }
        unsafe {
            self.bind_draw_framebuffer(view);
        }
    }

    fn bind_pipeline(&mut self, _stages: PipelineStage, pipeline: Pipeline) {
        match self.programs.get(&pipeline) {
            Some(p) => {
                unsafe { self.gl.use_program(Some(p.program)) };
                self.bound.topology = p.topology;
                self.bound.input_layout = p.input_layout.clone();
            }
            None => {
                if !pipeline.is_null() {
                    debug!(pipeline = pipeline.0, "unknown pipeline, unbinding program");
                }
                unsafe { self.gl.use_program(None) };
                self.bound.input_layout.clear();
            }
        }
    }

    fn bind_pipeline_states(&mut self, states: &[(DynamicState, u32)]) {
        for &(state, value) in states {
            match state {
                DynamicState::PRIMITIVE_TOPOLOGY => {
                    self.bound.topology = convert::primitive_topology(PrimitiveTopology(value))
                }
                DynamicState::FRONT_COUNTER_CLOCKWISE => unsafe {
                    self.gl
                        .front_face(if value != 0 { glow::CCW } else { glow::CW })
                },
                other => debug!(state = other.0, value, "dynamic state not supported"),
            }
        }
    }

    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]) {
        if first != 0 {
            self.unsupported("indexed viewports");
            return;
        }
        if let Some(v) = viewports.first() {
            unsafe {
                self.gl
                    .viewport(v.x as i32, v.y as i32, v.width as i32, v.height as i32);
                self.gl.depth_range_f32(v.min_depth, v.max_depth);
            }
        }
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]) {
        if first != 0 {
            self.unsupported("indexed scissor rects");
            return;
        }
        if let Some(r) = rects.first() {
            unsafe { self.gl.scissor(r.left, r.top, r.width(), r.height()) };
        }
    }

    fn push_constants(
        &mut self,
        _stages: ShaderStage,
        layout: PipelineLayout,
        param: u32,
        first: u32,
        values: &[u32],
    ) {
        // each push-constant range is a uniform block at its binding
        let binding = match self.layouts.get(&layout).and_then(|p| p.get(param as usize)) {
            Some(PipelineLayoutParam::PushConstants(range)) => range.binding,
            _ => param,
        };
        let (buffer, shadow) = match self.push_constants.entry(binding) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => match unsafe { self.gl.create_buffer() } {
                Ok(buffer) => e.insert((buffer, Vec::new())),
                Err(err) => {
                    warn!(%err, binding, "push constant buffer");
                    return;
                }
            },
        };
        let end = first as usize + values.len();
        if shadow.len() < end {
            shadow.resize(end, 0);
        }
        shadow[first as usize..end].copy_from_slice(values);
        let bytes: Vec<u8> = shadow.iter().flat_map(|v| v.to_le_bytes()).collect();
        let buffer = *buffer;
        unsafe {
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(buffer));
            self.gl
                .buffer_data_u8_slice(glow::UNIFORM_BUFFER, &bytes, glow::DYNAMIC_DRAW);
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, None);
            self.gl
                .bind_buffer_base(glow::UNIFORM_BUFFER, binding, Some(buffer));
        }
    }

    fn push_descriptors(
        &mut self,
        _stages: ShaderStage,
        _layout: PipelineLayout,
        _param: u32,
        update: &DescriptorTableUpdate,
    ) {
        let first = update.binding + update.array_offset;
        unsafe {
            match &update.descriptors {
                Descriptors::Samplers(samplers) => {
                    for (unit, s) in (first..).zip(samplers) {
                        self.gl
                            .bind_sampler(unit, object_name(s.0).map(glow::NativeSampler));
                    }
                }
                Descriptors::ShaderResourceViews(views) => {
                    for (unit, v) in (first..).zip(views) {
                        self.gl.active_texture(glow::TEXTURE0 + unit);
                        self.gl.bind_texture(glow::TEXTURE_2D, self.texture(v.0));
                    }
                    self.gl.active_texture(glow::TEXTURE0);
                }
                Descriptors::SamplersWithResourceViews(pairs) => {
                    for (unit, p) in (first..).zip(pairs) {
                        self.gl
                            .bind_sampler(unit, object_name(p.sampler.0).map(glow::NativeSampler));
                        self.gl.active_texture(glow::TEXTURE0 + unit);
                        self.gl.bind_texture(glow::TEXTURE_2D, self.texture(p.view.0));
                    }
                    self.gl.active_texture(glow::TEXTURE0);
                }
                Descriptors::ConstantBuffers(ranges) => {
                    for (index, r) in (first..).zip(ranges) {
                        let Some(buffer) = self.buffer(r.buffer) else {
                            continue;
                        };
                        let size = if r.size == WHOLE_SIZE || r.size == 0 {
                            self.resource_desc(r.buffer)
                                .buffer
                                .size
                                .saturating_sub(r.offset)
                        } else {
                            r.size
                        };
                        self.gl.bind_buffer_range(
                            glow::UNIFORM_BUFFER,
                            index,
                            Some(buffer),
                            r.offset as i32,
                            size as i32,
                        );
                    }
                }
                other => {
                    debug!(ty = ?other.ty(), "descriptor type not supported");
                    self.unsupported("push descriptors of this type");
                }
            }
        }
    }

    fn bind_descriptor_tables(
        &mut self,
        _stages: ShaderStage,
        _layout: PipelineLayout,
        first: u32,
        tables: &[DescriptorTable],
    ) {
        trace!(first, count = tables.len(), "bind descriptor tables");
        self.unsupported("descriptor tables");
    }

    fn bind_index_buffer(&mut self, buffer: Resource, offset: u64, index_size: u32) {
        let buffer = self.buffer(buffer);
        unsafe { self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, buffer) };
        self.bound.index = match (buffer, convert::index_type(index_size)) {
            (Some(_), Some(ty)) => Some((ty, index_size, offset)),
            _ => None,
        };
    }

    fn bind_vertex_buffers(&mut self, first: u32, bindings: &[VertexBufferBinding]) {
        let end = first as usize + bindings.len();
        if self.bound.vertex_buffers.len() < end {
            self.bound
                .vertex_buffers
                .resize(end, VertexBufferBinding::default());
        }
        self.bound.vertex_buffers[first as usize..end].copy_from_slice(bindings);
    }

    fn bind_stream_output_buffers(&mut self, first: u32, bindings: &[StreamOutputBinding]) {
        trace!(first, count = bindings.len(), "bind stream output buffers");
        self.unsupported("stream output");
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        if first_instance != 0 {
            debug!(first_instance, "base instance ignored");
        }
        unsafe {
            self.apply_input_layout();
            self.gl.draw_arrays_instanced(
                self.bound.topology,
                first_vertex as i32,
                vertex_count as i32,
                instance_count as i32,
            );
        }
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        let Some((ty, size, offset)) = self.bound.index else {
            warn!("indexed draw without an index buffer");
            return;
        };
        if first_instance != 0 {
            debug!(first_instance, "base instance ignored");
        }
        let offset = offset + u64::from(first_index) * u64::from(size);
        unsafe {
            self.apply_input_layout();
            self.gl.draw_elements_instanced_base_vertex(
                self.bound.topology,
                index_count as i32,
                ty,
                offset as i32,
                instance_count as i32,
                vertex_offset,
            );
        }
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        unsafe {
            self.gl
                .dispatch_compute(group_count_x, group_count_y, group_count_z)
        };
    }

    fn draw_or_dispatch_indirect(
        &mut self,
        ty: IndirectCommand,
        buffer: Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        let Some(args) = self.buffer(buffer) else {
            debug!(buffer = buffer.0, "indirect arguments in a non-buffer ignored");
            return;
        };
        let stride = convert::indirect_stride(ty, stride);
        let offsets = (0..u64::from(draw_count)).map(|i| (offset + i * stride) as i32);
        unsafe {
            match ty {
                IndirectCommand::DRAW => {
                    self.apply_input_layout();
                    self.gl.bind_buffer(glow::DRAW_INDIRECT_BUFFER, Some(args));
                    for at in offsets {
                        self.gl.draw_arrays_indirect_offset(self.bound.topology, at);
                    }
                    self.gl.bind_buffer(glow::DRAW_INDIRECT_BUFFER, None);
                }
                IndirectCommand::DRAW_INDEXED => {
                    let Some((index_type, _, _)) = self.bound.index else {
                        warn!("indexed indirect draw without an index buffer");
                        return;
                    };
                    self.apply_input_layout();
                    self.gl.bind_buffer(glow::DRAW_INDIRECT_BUFFER, Some(args));
                    for at in offsets {
                        self.gl
                            .draw_elements_indirect_offset(self.bound.topology, index_type, at);
                    }
                    self.gl.bind_buffer(glow::DRAW_INDIRECT_BUFFER, None);
                }
                IndirectCommand::DISPATCH => {
                    self.gl.bind_buffer(glow::DISPATCH_INDIRECT_BUFFER, Some(args));
                    for at in offsets {
                        self.gl.dispatch_compute_indirect(at);
                    }
                    self.gl.bind_buffer(glow::DISPATCH_INDIRECT_BUFFER, None);
                }
                other => {
                    debug!(ty = other.0, "unknown indirect command");
                    self.unsupported("indirect commands of unknown type");
                }
            }
        }
    }

    fn copy_resource(&mut self, src: Resource, dst: Resource) {
        let desc = self.resource_desc(src);
        if desc.ty == ResourceType::Buffer {
            self.copy_buffer_region(src, 0, dst, 0, desc.buffer.size);
            return;
        }
        let (levels, _) = desc.subresource_extent();
        for level in 0..levels {
            let region = TextureRegion {
                resource: src,
                subresource: level,
                region: None,
            };
            let target = TextureRegion {
                resource: dst,
                ..region
            };
            self.copy_texture_region(&region, &target, FilterMode::MIN_MAG_MIP_POINT);
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
        let (Some(from), Some(to)) = (self.buffer(src), self.buffer(dst)) else {
            debug!(src = src.0, dst = dst.0, "buffer copy between non-buffers ignored");
            return;
        };
        let size = if size == WHOLE_SIZE {
            self.resource_desc(src).buffer.size.saturating_sub(src_offset)
        } else {
            size
        };
        unsafe {
            self.gl.bind_buffer(glow::COPY_READ_BUFFER, Some(from));
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(to));
            self.gl.copy_buffer_sub_data(
                glow::COPY_READ_BUFFER,
                glow::COPY_WRITE_BUFFER,
                src_offset as i32,
                dst_offset as i32,
                size as i32,
            );
            self.gl.bind_buffer(glow::COPY_READ_BUFFER, None);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }

    fn copy_buffer_to_texture(&mut self, src: &BufferFootprint, dst: &TextureRegion) {
        let (Some(buffer), Some((texture, level))) =
            (self.buffer(src.buffer), self.texture_target_level(dst))
        else {
            debug!("buffer to texture copy with unknown objects ignored");
            return;
        };
        let desc = self.resource_desc(dst.resource);
        let Some(texel) = convert::texel_format(desc.texture.format) else {
            return;
        };
        let region = self.region_or_level(dst, level);
        unsafe {
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, Some(buffer));
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .pixel_store_i32(glow::UNPACK_ROW_LENGTH, src.row_length as i32);
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                level as i32,
                region.left as i32,
                region.top as i32,
                region.width() as i32,
                region.height() as i32,
                texel.format,
                texel.ty,
                glow::PixelUnpackData::BufferOffset(src.offset as u32),
            );
            self.gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, 0);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
        }
    }

    fn copy_texture_region(&mut self, src: &TextureRegion, dst: &TextureRegion, _filter: FilterMode) {
        let (Some((from, src_level)), Some((to, dst_level))) =
            (self.texture_target_level(src), self.texture_target_level(dst))
        else {
            debug!("texture copy with unknown objects ignored");
            return;
        };
        let s = self.region_or_level(src, src_level);
        let d = self.region_or_level(dst, dst_level);
        unsafe {
            self.gl.copy_image_sub_data(
                from,
                glow::TEXTURE_2D,
                src_level as i32,
                s.left as i32,
                s.top as i32,
                0,
                to,
                glow::TEXTURE_2D,
                dst_level as i32,
                d.left as i32,
                d.top as i32,
                0,
                s.width() as i32,
                s.height() as i32,
                1,
            );
        }
    }

    fn copy_texture_to_buffer(&mut self, src: &TextureRegion, dst: &BufferFootprint) {
        let (Some((texture, level)), Some(buffer)) =
            (self.texture_target_level(src), self.buffer(dst.buffer))
        else {
            debug!("texture to buffer copy with unknown objects ignored");
            return;
        };
        if src.region.is_some() {
            debug!("partial texture readback is not supported");
            return;
        }
        let desc = self.resource_desc(src.resource);
        let Some(texel) = convert::texel_format(desc.texture.format) else {
            return;
        };
        unsafe {
            self.gl.bind_buffer(glow::PIXEL_PACK_BUFFER, Some(buffer));
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .pixel_store_i32(glow::PACK_ROW_LENGTH, dst.row_length as i32);
            self.gl.get_tex_image(
                glow::TEXTURE_2D,
                level as i32,
                texel.format,
                texel.ty,
                glow::PixelPackData::BufferOffset(dst.offset as u32),
            );
            self.gl.pixel_store_i32(glow::PACK_ROW_LENGTH, 0);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            self.gl.bind_buffer(glow::PIXEL_PACK_BUFFER, None);
        }
    }

    fn resolve_texture_region(
        &mut self,
        src: &TextureRegion,
        dst: Resource,
        dst_subresource: u32,
        dst_offset: [i32; 3],
        _format: Format,
    ) {
        let target = TextureRegion {
            resource: dst,
            subresource: dst_subresource,
            region: None,
        };
        let (Some((from, src_level)), Some((to, dst_level))) =
            (self.texture_target_level(src), self.texture_target_level(&target))
        else {
            debug!(dst = dst.0, "resolve between unknown textures ignored");
            return;
        };
        let s = self.region_or_level(src, src_level);
        let Some((read, draw)) = self.scratch_framebuffers() else {
            return;
        };
        let [x, y, _] = dst_offset;
        unsafe {
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(read));
            self.gl.framebuffer_texture_2d(
                glow::READ_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(from),
                src_level as i32,
            );
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(draw));
            self.gl.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(to),
                dst_level as i32,
            );
            self.gl.blit_framebuffer(
                s.left as i32,
                s.top as i32,
                s.right as i32,
                s.bottom as i32,
                x,
                y,
                x + s.width() as i32,
                y + s.height() as i32,
                glow::COLOR_BUFFER_BIT,
                glow::NEAREST,
            );
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
            self.gl
                .bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.bound.draw_framebuffer);
        }
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[Rect],
    ) {
        unsafe {
            if !self.bind_draw_framebuffer(dsv) {
                return;
            }
            self.clear_rects(rects, |gl| {
                if let Some(d) = depth {
                    gl.clear_buffer_f32_slice(glow::DEPTH, 0, &[d]);
                }
                if let Some(s) = stencil {
                    gl.clear_buffer_i32_slice(glow::STENCIL, 0, &[i32::from(s)]);
                }
            });
        }
    }

    fn clear_render_target_view(&mut self, rtv: ResourceView, color: [f32; 4], rects: &[Rect]) {
        unsafe {
            if !self.bind_draw_framebuffer(rtv) {
                return;
            }
            self.clear_rects(rects, |gl| gl.clear_buffer_f32_slice(glow::COLOR, 0, &color));
        }
    }

    fn clear_unordered_access_view_uint(&mut self, uav: ResourceView, values: [u32; 4], rects: &[Rect]) {
        self.clear_texture_view(uav, rects, |gl| unsafe {
            gl.clear_buffer_u32_slice(glow::COLOR, 0, &values)
        });
    }

    fn clear_unordered_access_view_float(&mut self, uav: ResourceView, values: [f32; 4], rects: &[Rect]) {
        self.clear_texture_view(uav, rects, |gl| unsafe {
            gl.clear_buffer_f32_slice(glow::COLOR, 0, &values)
        });
    }

    fn generate_mipmaps(&mut self, srv: ResourceView) {
        let Some(texture) = self.texture(srv.0) else {
            debug!(srv = srv.0, target = object_target(srv.0), "mipmaps need a texture view");
            return;
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn take_unsupported(&mut self) -> u64 {
        self.take_unsupported_count()
    }
}
