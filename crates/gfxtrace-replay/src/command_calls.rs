// SPDX-License-Identifier: CEPL-1.0
use crate::context::ReplayContext;
use gfxtrace_render::*;
use gfxtrace_stream::Event;
use tracing::debug;

impl ReplayContext {
    pub(crate) fn apply_command(&mut self, cmd: &mut dyn CommandList, event: Event) {
        let r = &self.registry;
        match event {
            Event::Barrier { barriers } => {
                let barriers: Vec<_> = barriers
                    .iter()
                    .map(|b| Barrier {
                        resource: r.resources.get(b.resource),
                        ..*b
                    })
                    .collect();
                cmd.barrier(&barriers);
            }
            Event::BeginRenderPass {
                render_targets,
                depth_stencil,
            } => {
                let render_targets: Vec<_> = render_targets
                    .iter()
                    .map(|rt| RenderPassRenderTargetDesc {
                        view: r.views.get(rt.view),
                        ..*rt
                    })
                    .collect();
                let depth_stencil = depth_stencil.map(|ds| RenderPassDepthStencilDesc {
                    view: r.views.get(ds.view),
                    ..ds
                });
                cmd.begin_render_pass(&render_targets, depth_stencil.as_ref());
            }
            Event::EndRenderPass => cmd.end_render_pass(),
            Event::BindRenderTargetsAndDepthStencil { rtvs, dsv } => {
                let rtvs: Vec<_> = rtvs.iter().map(|&v| r.views.get(v)).collect();
                cmd.bind_render_targets_and_depth_stencil(&rtvs, r.views.get(dsv));
            }
            Event::BindPipeline { stages, pipeline } => {
                cmd.bind_pipeline(stages, r.pipelines.get(pipeline))
            }
            Event::BindPipelineStates { states } => cmd.bind_pipeline_states(&states),
            Event::BindViewports { first, viewports } => cmd.bind_viewports(first, &viewports),
            Event::BindScissorRects { first, rects } => cmd.bind_scissor_rects(first, &rects),
            Event::PushConstants {
                stages,
                layout,
                param,
                first,
                values,
            } => cmd.push_constants(stages, r.layouts.get(layout), param, first, &values),
            Event::PushDescriptors {
                stages,
                layout,
                param,
                binding,
                array_offset,
                descriptors,
            } => {
                let update = DescriptorTableUpdate {
                    table: DescriptorTable::NULL,
                    binding,
                    array_offset,
                    descriptors: r.descriptors(&descriptors),
                };
                cmd.push_descriptors(stages, r.layouts.get(layout), param, &update);
            }
            Event::BindDescriptorTables {
                stages,
                layout,
                first,
                tables,
            } => {
                let tables: Vec<_> = tables.iter().map(|&t| r.tables.get(t)).collect();
                cmd.bind_descriptor_tables(stages, r.layouts.get(layout), first, &tables);
            }
            Event::BindIndexBuffer {
                buffer,
                offset,
                index_size,
            } => cmd.bind_index_buffer(r.resources.get(buffer), offset, index_size),
            Event::BindVertexBuffers { first, bindings } => {
                let bindings: Vec<_> = bindings
                    .iter()
                    .map(|b| VertexBufferBinding {
                        buffer: r.resources.get(b.buffer),
                        ..*b
                    })
                    .collect();
                cmd.bind_vertex_buffers(first, &bindings);
            }
            Event::BindStreamOutputBuffers { first, bindings } => {
                let bindings: Vec<_> = bindings
                    .iter()
                    .map(|b| StreamOutputBinding {
                        buffer: r.resources.get(b.buffer),
                        counter_buffer: r.resources.get(b.counter_buffer),
                        ..*b
                    })
                    .collect();
                cmd.bind_stream_output_buffers(first, &bindings);
            }
            Event::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => cmd.draw(vertex_count, instance_count, first_vertex, first_instance),
            Event::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => cmd.draw_indexed(
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            ),
            Event::Dispatch {
                group_count_x,
                group_count_y,
                group_count_z,
            } => cmd.dispatch(group_count_x, group_count_y, group_count_z),
            Event::DrawOrDispatchIndirect {
                ty,
                buffer,
                offset,
                draw_count,
                stride,
            } => cmd.draw_or_dispatch_indirect(ty, r.resources.get(buffer), offset, draw_count, stride),
            Event::CopyResource { src, dst } => {
                cmd.copy_resource(r.resources.get(src), r.resources.get(dst))
            }
            Event::CopyBufferRegion {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => cmd.copy_buffer_region(
                r.resources.get(src),
                src_offset,
                r.resources.get(dst),
                dst_offset,
                size,
            ),
            Event::CopyBufferToTexture { src, dst } => {
                cmd.copy_buffer_to_texture(&r.buffer_footprint(&src), &r.texture_region(&dst))
            }
            Event::CopyTextureRegion { src, dst, filter } => {
                cmd.copy_texture_region(&r.texture_region(&src), &r.texture_region(&dst), filter)
            }
            Event::CopyTextureToBuffer { src, dst } => {
                cmd.copy_texture_to_buffer(&r.texture_region(&src), &r.buffer_footprint(&dst))
            }
            Event::ResolveTextureRegion {
                src,
                dst,
                dst_subresource,
                dst_offset,
                format,
            } => cmd.resolve_texture_region(
                &r.texture_region(&src),
                r.resources.get(dst),
                dst_subresource,
                dst_offset,
                format,
            ),
            Event::ClearDepthStencilView {
                dsv,
                depth,
                stencil,
                rects,
            } => cmd.clear_depth_stencil_view(r.views.get(dsv), depth, stencil, &rects),
            Event::ClearRenderTargetView { rtv, color, rects } => {
                cmd.clear_render_target_view(r.views.get(rtv), color, &rects)
            }
            Event::ClearUnorderedAccessViewUint { uav, values, rects } => {
                cmd.clear_unordered_access_view_uint(r.views.get(uav), values, &rects)
            }
            Event::ClearUnorderedAccessViewFloat { uav, values, rects } => {
                cmd.clear_unordered_access_view_float(r.views.get(uav), values, &rects)
            }
            Event::GenerateMipmaps { srv } => cmd.generate_mipmaps(r.views.get(srv)),
            other => debug!(event = other.tag().name(), "not a command event"),
        }
    }
}
