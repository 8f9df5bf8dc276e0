// SPDX-License-Identifier: CEPL-1.0
use crate::context::ReplayContext;
use gfxtrace_render::*;
use gfxtrace_stream::{calc_texture_size, Event, MappedTexels, SubresourcePayload};
use tracing::{debug, warn};

/// Copies recorded texels into live mapped memory laid out at `row_pitch`/`slice_pitch`, row by
/// row when the pitches differ. Writes nothing and returns `false` when the texels do not fit.
fn copy_texels(dst: &mut [u8], row_pitch: u32, slice_pitch: u32, texels: &MappedTexels) -> bool {
    let src = &texels.data;
    if texels.row_pitch == 0 || texels.row_pitch == row_pitch {
        let Some(dst) = dst.get_mut(..src.len()) else {
            return false;
        };
        dst.copy_from_slice(src);
        return true;
    }
    let src_row = texels.row_pitch as usize;
    let width = src_row.min(row_pitch as usize);
    let rows_per_slice = match texels.slice_pitch as usize / src_row {
        0 => usize::MAX,
        n => n,
    };
    let rows: Vec<(usize, &[u8])> = src
        .chunks(src_row)
        .enumerate()
        .map(|(row, chunk)| {
            let offset = (row / rows_per_slice)
                .saturating_mul(slice_pitch as usize)
                .saturating_add((row % rows_per_slice).saturating_mul(row_pitch as usize));
            (offset, &chunk[..width.min(chunk.len())])
        })
        .collect();
    if rows
        .iter()
        .any(|(offset, row)| offset.saturating_add(row.len()) > dst.len())
    {
        return false;
    }
    for (offset, row) in rows {
        dst[offset..offset + row.len()].copy_from_slice(row);
    }
    true
}

impl ReplayContext {
    pub(crate) fn apply_device(&mut self, device: &mut dyn Device, event: Event) {
        match event {
            Event::InitSampler { desc, handle } => {
                if let Some(stale) = self.registry.samplers.remove(handle) {
                    device.destroy_sampler(stale);
                }
                match device.create_sampler(&desc) {
                    Ok(live) => {
                        self.registry.samplers.insert_owned(handle, live);
                    }
                    Err(e) => self.native_failure("create_sampler", handle.0, e),
                }
            }
            Event::DestroySampler { handle } => {
                if let Some(live) = self.registry.samplers.remove(handle) {
                    device.destroy_sampler(live);
                }
            }
            Event::InitResource {
                desc,
                initial_state,
                handle,
                initial_data,
            } => self.init_resource(device, desc, initial_state, handle, &initial_data),
            Event::DestroyResource { handle } => {
                self.origin_descs.remove(&handle);
                if let Some(live) = self.registry.resources.remove(handle) {
                    device.destroy_resource(live);
                }
            }
            Event::InitResourceView {
                resource,
                usage_type,
                desc,
                handle,
            } => {
                if self.is_default_framebuffer(handle.0) {
                    if let Some(stale) = self.registry.views.insert_borrowed(handle, handle) {
                        device.destroy_resource_view(stale);
                    }
                    return;
                }
                if let Some(stale) = self.registry.views.remove(handle) {
                    device.destroy_resource_view(stale);
                }
                let live_resource = self.registry.resources.get(resource);
                match device.create_resource_view(live_resource, usage_type, &desc) {
                    Ok(live) => {
                        self.registry.views.insert_owned(handle, live);
                    }
                    Err(e) => self.native_failure("create_resource_view", handle.0, e),
                }
            }
            Event::DestroyResourceView { handle } => {
                if let Some(live) = self.registry.views.remove(handle) {
                    device.destroy_resource_view(live);
                }
            }
            Event::InitPipeline {
                layout,
                subobjects,
                handle,
            } => {
                if let Some(stale) = self.registry.pipelines.remove(handle) {
                    device.destroy_pipeline(stale);
                }
                let live_layout = self.registry.layouts.get(layout);
                match device.create_pipeline(live_layout, &subobjects) {
                    Ok(live) => {
                        self.registry.pipelines.insert_owned(handle, live);
                    }
                    Err(e) => self.native_failure("create_pipeline", handle.0, e),
                }
            }
            Event::DestroyPipeline { handle } => {
                if let Some(live) = self.registry.pipelines.remove(handle) {
                    device.destroy_pipeline(live);
                }
            }
            Event::InitPipelineLayout { params, handle } => {
                if let Some(stale) = self.registry.layouts.remove(handle) {
                    device.destroy_pipeline_layout(stale);
                }
                match device.create_pipeline_layout(&params) {
                    Ok(live) => {
                        self.registry.layouts.insert_owned(handle, live);
                    }
                    Err(e) => self.native_failure("create_pipeline_layout", handle.0, e),
                }
            }
            Event::DestroyPipelineLayout { handle } => {
                if let Some(live) = self.registry.layouts.remove(handle) {
                    device.destroy_pipeline_layout(live);
                }
            }
            Event::AllocateDescriptorTables {
                layout,
                param,
                tables,
            } => {
                let stale: Vec<_> = tables
                    .iter()
                    .filter_map(|&t| self.registry.tables.remove(t))
                    .collect();
                if !stale.is_empty() {
                    device.free_descriptor_tables(&stale);
                }
                let live_layout = self.registry.layouts.get(layout);
                match device.allocate_descriptor_tables(live_layout, param, tables.len() as u32) {
                    Ok(live) => {
                        for (&origin, live) in tables.iter().zip(live) {
                            self.registry.tables.insert_owned(origin, live);
                        }
                    }
                    Err(e) => {
                        let first = tables.first().map_or(0, |t| t.0);
                        self.native_failure("allocate_descriptor_tables", first, e);
                    }
                }
            }
            Event::FreeDescriptorTables { tables } => {
                let live: Vec<_> = tables
                    .iter()
                    .filter_map(|&t| self.registry.tables.remove(t))
                    .collect();
                if !live.is_empty() {
                    device.free_descriptor_tables(&live);
                }
            }
            Event::CopyDescriptorTables { copies } => {
                let copies: Vec<_> = copies.iter().map(|c| self.registry.table_copy(c)).collect();
                device.copy_descriptor_tables(&copies);
            }
            Event::UpdateDescriptorTables { updates } => {
                let updates: Vec<_> = updates
                    .iter()
                    .map(|u| self.registry.table_update(u))
                    .collect();
                device.update_descriptor_tables(&updates);
            }
            // maps are collapsed into their unmap
            Event::MapBufferRegion { .. } | Event::MapTextureRegion { .. } => {
                self.stats.skipped += 1;
            }
            Event::UnmapBufferRegion {
                resource,
                offset,
                size,
                access,
                data,
            } => {
                if !access.writes() {
                    self.stats.skipped += 1;
                    return;
                }
                let live = self.registry.resources.get(resource);
                if live.is_null() {
                    self.skip("unmap_buffer_region", resource.0);
                    return;
                }
                match device.map_buffer_region(live, offset, size, access) {
                    Ok(ptr) => {
                        let mapped = if size == WHOLE_SIZE {
                            device.resource_desc(live).buffer.size.saturating_sub(offset)
                        } else {
                            size
                        };
                        if data.len() as u64 > mapped {
                            warn!(
                                origin = resource.0,
                                recorded = data.len(),
                                mapped,
                                "unmap data exceeds the live mapping, truncated"
                            );
                        }
                        let n = data.len().min(usize::try_from(mapped).unwrap_or(usize::MAX));
                        // SAFETY: the live map spans `mapped` bytes from `ptr` until the unmap.
                        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), n) };
                        device.unmap_buffer_region(live);
                    }
                    Err(DeviceError::Unsupported(what)) => {
                        debug!(what, origin = resource.0, "writing the unmapped range as an update");
                        device.update_buffer_region(&data, live, offset);
                    }
                    Err(e) => self.native_failure("map_buffer_region", resource.0, e),
                }
            }
            Event::UnmapTextureRegion {
                resource,
                subresource,
                region,
                access,
                texels,
            } => {
                let Some(texels) = texels.filter(|_| access.writes()) else {
                    self.stats.skipped += 1;
                    return;
                };
                self.check_texture_size(
                    resource,
                    subresource,
                    texels.row_pitch,
                    texels.slice_pitch,
                    region.as_ref(),
                    texels.data.len(),
                );
                let live = self.registry.resources.get(resource);
                if live.is_null() {
                    self.skip("unmap_texture_region", resource.0);
                    return;
                }
                match device.map_texture_region(live, subresource, region.as_ref(), access) {
                    Ok(mapped) => {
                        // SAFETY: the live map keeps `len` bytes at `data` addressable until the
                        // unmap below, and nothing else touches them meanwhile.
                        let dst =
                            unsafe { std::slice::from_raw_parts_mut(mapped.data.as_ptr(), mapped.len) };
                        if !copy_texels(dst, mapped.row_pitch, mapped.slice_pitch, &texels) {
                            warn!(
                                origin = resource.0,
                                subresource,
                                recorded = texels.data.len(),
                                mapped = mapped.len,
                                "texels do not fit the live mapping, skipped"
                            );
                            self.stats.skipped += 1;
                        }
                        device.unmap_texture_region(live, subresource);
                    }
                    Err(DeviceError::Unsupported(what)) => {
                        debug!(what, origin = resource.0, "writing the unmapped texels as an update");
                        let data = SubresourceData {
                            data: &texels.data,
                            row_pitch: texels.row_pitch,
                            slice_pitch: texels.slice_pitch,
                        };
                        device.update_texture_region(&data, live, subresource, region.as_ref());
                    }
                    Err(e) => self.native_failure("map_texture_region", resource.0, e),
                }
            }
            Event::UpdateBufferRegion {
                resource,
                offset,
                data,
            } => {
                let live = self.registry.resources.get(resource);
                if data.is_empty() || live.is_null() {
                    self.skip("update_buffer_region", resource.0);
                    return;
                }
                device.update_buffer_region(&data, live, offset);
            }
            Event::UpdateTextureRegion {
                resource,
                subresource,
                region,
                row_pitch,
                slice_pitch,
                data,
            } => {
                self.check_texture_size(
                    resource,
                    subresource,
                    row_pitch,
                    slice_pitch,
                    region.as_ref(),
                    data.len(),
                );
                let live = self.registry.resources.get(resource);
                if data.is_empty() || live.is_null() {
                    self.skip("update_texture_region", resource.0);
                    return;
                }
                let data = SubresourceData {
                    data: &data,
                    row_pitch,
                    slice_pitch,
                };
                device.update_texture_region(&data, live, subresource, region.as_ref());
            }
            other => debug!(event = other.tag().name(), "not a device event"),
        }
    }

    fn init_resource(
        &mut self,
        device: &mut dyn Device,
        mut desc: ResourceDesc,
        initial_state: ResourceUsage,
        handle: Resource,
        initial_data: &[SubresourcePayload],
    ) {
        if self.api == DeviceApi::OpenGL && desc.is_texture() && desc.texture.levels == 0 {
            desc.texture.levels = 1;
        }
        self.origin_descs.insert(handle, desc);

        if self.is_default_framebuffer(handle.0) {
            if let Some(stale) = self.registry.resources.insert_borrowed(handle, handle) {
                device.destroy_resource(stale);
            }
            return;
        }
        if desc.is_texture() {
            for (i, payload) in initial_data.iter().enumerate() {
                let expected =
                    calc_texture_size(&desc, i as u32, payload.row_pitch, payload.slice_pitch, None);
                if expected != payload.data.len() as u64 {
                    warn!(
                        origin = handle.0,
                        subresource = i,
                        expected,
                        recorded = payload.data.len(),
                        "texture size mismatch"
                    );
                }
            }
        }
        if let Some(stale) = self.registry.resources.remove(handle) {
            device.destroy_resource(stale);
        }
        let data: Vec<SubresourceData<'_>> = initial_data.iter().map(SubresourcePayload::as_data).collect();
        match device.create_resource(&desc, &data, initial_state) {
            Ok(live) => {
                self.registry.resources.insert_owned(handle, live);
            }
            Err(e) => self.native_failure("create_resource", handle.0, e),
        }
    }

    fn check_texture_size(
        &self,
        resource: Resource,
        subresource: u32,
        row_pitch: u32,
        slice_pitch: u32,
        region: Option<&SubresourceBox>,
        recorded: usize,
    ) {
        let Some(desc) = self.origin_descs.get(&resource) else {
            return;
        };
        let expected = calc_texture_size(desc, subresource, row_pitch, slice_pitch, region);
        if expected != recorded as u64 {
            warn!(
                origin = resource.0,
                subresource, expected, recorded, "texture size mismatch"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texels_are_repitched_into_the_live_layout() {
        let mut live = vec![0u8; 16];
        let texels = MappedTexels {
            row_pitch: 2,
            slice_pitch: 4,
            data: vec![1, 2, 3, 4],
        };
        assert!(copy_texels(&mut live, 8, 16, &texels));
        assert_eq!(live[..2], [1, 2]);
        assert_eq!(live[8..10], [3, 4]);
        assert!(live[2..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn slices_advance_by_the_live_slice_pitch() {
        let mut live = vec![0u8; 32];
        // two slices of one 2-byte row each
        let texels = MappedTexels {
            row_pitch: 2,
            slice_pitch: 2,
            data: vec![5, 6, 7, 8],
        };
        assert!(copy_texels(&mut live, 4, 16, &texels));
        assert_eq!(live[..2], [5, 6]);
        assert_eq!(live[16..18], [7, 8]);
    }

    #[test]
    fn texels_past_the_mapping_are_not_written() {
        let mut live = vec![0u8; 8];
        let linear = MappedTexels {
            row_pitch: 0,
            slice_pitch: 0,
            data: vec![9; 9],
        };
        assert!(!copy_texels(&mut live, 4, 8, &linear));
        // the third row would start past the end
        let pitched = MappedTexels {
            row_pitch: 2,
            slice_pitch: 0,
            data: vec![9; 6],
        };
        assert!(!copy_texels(&mut live, 4, 8, &pitched));
        assert!(live.iter().all(|&b| b == 0));
    }
}
