// SPDX-License-Identifier: CEPL-1.0
use crate::mapping::{BufferMapping, MappedPtr, MappingTable, TextureMapping};
use gfxtrace_render::*;
use gfxtrace_stream::{calc_texture_size, Event, MappedTexels, SubresourcePayload, TraceWriter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, trace, warn};

struct RecorderState<W: Write> {
    writer: TraceWriter<W>,
    mappings: MappingTable,
    events: u64,
}

impl<W: Write> RecorderState<W> {
    fn write(&mut self, event: &Event) {
        match self.writer.write_event(event) {
            Ok(()) => {
                self.events += 1;
                trace!(event = event.tag().name(), index = self.events, "recorded");
            }
            Err(e) => {
                error!(event = event.tag().name(), %e, "trace write failed");
                debug_assert!(false, "trace write failed: {e}");
            }
        }
    }
}

/// Serializes the calls of one device into its trace.
///
/// Every hook holds the lock for the whole event, so events from concurrent call sites never
/// interleave and pending mappings are only touched under it. Hooks never fail towards the
/// caller; write errors are logged.
pub struct Recorder<W: Write = BufWriter<File>> {
    api: DeviceApi,
    state: Mutex<RecorderState<W>>,
}

/// Resolves `WHOLE_SIZE` to the bytes left in the buffer after `offset`.
pub fn resolve_whole_size(offset: u64, size: u64, buffer_size: u64) -> u64 {
    if size == WHOLE_SIZE {
        buffer_size.saturating_sub(offset)
    } else {
        size
    }
}

/// Returns exactly `len` bytes of `data`, zero-filling what the caller did not provide.
fn exact_bytes(data: &[u8], len: u64, what: &str) -> Vec<u8> {
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    if data.len() < len {
        warn!(what, provided = data.len(), expected = len, "short initial data, zero-filled");
        let mut bytes = data.to_vec();
        bytes.resize(len, 0);
        bytes
    } else {
        data[..len].to_vec()
    }
}

/// Copies `len` bytes out of a live native mapping.
///
/// # Safety
/// `ptr` must be valid for reads of `len` bytes.
unsafe fn read_mapped(ptr: NonNull<u8>, len: u64) -> Vec<u8> {
    let Ok(len) = usize::try_from(len) else {
        return Vec::new();
    };
    // SAFETY: forwarded from the caller.
    unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }.to_vec()
}

impl<W: Write> Recorder<W> {
    /// Starts a trace on `inner`, writing the header first.
    pub fn new(api: DeviceApi, inner: W) -> io::Result<Self> {
        let mut writer = TraceWriter::new(inner);
        writer.write_header(api)?;
        Ok(Self::from_writer(api, writer))
    }

    /// Wraps a writer whose header is already written.
    pub fn from_writer(api: DeviceApi, writer: TraceWriter<W>) -> Self {
        Recorder {
            api,
            state: Mutex::new(RecorderState {
                writer,
                mappings: MappingTable::default(),
                events: 0,
            }),
        }
    }

    pub fn api(&self) -> DeviceApi {
        self.api
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events_written(&self) -> u64 {
        self.lock().events
    }

    /// Maps opened on the device that have not been unmapped yet.
    pub fn pending_mappings(&self) -> usize {
        self.lock().mappings.len()
    }

    pub fn flush(&self) {
        if let Err(e) = self.lock().writer.flush() {
            error!(%e, "trace flush failed");
        }
    }

    pub fn into_writer(self) -> W {
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        state.writer.into_inner()
    }

    /// Records an event whose payload is fully described by its arguments.
    pub fn record(&self, event: &Event) {
        self.lock().write(event);
    }

    pub fn on_init_swapchain(&self, back_buffers: &[Resource]) {
        self.record(&Event::InitSwapchain {
            back_buffers: back_buffers.to_vec(),
        });
    }

    pub fn on_destroy_swapchain(&self, back_buffers: &[Resource]) {
        self.record(&Event::DestroySwapchain {
            back_buffers: back_buffers.to_vec(),
        });
    }

    /// Records a created resource. Buffers keep exactly `desc.buffer.size` bytes; each texture
    /// subresource keeps the bytes `calc_texture_size` derives from its pitches.
    pub fn on_init_resource(
        &self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
        initial_state: ResourceUsage,
        handle: Resource,
    ) {
        let payloads = if desc.ty == ResourceType::Buffer {
            initial_data
                .first()
                .map(|d| SubresourcePayload {
                    data: exact_bytes(d.data, desc.buffer.size, "buffer"),
                    ..Default::default()
                })
                .into_iter()
                .collect()
        } else {
            initial_data
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let size = calc_texture_size(desc, i as u32, d.row_pitch, d.slice_pitch, None);
                    SubresourcePayload {
                        row_pitch: d.row_pitch,
                        slice_pitch: d.slice_pitch,
                        data: exact_bytes(d.data, size, "texture"),
                    }
                })
                .collect()
        };
        self.record(&Event::InitResource {
            desc: *desc,
            initial_state,
            handle,
            initial_data: payloads,
        });
    }

    pub fn on_map_buffer_region(
        &self,
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
        buffer_size: u64,
        data: NonNull<u8>,
    ) {
        let size = resolve_whole_size(offset, size, buffer_size);
        let mut state = self.lock();
        state.write(&Event::MapBufferRegion {
            resource,
            offset,
            size,
            access,
        });
        state.mappings.insert_buffer(BufferMapping {
            resource,
            offset,
            size,
            access,
            data: MappedPtr(data),
        });
    }

    /// Records the bytes left in the oldest open map of `resource`.
    ///
    /// # Safety
    /// Must be called before the native unmap, while the pointer recorded by the matching
    /// [`Recorder::on_map_buffer_region`] is still valid for its mapped size.
    pub unsafe fn on_unmap_buffer_region(&self, resource: Resource) {
        let mut state = self.lock();
        let Some(mapping) = state.mappings.take_buffer(resource) else {
            warn!(?resource, "unmap without a recorded map");
            return;
        };
        let data = if mapping.access.writes() {
            // SAFETY: the mapping is live per the caller.
            unsafe { read_mapped(mapping.data.0, mapping.size) }
        } else {
            Vec::new()
        };
        state.write(&Event::UnmapBufferRegion {
            resource,
            offset: mapping.offset,
            size: mapping.size,
            access: mapping.access,
            data,
        });
    }

    pub fn on_map_texture_region(
        &self,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
        access: MapAccess,
        mapped: &MappedSubresource,
    ) {
        let mut state = self.lock();
        state.write(&Event::MapTextureRegion {
            resource,
            subresource,
            region: region.copied(),
            access,
        });
        state.mappings.insert_texture(TextureMapping {
            resource,
            subresource,
            region: region.copied(),
            access,
            data: MappedPtr(mapped.data),
            row_pitch: mapped.row_pitch,
            slice_pitch: mapped.slice_pitch,
            len: mapped.len,
            refs: 1,
        });
    }

    /// Records the texels of the newest open map of `(resource, subresource)`.
    ///
    /// # Safety
    /// Must be called before the native unmap, while the mapped pointer is valid for the size
    /// `calc_texture_size` yields for `desc` and the mapping's pitches.
    pub unsafe fn on_unmap_texture_region(&self, desc: &ResourceDesc, resource: Resource, subresource: u32) {
        let mut state = self.lock();
        let Some(mapping) = state.mappings.release_texture(resource, subresource) else {
            warn!(?resource, subresource, "unmap without a recorded map");
            return;
        };
        let texels = mapping.access.writes().then(|| {
            let size = calc_texture_size(
                desc,
                subresource,
                mapping.row_pitch,
                mapping.slice_pitch,
                mapping.region.as_ref(),
            );
            let size = if size > mapping.len as u64 {
                warn!(
                    ?resource,
                    subresource,
                    size,
                    mapped = mapping.len,
                    "texels exceed the mapping, truncated"
                );
                mapping.len as u64
            } else {
                size
            };
            MappedTexels {
                row_pitch: mapping.row_pitch,
                slice_pitch: mapping.slice_pitch,
                // SAFETY: the mapping is live per the caller.
                data: unsafe { read_mapped(mapping.data.0, size) },
            }
        });
        state.write(&Event::UnmapTextureRegion {
            resource,
            subresource,
            region: mapping.region,
            access: mapping.access,
            texels,
        });
    }

    pub fn on_update_buffer_region(&self, data: &[u8], resource: Resource, offset: u64) {
        self.record(&Event::UpdateBufferRegion {
            resource,
            offset,
            data: data.to_vec(),
        });
    }

    pub fn on_update_texture_region(
        &self,
        desc: &ResourceDesc,
        data: &SubresourceData<'_>,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
    ) {
        let size = calc_texture_size(desc, subresource, data.row_pitch, data.slice_pitch, region);
        self.record(&Event::UpdateTextureRegion {
            resource,
            subresource,
            region: region.copied(),
            row_pitch: data.row_pitch,
            slice_pitch: data.slice_pitch,
            data: exact_bytes(data.data, size, "texture update"),
        });
    }

    /// Records the frame boundary and pushes buffered events to the file.
    pub fn on_present(&self) {
        let mut state = self.lock();
        state.write(&Event::Present);
        if let Err(e) = state.writer.flush() {
            error!(%e, "trace flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfxtrace_stream::TraceReader;
    use std::io::Cursor;

    fn recorder() -> Recorder<Vec<u8>> {
        Recorder::new(DeviceApi::D3D11, Vec::new()).unwrap()
    }

    fn events(recorder: Recorder<Vec<u8>>) -> Vec<Event> {
        TraceReader::new(Cursor::new(recorder.into_writer()))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn whole_size_resolves_to_the_remainder() {
        assert_eq!(resolve_whole_size(16, WHOLE_SIZE, 64), 48);
        assert_eq!(resolve_whole_size(0, WHOLE_SIZE, 64), 64);
        assert_eq!(resolve_whole_size(80, WHOLE_SIZE, 64), 0);
        assert_eq!(resolve_whole_size(8, 4, 64), 4);
    }

    #[test]
    fn buffer_initial_data_is_sized_by_the_descriptor() {
        let rec = recorder();
        let desc = ResourceDesc::buffer(8, MemoryHeap::GPU_ONLY, ResourceUsage::INDEX_BUFFER);
        let long = [7u8; 12];
        rec.on_init_resource(
            &desc,
            &[SubresourceData {
                data: &long,
                row_pitch: 0,
                slice_pitch: 0,
            }],
            ResourceUsage::INDEX_BUFFER,
            Resource(1),
        );
        let short = [9u8; 3];
        rec.on_init_resource(
            &desc,
            &[SubresourceData {
                data: &short,
                row_pitch: 0,
                slice_pitch: 0,
            }],
            ResourceUsage::INDEX_BUFFER,
            Resource(2),
        );

        let recorded: Vec<Vec<u8>> = events(rec)
            .into_iter()
            .filter_map(|e| match e {
                Event::InitResource { initial_data, .. } => Some(initial_data[0].data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(recorded[0], vec![7; 8]);
        assert_eq!(recorded[1], vec![9, 9, 9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn texture_subresources_follow_their_pitches() {
        let rec = recorder();
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            4,
            4,
            1,
            2,
            Format::R8G8B8A8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        // level 0 padded to 32-byte rows
        let level0 = vec![1u8; 32 * 4];
        let level1 = vec![2u8; 8 * 2];
        rec.on_init_resource(
            &desc,
            &[
                SubresourceData {
                    data: &level0,
                    row_pitch: 32,
                    slice_pitch: 128,
                },
                SubresourceData {
                    data: &level1,
                    row_pitch: 8,
                    slice_pitch: 16,
                },
            ],
            ResourceUsage::SHADER_RESOURCE,
            Resource(3),
        );
        let Event::InitResource { initial_data, .. } = &events(rec)[0] else {
            panic!("expected init_resource");
        };
        assert_eq!(initial_data[0].data.len(), 128);
        assert_eq!(initial_data[1].data.len(), 16);
    }

    #[test]
    fn buffer_unmap_records_written_bytes() {
        let rec = recorder();
        let mut memory = vec![0u8; 32];
        let base = NonNull::new(memory.as_mut_ptr()).unwrap();
        rec.on_map_buffer_region(Resource(4), 0, WHOLE_SIZE, MapAccess::WriteDiscard, 32, base);
        memory[..4].copy_from_slice(&[1, 2, 3, 4]);
        unsafe { rec.on_unmap_buffer_region(Resource(4)) };
        assert_eq!(rec.pending_mappings(), 0);

        let evs = events(rec);
        assert_eq!(
            evs[0],
            Event::MapBufferRegion {
                resource: Resource(4),
                offset: 0,
                size: 32,
                access: MapAccess::WriteDiscard,
            }
        );
        let Event::UnmapBufferRegion { data, .. } = &evs[1] else {
            panic!("expected unmap");
        };
        assert_eq!(&data[..4], &[1, 2, 3, 4]);
        assert_eq!(data.len(), 32);
    }

    #[test]
    fn read_only_unmap_carries_no_bytes_and_stray_unmap_is_dropped() {
        let rec = recorder();
        let mut memory = vec![5u8; 8];
        let base = NonNull::new(memory.as_mut_ptr()).unwrap();
        rec.on_map_buffer_region(Resource(6), 0, 8, MapAccess::ReadOnly, 8, base);
        unsafe {
            rec.on_unmap_buffer_region(Resource(6));
            rec.on_unmap_buffer_region(Resource(6));
        }
        let evs = events(rec);
        assert_eq!(evs.len(), 2);
        assert!(matches!(&evs[1], Event::UnmapBufferRegion { data, .. } if data.is_empty()));
    }

    #[test]
    fn nested_texture_maps_record_each_unmap() {
        let rec = recorder();
        let desc = ResourceDesc::texture(
            ResourceType::Texture2d,
            2,
            2,
            1,
            1,
            Format::R8_UNORM,
            ResourceUsage::SHADER_RESOURCE,
        );
        let mut memory = vec![0u8; 4];
        let mapped = MappedSubresource {
            data: NonNull::new(memory.as_mut_ptr()).unwrap(),
            row_pitch: 2,
            slice_pitch: 4,
            len: memory.len(),
        };
        rec.on_map_texture_region(Resource(8), 0, None, MapAccess::WriteOnly, &mapped);
        rec.on_map_texture_region(Resource(8), 0, None, MapAccess::WriteOnly, &mapped);
        assert_eq!(rec.pending_mappings(), 1);
        memory.copy_from_slice(&[1, 2, 3, 4]);
        unsafe { rec.on_unmap_texture_region(&desc, Resource(8), 0) };
        assert_eq!(rec.pending_mappings(), 1);
        unsafe { rec.on_unmap_texture_region(&desc, Resource(8), 0) };
        assert_eq!(rec.pending_mappings(), 0);

        let unmaps: Vec<_> = events(rec)
            .into_iter()
            .filter(|e| matches!(e, Event::UnmapTextureRegion { .. }))
            .collect();
        assert_eq!(unmaps.len(), 2);
        let Event::UnmapTextureRegion { texels: Some(t), .. } = &unmaps[1] else {
            panic!("expected texels");
        };
        assert_eq!(t.data, vec![1, 2, 3, 4]);
        assert_eq!((t.row_pitch, t.slice_pitch), (2, 4));
    }
}
