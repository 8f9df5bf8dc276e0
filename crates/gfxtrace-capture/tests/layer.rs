// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_capture::{CaptureLayer, CaptureSession, Recorder};
use gfxtrace_render::*;
use gfxtrace_render_null::{Call, HeadlessApplication};
use gfxtrace_stream::{Event, EventTag, TraceReader};
use std::io::Cursor;
use std::ptr::NonNull;
use std::sync::Arc;
use std::thread;

fn decode(bytes: Vec<u8>) -> Vec<Event> {
    TraceReader::new(Cursor::new(bytes))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn draw_frame(app: &mut dyn Application) {
    let desc = ResourceDesc::buffer(16, MemoryHeap::CPU_TO_GPU, ResourceUsage::VERTEX_BUFFER);
    let init = [3u8; 16];
    let buffer = app
        .device()
        .create_resource(
            &desc,
            &[SubresourceData {
                data: &init,
                row_pitch: 0,
                slice_pitch: 0,
            }],
            ResourceUsage::VERTEX_BUFFER,
        )
        .unwrap();

    let ptr = app
        .device()
        .map_buffer_region(buffer, 0, WHOLE_SIZE, MapAccess::WriteOnly)
        .unwrap();
    unsafe { ptr.as_ptr().write_bytes(0xab, 16) };
    app.device().unmap_buffer_region(buffer);

    let cmd = app.command_list();
    cmd.bind_vertex_buffers(
        0,
        &[VertexBufferBinding {
            buffer,
            offset: 0,
            stride: 16,
        }],
    );
    cmd.draw(3, 1, 0, 0);
    app.present().unwrap();
    app.device().destroy_resource(buffer);
}

#[test]
fn layer_is_transparent_to_the_wrapped_device() {
    let mut plain = HeadlessApplication::new(DeviceApi::D3D11, 2);
    draw_frame(&mut plain);

    let recorder = Arc::new(Recorder::new(DeviceApi::D3D11, Vec::new()).unwrap());
    let mut layered = CaptureLayer::new(HeadlessApplication::new(DeviceApi::D3D11, 2), recorder);
    draw_frame(&mut layered);

    assert_eq!(
        layered.inner().null_device().journal(),
        plain.null_device().journal()
    );
    let buffer = match &plain.null_device().journal()[0] {
        Call::CreateResource { handle, .. } => *handle,
        other => panic!("unexpected first call {other:?}"),
    };
    assert!(plain.null_device().buffer_contents(buffer).is_none());
}

#[test]
fn layer_records_one_event_per_call() {
    let recorder = Arc::new(Recorder::new(DeviceApi::Vulkan, Vec::new()).unwrap());
    {
        let mut layered =
            CaptureLayer::new(HeadlessApplication::new(DeviceApi::Vulkan, 2), recorder.clone());
        draw_frame(&mut layered);
    }
    let recorder = Arc::try_unwrap(recorder).ok().unwrap();
    let tags: Vec<EventTag> = decode(recorder.into_writer())
        .iter()
        .map(Event::tag)
        .collect();
    assert_eq!(
        tags,
        [
            EventTag::InitSwapchain,
            EventTag::InitResource,
            EventTag::MapBufferRegion,
            EventTag::UnmapBufferRegion,
            EventTag::BindVertexBuffers,
            EventTag::Draw,
            EventTag::Present,
            EventTag::DestroyResource,
            EventTag::DestroySwapchain,
        ]
    );
}

#[test]
fn unmap_captures_bytes_written_through_the_mapping() {
    let recorder = Arc::new(Recorder::new(DeviceApi::D3D12, Vec::new()).unwrap());
    {
        let mut layered =
            CaptureLayer::new(HeadlessApplication::new(DeviceApi::D3D12, 1), recorder.clone());
        draw_frame(&mut layered);
    }
    let recorder = Arc::try_unwrap(recorder).ok().unwrap();
    let events = decode(recorder.into_writer());
    let unmap = events
        .iter()
        .find_map(|e| match e {
            Event::UnmapBufferRegion { size, data, .. } => Some((*size, data.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(unmap, (16, vec![0xab; 16]));
}

#[test]
fn failed_creation_is_not_recorded() {
    let recorder = Arc::new(Recorder::new(DeviceApi::D3D11, Vec::new()).unwrap());
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 1);
    app.null_device_mut().set_fail_creation(true);
    let mut layered = CaptureLayer::new(app, recorder.clone());
    assert!(layered
        .device()
        .create_sampler(&SamplerDesc::linear_clamp())
        .is_err());
    assert_eq!(recorder.events_written(), 1);
}

#[test]
fn concurrent_hooks_produce_a_well_formed_stream() {
    let recorder = Arc::new(Recorder::new(DeviceApi::D3D12, Vec::new()).unwrap());
    let threads: Vec<_> = (0..4u64)
        .map(|t| {
            let recorder = recorder.clone();
            thread::spawn(move || {
                for i in 0..50u64 {
                    let data = vec![t as u8; (i % 7) as usize + 1];
                    recorder.on_update_buffer_region(&data, Resource(t + 1), i);
                    recorder.record(&Event::Draw {
                        vertex_count: i as u32,
                        instance_count: 1,
                        first_vertex: 0,
                        first_instance: t as u32,
                    });
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(recorder.events_written(), 400);

    let recorder = Arc::try_unwrap(recorder).ok().unwrap();
    let events = decode(recorder.into_writer());
    assert_eq!(events.len(), 400);
    for event in &events {
        if let Event::UpdateBufferRegion { resource, data, .. } = event {
            assert!(data.iter().all(|&b| u64::from(b) + 1 == resource.0));
        }
    }
}

#[test]
fn concurrent_maps_pair_with_their_unmaps() {
    let recorder = Arc::new(Recorder::new(DeviceApi::D3D11, Vec::new()).unwrap());
    let desc = ResourceDesc::texture(
        ResourceType::Texture2d,
        4,
        4,
        1,
        1,
        Format::R8_UNORM,
        ResourceUsage::SHADER_RESOURCE,
    );
    let threads: Vec<_> = (1..=4u64)
        .map(|t| {
            let recorder = recorder.clone();
            thread::spawn(move || {
                let mut bytes = vec![0u8; 32];
                let mut texels = vec![0u8; 16];
                for i in 0..25u8 {
                    let ptr = NonNull::new(bytes.as_mut_ptr()).unwrap();
                    recorder.on_map_buffer_region(Resource(t), 0, WHOLE_SIZE, MapAccess::WriteOnly, 32, ptr);
                    unsafe {
                        ptr.as_ptr().write_bytes(t as u8 ^ i, 32);
                        recorder.on_unmap_buffer_region(Resource(t));
                    }

                    let mapped = MappedSubresource {
                        data: NonNull::new(texels.as_mut_ptr()).unwrap(),
                        row_pitch: 4,
                        slice_pitch: 16,
                        len: 16,
                    };
                    let texture = Resource(t + 100);
                    recorder.on_map_texture_region(texture, 0, None, MapAccess::WriteOnly, &mapped);
                    recorder.on_map_texture_region(texture, 0, None, MapAccess::WriteOnly, &mapped);
                    unsafe {
                        mapped.data.as_ptr().write_bytes(i, 16);
                        recorder.on_unmap_texture_region(&desc, texture, 0);
                        recorder.on_unmap_texture_region(&desc, texture, 0);
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(recorder.pending_mappings(), 0);

    let recorder = Arc::try_unwrap(recorder).ok().unwrap();
    let events = decode(recorder.into_writer());
    assert_eq!(events.len(), 4 * 25 * 6);
    for t in 1..=4u64 {
        let buffer_maps = events
            .iter()
            .filter(|e| matches!(e, Event::MapBufferRegion { resource, .. } if resource.0 == t))
            .count();
        let buffer_unmaps: Vec<Vec<u8>> = events
            .iter()
            .filter_map(|e| match e {
                Event::UnmapBufferRegion { resource, data, .. } if resource.0 == t => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(buffer_maps, 25);
        let expected: Vec<Vec<u8>> = (0..25u8).map(|i| vec![t as u8 ^ i; 32]).collect();
        assert_eq!(buffer_unmaps, expected);

        let texture_unmaps: Vec<Vec<u8>> = events
            .iter()
            .filter_map(|e| match e {
                Event::UnmapTextureRegion {
                    resource,
                    texels: Some(texels),
                    ..
                } if resource.0 == t + 100 => Some(texels.data.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<Vec<u8>> = (0..25u8).flat_map(|i| [vec![i; 16], vec![i; 16]]).collect();
        assert_eq!(texture_unmaps, expected);
    }
}

#[test]
fn session_traces_decode_with_their_backend_tag() {
    let dir = tempfile::tempdir().unwrap();
    let session = CaptureSession::new(dir.path(), "api_trace_log");
    let recorder = session.attach(DeviceApi::OpenGL).unwrap();
    recorder.on_present();
    drop(recorder);

    let reader = TraceReader::open(&dir.path().join("api_trace_log.bin")).unwrap();
    assert_eq!(reader.api(), DeviceApi::OpenGL);
    let events: Vec<Event> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(events, vec![Event::Present]);
}
