// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::*;
use gfxtrace_render_null::{Call, HeadlessApplication};
use gfxtrace_replay::{FrameEnd, ReplayError, Replayer};
use gfxtrace_stream::{Event, EventTag, MappedTexels, StreamError, SubresourcePayload, TraceWriter};
use std::io::Cursor;

fn trace(api: DeviceApi, events: &[Event]) -> Vec<u8> {
    let mut w = TraceWriter::new(Vec::new());
    w.write_header(api).unwrap();
    for event in events {
        w.write_event(event).unwrap();
    }
    w.into_inner()
}

fn replayer(bytes: Vec<u8>) -> Replayer<Cursor<Vec<u8>>> {
    Replayer::from_reader(Cursor::new(bytes)).unwrap()
}

fn buffer_init(origin: u64, size: u64, byte: u8) -> Event {
    Event::InitResource {
        desc: ResourceDesc::buffer(size, MemoryHeap::CPU_TO_GPU, ResourceUsage::VERTEX_BUFFER),
        initial_state: ResourceUsage::VERTEX_BUFFER,
        handle: Resource(origin),
        initial_data: vec![SubresourcePayload {
            data: vec![byte; size as usize],
            ..Default::default()
        }],
    }
}

fn created(journal: &[Call]) -> Vec<Resource> {
    journal
        .iter()
        .filter_map(|c| match c {
            Call::CreateResource { handle, .. } => Some(*handle),
            _ => None,
        })
        .collect()
}

#[test]
fn create_destroy_present_is_one_frame() {
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            buffer_init(0xa0, 64, 0x5a),
            Event::DestroyResource {
                handle: Resource(0xa0),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    let mut replayer = replayer(bytes);

    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::Presented);
    let journal = app.null_device().journal();
    assert_eq!(journal.len(), 2);
    let Call::CreateResource {
        desc,
        initial_data,
        handle,
        ..
    } = &journal[0]
    else {
        panic!("expected create_resource, got {:?}", journal[0]);
    };
    assert_eq!(desc.buffer.size, 64);
    assert_eq!(initial_data, &vec![vec![0x5a; 64]]);
    assert_eq!(journal[1], Call::DestroyResource(*handle));

    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::EndOfStream);
    assert!(replayer.is_finished());
    assert_eq!(replayer.stats().frames, 1);
    assert_eq!(replayer.stats().events, 3);
}

#[test]
fn map_and_unmap_collapse_into_one_write() {
    let payload: Vec<u8> = (0..16).collect();
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            buffer_init(0xa0, 32, 0),
            Event::MapBufferRegion {
                resource: Resource(0xa0),
                offset: 8,
                size: 16,
                access: MapAccess::WriteDiscard,
            },
            Event::UnmapBufferRegion {
                resource: Resource(0xa0),
                offset: 8,
                size: 16,
                access: MapAccess::WriteDiscard,
                data: payload.clone(),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    replayer(bytes).play_frame(&mut app).unwrap();

    let dev = app.null_device();
    let live = created(dev.journal())[0];
    assert_eq!(
        &dev.journal()[1..],
        &[
            Call::MapBufferRegion {
                resource: live,
                offset: 8,
                size: 16,
                access: MapAccess::WriteDiscard,
            },
            Call::UnmapBufferRegion(live),
        ]
    );
    let contents = dev.buffer_contents(live).unwrap();
    assert_eq!(&contents[8..24], &payload[..]);
    assert!(contents[..8].iter().chain(&contents[24..]).all(|&b| b == 0));
}

#[test]
fn read_only_unmap_touches_nothing() {
    let bytes = trace(
        DeviceApi::D3D12,
        &[
            buffer_init(0xa0, 8, 1),
            Event::MapBufferRegion {
                resource: Resource(0xa0),
                offset: 0,
                size: 8,
                access: MapAccess::ReadOnly,
            },
            Event::UnmapBufferRegion {
                resource: Resource(0xa0),
                offset: 0,
                size: 8,
                access: MapAccess::ReadOnly,
                data: Vec::new(),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D12, 2);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();
    assert_eq!(app.null_device().journal().len(), 1);
    assert_eq!(replayer.stats().skipped, 2);
}

#[test]
fn texture_unmap_is_repitched() {
    let desc = ResourceDesc::texture(
        ResourceType::Texture2d,
        2,
        2,
        1,
        1,
        Format::R8G8B8A8_UNORM,
        ResourceUsage::SHADER_RESOURCE,
    );
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            Event::InitResource {
                desc,
                initial_state: ResourceUsage::SHADER_RESOURCE,
                handle: Resource(0xb0),
                initial_data: Vec::new(),
            },
            Event::UnmapTextureRegion {
                resource: Resource(0xb0),
                subresource: 0,
                region: None,
                access: MapAccess::WriteOnly,
                // 8 texel bytes per row padded to 16
                texels: Some(MappedTexels {
                    row_pitch: 16,
                    slice_pitch: 32,
                    data: [[1u8; 8], [0; 8], [2; 8], [0; 8]].concat(),
                }),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 1);
    replayer(bytes).play_frame(&mut app).unwrap();
    let dev = app.null_device();
    let live = created(dev.journal())[0];
    assert_eq!(
        dev.subresource_contents(live, 0).unwrap(),
        &[[1u8; 8], [2; 8]].concat()[..]
    );
}

fn small_texture_trace(texels: MappedTexels) -> Vec<u8> {
    let desc = ResourceDesc::texture(
        ResourceType::Texture2d,
        2,
        2,
        1,
        1,
        Format::R8_UNORM,
        ResourceUsage::SHADER_RESOURCE,
    );
    trace(
        DeviceApi::D3D11,
        &[
            Event::InitResource {
                desc,
                initial_state: ResourceUsage::SHADER_RESOURCE,
                handle: Resource(0xb0),
                initial_data: Vec::new(),
            },
            Event::UnmapTextureRegion {
                resource: Resource(0xb0),
                subresource: 0,
                region: None,
                access: MapAccess::WriteOnly,
                texels: Some(texels),
            },
            Event::Present,
        ],
    )
}

#[test]
fn texture_unmap_larger_than_the_live_subresource_is_skipped() {
    let bytes = small_texture_trace(MappedTexels {
        row_pitch: 0,
        slice_pitch: 0,
        data: vec![0xee; 64 * 1024],
    });
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 1);
    let mut replayer = replayer(bytes);
    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::Presented);
    assert_eq!(replayer.stats().skipped, 1);

    let dev = app.null_device();
    let live = created(dev.journal())[0];
    assert_eq!(dev.subresource_contents(live, 0), Some(&[0u8; 4][..]));
    assert!(dev
        .journal()
        .iter()
        .any(|c| matches!(c, Call::UnmapTextureRegion { resource, .. } if *resource == live)));
}

#[test]
fn refused_texture_map_becomes_an_update() {
    let bytes = small_texture_trace(MappedTexels {
        row_pitch: 2,
        slice_pitch: 4,
        data: vec![1, 2, 3, 4],
    });
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 1);
    app.null_device_mut().set_refuse_texture_maps(true);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();
    assert_eq!(replayer.stats().failures, 0);

    let dev = app.null_device();
    let live = created(dev.journal())[0];
    let names: Vec<_> = dev.journal().iter().map(Call::name).collect();
    assert_eq!(
        names,
        ["create_resource", "map_texture_region", "update_texture_region"]
    );
    assert_eq!(dev.subresource_contents(live, 0), Some(&[1u8, 2, 3, 4][..]));
}

#[test]
fn commands_the_backend_drops_count_as_skipped() {
    let bytes = trace(
        DeviceApi::Vulkan,
        &[
            Event::PushConstants {
                stages: ShaderStage::VERTEX,
                layout: PipelineLayout::NULL,
                param: 0,
                first: 0,
                values: vec![1, 2, 3],
            },
            Event::Draw {
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::Vulkan, 1);
    app.null_device_mut()
        .set_unsupported_commands(&[EventTag::PushConstants]);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();
    assert_eq!(replayer.stats().skipped, 1);
    assert_eq!(app.null_device().call_counts().get("Draw"), Some(&1));
    assert_eq!(app.null_device().call_counts().get("PushConstants"), None);
}

#[test]
fn pipeline_subobjects_arrive_intact() {
    let code: Vec<u8> = (0..=255).collect();
    let blend = BlendDesc {
        alpha_to_coverage_enable: 1,
        ..BlendDesc::default()
    };
    let subobjects = vec![
        PipelineSubobject::VertexShader(ShaderDesc {
            code,
            entry_point: Some("main".into()),
        }),
        PipelineSubobject::BlendState(blend),
    ];
    let bytes = trace(
        DeviceApi::Vulkan,
        &[
            Event::InitPipeline {
                layout: PipelineLayout::NULL,
                subobjects: subobjects.clone(),
                handle: Pipeline(0xc0),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::Vulkan, 2);
    replayer(bytes).play_frame(&mut app).unwrap();
    let journal = app.null_device().journal();
    assert_eq!(journal.len(), 1);
    let Call::CreatePipeline {
        layout,
        subobjects: live,
        ..
    } = &journal[0]
    else {
        panic!("expected create_pipeline");
    };
    assert_eq!(*layout, PipelineLayout::NULL);
    assert_eq!(live, &subobjects);
}

#[test]
fn handles_resolve_between_create_and_destroy() {
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            Event::InitSampler {
                desc: SamplerDesc::linear_clamp(),
                handle: Sampler(0x50),
            },
            Event::Present,
            Event::DestroySampler {
                handle: Sampler(0x50),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    let mut replayer = replayer(bytes);

    replayer.play_frame(&mut app).unwrap();
    let live = replayer.registry().samplers.get(Sampler(0x50));
    assert!(!live.is_null());
    assert_eq!(app.null_device().live_objects(), 3);

    replayer.play_frame(&mut app).unwrap();
    assert!(replayer.registry().samplers.get(Sampler(0x50)).is_null());
    assert_eq!(
        app.null_device().journal().last(),
        Some(&Call::DestroySampler(live))
    );
}

#[test]
fn reused_origin_replaces_the_stale_object() {
    let bytes = trace(
        DeviceApi::D3D11,
        &[buffer_init(0xa0, 4, 1), buffer_init(0xa0, 4, 2), Event::Present],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    replayer(bytes).play_frame(&mut app).unwrap();
    let journal = app.null_device().journal();
    let first = created(journal)[0];
    assert_eq!(journal[1], Call::DestroyResource(first));
    assert!(matches!(journal[2], Call::CreateResource { .. }));
}

#[test]
fn descriptor_updates_are_remapped() {
    let bytes = trace(
        DeviceApi::D3D12,
        &[
            buffer_init(0xa0, 256, 0),
            Event::InitPipelineLayout {
                params: vec![PipelineLayoutParam::DescriptorTable(vec![DescriptorRange {
                    ty: DescriptorType::ConstantBuffer,
                    ..Default::default()
                }])],
                handle: PipelineLayout(0xb0),
            },
            Event::AllocateDescriptorTables {
                layout: PipelineLayout(0xb0),
                param: 0,
                tables: vec![DescriptorTable(0xd0)],
            },
            Event::UpdateDescriptorTables {
                updates: vec![DescriptorTableUpdate {
                    table: DescriptorTable(0xd0),
                    binding: 0,
                    array_offset: 0,
                    descriptors: Descriptors::ConstantBuffers(vec![BufferRange {
                        buffer: Resource(0xa0),
                        offset: 64,
                        size: 128,
                    }]),
                }],
            },
            Event::FreeDescriptorTables {
                tables: vec![DescriptorTable(0xd0)],
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D12, 2);
    replayer(bytes).play_frame(&mut app).unwrap();
    let journal = app.null_device().journal();
    let buffer = created(journal)[0];
    let Call::AllocateDescriptorTables { tables, .. } = &journal[2] else {
        panic!("expected allocation");
    };
    let table = tables[0];
    assert_eq!(
        journal[3],
        Call::UpdateDescriptorTables(vec![DescriptorTableUpdate {
            table,
            binding: 0,
            array_offset: 0,
            descriptors: Descriptors::ConstantBuffers(vec![BufferRange {
                buffer,
                offset: 64,
                size: 128,
            }]),
        }])
    );
    assert_eq!(journal[4], Call::FreeDescriptorTables(vec![table]));
}

#[test]
fn swapchain_back_buffers_are_borrowed() {
    let origins = [Resource(0x100), Resource(0x101), Resource(0x102)];
    let bytes = trace(
        DeviceApi::D3D9,
        &[
            Event::InitSwapchain {
                back_buffers: origins.to_vec(),
            },
            Event::DestroyResource { handle: origins[1] },
            Event::ClearRenderTargetView {
                rtv: ResourceView(0x101),
                color: [0.0; 4],
                rects: Vec::new(),
            },
            Event::Present,
            Event::DestroySwapchain {
                back_buffers: origins.to_vec(),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D9, 2);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();

    let r = replayer.registry();
    assert_eq!(r.resources.get(origins[0]), app.back_buffer(0));
    assert_eq!(r.resources.get(origins[1]), app.back_buffer(1));
    // more origin back buffers than live ones fall back to the first
    assert_eq!(r.resources.get(origins[2]), app.back_buffer(0));
    assert_eq!(
        app.null_device().journal(),
        &[Call::Command(Event::ClearRenderTargetView {
            rtv: ResourceView(app.back_buffer(1).0),
            color: [0.0; 4],
            rects: Vec::new(),
        })]
    );

    replayer.play_frame(&mut app).unwrap();
    assert!(replayer.registry().resources.is_empty());
    assert!(replayer.registry().views.is_empty());
}

#[test]
fn opengl_default_framebuffer_maps_to_itself() {
    let fb = Resource(gl_handle(GL_FRAMEBUFFER_DEFAULT, GL_BACK as u32));
    let bytes = trace(
        DeviceApi::OpenGL,
        &[
            Event::InitResource {
                desc: ResourceDesc::texture(
                    ResourceType::Surface,
                    64,
                    64,
                    1,
                    1,
                    Format::R8G8B8A8_UNORM,
                    ResourceUsage::RENDER_TARGET,
                ),
                initial_state: ResourceUsage::RENDER_TARGET,
                handle: fb,
                initial_data: Vec::new(),
            },
            Event::InitResource {
                desc: ResourceDesc::texture(
                    ResourceType::Texture2d,
                    16,
                    16,
                    1,
                    0,
                    Format::R8G8B8A8_UNORM,
                    ResourceUsage::SHADER_RESOURCE,
                ),
                initial_state: ResourceUsage::SHADER_RESOURCE,
                handle: Resource(gl_handle(0x0de1, 7)),
                initial_data: Vec::new(),
            },
            Event::DestroyResource { handle: fb },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::OpenGL, 2);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();

    assert_eq!(replayer.registry().resources.get(fb), fb);
    let journal = app.null_device().journal();
    assert_eq!(journal.len(), 1);
    let Call::CreateResource { desc, .. } = &journal[0] else {
        panic!("expected create_resource");
    };
    assert_eq!(desc.texture.levels, 1);
}

#[test]
fn failed_creation_degrades_later_references() {
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            buffer_init(0xa0, 16, 0),
            Event::UnmapBufferRegion {
                resource: Resource(0xa0),
                offset: 0,
                size: 4,
                access: MapAccess::WriteDiscard,
                data: vec![1; 4],
            },
            Event::UpdateBufferRegion {
                resource: Resource(0xa0),
                offset: 0,
                data: vec![2; 4],
            },
            Event::BindIndexBuffer {
                buffer: Resource(0xa0),
                offset: 0,
                index_size: 2,
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    app.null_device_mut().set_fail_creation(true);
    let mut replayer = replayer(bytes);
    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::Presented);

    let stats = replayer.stats();
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(
        app.null_device().journal(),
        &[Call::Command(Event::BindIndexBuffer {
            buffer: Resource::NULL,
            offset: 0,
            index_size: 2,
        })]
    );
}

#[test]
#[should_panic(expected = "create_resource failed")]
fn strict_mode_panics_on_native_failure() {
    let bytes = trace(DeviceApi::D3D11, &[buffer_init(0xa0, 16, 0), Event::Present]);
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    app.null_device_mut().set_fail_creation(true);
    let mut replayer = replayer(bytes).with_strict(true);
    let _ = replayer.play_frame(&mut app);
}

#[test]
fn step_brackets_the_frame_and_presents() {
    let bytes = trace(
        DeviceApi::D3D12,
        &[
            Event::Draw {
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D12, 2);
    let back_buffer = app.current_back_buffer();
    let mut replayer = replayer(bytes);
    assert_eq!(replayer.step(&mut app).unwrap(), FrameEnd::Presented);

    let barrier = |old_state, new_state| {
        Call::Command(Event::Barrier {
            barriers: vec![Barrier {
                resource: back_buffer,
                old_state,
                new_state,
            }],
        })
    };
    assert_eq!(
        app.null_device().journal(),
        &[
            barrier(ResourceUsage::PRESENT, ResourceUsage::RENDER_TARGET),
            Call::Command(Event::Draw {
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            }),
            barrier(ResourceUsage::RENDER_TARGET, ResourceUsage::PRESENT),
            Call::UpdateEffects,
            Call::Present { back_buffer },
        ]
    );

    // an exhausted trace keeps presenting
    assert_eq!(replayer.step(&mut app).unwrap(), FrameEnd::EndOfStream);
    assert_eq!(app.presents(), 2);
}

#[test]
fn truncated_stream_stops_playback() {
    let mut bytes = trace(
        DeviceApi::D3D11,
        &[buffer_init(0xa0, 8, 3), Event::Present, buffer_init(0xa1, 8, 4)],
    );
    bytes.truncate(bytes.len() - 3);
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 2);
    let mut replayer = replayer(bytes);

    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::Presented);
    assert!(matches!(
        replayer.play_frame(&mut app),
        Err(ReplayError::Stream(StreamError::Truncated))
    ));
    assert!(replayer.is_finished());
    assert_eq!(replayer.play_frame(&mut app).unwrap(), FrameEnd::EndOfStream);
    assert_eq!(created(app.null_device().journal()).len(), 1);
}

#[test]
fn bad_header_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bogus.bin");
    std::fs::write(&path, b"NOTATRACE___").unwrap();
    assert!(matches!(
        Replayer::open(&path),
        Err(ReplayError::Open {
            source: StreamError::BadMagic(_),
            ..
        })
    ));
    assert!(matches!(
        Replayer::open(&dir.path().join("missing.bin")),
        Err(ReplayError::Open {
            source: StreamError::Io(_),
            ..
        })
    ));
}

#[test]
fn release_destroys_only_owned_objects() {
    let bytes = trace(
        DeviceApi::D3D11,
        &[
            Event::InitSwapchain {
                back_buffers: vec![Resource(0x100)],
            },
            buffer_init(0xa0, 8, 0),
            Event::InitSampler {
                desc: SamplerDesc::default(),
                handle: Sampler(0x50),
            },
            Event::Present,
        ],
    );
    let mut app = HeadlessApplication::new(DeviceApi::D3D11, 1);
    let mut replayer = replayer(bytes);
    replayer.play_frame(&mut app).unwrap();
    assert_eq!(app.null_device().live_objects(), 3);

    replayer.release(&mut app);
    assert_eq!(app.null_device().live_objects(), 1);
    assert!(replayer.registry().is_empty());
}

#[test]
fn replaying_twice_issues_the_same_calls() {
    let bytes = trace(
        DeviceApi::Vulkan,
        &[
            Event::InitSwapchain {
                back_buffers: vec![Resource(0x100), Resource(0x101)],
            },
            buffer_init(0xa0, 32, 7),
            Event::InitResourceView {
                resource: Resource(0xa0),
                usage_type: ResourceUsage::SHADER_RESOURCE,
                desc: ResourceViewDesc::default(),
                handle: ResourceView(0xe0),
            },
            Event::UpdateBufferRegion {
                resource: Resource(0xa0),
                offset: 4,
                data: vec![9; 8],
            },
            Event::BindVertexBuffers {
                first: 0,
                bindings: vec![VertexBufferBinding {
                    buffer: Resource(0xa0),
                    offset: 0,
                    stride: 8,
                }],
            },
            Event::Draw {
                vertex_count: 4,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            },
            Event::Present,
            Event::DestroyResourceView {
                handle: ResourceView(0xe0),
            },
            Event::CopyResource {
                src: Resource(0xa0),
                dst: Resource(0x101),
            },
            Event::Present,
        ],
    );

    let run = || {
        let mut app = HeadlessApplication::new(DeviceApi::Vulkan, 2);
        let mut replayer = replayer(bytes.clone());
        while replayer.step(&mut app).unwrap() == FrameEnd::Presented {}
        app.null_device_mut().take_journal()
    };
    let first = run();
    assert!(first.len() > 10);
    assert_eq!(first, run());
}
