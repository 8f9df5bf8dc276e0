// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::*;
use gfxtrace_stream::*;

fn texture_2d(width: u32, height: u32, levels: u16) -> ResourceDesc {
    ResourceDesc::texture(
        ResourceType::Texture2d,
        width,
        height,
        1,
        levels,
        Format::R8G8B8A8_UNORM,
        ResourceUsage::SHADER_RESOURCE | ResourceUsage::COPY_DEST,
    )
}

fn sample_events() -> Vec<Event> {
    let desc = texture_2d(8, 4, 2);
    let level0 = calc_texture_size(&desc, 0, 32, 128, None) as usize;
    let level1 = calc_texture_size(&desc, 1, 16, 32, None) as usize;

    vec![
        Event::InitSwapchain {
            back_buffers: vec![Resource(0x100), Resource(0x101)],
        },
        Event::InitResource {
            desc: ResourceDesc::buffer(64, MemoryHeap::CPU_TO_GPU, ResourceUsage::VERTEX_BUFFER),
            initial_state: ResourceUsage::VERTEX_BUFFER,
            handle: Resource(0xa0),
            initial_data: vec![SubresourcePayload {
                data: (0..64).collect(),
                ..Default::default()
            }],
        },
        Event::InitResource {
            desc,
            initial_state: ResourceUsage::SHADER_RESOURCE,
            handle: Resource(0xa1),
            initial_data: vec![
                SubresourcePayload {
                    row_pitch: 32,
                    slice_pitch: 128,
                    data: vec![0x11; level0],
                },
                SubresourcePayload {
                    row_pitch: 16,
                    slice_pitch: 32,
                    data: vec![0x22; level1],
                },
            ],
        },
        Event::InitPipelineLayout {
            params: vec![
                PipelineLayoutParam::PushConstants(ConstantRange {
                    count: 4,
                    visibility: ShaderStage::VERTEX,
                    ..Default::default()
                }),
                PipelineLayoutParam::DescriptorTableWithStaticSamplers(vec![
                    DescriptorRangeWithStaticSamplers {
                        range: DescriptorRange {
                            ty: DescriptorType::Sampler,
                            ..Default::default()
                        },
                        static_samplers: vec![SamplerDesc::linear_clamp(); 2],
                    },
                ]),
            ],
            handle: PipelineLayout(0xb0),
        },
        Event::InitPipeline {
            layout: PipelineLayout(0xb0),
            subobjects: vec![
                PipelineSubobject::VertexShader(ShaderDesc {
                    code: vec![0x44, 0x58, 0x42, 0x43, 1, 2, 3],
                    entry_point: Some("main".into()),
                }),
                PipelineSubobject::PixelShader(ShaderDesc {
                    code: vec![9; 16],
                    entry_point: None,
                }),
                PipelineSubobject::InputLayout(vec![InputElement {
                    location: 0,
                    semantic: Some("POSITION".into()),
                    format: Format::R32G32B32_FLOAT,
                    stride: 12,
                    ..Default::default()
                }]),
                PipelineSubobject::BlendState(BlendDesc::default()),
                PipelineSubobject::StreamOutputState,
                PipelineSubobject::RenderTargetFormats(vec![Format::B8G8R8A8_UNORM]),
                PipelineSubobject::DynamicPipelineStates(vec![DynamicState::BLEND_CONSTANT]),
                PipelineSubobject::SampleMask(u32::MAX),
            ],
            handle: Pipeline(0xc0),
        },
        Event::AllocateDescriptorTables {
            layout: PipelineLayout(0xb0),
            param: 1,
            tables: vec![DescriptorTable(0xd0), DescriptorTable(0xd1)],
        },
        Event::UpdateDescriptorTables {
            updates: vec![
                DescriptorTableUpdate {
                    table: DescriptorTable(0xd0),
                    binding: 0,
                    array_offset: 0,
                    descriptors: Descriptors::SamplersWithResourceViews(vec![
                        SamplerWithResourceView {
                            sampler: Sampler(1),
                            view: ResourceView(2),
                        };
                        3
                    ]),
                },
                DescriptorTableUpdate {
                    table: DescriptorTable(0xd1),
                    binding: 2,
                    array_offset: 1,
                    descriptors: Descriptors::ConstantBuffers(vec![BufferRange {
                        buffer: Resource(0xa0),
                        offset: 0,
                        size: 64,
                    }]),
                },
            ],
        },
        Event::MapBufferRegion {
            resource: Resource(0xa0),
            offset: 16,
            size: 16,
            access: MapAccess::WriteOnly,
        },
        Event::UnmapBufferRegion {
            resource: Resource(0xa0),
            offset: 16,
            size: 16,
            access: MapAccess::WriteOnly,
            data: vec![0xee; 16],
        },
        Event::UnmapTextureRegion {
            resource: Resource(0xa1),
            subresource: 1,
            region: None,
            access: MapAccess::WriteDiscard,
            texels: Some(MappedTexels {
                row_pitch: 16,
                slice_pitch: 32,
                data: vec![0x33; level1],
            }),
        },
        Event::BeginRenderPass {
            render_targets: vec![RenderPassRenderTargetDesc {
                view: ResourceView(0x100),
                load_op: RenderPassLoadOp::CLEAR,
                store_op: RenderPassStoreOp::STORE,
                clear_color: [0.0, 0.25, 0.5, 1.0],
            }],
            depth_stencil: Some(RenderPassDepthStencilDesc {
                view: ResourceView(0x200),
                clear_depth: 1.0,
                clear_stencil: 0x7f,
                ..Default::default()
            }),
        },
        Event::BindVertexBuffers {
            first: 0,
            bindings: vec![VertexBufferBinding {
                buffer: Resource(0xa0),
                offset: 0,
                stride: 12,
            }],
        },
        Event::BindPipelineStates {
            states: vec![(DynamicState::BLEND_CONSTANT, 0xffff_ffff)],
        },
        Event::DrawIndexed {
            index_count: 36,
            instance_count: 1,
            first_index: 0,
            vertex_offset: -4,
            first_instance: 0,
        },
        Event::CopyTextureRegion {
            src: TextureRegion {
                resource: Resource(0xa1),
                subresource: 0,
                region: Some(SubresourceBox {
                    right: 4,
                    bottom: 4,
                    back: 1,
                    ..Default::default()
                }),
            },
            dst: TextureRegion {
                resource: Resource(0x100),
                subresource: 0,
                region: None,
            },
            filter: FilterMode::MIN_MAG_MIP_POINT,
        },
        Event::ClearDepthStencilView {
            dsv: ResourceView(0x200),
            depth: Some(1.0),
            stencil: None,
            rects: vec![Rect {
                left: 0,
                top: 0,
                right: 8,
                bottom: 8,
            }],
        },
        Event::EndRenderPass,
        Event::Present,
    ]
}

#[test]
fn events_survive_a_trip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.bin");
    let events = sample_events();

    let mut writer = TraceWriter::create(&path, DeviceApi::D3D12).unwrap();
    for event in &events {
        writer.write_event(event).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    let reader = TraceReader::open(&path).unwrap();
    assert_eq!(reader.api(), DeviceApi::D3D12);
    let decoded: Vec<Event> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(decoded, events);
}

#[test]
fn recorded_texture_sizes_match_recomputation() {
    for event in sample_events() {
        if let Event::InitResource {
            desc, initial_data, ..
        } = event
        {
            if !desc.is_texture() {
                continue;
            }
            for (i, payload) in initial_data.iter().enumerate() {
                let expected =
                    calc_texture_size(&desc, i as u32, payload.row_pitch, payload.slice_pitch, None);
                assert_eq!(payload.data.len() as u64, expected);
            }
        }
    }
}

#[test]
fn truncation_inside_an_event_is_reported() {
    let mut writer = TraceWriter::new(Vec::new());
    writer.write_header(DeviceApi::D3D11).unwrap();
    writer
        .write_event(&Event::UpdateBufferRegion {
            resource: Resource(1),
            offset: 0,
            data: vec![5; 32],
        })
        .unwrap();
    let mut bytes = writer.into_inner();
    bytes.truncate(bytes.len() - 1);

    let mut reader = TraceReader::new(std::io::Cursor::new(bytes)).unwrap();
    assert!(matches!(reader.next_event(), Err(StreamError::Truncated)));
}
