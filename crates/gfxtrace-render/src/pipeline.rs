// SPDX-License-Identifier: CEPL-1.0
use crate::descriptor::{DescriptorRange, DescriptorRangeWithStaticSamplers};
use crate::format::Format;
use crate::sampler::CompareOp;
use crate::Bool32;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    pub struct ShaderStage: u32 {
        const VERTEX = 0x1;
        const HULL = 0x2;
        const DOMAIN = 0x4;
        const GEOMETRY = 0x8;
        const PIXEL = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1f;
        const ALL = 0x7fff_ffff;

        const _ = !0;
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    pub struct PipelineStage: u32 {
        const VERTEX_SHADER = 0x8;
        const HULL_SHADER = 0x10;
        const DOMAIN_SHADER = 0x20;
        const GEOMETRY_SHADER = 0x40;
        const PIXEL_SHADER = 0x80;
        const COMPUTE_SHADER = 0x800;
        const INPUT_ASSEMBLER = 0x2;
        const STREAM_OUTPUT = 0x4;
        const RASTERIZER = 0x100;
        const DEPTH_STENCIL = 0x200;
        const OUTPUT_MERGER = 0x400;
        const ALL = 0x7fff_ffff;

        const _ = !0;
    }
}

u32_enum!(BlendFactor {
    ZERO = 0,
    ONE = 1,
    SOURCE_COLOR = 2,
    ONE_MINUS_SOURCE_COLOR = 3,
    DEST_COLOR = 4,
    ONE_MINUS_DEST_COLOR = 5,
    SOURCE_ALPHA = 6,
    ONE_MINUS_SOURCE_ALPHA = 7,
    DEST_ALPHA = 8,
    ONE_MINUS_DEST_ALPHA = 9,
});

u32_enum!(BlendOp {
    ADD = 0,
    SUBTRACT = 1,
    REVERSE_SUBTRACT = 2,
    MIN = 3,
    MAX = 4,
});

u32_enum!(LogicOp {
    CLEAR = 0,
    AND = 1,
    COPY = 3,
    NOOP = 5,
    XOR = 6,
    OR = 7,
});

u32_enum!(FillMode {
    SOLID = 0,
    WIREFRAME = 1,
    POINT = 2,
});

u32_enum!(CullMode {
    NONE = 0,
    FRONT = 1,
    BACK = 2,
    FRONT_AND_BACK = 3,
});

u32_enum!(StencilOp {
    KEEP = 0,
    ZERO = 1,
    REPLACE = 2,
    INCREMENT_SATURATE = 3,
    DECREMENT_SATURATE = 4,
    INVERT = 5,
    INCREMENT = 6,
    DECREMENT = 7,
});

u32_enum!(PrimitiveTopology {
    UNDEFINED = 0,
    POINT_LIST = 1,
    LINE_LIST = 2,
    LINE_STRIP = 3,
    TRIANGLE_LIST = 4,
    TRIANGLE_STRIP = 5,
    TRIANGLE_FAN = 6,
});

u32_enum!(DynamicState {
    UNKNOWN = 0,
    ALPHA_TEST_ENABLE = 15,
    SRC_COLOR_BLEND_FACTOR = 19,
    BLEND_CONSTANT = 193,
    PRIMITIVE_TOPOLOGY = 1000,
    STENCIL_REFERENCE_VALUE = 57,
    DEPTH_BIAS = 195,
    FRONT_COUNTER_CLOCKWISE = 1001,
});

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BlendDesc {
    pub alpha_to_coverage_enable: Bool32,
    pub blend_enable: [Bool32; 8],
    pub logic_op_enable: [Bool32; 8],
    pub source_color_blend_factor: [BlendFactor; 8],
    pub dest_color_blend_factor: [BlendFactor; 8],
    pub color_blend_op: [BlendOp; 8],
    pub source_alpha_blend_factor: [BlendFactor; 8],
    pub dest_alpha_blend_factor: [BlendFactor; 8],
    pub alpha_blend_op: [BlendOp; 8],
    pub logic_op: [LogicOp; 8],
    pub blend_constant: [f32; 4],
    pub render_target_write_mask: [u8; 8],
}

impl Default for BlendDesc {
    fn default() -> Self {
        BlendDesc {
            alpha_to_coverage_enable: 0,
            blend_enable: [0; 8],
            logic_op_enable: [0; 8],
            source_color_blend_factor: [BlendFactor::ONE; 8],
            dest_color_blend_factor: [BlendFactor::ZERO; 8],
            color_blend_op: [BlendOp::ADD; 8],
            source_alpha_blend_factor: [BlendFactor::ONE; 8],
            dest_alpha_blend_factor: [BlendFactor::ZERO; 8],
            alpha_blend_op: [BlendOp::ADD; 8],
            logic_op: [LogicOp::NOOP; 8],
            blend_constant: [0.0; 4],
            render_target_write_mask: [0xf; 8],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: Bool32,
    pub depth_bias: f32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: Bool32,
    pub scissor_enable: Bool32,
    pub multisample_enable: Bool32,
    pub antialiased_line_enable: Bool32,
    pub conservative_rasterization: u32,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        RasterizerDesc {
            fill_mode: FillMode::SOLID,
            cull_mode: CullMode::BACK,
            front_counter_clockwise: 0,
            depth_bias: 0.0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: 1,
            scissor_enable: 0,
            multisample_enable: 0,
            antialiased_line_enable: 0,
            conservative_rasterization: 0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct StencilFaceDesc {
    pub read_mask: u32,
    pub write_mask: u32,
    pub reference_value: u32,
    pub func: CompareOp,
    pub pass_op: StencilOp,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        StencilFaceDesc {
            read_mask: 0xff,
            write_mask: 0xff,
            reference_value: 0,
            func: CompareOp::ALWAYS,
            pass_op: StencilOp::KEEP,
            fail_op: StencilOp::KEEP,
            depth_fail_op: StencilOp::KEEP,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DepthStencilDesc {
    pub depth_enable: Bool32,
    pub depth_write_mask: Bool32,
    pub depth_func: CompareOp,
    pub stencil_enable: Bool32,
    pub front: StencilFaceDesc,
    pub back: StencilFaceDesc,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        DepthStencilDesc {
            depth_enable: 1,
            depth_write_mask: 1,
            depth_func: CompareOp::LESS,
            stencil_enable: 0,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderDesc {
    pub code: Vec<u8>,
    pub entry_point: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputElement {
    pub location: u32,
    pub semantic: Option<String>,
    pub semantic_index: u32,
    pub format: Format,
    pub buffer_binding: u32,
    pub offset: u32,
    pub stride: u32,
    /// Zero for per-vertex data.
    pub instance_step_rate: u32,
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineSubobjectType {
    VertexShader = 1,
    HullShader = 2,
    DomainShader = 3,
    GeometryShader = 4,
    PixelShader = 5,
    ComputeShader = 6,
    InputLayout = 7,
    StreamOutputState = 8,
    BlendState = 9,
    RasterizerState = 10,
    DepthStencilState = 11,
    PrimitiveTopology = 12,
    DepthStencilFormat = 13,
    RenderTargetFormats = 14,
    SampleMask = 15,
    SampleCount = 16,
    ViewportCount = 17,
    DynamicPipelineStates = 18,
    MaxVertexCount = 19,
}

impl TryFrom<u32> for PipelineSubobjectType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        use PipelineSubobjectType::*;
        Ok(match value {
            1 => VertexShader,
            2 => HullShader,
            3 => DomainShader,
            4 => GeometryShader,
            5 => PixelShader,
            6 => ComputeShader,
            7 => InputLayout,
            8 => StreamOutputState,
            9 => BlendState,
            10 => RasterizerState,
            11 => DepthStencilState,
            12 => PrimitiveTopology,
            13 => DepthStencilFormat,
            14 => RenderTargetFormats,
            15 => SampleMask,
            16 => SampleCount,
            17 => ViewportCount,
            18 => DynamicPipelineStates,
            19 => MaxVertexCount,
            other => return Err(other),
        })
    }
}

/// One typed component of a pipeline creation call.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineSubobject {
    VertexShader(ShaderDesc),
    HullShader(ShaderDesc),
    DomainShader(ShaderDesc),
    GeometryShader(ShaderDesc),
    PixelShader(ShaderDesc),
    ComputeShader(ShaderDesc),
    InputLayout(Vec<InputElement>),
    /// Stream output declarations are not carried; only the presence of the block is.
    StreamOutputState,
    BlendState(BlendDesc),
    RasterizerState(RasterizerDesc),
    DepthStencilState(DepthStencilDesc),
    PrimitiveTopology(PrimitiveTopology),
    DepthStencilFormat(Format),
    RenderTargetFormats(Vec<Format>),
    SampleMask(u32),
    SampleCount(u32),
    ViewportCount(u32),
    DynamicPipelineStates(Vec<DynamicState>),
    MaxVertexCount(u32),
}

impl PipelineSubobject {
    pub fn ty(&self) -> PipelineSubobjectType {
        use PipelineSubobject as S;
        use PipelineSubobjectType as T;
        match self {
            S::VertexShader(_) => T::VertexShader,
            S::HullShader(_) => T::HullShader,
            S::DomainShader(_) => T::DomainShader,
            S::GeometryShader(_) => T::GeometryShader,
            S::PixelShader(_) => T::PixelShader,
            S::ComputeShader(_) => T::ComputeShader,
            S::InputLayout(_) => T::InputLayout,
            S::StreamOutputState => T::StreamOutputState,
            S::BlendState(_) => T::BlendState,
            S::RasterizerState(_) => T::RasterizerState,
            S::DepthStencilState(_) => T::DepthStencilState,
            S::PrimitiveTopology(_) => T::PrimitiveTopology,
            S::DepthStencilFormat(_) => T::DepthStencilFormat,
            S::RenderTargetFormats(_) => T::RenderTargetFormats,
            S::SampleMask(_) => T::SampleMask,
            S::SampleCount(_) => T::SampleCount,
            S::ViewportCount(_) => T::ViewportCount,
            S::DynamicPipelineStates(_) => T::DynamicPipelineStates,
            S::MaxVertexCount(_) => T::MaxVertexCount,
        }
    }

    /// Shader stage and code for the shader subobjects.
    pub fn shader(&self) -> Option<(ShaderStage, &ShaderDesc)> {
        match self {
            PipelineSubobject::VertexShader(d) => Some((ShaderStage::VERTEX, d)),
            PipelineSubobject::HullShader(d) => Some((ShaderStage::HULL, d)),
            PipelineSubobject::DomainShader(d) => Some((ShaderStage::DOMAIN, d)),
            PipelineSubobject::GeometryShader(d) => Some((ShaderStage::GEOMETRY, d)),
            PipelineSubobject::PixelShader(d) => Some((ShaderStage::PIXEL, d)),
            PipelineSubobject::ComputeShader(d) => Some((ShaderStage::COMPUTE, d)),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ConstantRange {
    pub offset: u32,
    pub binding: u32,
    pub dx_register_index: u32,
    pub dx_register_space: u32,
    pub count: u32,
    pub visibility: ShaderStage,
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineLayoutParamType {
    PushConstants = 1,
    PushDescriptors = 2,
    DescriptorTable = 3,
    PushDescriptorsWithRanges = 4,
    DescriptorTableWithStaticSamplers = 5,
    PushDescriptorsWithStaticSamplers = 6,
}

impl TryFrom<u32> for PipelineLayoutParamType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        use PipelineLayoutParamType::*;
        Ok(match value {
            1 => PushConstants,
            2 => PushDescriptors,
            3 => DescriptorTable,
            4 => PushDescriptorsWithRanges,
            5 => DescriptorTableWithStaticSamplers,
            6 => PushDescriptorsWithStaticSamplers,
            other => return Err(other),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineLayoutParam {
    PushConstants(ConstantRange),
    PushDescriptors(DescriptorRange),
    DescriptorTable(Vec<DescriptorRange>),
    PushDescriptorsWithRanges(Vec<DescriptorRange>),
    DescriptorTableWithStaticSamplers(Vec<DescriptorRangeWithStaticSamplers>),
    PushDescriptorsWithStaticSamplers(Vec<DescriptorRangeWithStaticSamplers>),
}

impl PipelineLayoutParam {
    pub fn ty(&self) -> PipelineLayoutParamType {
        match self {
            PipelineLayoutParam::PushConstants(_) => PipelineLayoutParamType::PushConstants,
            PipelineLayoutParam::PushDescriptors(_) => PipelineLayoutParamType::PushDescriptors,
            PipelineLayoutParam::DescriptorTable(_) => PipelineLayoutParamType::DescriptorTable,
            PipelineLayoutParam::PushDescriptorsWithRanges(_) => {
                PipelineLayoutParamType::PushDescriptorsWithRanges
            }
            PipelineLayoutParam::DescriptorTableWithStaticSamplers(_) => {
                PipelineLayoutParamType::DescriptorTableWithStaticSamplers
            }
            PipelineLayoutParam::PushDescriptorsWithStaticSamplers(_) => {
                PipelineLayoutParamType::PushDescriptorsWithStaticSamplers
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_descriptors_have_no_padding() {
        assert_eq!(std::mem::size_of::<BlendDesc>(), 4 + 8 * 4 * 9 + 16 + 8);
        assert_eq!(std::mem::size_of::<RasterizerDesc>(), 11 * 4);
        assert_eq!(std::mem::size_of::<DepthStencilDesc>(), 4 * 4 + 2 * 7 * 4);
        assert_eq!(std::mem::size_of::<ConstantRange>(), 24);
    }

    #[test]
    fn subobject_tags_match_variants() {
        let vs = PipelineSubobject::VertexShader(ShaderDesc::default());
        assert_eq!(vs.ty(), PipelineSubobjectType::VertexShader);
        assert_eq!(vs.shader().map(|(s, _)| s), Some(ShaderStage::VERTEX));
        assert!(PipelineSubobject::SampleMask(!0).shader().is_none());
        assert_eq!(
            PipelineSubobjectType::try_from(19),
            Ok(PipelineSubobjectType::MaxVertexCount)
        );
        assert_eq!(PipelineSubobjectType::try_from(0), Err(0));
    }
}
