// SPDX-License-Identifier: CEPL-1.0
use crate::convert;
use gfxtrace_render::*;
use glow::HasContext as _;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::ptr::NonNull;
use tracing::{debug, warn};

pub(crate) struct Program {
    pub program: glow::Program,
    pub topology: u32,
    pub input_layout: Vec<InputElement>,
}

/// Pipeline state latched by the command list until the next draw.
pub(crate) struct Bound {
    pub draw_framebuffer: Option<glow::Framebuffer>,
    pub topology: u32,
    pub input_layout: Vec<InputElement>,
    pub vertex_buffers: Vec<VertexBufferBinding>,
    /// Index type, index size and byte offset of the bound index buffer.
    pub index: Option<(u32, u32, u64)>,
}

/// Host copy of a mapped texture region, uploaded when it is unmapped.
struct Staged {
    level: u32,
    region: SubresourceBox,
    access: MapAccess,
    row_pitch: u32,
    bytes: Vec<u8>,
}

/// OpenGL implementation of the device and its immediate command list. Objects are named by
/// `gl_handle(target, name)`; the window back buffer is the default framebuffer.
pub struct GlDevice {
    pub(crate) gl: glow::Context,
    pub(crate) vao: glow::VertexArray,
    pub(crate) back_buffer: ResourceDesc,
    pub(crate) resources: HashMap<Resource, ResourceDesc>,
    pub(crate) programs: HashMap<Pipeline, Program>,
    pub(crate) layouts: HashMap<PipelineLayout, Vec<PipelineLayoutParam>>,
    next_layout: u64,
    pub(crate) bound: Bound,
    /// Uniform buffer and shadow copy per push-constant binding.
    pub(crate) push_constants: HashMap<u32, (glow::Buffer, Vec<u32>)>,
    staged: HashMap<(Resource, u32), Staged>,
    /// Read and draw framebuffers for blits and texture clears.
    scratch: Option<(glow::Framebuffer, glow::Framebuffer)>,
    unsupported: u64,
    warned: HashSet<&'static str>,
}

pub(crate) fn object_name(raw: u64) -> Option<NonZeroU32> {
    NonZeroU32::new(raw as u32)
}

pub(crate) fn object_target(raw: u64) -> u32 {
    (raw >> 40) as u32
}

pub(crate) fn default_back_buffer() -> Resource {
    Resource(gl_handle(GL_FRAMEBUFFER_DEFAULT, GL_BACK as u32))
}

fn native(e: String) -> DeviceError {
    DeviceError::Native(e)
}

fn gl_int(value: u64, what: &'static str) -> Result<i32, DeviceError> {
    i32::try_from(value).map_err(|_| DeviceError::Native(format!("{what} {value} out of range")))
}

pub(crate) fn compile_program(
    gl: &glow::Context,
    shaders: &[(u32, &ShaderDesc)],
) -> Result<glow::Program, DeviceError> {
    unsafe {
        let program = gl.create_program().map_err(native)?;
        let mut compiled = Vec::with_capacity(shaders.len());
        let mut failure = None;

        for &(ty, desc) in shaders {
            let source = match std::str::from_utf8(&desc.code) {
                Ok(s) => s,
                Err(_) => {
                    failure = Some("shader code is not GLSL text".to_owned());
                    break;
                }
            };
            let shader = match gl.create_shader(ty) {
                Ok(s) => s,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            compiled.push(shader);

            if !gl.get_shader_compile_status(shader) {
                failure = Some(format!(
                    "GL shader {ty:#x} compile: {}",
                    gl.get_shader_info_log(shader)
                ));
                break;
            }
            gl.attach_shader(program, shader);
        }

        if failure.is_none() {
            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                failure = Some(format!("GL link: {}", gl.get_program_info_log(program)));
            }
        }

        for shader in compiled {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        match failure {
            None => Ok(program),
            Some(e) => {
                gl.delete_program(program);
                Err(DeviceError::Native(e))
            }
        }
    }
}

impl GlDevice {
    pub(crate) fn new(gl: glow::Context, width: u32, height: u32) -> Result<Self, DeviceError> {
        let vao = unsafe { gl.create_vertex_array().map_err(native)? };
        unsafe {
            gl.bind_vertex_array(Some(vao));
        }

        Ok(GlDevice {
            gl,
            vao,
            back_buffer: Self::back_buffer_desc(width, height),
            resources: HashMap::new(),
            programs: HashMap::new(),
            layouts: HashMap::new(),
            next_layout: 0,
            bound: Bound {
                draw_framebuffer: None,
                topology: glow::TRIANGLES,
                input_layout: Vec::new(),
                vertex_buffers: Vec::new(),
                index: None,
            },
            push_constants: HashMap::new(),
            staged: HashMap::new(),
            scratch: None,
            unsupported: 0,
            warned: HashSet::new(),
        })
    }

    fn back_buffer_desc(width: u32, height: u32) -> ResourceDesc {
        ResourceDesc::texture(
            ResourceType::Surface,
            width,
            height,
            1,
            1,
            Format::R8G8B8A8_UNORM,
            ResourceUsage::PRESENT,
        )
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.back_buffer = Self::back_buffer_desc(width, height);
    }

    pub(crate) fn buffer(&self, resource: Resource) -> Option<glow::Buffer> {
        if object_target(resource.0) != glow::BUFFER {
            return None;
        }
        object_name(resource.0).map(glow::NativeBuffer)
    }

    /// Texture behind a resource or a shader resource view, which alias the same handle.
    pub(crate) fn texture(&self, raw: u64) -> Option<glow::Texture> {
        if object_target(raw) != glow::TEXTURE_2D {
            return None;
        }
        object_name(raw).map(glow::NativeTexture)
    }

    /// Draw framebuffer of a render target or depth-stencil view; `None` inside means the
    /// default framebuffer.
    pub(crate) fn framebuffer(&self, view: ResourceView) -> Option<Option<glow::Framebuffer>> {
        if is_gl_default_framebuffer(view.0) {
            return Some(None);
        }
        if object_target(view.0) != glow::FRAMEBUFFER {
            return None;
        }
        object_name(view.0).map(|n| Some(glow::NativeFramebuffer(n)))
    }

    fn create_buffer(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
    ) -> Result<Resource, DeviceError> {
        let size = gl_int(desc.buffer.size, "buffer size")?;
        let buffer = unsafe { self.gl.create_buffer().map_err(native)? };
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl.buffer_data_size(
                glow::COPY_WRITE_BUFFER,
                size,
                convert::buffer_usage(desc.heap),
            );
            if let Some(initial) = initial_data.first() {
                let n = initial.data.len().min(size as usize);
                self.gl
                    .buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, &initial.data[..n]);
            }
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(Resource(gl_handle(u64::from(glow::BUFFER), buffer.0.get())))
    }

    fn create_texture(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
    ) -> Result<Resource, DeviceError> {
        if !matches!(desc.ty, ResourceType::Texture2d | ResourceType::Surface) {
            return Err(DeviceError::Unsupported("1D and 3D textures"));
        }
        if desc.texture.depth_or_layers > 1 {
            return Err(DeviceError::Unsupported("texture arrays"));
        }
        if desc.texture.samples > 1 {
            return Err(DeviceError::Unsupported("multisampled textures"));
        }
        let texel = convert::texel_format(desc.texture.format)
            .ok_or(DeviceError::Unsupported("texture format"))?;
        let levels = i32::from(desc.texture.levels.max(1));
        let width = gl_int(u64::from(desc.texture.width), "texture width")?;
        let height = gl_int(u64::from(desc.texture.height), "texture height")?;

        let texture = unsafe { self.gl.create_texture().map_err(native)? };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .tex_storage_2d(glow::TEXTURE_2D, levels, texel.internal, width, height);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, levels - 1);
            for (level, data) in initial_data.iter().enumerate().take(levels as usize) {
                let region = convert::level_region(desc, level as u32);
                self.upload_texels(desc, level as u32, &region, data);
            }
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
        Ok(Resource(gl_handle(
            u64::from(glow::TEXTURE_2D),
            texture.0.get(),
        )))
    }

    /// Uploads one region of the texture bound to `TEXTURE_2D`.
    unsafe fn upload_texels(
        &self,
        desc: &ResourceDesc,
        level: u32,
        region: &SubresourceBox,
        data: &SubresourceData<'_>,
    ) {
        let Some(texel) = convert::texel_format(desc.texture.format) else {
            return;
        };
        let bpp = desc.texture.format.bytes_per_pixel();
        let row_bytes = region.width().saturating_mul(bpp);
        let row_pitch = if data.row_pitch == 0 {
            row_bytes
        } else {
            data.row_pitch
        };
        let needed = u64::from(row_pitch) * u64::from(region.height().saturating_sub(1))
            + u64::from(row_bytes);
        if (data.data.len() as u64) < needed {
            warn!(
                len = data.data.len(),
                needed, level, "texture data shorter than its region, upload skipped"
            );
            return;
        }

        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl
                .pixel_store_i32(glow::UNPACK_ROW_LENGTH, (row_pitch / bpp.max(1)) as i32);
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                level as i32,
                region.left as i32,
                region.top as i32,
                region.width() as i32,
                region.height() as i32,
                texel.format,
                texel.ty,
                glow::PixelUnpackData::Slice(Some(data.data)),
            );
            self.gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, 0);
        }
    }

    fn create_framebuffer(
        &mut self,
        texture: glow::Texture,
        level: u32,
        depth: bool,
        stencil: bool,
    ) -> Result<ResourceView, DeviceError> {
        let attachment = match (depth, stencil) {
            (true, true) => glow::DEPTH_STENCIL_ATTACHMENT,
            (true, false) => glow::DEPTH_ATTACHMENT,
            _ => glow::COLOR_ATTACHMENT0,
        };
        unsafe {
            let fbo = self.gl.create_framebuffer().map_err(native)?;
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(fbo));
            self.gl.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                Some(texture),
                level as i32,
            );
            let status = self.gl.check_framebuffer_status(glow::DRAW_FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                self.gl.delete_framebuffer(fbo);
                return Err(DeviceError::Native(format!(
                    "framebuffer incomplete: {status:#x}"
                )));
            }
            Ok(ResourceView(gl_handle(
                u64::from(glow::FRAMEBUFFER),
                fbo.0.get(),
            )))
        }
    }

    /// Counts a command that has no GL counterpart, warning the first time each kind shows up.
    pub(crate) fn unsupported(&mut self, what: &'static str) {
        self.unsupported += 1;
        if self.warned.insert(what) {
            warn!(what, "not expressible on OpenGL, dropping these commands");
        }
    }

    pub(crate) fn take_unsupported_count(&mut self) -> u64 {
        std::mem::take(&mut self.unsupported)
    }

    pub(crate) fn scratch_framebuffers(&mut self) -> Option<(glow::Framebuffer, glow::Framebuffer)> {
        if self.scratch.is_none() {
            let created = unsafe { (self.gl.create_framebuffer(), self.gl.create_framebuffer()) };
            match created {
                (Ok(read), Ok(draw)) => self.scratch = Some((read, draw)),
                (read, draw) => {
                    for fbo in [read, draw].into_iter().flatten() {
                        unsafe { self.gl.delete_framebuffer(fbo) };
                    }
                    warn!("scratch framebuffers unavailable");
                }
            }
        }
        self.scratch
    }

    fn buffer_size(&self, resource: Resource) -> u64 {
        self.resources
            .get(&resource)
            .map(|d| d.buffer.size)
            .unwrap_or(0)
    }
}

impl Device for GlDevice {
    fn api(&self) -> DeviceApi {
        DeviceApi::OpenGL
    }

    fn resource_desc(&self, resource: Resource) -> ResourceDesc {
        if is_gl_default_framebuffer(resource.0) {
            return self.back_buffer;
        }
        self.resources.get(&resource).copied().unwrap_or_default()
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Sampler, DeviceError> {
        let (min, mag) = convert::filter(desc.filter);
        unsafe {
            let sampler = self.gl.create_sampler().map_err(native)?;
            let gl = &self.gl;
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_MIN_FILTER, min as i32);
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_MAG_FILTER, mag as i32);
            gl.sampler_parameter_i32(
                sampler,
                glow::TEXTURE_WRAP_S,
                convert::address_mode(desc.address_u) as i32,
            );
            gl.sampler_parameter_i32(
                sampler,
                glow::TEXTURE_WRAP_T,
                convert::address_mode(desc.address_v) as i32,
            );
            gl.sampler_parameter_i32(
                sampler,
                glow::TEXTURE_WRAP_R,
                convert::address_mode(desc.address_w) as i32,
            );
            gl.sampler_parameter_f32(sampler, glow::TEXTURE_LOD_BIAS, desc.mip_lod_bias);
            gl.sampler_parameter_f32(sampler, glow::TEXTURE_MIN_LOD, desc.min_lod);
            gl.sampler_parameter_f32(sampler, glow::TEXTURE_MAX_LOD, desc.max_lod);
            gl.sampler_parameter_f32_slice(sampler, glow::TEXTURE_BORDER_COLOR, &desc.border_color);
            if convert::is_anisotropic(desc.filter) {
                gl.sampler_parameter_f32(
                    sampler,
                    glow::TEXTURE_MAX_ANISOTROPY,
                    desc.max_anisotropy.max(1.0),
                );
            }
            if convert::is_comparison(desc.filter) {
                gl.sampler_parameter_i32(
                    sampler,
                    glow::TEXTURE_COMPARE_MODE,
                    glow::COMPARE_REF_TO_TEXTURE as i32,
                );
                gl.sampler_parameter_i32(
                    sampler,
                    glow::TEXTURE_COMPARE_FUNC,
                    convert::compare_func(desc.compare_op) as i32,
                );
            }
            Ok(Sampler(gl_handle(u64::from(glow::SAMPLER), sampler.0.get())))
        }
    }

    fn destroy_sampler(&mut self, sampler: Sampler) {
        if let Some(name) = object_name(sampler.0) {
            unsafe { self.gl.delete_sampler(glow::NativeSampler(name)) };
        }
    }

    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_data: &[SubresourceData<'_>],
        _initial_state: ResourceUsage,
    ) -> Result<Resource, DeviceError> {
        let resource = match desc.ty {
            ResourceType::Buffer => self.create_buffer(desc, initial_data)?,
            ResourceType::Unknown => return Err(DeviceError::Unsupported("untyped resources")),
            _ => self.create_texture(desc, initial_data)?,
        };
        self.resources.insert(resource, *desc);
        Ok(resource)
    }

    fn destroy_resource(&mut self, resource: Resource) {
        if self.resources.remove(&resource).is_none() {
            return;
        }
        self.staged.retain(|(r, _), _| *r != resource);
        if let Some(buffer) = self.buffer(resource) {
            unsafe { self.gl.delete_buffer(buffer) };
        } else if let Some(texture) = self.texture(resource.0) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn create_resource_view(
        &mut self,
        resource: Resource,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceView, DeviceError> {
        if is_gl_default_framebuffer(resource.0) {
            return Ok(ResourceView(resource.0));
        }
        if desc.uses_buffer_range() {
            return Err(DeviceError::Unsupported("buffer views"));
        }
        let texture = self.texture(resource.0).ok_or(DeviceError::InvalidHandle)?;

        if usage_type.intersects(ResourceUsage::RENDER_TARGET | ResourceUsage::DEPTH_STENCIL) {
            let format = if desc.format == Format::UNKNOWN {
                self.resource_desc(resource).texture.format
            } else {
                desc.format
            };
            let depth = usage_type.intersects(ResourceUsage::DEPTH_STENCIL);
            let stencil = depth && format == Format::D24_UNORM_S8_UINT;
            self.create_framebuffer(texture, desc.texture.first_level, depth, stencil)
        } else {
            // sampled views name the texture itself
            Ok(ResourceView(resource.0))
        }
    }

    fn destroy_resource_view(&mut self, view: ResourceView) {
        if is_gl_default_framebuffer(view.0) || object_target(view.0) != glow::FRAMEBUFFER {
            return;
        }
        if let Some(name) = object_name(view.0) {
            unsafe { self.gl.delete_framebuffer(glow::NativeFramebuffer(name)) };
        }
    }

    fn create_pipeline(
        &mut self,
        _layout: PipelineLayout,
        subobjects: &[PipelineSubobject],
    ) -> Result<Pipeline, DeviceError> {
        let mut shaders = Vec::new();
        let mut topology = glow::TRIANGLES;
        let mut input_layout = Vec::new();

        for subobject in subobjects {
            match subobject {
                PipelineSubobject::PrimitiveTopology(t) => {
                    topology = convert::primitive_topology(*t)
                }
                PipelineSubobject::InputLayout(elements) => input_layout = elements.clone(),
                other => match other.shader() {
                    Some((stage, desc)) => {
                        let ty = convert::shader_type(stage)
                            .ok_or(DeviceError::Unsupported("shader stage"))?;
                        shaders.push((ty, desc));
                    }
                    None => debug!(subobject = ?other.ty(), "pipeline state left at GL defaults"),
                },
            }
        }
        if shaders.is_empty() {
            return Err(DeviceError::Unsupported("pipelines without shaders"));
        }

        let program = compile_program(&self.gl, &shaders)?;
        let handle = Pipeline(gl_handle(u64::from(glow::PROGRAM), program.0.get()));
        self.programs.insert(
            handle,
            Program {
                program,
                topology,
                input_layout,
            },
        );
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: Pipeline) {
        if let Some(p) = self.programs.remove(&pipeline) {
            unsafe { self.gl.delete_program(p.program) };
        }
    }

    fn create_pipeline_layout(
        &mut self,
        params: &[PipelineLayoutParam],
    ) -> Result<PipelineLayout, DeviceError> {
        // GL binds by location; the params only place push constants
        self.next_layout += 1;
        let layout = PipelineLayout(self.next_layout);
        self.layouts.insert(layout, params.to_vec());
        Ok(layout)
    }

    fn destroy_pipeline_layout(&mut self, layout: PipelineLayout) {
        self.layouts.remove(&layout);
    }

    fn allocate_descriptor_tables(
        &mut self,
        _layout: PipelineLayout,
        _param: u32,
        _count: u32,
    ) -> Result<Vec<DescriptorTable>, DeviceError> {
        Err(DeviceError::Unsupported("descriptor tables"))
    }

    fn free_descriptor_tables(&mut self, tables: &[DescriptorTable]) {
        debug!(count = tables.len(), "descriptor tables are not supported");
    }

    fn copy_descriptor_tables(&mut self, copies: &[DescriptorTableCopy]) {
        debug!(count = copies.len(), "descriptor tables are not supported");
    }

    fn update_descriptor_tables(&mut self, updates: &[DescriptorTableUpdate]) {
        debug!(count = updates.len(), "descriptor tables are not supported");
    }

    fn map_buffer_region(
        &mut self,
        resource: Resource,
        offset: u64,
        size: u64,
        access: MapAccess,
    ) -> Result<NonNull<u8>, DeviceError> {
        let buffer = self.buffer(resource).ok_or(DeviceError::InvalidHandle)?;
        let size = if size == WHOLE_SIZE {
            self.buffer_size(resource).saturating_sub(offset)
        } else {
            size
        };
        let offset = gl_int(offset, "map offset")?;
        let length = gl_int(size, "map length")?;
        let ptr = unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            let ptr = self.gl.map_buffer_range(
                glow::COPY_WRITE_BUFFER,
                offset,
                length,
                convert::map_access(access),
            );
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            ptr
        };
        NonNull::new(ptr).ok_or_else(|| DeviceError::Native("glMapBufferRange failed".to_owned()))
    }

    fn unmap_buffer_region(&mut self, resource: Resource) {
        let Some(buffer) = self.buffer(resource) else {
            return;
        };
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl.unmap_buffer(glow::COPY_WRITE_BUFFER);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }

    fn map_texture_region(
        &mut self,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
        access: MapAccess,
    ) -> Result<MappedSubresource, DeviceError> {
        let texture = self.texture(resource.0).ok_or(DeviceError::InvalidHandle)?;
        if self.staged.contains_key(&(resource, subresource)) {
            return Err(DeviceError::Native(format!("subresource {subresource} is already mapped")));
        }
        let desc = self.resource_desc(resource);
        let (level, layer) = convert::split_subresource(&desc, subresource);
        if layer != 0 {
            return Err(DeviceError::Unsupported("texture array layers"));
        }
        let whole = convert::level_region(&desc, level);
        let region = region.copied().unwrap_or(whole);
        let format = desc.texture.format;
        let row_pitch = format_row_pitch(format, region.width());
        let slice_pitch = format_slice_pitch(format, row_pitch, region.height());
        let mut bytes = vec![0u8; slice_pitch as usize];

        if access != MapAccess::WriteOnly && access != MapAccess::WriteDiscard {
            match convert::texel_format(format) {
                Some(texel) if region == whole => unsafe {
                    self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
                    self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
                    self.gl.get_tex_image(
                        glow::TEXTURE_2D,
                        level as i32,
                        texel.format,
                        texel.ty,
                        glow::PixelPackData::Slice(Some(&mut bytes)),
                    );
                    self.gl.bind_texture(glow::TEXTURE_2D, None);
                },
                _ => debug!(subresource, "texture region mapped without its current contents"),
            }
        }

        let staged = self.staged.entry((resource, subresource)).or_insert(Staged {
            level,
            region,
            access,
            row_pitch,
            bytes,
        });
        let data = NonNull::new(staged.bytes.as_mut_ptr()).ok_or(DeviceError::InvalidHandle)?;
        Ok(MappedSubresource {
            data,
            row_pitch,
            slice_pitch,
            len: staged.bytes.len(),
        })
    }

    fn unmap_texture_region(&mut self, resource: Resource, subresource: u32) {
        let Some(staged) = self.staged.remove(&(resource, subresource)) else {
            debug!(resource = resource.0, subresource, "unmap of an unmapped texture");
            return;
        };
        let Some(texture) = self.texture(resource.0).filter(|_| staged.access.writes()) else {
            return;
        };
        let desc = self.resource_desc(resource);
        let data = SubresourceData {
            data: &staged.bytes,
            row_pitch: staged.row_pitch,
            slice_pitch: 0,
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.upload_texels(&desc, staged.level, &staged.region, &data);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn update_buffer_region(&mut self, data: &[u8], resource: Resource, offset: u64) {
        let Some(buffer) = self.buffer(resource) else {
            debug!(resource = resource.0, "update of a non-buffer ignored");
            return;
        };
        let Ok(offset) = gl_int(offset, "update offset") else {
            warn!(offset, "buffer update offset out of range");
            return;
        };
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl
                .buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, offset, data);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }

    fn update_texture_region(
        &mut self,
        data: &SubresourceData<'_>,
        resource: Resource,
        subresource: u32,
        region: Option<&SubresourceBox>,
    ) {
        let Some(texture) = self.texture(resource.0) else {
            debug!(resource = resource.0, "update of a non-texture ignored");
            return;
        };
        let desc = self.resource_desc(resource);
        let (level, layer) = convert::split_subresource(&desc, subresource);
        if layer != 0 {
            debug!(subresource, "texture array layers are not supported");
            return;
        }
        let region = region
            .copied()
            .unwrap_or_else(|| convert::level_region(&desc, level));
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.upload_texels(&desc, level, &region, data);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }
}
