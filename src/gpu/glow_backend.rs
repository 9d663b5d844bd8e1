//! OpenGL 3.3 / OpenGL ES 3.0 / WebGL2 backend built on [`glow`].

use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};
use log::{debug, info, warn};
use slotmap::SlotMap;

use super::{
    BlendMode, BufferId, BufferTarget, Capabilities, ComponentType, Face, FilterMode,
    FramebufferId, FrontFace, GraphicsContext, IndexType, ProgramId, ShaderId, ShaderStage,
    TextureDescriptor, TextureFormat, TextureId, TextureKind, TextureTarget, TextureUpload,
    Topology, UniformLocation, UniformValue, VertexLayout, WrapMode,
};
use crate::errors::{GlintError, Result};

struct GlTexture {
    raw: glow::Texture,
    bind_target: u32,
    format: TextureFormat,
}

struct GlBuffer {
    raw: glow::Buffer,
    bind_target: u32,
}

/// Convert a `u32` to the `i32` GL size arguments expect.
fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// (internal format, format, type) for `tex_image_2d`.
fn format_triple(format: TextureFormat) -> (i32, u32, u32) {
    match format {
        TextureFormat::Rgba8 => (glow::RGBA8 as i32, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba16F => (glow::RGBA16F as i32, glow::RGBA, glow::HALF_FLOAT),
        TextureFormat::Rgba32F => (glow::RGBA32F as i32, glow::RGBA, glow::FLOAT),
    }
}

fn filter_enum(filter: FilterMode) -> i32 {
    (match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn wrap_enum(wrap: WrapMode) -> i32 {
    (match wrap {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn component_enum(component_type: ComponentType) -> u32 {
    match component_type {
        ComponentType::I8 => glow::BYTE,
        ComponentType::U8 => glow::UNSIGNED_BYTE,
        ComponentType::I16 => glow::SHORT,
        ComponentType::U16 => glow::UNSIGNED_SHORT,
        ComponentType::U32 => glow::UNSIGNED_INT,
        ComponentType::F32 => glow::FLOAT,
    }
}

fn topology_enum(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn upload_target(texture: &GlTexture, target: TextureTarget) -> u32 {
    match target {
        TextureTarget::CubeFace(face) if texture.bind_target == glow::TEXTURE_CUBE_MAP => {
            glow::TEXTURE_CUBE_MAP_POSITIVE_X + face.min(5)
        }
        _ => glow::TEXTURE_2D,
    }
}

/// A [`GraphicsContext`] issuing real GL calls.
///
/// Owns one vertex array object which stays bound for the lifetime of the
/// context; attribute arrays are enabled and disabled on it per draw.
pub struct GlowContext {
    gl: Arc<glow::Context>,
    capabilities: Capabilities,
    vertex_array: glow::VertexArray,

    shaders: SlotMap<ShaderId, glow::Shader>,
    programs: SlotMap<ProgramId, glow::Program>,
    buffers: SlotMap<BufferId, GlBuffer>,
    textures: SlotMap<TextureId, GlTexture>,
    framebuffers: SlotMap<FramebufferId, glow::Framebuffer>,
    /// Locations are owned by the program they were queried from.
    uniform_locations: SlotMap<UniformLocation, (ProgramId, glow::UniformLocation)>,
}

impl GlowContext {
    /// Wraps a GL context and probes its capabilities.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread for the whole lifetime of the
    /// returned value, and every object created through it must be released
    /// before the context is dropped.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Result<Self> {
        let extensions = gl.supported_extensions();
        let version = gl.version();
        let embedded = version.is_embedded;

        let has = |name: &str| extensions.contains(name);
        let capabilities = Capabilities {
            glsl_version: if embedded {
                "#version 300 es"
            } else {
                "#version 330 core"
            },
            float_color_buffer: !embedded
                || has("EXT_color_buffer_float")
                || has("GL_EXT_color_buffer_float"),
            float_texture_linear: !embedded
                || has("OES_texture_float_linear")
                || has("GL_OES_texture_float_linear"),
            shader_texture_lod: true,
            max_texture_units: unsafe {
                gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS)
            }
            .max(0) as u32,
        };
        info!(
            "GL {}.{} ({}) float color buffer: {}, texture units: {}",
            version.major,
            version.minor,
            if embedded { "ES" } else { "desktop" },
            capabilities.float_color_buffer,
            capabilities.max_texture_units
        );

        let vertex_array = unsafe {
            let vao = gl.create_vertex_array().map_err(GlintError::Gpu)?;
            gl.bind_vertex_array(Some(vao));
            if !embedded {
                gl.enable(glow::TEXTURE_CUBE_MAP_SEAMLESS);
            }
            vao
        };

        Ok(Self {
            gl,
            capabilities,
            vertex_array,
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            uniform_locations: SlotMap::with_key(),
        })
    }

    /// The wrapped context, for host code that draws its own UI.
    #[must_use]
    pub fn raw(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Releases the vertex array and every object still alive.
    pub fn destroy(&mut self) {
        let gl = &self.gl;
        unsafe {
            for (_, program) in self.programs.drain() {
                gl.delete_program(program);
            }
            for (_, shader) in self.shaders.drain() {
                gl.delete_shader(shader);
            }
            for (_, buffer) in self.buffers.drain() {
                gl.delete_buffer(buffer.raw);
            }
            for (_, texture) in self.textures.drain() {
                gl.delete_texture(texture.raw);
            }
            for (_, framebuffer) in self.framebuffers.drain() {
                gl.delete_framebuffer(framebuffer);
            }
            gl.delete_vertex_array(self.vertex_array);
        }
        self.uniform_locations.clear();
    }
}

impl GraphicsContext for GlowContext {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        let gl = &self.gl;
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = gl.create_shader(kind).map_err(GlintError::Gpu)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(GlintError::Gpu(log));
            }
            Ok(self.shaders.insert(shader))
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(raw) = self.shaders.remove(shader) {
            unsafe { self.gl.delete_shader(raw) };
        }
    }

    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId> {
        let (Some(&vs), Some(&fs)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            return Err(GlintError::Gpu("invalid shader handle".to_string()));
        };
        let gl = &self.gl;
        unsafe {
            let program = gl.create_program().map_err(GlintError::Gpu)?;
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);
            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(GlintError::Gpu(log));
            }
            Ok(self.programs.insert(program))
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(raw) = self.programs.remove(program) {
            unsafe { self.gl.delete_program(raw) };
            self.uniform_locations.retain(|_, (owner, _)| *owner != program);
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        let raw = self.programs.get(program).copied();
        unsafe { self.gl.use_program(raw) };
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let raw = *self.programs.get(program)?;
        let location = unsafe { self.gl.get_uniform_location(raw, name) }?;
        Some(self.uniform_locations.insert((program, location)))
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let raw = *self.programs.get(program)?;
        unsafe { self.gl.get_attrib_location(raw, name) }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>) {
        let Some((_, loc)) = self.uniform_locations.get(location) else {
            return;
        };
        let gl = &self.gl;
        let loc = Some(loc);
        unsafe {
            match value {
                UniformValue::Int(v) => gl.uniform_1_i32(loc, v),
                UniformValue::Float(v) => gl.uniform_1_f32(loc, v),
                UniformValue::Vec2(v) => gl.uniform_2_f32(loc, v.x, v.y),
                UniformValue::Vec3(v) => gl.uniform_3_f32(loc, v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(loc, v.x, v.y, v.z, v.w),
                UniformValue::Mat3(m) => {
                    gl.uniform_matrix_3_f32_slice(loc, false, &m.to_cols_array());
                }
                UniformValue::Mat4(m) => {
                    gl.uniform_matrix_4_f32_slice(loc, false, &m.to_cols_array());
                }
                UniformValue::FloatArray(values) => gl.uniform_1_f32_slice(loc, values),
                UniformValue::Mat4Array(matrices) => {
                    gl.uniform_matrix_4_f32_slice(loc, false, bytemuck::cast_slice(matrices));
                }
            }
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId> {
        let bind_target = match target {
            BufferTarget::Vertex => glow::ARRAY_BUFFER,
            BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
        };
        let gl = &self.gl;
        unsafe {
            let raw = gl.create_buffer().map_err(GlintError::Gpu)?;
            gl.bind_buffer(bind_target, Some(raw));
            gl.buffer_data_u8_slice(bind_target, data, glow::STATIC_DRAW);
            Ok(self.buffers.insert(GlBuffer { raw, bind_target }))
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(buffer.raw) };
        }
    }

    fn enable_vertex_attribute(&mut self, location: u32, buffer: BufferId, layout: &VertexLayout) {
        let Some(buffer) = self.buffers.get(buffer) else {
            warn!("vertex attribute {location} bound to a deleted buffer");
            return;
        };
        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer.raw));
            gl.vertex_attrib_pointer_f32(
                location,
                gl_size(layout.components),
                component_enum(layout.component_type),
                layout.normalized,
                gl_size(layout.stride),
                gl_size(layout.offset),
            );
            gl.enable_vertex_attrib_array(location);
        }
    }

    fn disable_vertex_attribute(&mut self, location: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(location) };
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId> {
        let bind_target = match descriptor.kind {
            TextureKind::D2 => glow::TEXTURE_2D,
            TextureKind::Cube => glow::TEXTURE_CUBE_MAP,
        };
        let (internal, format, ty) = format_triple(descriptor.format);
        let gl = &self.gl;
        unsafe {
            let raw = gl.create_texture().map_err(GlintError::Gpu)?;
            gl.bind_texture(bind_target, Some(raw));

            let faces: &[u32] = match descriptor.kind {
                TextureKind::D2 => &[glow::TEXTURE_2D],
                TextureKind::Cube => &[
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X,
                    glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
                    glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
                    glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
                    glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
                    glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
                ],
            };
            for level in 0..descriptor.mip_levels.max(1) {
                let width = (descriptor.width >> level).max(1);
                let height = (descriptor.height >> level).max(1);
                for &face in faces {
                    gl.tex_image_2d(
                        face,
                        gl_size(level),
                        internal,
                        gl_size(width),
                        gl_size(height),
                        0,
                        format,
                        ty,
                        PixelUnpackData::Slice(None),
                    );
                }
            }

            let sampler = descriptor.sampler;
            gl.tex_parameter_i32(bind_target, glow::TEXTURE_MIN_FILTER, filter_enum(sampler.min_filter));
            gl.tex_parameter_i32(bind_target, glow::TEXTURE_MAG_FILTER, filter_enum(sampler.mag_filter));
            gl.tex_parameter_i32(bind_target, glow::TEXTURE_WRAP_S, wrap_enum(sampler.wrap_s));
            gl.tex_parameter_i32(bind_target, glow::TEXTURE_WRAP_T, wrap_enum(sampler.wrap_t));
            if descriptor.kind == TextureKind::Cube {
                gl.tex_parameter_i32(bind_target, glow::TEXTURE_WRAP_R, wrap_enum(sampler.wrap_t));
            }
            gl.tex_parameter_i32(
                bind_target,
                glow::TEXTURE_MAX_LEVEL,
                gl_size(descriptor.mip_levels.saturating_sub(1)),
            );

            debug!(
                "created texture `{}` {}x{} {:?} ({} levels)",
                descriptor.label,
                descriptor.width,
                descriptor.height,
                descriptor.format,
                descriptor.mip_levels
            );

            Ok(self.textures.insert(GlTexture {
                raw,
                bind_target,
                format: descriptor.format,
            }))
        }
    }

    fn upload_texture(&mut self, texture: TextureId, upload: &TextureUpload<'_>) {
        let Some(texture) = self.textures.get(texture) else {
            return;
        };
        let (_, format, ty) = format_triple(texture.format);
        let target = upload_target(texture, upload.target);
        let gl = &self.gl;
        unsafe {
            gl.bind_texture(texture.bind_target, Some(texture.raw));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_sub_image_2d(
                target,
                gl_size(upload.level),
                0,
                0,
                gl_size(upload.width),
                gl_size(upload.height),
                format,
                ty,
                PixelUnpackData::Slice(Some(upload.data)),
            );
        }
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        let Some(texture) = self.textures.get(texture) else {
            return;
        };
        unsafe {
            self.gl.bind_texture(texture.bind_target, Some(texture.raw));
            self.gl.generate_mipmap(texture.bind_target);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(texture) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(texture.raw) };
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        let Some(texture) = self.textures.get(texture) else {
            return;
        };
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(texture.bind_target, Some(texture.raw));
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let raw = unsafe { self.gl.create_framebuffer() }.map_err(GlintError::Gpu)?;
        Ok(self.framebuffers.insert(raw))
    }

    fn attach_color_target(
        &mut self,
        framebuffer: FramebufferId,
        texture: TextureId,
        target: TextureTarget,
        level: u32,
    ) {
        let (Some(&fbo), Some(texture)) = (self.framebuffers.get(framebuffer), self.textures.get(texture))
        else {
            return;
        };
        let attach_target = upload_target(texture, target);
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                attach_target,
                Some(texture.raw),
                gl_size(level),
            );
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let raw = framebuffer.and_then(|fb| self.framebuffers.get(fb).copied());
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, raw) };
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(raw) = self.framebuffers.remove(framebuffer) {
            unsafe { self.gl.delete_framebuffer(raw) };
        }
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, gl_size(width), gl_size(height)) };
    }

    fn clear(&mut self, color: glam::Vec4) {
        unsafe {
            self.gl.clear_color(color.x, color.y, color.z, color.w);
            self.gl.clear_depth_f32(1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
                self.gl.depth_func(glow::LEQUAL);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_write(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) };
    }

    fn set_front_face(&mut self, face: FrontFace) {
        let mode = match face {
            FrontFace::Ccw => glow::CCW,
            FrontFace::Cw => glow::CW,
        };
        unsafe { self.gl.front_face(mode) };
    }

    fn set_cull_face(&mut self, face: Option<Face>) {
        unsafe {
            match face {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(match face {
                        Face::Front => glow::FRONT,
                        Face::Back => glow::BACK,
                    });
                }
                None => self.gl.disable(glow::CULL_FACE),
            }
        }
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        unsafe {
            match blend {
                Some(BlendMode::Alpha) => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_equation(glow::FUNC_ADD);
                    self.gl.blend_func_separate(
                        glow::SRC_ALPHA,
                        glow::ONE_MINUS_SRC_ALPHA,
                        glow::ONE,
                        glow::ONE_MINUS_SRC_ALPHA,
                    );
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(topology_enum(topology), gl_size(first), gl_size(count));
        }
    }

    fn draw_elements(
        &mut self,
        topology: Topology,
        indices: BufferId,
        index_type: IndexType,
        count: u32,
        offset: u32,
    ) {
        let Some(buffer) = self.buffers.get(indices) else {
            warn!("draw_elements with a deleted index buffer");
            return;
        };
        let element_type = match index_type {
            IndexType::U8 => glow::UNSIGNED_BYTE,
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        };
        unsafe {
            self.gl.bind_buffer(buffer.bind_target, Some(buffer.raw));
            self.gl.draw_elements(
                topology_enum(topology),
                gl_size(count),
                element_type,
                gl_size(offset),
            );
        }
    }
}
