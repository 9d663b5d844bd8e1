//! Headless graphics context.
//!
//! [`RecordingContext`] implements [`GraphicsContext`] without a GPU. Every
//! call is appended to a command log and every draw captures a snapshot of
//! the binding state it was issued with. Shader "compilation" always succeeds
//! unless the source contains a registered failure marker, which makes it
//! possible to exercise the cache and the per-draw failure paths in tests and
//! in tooling that runs without a window.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use log::debug;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use super::{
    BlendMode, BufferId, BufferTarget, Capabilities, Face, FramebufferId, FrontFace,
    GraphicsContext, IndexType, ProgramId, ShaderId, ShaderStage, TextureDescriptor, TextureId,
    TextureTarget, TextureUpload, Topology, UniformLocation, UniformValue, VertexLayout,
};
use crate::errors::{GlintError, Result};

/// Owned copy of a [`UniformValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedUniform {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Mat4Array(Vec<Mat4>),
}

impl From<UniformValue<'_>> for RecordedUniform {
    fn from(value: UniformValue<'_>) -> Self {
        match value {
            UniformValue::Int(v) => Self::Int(v),
            UniformValue::Float(v) => Self::Float(v),
            UniformValue::Vec2(v) => Self::Vec2(v),
            UniformValue::Vec3(v) => Self::Vec3(v),
            UniformValue::Vec4(v) => Self::Vec4(v),
            UniformValue::Mat3(v) => Self::Mat3(v),
            UniformValue::Mat4(v) => Self::Mat4(v),
            UniformValue::FloatArray(v) => Self::FloatArray(v.to_vec()),
            UniformValue::Mat4Array(v) => Self::Mat4Array(v.to_vec()),
        }
    }
}

/// One entry of the command log.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CompileShader { stage: ShaderStage, success: bool },
    LinkProgram { program: Option<ProgramId> },
    UseProgram(ProgramId),
    SetUniform { name: String, value: RecordedUniform },
    EnableAttribute { location: u32, buffer: BufferId },
    DisableAttribute(u32),
    CreateTexture { texture: TextureId, label: &'static str },
    UploadTexture { texture: TextureId, target: TextureTarget, level: u32, width: u32, height: u32 },
    GenerateMipmaps(TextureId),
    BindTexture { unit: u32, texture: TextureId },
    BindFramebuffer(Option<FramebufferId>),
    AttachColorTarget { texture: TextureId, target: TextureTarget, level: u32 },
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    Clear(Vec4),
    Draw(DrawCall),
}

/// Binding state captured when a draw was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: Option<ProgramId>,
    pub topology: Topology,
    pub count: u32,
    pub indexed: bool,
    pub front_face: FrontFace,
    pub cull_face: Option<Face>,
    pub blend: Option<BlendMode>,
    pub textures: BTreeMap<u32, TextureId>,
    pub enabled_attributes: BTreeSet<u32>,
    pub framebuffer: Option<FramebufferId>,
}

struct RecordedShader {
    stage: ShaderStage,
    source: String,
}

struct RecordedProgram {
    vertex_source: String,
    fragment_source: String,
    attributes: FxHashMap<String, u32>,
}

/// A [`GraphicsContext`] that records instead of rendering.
pub struct RecordingContext {
    capabilities: Capabilities,
    compile_failure_markers: Vec<String>,
    link_failure_markers: Vec<String>,

    shaders: SlotMap<ShaderId, RecordedShader>,
    programs: SlotMap<ProgramId, RecordedProgram>,
    buffers: SlotMap<BufferId, BufferTarget>,
    textures: SlotMap<TextureId, TextureDescriptor>,
    framebuffers: SlotMap<FramebufferId, ()>,
    uniform_locations: SlotMap<UniformLocation, (ProgramId, String)>,
    uniform_lookup: FxHashMap<(ProgramId, String), UniformLocation>,

    current_program: Option<ProgramId>,
    enabled_attributes: BTreeSet<u32>,
    bound_textures: BTreeMap<u32, TextureId>,
    framebuffer: Option<FramebufferId>,
    front_face: FrontFace,
    cull_face: Option<Face>,
    blend: Option<BlendMode>,
    depth_test: bool,
    depth_write: bool,
    viewport: (i32, i32, u32, u32),

    uniforms: FxHashMap<(ProgramId, String), RecordedUniform>,
    commands: Vec<GpuCommand>,
    compile_count: usize,
    link_count: usize,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            compile_failure_markers: Vec::new(),
            link_failure_markers: Vec::new(),
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            uniform_locations: SlotMap::with_key(),
            uniform_lookup: FxHashMap::default(),
            current_program: None,
            enabled_attributes: BTreeSet::new(),
            bound_textures: BTreeMap::new(),
            framebuffer: None,
            front_face: FrontFace::Ccw,
            cull_face: None,
            blend: None,
            depth_test: false,
            depth_write: true,
            viewport: (0, 0, 0, 0),
            uniforms: FxHashMap::default(),
            commands: Vec::new(),
            compile_count: 0,
            link_count: 0,
        }
    }

    /// Any shader source containing `marker` fails to compile.
    pub fn fail_compile_when(&mut self, marker: impl Into<String>) {
        self.compile_failure_markers.push(marker.into());
    }

    /// Any program whose stages contain `marker` fails to link.
    pub fn fail_link_when(&mut self, marker: impl Into<String>) {
        self.link_failure_markers.push(marker.into());
    }

    #[must_use]
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Draw calls in issue order.
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            GpuCommand::Draw(call) => Some(call),
            _ => None,
        })
    }

    /// Number of successful or failed compile attempts.
    #[must_use]
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    #[must_use]
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Source a shader was compiled from.
    #[must_use]
    pub fn shader_source(&self, shader: ShaderId) -> Option<&str> {
        self.shaders.get(shader).map(|s| s.source.as_str())
    }

    /// Sources of every live shader, in creation order.
    pub fn shader_sources(&self) -> impl Iterator<Item = &str> {
        self.shaders.values().map(|s| s.source.as_str())
    }

    #[must_use]
    pub fn live_shader_count(&self) -> usize {
        self.shaders.len()
    }

    #[must_use]
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Target a live buffer was created for.
    #[must_use]
    pub fn buffer_target(&self, buffer: BufferId) -> Option<BufferTarget> {
        self.buffers.get(buffer).copied()
    }

    /// Uniform locations handed out for programs that are still alive.
    #[must_use]
    pub fn live_uniform_location_count(&self) -> usize {
        self.uniform_locations.len()
    }

    #[must_use]
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    #[must_use]
    pub fn texture_alive(&self, texture: TextureId) -> bool {
        self.textures.contains_key(texture)
    }

    #[must_use]
    pub fn texture_descriptor(&self, texture: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(texture)
    }

    /// Attribute arrays currently enabled.
    #[must_use]
    pub fn enabled_attributes(&self) -> &BTreeSet<u32> {
        &self.enabled_attributes
    }

    #[must_use]
    pub fn current_framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    #[must_use]
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    #[must_use]
    pub fn depth_state(&self) -> (bool, bool) {
        (self.depth_test, self.depth_write)
    }

    /// Last value written to `name` in `program`.
    #[must_use]
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<&RecordedUniform> {
        self.uniforms.get(&(program, name.to_string()))
    }

    fn contains_identifier(source: &str, name: &str) -> bool {
        let base = name.split(['[', '.']).next().unwrap_or(name);
        !base.is_empty() && source.contains(base)
    }

    fn snapshot(&self, topology: Topology, count: u32, indexed: bool) -> DrawCall {
        DrawCall {
            program: self.current_program,
            topology,
            count,
            indexed,
            front_face: self.front_face,
            cull_face: self.cull_face,
            blend: self.blend,
            textures: self.bound_textures.clone(),
            enabled_attributes: self.enabled_attributes.clone(),
            framebuffer: self.framebuffer,
        }
    }
}

impl GraphicsContext for RecordingContext {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        self.compile_count += 1;
        let failed = self
            .compile_failure_markers
            .iter()
            .find(|marker| source.contains(marker.as_str()));

        self.commands.push(GpuCommand::CompileShader {
            stage,
            success: failed.is_none(),
        });

        if let Some(marker) = failed {
            return Err(GlintError::Gpu(format!(
                "ERROR: 0:1: '{marker}' : syntax error"
            )));
        }

        Ok(self.shaders.insert(RecordedShader {
            stage,
            source: source.to_string(),
        }))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(shader);
    }

    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId> {
        self.link_count += 1;
        let (Some(vs), Some(fs)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            self.commands.push(GpuCommand::LinkProgram { program: None });
            return Err(GlintError::Gpu("invalid shader handle".to_string()));
        };
        if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
            self.commands.push(GpuCommand::LinkProgram { program: None });
            return Err(GlintError::Gpu("stage mismatch".to_string()));
        }
        if let Some(marker) = self
            .link_failure_markers
            .iter()
            .find(|m| vs.source.contains(m.as_str()) || fs.source.contains(m.as_str()))
        {
            self.commands.push(GpuCommand::LinkProgram { program: None });
            return Err(GlintError::Gpu(format!("link failed at '{marker}'")));
        }

        let program = self.programs.insert(RecordedProgram {
            vertex_source: vs.source.clone(),
            fragment_source: fs.source.clone(),
            attributes: FxHashMap::default(),
        });
        self.commands.push(GpuCommand::LinkProgram {
            program: Some(program),
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(program);
        self.uniform_locations.retain(|_, (owner, _)| *owner != program);
        self.uniform_lookup.retain(|(owner, _), _| *owner != program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let key = (program, name.to_string());
        if let Some(&location) = self.uniform_lookup.get(&key) {
            return Some(location);
        }
        let recorded = self.programs.get(program)?;
        if !Self::contains_identifier(&recorded.vertex_source, name)
            && !Self::contains_identifier(&recorded.fragment_source, name)
        {
            return None;
        }
        let location = self.uniform_locations.insert(key.clone());
        self.uniform_lookup.insert(key, location);
        Some(location)
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let recorded = self.programs.get_mut(program)?;
        if !recorded.vertex_source.contains(name) {
            return None;
        }
        let next = recorded.attributes.len() as u32;
        Some(*recorded.attributes.entry(name.to_string()).or_insert(next))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>) {
        let Some((program, name)) = self.uniform_locations.get(location).cloned() else {
            return;
        };
        if self.current_program != Some(program) {
            debug!("uniform `{name}` written while another program is current");
        }
        let value = RecordedUniform::from(value);
        self.uniforms.insert((program, name.clone()), value.clone());
        self.commands.push(GpuCommand::SetUniform { name, value });
    }

    fn create_buffer(&mut self, target: BufferTarget, _data: &[u8]) -> Result<BufferId> {
        Ok(self.buffers.insert(target))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
    }

    fn enable_vertex_attribute(&mut self, location: u32, buffer: BufferId, _layout: &VertexLayout) {
        self.enabled_attributes.insert(location);
        self.commands
            .push(GpuCommand::EnableAttribute { location, buffer });
    }

    fn disable_vertex_attribute(&mut self, location: u32) {
        self.enabled_attributes.remove(&location);
        self.commands.push(GpuCommand::DisableAttribute(location));
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId> {
        let texture = self.textures.insert(*descriptor);
        self.commands.push(GpuCommand::CreateTexture {
            texture,
            label: descriptor.label,
        });
        Ok(texture)
    }

    fn upload_texture(&mut self, texture: TextureId, upload: &TextureUpload<'_>) {
        self.commands.push(GpuCommand::UploadTexture {
            texture,
            target: upload.target,
            level: upload.level,
            width: upload.width,
            height: upload.height,
        });
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.commands.push(GpuCommand::GenerateMipmaps(texture));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture);
        self.bound_textures.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.bound_textures.insert(unit, texture);
        self.commands.push(GpuCommand::BindTexture { unit, texture });
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        Ok(self.framebuffers.insert(()))
    }

    fn attach_color_target(
        &mut self,
        _framebuffer: FramebufferId,
        texture: TextureId,
        target: TextureTarget,
        level: u32,
    ) {
        self.commands.push(GpuCommand::AttachColorTarget {
            texture,
            target,
            level,
        });
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.framebuffer = framebuffer;
        self.commands.push(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(framebuffer);
        if self.framebuffer == Some(framebuffer) {
            self.framebuffer = None;
        }
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.commands.push(GpuCommand::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&mut self, color: Vec4) {
        self.commands.push(GpuCommand::Clear(color));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_front_face(&mut self, face: FrontFace) {
        self.front_face = face;
    }

    fn set_cull_face(&mut self, face: Option<Face>) {
        self.cull_face = face;
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.blend = blend;
    }

    fn draw_arrays(&mut self, topology: Topology, _first: u32, count: u32) {
        let call = self.snapshot(topology, count, false);
        self.commands.push(GpuCommand::Draw(call));
    }

    fn draw_elements(
        &mut self,
        topology: Topology,
        _indices: BufferId,
        _index_type: IndexType,
        count: u32,
        _offset: u32,
    ) {
        let call = self.snapshot(topology, count, true);
        self.commands.push(GpuCommand::Draw(call));
    }
}
