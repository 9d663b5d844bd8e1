//! GPU Resource Wrapper
//!
//! A thin ownership layer over an immediate-mode graphics API.
//!
//! Every component receives the graphics context explicitly as
//! `&mut impl GraphicsContext`; there is no ambient GL state in this crate.
//! Backend objects are addressed through opaque [`slotmap`] keys so the same
//! scene and cache types work with the [`GlowContext`] (OpenGL / WebGL2) and
//! with the headless `RecordingContext` (`recording` feature, on by default).
//!
//! # Binding state
//!
//! The current program, bound texture units and enabled vertex attributes are
//! global mutable state of one context. Callers that enable attributes are
//! responsible for disabling them again; nothing here saves or restores
//! unrelated state.

pub mod glow_backend;
#[cfg(any(test, feature = "recording"))]
pub mod recording;
pub mod slots;
pub mod texture;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::errors::Result;

pub use glow_backend::GlowContext;
#[cfg(any(test, feature = "recording"))]
pub use recording::{DrawCall, GpuCommand, RecordedUniform, RecordingContext};
pub use slots::{SlotPlan, TextureSlotAllocator, ENVIRONMENT_TEXTURE_COUNT};
pub use texture::{GpuTexture, ImageData, TextureCell};

slotmap::new_key_type! {
    /// Handle to a compiled shader stage.
    pub struct ShaderId;
    /// Handle to a linked program.
    pub struct ProgramId;
    /// Handle to a vertex or index buffer.
    pub struct BufferId;
    /// Handle to a 2-D or cube texture.
    pub struct TextureId;
    /// Handle to an off-screen framebuffer.
    pub struct FramebufferId;
    /// Handle to a uniform location inside one program.
    pub struct UniformLocation;
}

// ============================================================================
// Capabilities
// ============================================================================

/// Optional features reported by the backend at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// `#version` line prepended to every assembled shader.
    pub glsl_version: &'static str,
    /// Float render targets (`EXT_color_buffer_float`).
    pub float_color_buffer: bool,
    /// Linear filtering of 32-bit float textures (`OES_texture_float_linear`).
    pub float_texture_linear: bool,
    /// Explicit-LOD texture sampling in fragment shaders.
    pub shader_texture_lod: bool,
    /// Texture image units available to the fragment stage.
    pub max_texture_units: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            glsl_version: "#version 300 es",
            float_color_buffer: true,
            float_texture_linear: true,
            shader_texture_lod: true,
            max_texture_units: 16,
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Scalar type of vertex, index and accessor data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// How one vertex attribute is read from its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Byte stride; 0 means tightly packed.
    pub stride: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    #[must_use]
    pub fn from_component_type(component_type: ComponentType) -> Option<Self> {
        match component_type {
            ComponentType::U8 => Some(Self::U8),
            ComponentType::U16 => Some(Self::U16),
            ComponentType::U32 => Some(Self::U32),
            _ => None,
        }
    }
}

/// Primitive topology, numbered as glTF `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    /// Number of triangles produced by `count` vertices (or indices).
    #[must_use]
    pub fn triangle_count(self, count: usize) -> usize {
        match self {
            Self::Triangles => count / 3,
            Self::TriangleStrip | Self::TriangleFan => count.saturating_sub(2),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    Cube,
}

/// Internal storage format of a texture (and of the pixel data uploaded to it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba16F,
    Rgba32F,
}

impl TextureFormat {
    /// Bytes per RGBA texel.
    #[must_use]
    pub fn texel_size(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgba16F => 8,
            Self::Rgba32F => 16,
        }
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        !matches!(self, Self::Rgba8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    LinearMipmapLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// Sampling state attached to a texture at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerState {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl SamplerState {
    /// Clamp-to-edge linear sampling, used for render targets and LUTs.
    pub const CLAMP_LINEAR: Self = Self {
        min_filter: FilterMode::Linear,
        mag_filter: FilterMode::Linear,
        wrap_s: WrapMode::ClampToEdge,
        wrap_t: WrapMode::ClampToEdge,
    };

    /// Clamp-to-edge trilinear sampling, used for mipmapped cubemaps.
    pub const CLAMP_TRILINEAR: Self = Self {
        min_filter: FilterMode::LinearMipmapLinear,
        mag_filter: FilterMode::Linear,
        wrap_s: WrapMode::ClampToEdge,
        wrap_t: WrapMode::ClampToEdge,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: &'static str,
    pub kind: TextureKind,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Number of mip levels to allocate storage for.
    pub mip_levels: u32,
    pub sampler: SamplerState,
}

/// Destination of an upload or a framebuffer attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    D2,
    /// Cube face in GL order: +X, -X, +Y, -Y, +Z, -Z.
    CubeFace(u32),
}

#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub target: TextureTarget,
    pub level: u32,
    pub width: u32,
    pub height: u32,
    /// Tightly packed texels in the texture's format.
    pub data: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src * a + dst * (1 - a)`
    Alpha,
}

/// A value written to one uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(&'a [f32]),
    Mat4Array(&'a [Mat4]),
}

// ============================================================================
// GraphicsContext
// ============================================================================

/// One immediate-mode graphics context.
///
/// Calls are synchronous with respect to logical submission: a call has been
/// issued before the next one starts. Creation calls return backend
/// diagnostics as [`GlintError`](crate::errors::GlintError).
pub trait GraphicsContext {
    fn capabilities(&self) -> &Capabilities;

    // --- Shaders ---
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId>;
    fn delete_shader(&mut self, shader: ShaderId);
    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId>;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: ProgramId);
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32>;
    /// Writes to a location of the currently used program.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>);

    // --- Buffers & vertex attributes ---
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId>;
    fn delete_buffer(&mut self, buffer: BufferId);
    /// Points `location` at `buffer` and enables the attribute array.
    fn enable_vertex_attribute(&mut self, location: u32, buffer: BufferId, layout: &VertexLayout);
    fn disable_vertex_attribute(&mut self, location: u32);

    // --- Textures ---
    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId>;
    fn upload_texture(&mut self, texture: TextureId, upload: &TextureUpload<'_>);
    fn generate_mipmaps(&mut self, texture: TextureId);
    fn delete_texture(&mut self, texture: TextureId);
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    // --- Framebuffers ---
    fn create_framebuffer(&mut self) -> Result<FramebufferId>;
    fn attach_color_target(
        &mut self,
        framebuffer: FramebufferId,
        texture: TextureId,
        target: TextureTarget,
        level: u32,
    );
    /// `None` binds the default framebuffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // --- Fixed-function state ---
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear(&mut self, color: Vec4);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_front_face(&mut self, face: FrontFace);
    /// `None` disables face culling.
    fn set_cull_face(&mut self, face: Option<Face>);
    /// `None` disables blending.
    fn set_blend(&mut self, blend: Option<BlendMode>);

    // --- Draws ---
    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32);
    fn draw_elements(
        &mut self,
        topology: Topology,
        indices: BufferId,
        index_type: IndexType,
        count: u32,
        offset: u32,
    );
}
