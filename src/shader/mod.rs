//! Shader Permutation System
//!
//! - [`defines`]: typed feature flags and canonical define sets
//! - [`source`]: embedded GLSL and variant source assembly
//! - [`cache`]: stage and program caches keyed by content hash
//!
//! The same cache instance is shared by the frame renderer and the IBL
//! sampler; it is passed explicitly as `&mut ShaderCache`.

pub mod cache;
pub mod defines;
pub mod source;

pub use cache::{CompiledProgram, ShaderCache, ShaderVariantKey, VariantHandle};
pub use defines::{
    DefineKey, DefineValue, GlobalFeatures, MaterialFeatures, PrimitiveFeatures, ShaderDefines,
};
pub use source::assemble_source;

/// Base identifiers of the built-in sources.
pub mod names {
    pub const PRIMITIVE_VERT: &str = "primitive.vert";
    pub const PBR_FRAG: &str = "pbr.frag";
    pub const FULLSCREEN_VERT: &str = "fullscreen.vert";
    pub const PANORAMA_TO_CUBEMAP_FRAG: &str = "panorama_to_cubemap.frag";
    pub const IBL_FILTERING_FRAG: &str = "ibl_filtering.frag";
    pub const BACKGROUND_FRAG: &str = "background.frag";
}
