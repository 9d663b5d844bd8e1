//! Material description and its shader-facing features.
//!
//! Supported shading models: metallic-roughness (core), unlit, emissive
//! strength, clearcoat, sheen, transmission, IOR and specular.

use glam::{Vec3, Vec4};
use smallvec::SmallVec;

use crate::gpu::{GraphicsContext, UniformValue};
use crate::shader::{names, CompiledProgram, DefineKey, DefineValue, MaterialFeatures, ShaderDefines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    #[must_use]
    pub fn define_symbol(self) -> &'static str {
        match self {
            Self::Opaque => "ALPHAMODE_OPAQUE",
            Self::Mask => "ALPHAMODE_MASK",
            Self::Blend => "ALPHAMODE_BLEND",
        }
    }
}

/// The slot a texture fills in a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    BaseColor,
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
    Clearcoat,
    ClearcoatRoughness,
    ClearcoatNormal,
    SheenColor,
    SheenRoughness,
    Transmission,
    Specular,
    SpecularColor,
}

impl TextureRole {
    #[must_use]
    pub fn sampler_uniform(self) -> &'static str {
        match self {
            Self::BaseColor => "u_BaseColorSampler",
            Self::MetallicRoughness => "u_MetallicRoughnessSampler",
            Self::Normal => "u_NormalSampler",
            Self::Occlusion => "u_OcclusionSampler",
            Self::Emissive => "u_EmissiveSampler",
            Self::Clearcoat => "u_ClearcoatSampler",
            Self::ClearcoatRoughness => "u_ClearcoatRoughnessSampler",
            Self::ClearcoatNormal => "u_ClearcoatNormalSampler",
            Self::SheenColor => "u_SheenColorSampler",
            Self::SheenRoughness => "u_SheenRoughnessSampler",
            Self::Transmission => "u_TransmissionSampler",
            Self::Specular => "u_SpecularSampler",
            Self::SpecularColor => "u_SpecularColorSampler",
        }
    }

    #[must_use]
    pub fn uv_set_uniform(self) -> &'static str {
        match self {
            Self::BaseColor => "u_BaseColorUVSet",
            Self::MetallicRoughness => "u_MetallicRoughnessUVSet",
            Self::Normal => "u_NormalUVSet",
            Self::Occlusion => "u_OcclusionUVSet",
            Self::Emissive => "u_EmissiveUVSet",
            Self::Clearcoat => "u_ClearcoatUVSet",
            Self::ClearcoatRoughness => "u_ClearcoatRoughnessUVSet",
            Self::ClearcoatNormal => "u_ClearcoatNormalUVSet",
            Self::SheenColor => "u_SheenColorUVSet",
            Self::SheenRoughness => "u_SheenRoughnessUVSet",
            Self::Transmission => "u_TransmissionUVSet",
            Self::Specular => "u_SpecularUVSet",
            Self::SpecularColor => "u_SpecularColorUVSet",
        }
    }

    #[must_use]
    pub fn feature(self) -> MaterialFeatures {
        match self {
            Self::BaseColor => MaterialFeatures::HAS_BASE_COLOR_MAP,
            Self::MetallicRoughness => MaterialFeatures::HAS_METALLIC_ROUGHNESS_MAP,
            Self::Normal => MaterialFeatures::HAS_NORMAL_MAP,
            Self::Occlusion => MaterialFeatures::HAS_OCCLUSION_MAP,
            Self::Emissive => MaterialFeatures::HAS_EMISSIVE_MAP,
            Self::Clearcoat => MaterialFeatures::HAS_CLEARCOAT_MAP,
            Self::ClearcoatRoughness => MaterialFeatures::HAS_CLEARCOAT_ROUGHNESS_MAP,
            Self::ClearcoatNormal => MaterialFeatures::HAS_CLEARCOAT_NORMAL_MAP,
            Self::SheenColor => MaterialFeatures::HAS_SHEEN_COLOR_MAP,
            Self::SheenRoughness => MaterialFeatures::HAS_SHEEN_ROUGHNESS_MAP,
            Self::Transmission => MaterialFeatures::HAS_TRANSMISSION_MAP,
            Self::Specular => MaterialFeatures::HAS_SPECULAR_MAP,
            Self::SpecularColor => MaterialFeatures::HAS_SPECULAR_COLOR_MAP,
        }
    }
}

/// A texture reference with its UV set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub texture: usize,
    pub tex_coord: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialFactors {
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub alpha_cutoff: f32,
}

impl Default for MaterialFactors {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            metallic: 1.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            alpha_cutoff: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clearcoat {
    pub factor: f32,
    pub roughness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sheen {
    pub color: Vec3,
    pub roughness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specular {
    pub factor: f32,
    pub color: Vec3,
}

impl Default for Specular {
    fn default() -> Self {
        Self {
            factor: 1.0,
            color: Vec3::ONE,
        }
    }
}

/// Optional extension parameters. `None` means the extension is absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialExtensions {
    pub unlit: bool,
    pub emissive_strength: Option<f32>,
    pub clearcoat: Option<Clearcoat>,
    pub sheen: Option<Sheen>,
    pub transmission: Option<f32>,
    pub ior: Option<f32>,
    pub specular: Option<Specular>,
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: Option<String>,
    pub factors: MaterialFactors,
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
    pub textures: SmallVec<[(TextureRole, TextureRef); 4]>,
    pub extensions: MaterialExtensions,

    features: MaterialFeatures,
}

impl Material {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    #[must_use]
    pub fn with_texture(mut self, role: TextureRole, texture: usize, tex_coord: u32) -> Self {
        self.textures.push((role, TextureRef { texture, tex_coord }));
        self
    }

    /// Base identifier of the fragment shader.
    #[must_use]
    pub fn shader_identifier(&self) -> &'static str {
        names::PBR_FRAG
    }

    #[inline]
    #[must_use]
    pub fn features(&self) -> MaterialFeatures {
        self.features
    }

    /// Computes [`MaterialFeatures`] from the model and the texture slots.
    pub fn prepare(&mut self) {
        let ext = &self.extensions;
        let mut features = if ext.unlit {
            MaterialFeatures::MATERIAL_UNLIT
        } else {
            MaterialFeatures::MATERIAL_METALLICROUGHNESS
        };
        if ext.emissive_strength.is_some() {
            features |= MaterialFeatures::MATERIAL_EMISSIVE_STRENGTH;
        }
        if ext.clearcoat.is_some() {
            features |= MaterialFeatures::MATERIAL_CLEARCOAT;
        }
        if ext.sheen.is_some() {
            features |= MaterialFeatures::MATERIAL_SHEEN;
        }
        if ext.transmission.is_some() {
            features |= MaterialFeatures::MATERIAL_TRANSMISSION;
        }
        if ext.ior.is_some() {
            features |= MaterialFeatures::MATERIAL_IOR;
        }
        if ext.specular.is_some() {
            features |= MaterialFeatures::MATERIAL_SPECULAR;
        }
        for (role, _) in &self.textures {
            features |= role.feature();
        }
        self.features = features;
    }

    /// Material part of the fragment defines.
    #[must_use]
    pub fn defines(&self) -> ShaderDefines {
        let mut defines = ShaderDefines::new();
        defines.insert_material(self.features).set(
            DefineKey::AlphaMode,
            DefineValue::Symbol(self.alpha_mode.define_symbol()),
        );
        defines
    }

    /// Writes the scalar and vector factors.
    pub fn write_uniforms(&self, gl: &mut impl GraphicsContext, program: &CompiledProgram) {
        let f = &self.factors;
        let ext = &self.extensions;
        program.set_uniform(gl, "u_BaseColorFactor", UniformValue::Vec4(f.base_color));
        program.set_uniform(gl, "u_MetallicFactor", UniformValue::Float(f.metallic));
        program.set_uniform(gl, "u_RoughnessFactor", UniformValue::Float(f.roughness));
        program.set_uniform(gl, "u_EmissiveFactor", UniformValue::Vec3(f.emissive));
        program.set_uniform(gl, "u_NormalScale", UniformValue::Float(f.normal_scale));
        program.set_uniform(gl, "u_OcclusionStrength", UniformValue::Float(f.occlusion_strength));
        if self.alpha_mode == AlphaMode::Mask {
            program.set_uniform(gl, "u_AlphaCutoff", UniformValue::Float(f.alpha_cutoff));
        }

        if let Some(strength) = ext.emissive_strength {
            program.set_uniform(gl, "u_EmissiveStrength", UniformValue::Float(strength));
        }
        if let Some(clearcoat) = ext.clearcoat {
            program.set_uniform(gl, "u_ClearcoatFactor", UniformValue::Float(clearcoat.factor));
            program.set_uniform(
                gl,
                "u_ClearcoatRoughnessFactor",
                UniformValue::Float(clearcoat.roughness),
            );
        }
        if let Some(sheen) = ext.sheen {
            program.set_uniform(gl, "u_SheenColorFactor", UniformValue::Vec3(sheen.color));
            program.set_uniform(gl, "u_SheenRoughnessFactor", UniformValue::Float(sheen.roughness));
        }
        if let Some(transmission) = ext.transmission {
            program.set_uniform(gl, "u_TransmissionFactor", UniformValue::Float(transmission));
        }
        if let Some(ior) = ext.ior {
            program.set_uniform(gl, "u_Ior", UniformValue::Float(ior));
        }
        if let Some(specular) = ext.specular {
            program.set_uniform(gl, "u_SpecularFactor", UniformValue::Float(specular.factor));
            program.set_uniform(gl, "u_SpecularColorFactor", UniformValue::Vec3(specular.color));
        }
    }
}
