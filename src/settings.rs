//! Rendering Parameters
//!
//! Per-frame switches supplied by the host. Plain data with `Default` and
//! `serde` support so hosts can keep them in their own configuration files:
//!
//! ```rust,ignore
//! use glint::settings::{RenderingParameters, ToneMap};
//!
//! let params = RenderingParameters {
//!     tone_map: ToneMap::Aces,
//!     exposure: 1.5,
//!     ..Default::default()
//! };
//! ```

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::shader::{DefineKey, DefineValue, ShaderDefines};

/// Tone mapping operator applied in the fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToneMap {
    #[default]
    Linear,
    Uncharted,
    HejlRichard,
    Aces,
}

impl ToneMap {
    #[must_use]
    pub fn define_symbol(self) -> &'static str {
        match self {
            Self::Linear => "TONEMAP_LINEAR",
            Self::Uncharted => "TONEMAP_UNCHARTED",
            Self::HejlRichard => "TONEMAP_HEJL_RICHARD",
            Self::Aces => "TONEMAP_ACES",
        }
    }
}

/// Single channel written instead of the shaded color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebugOutput {
    #[default]
    None,
    Metallic,
    Roughness,
    Normal,
    WorldspaceNormal,
    GeometryNormal,
    Tangent,
    Bitangent,
    BaseColor,
    Occlusion,
    Emissive,
    Specular,
    Diffuse,
    Thickness,
    Clearcoat,
    Sheen,
    Subsurface,
    Transmission,
    F0,
    Alpha,
}

impl DebugOutput {
    #[must_use]
    pub fn define_symbol(self) -> &'static str {
        match self {
            Self::None => "DEBUG_NONE",
            Self::Metallic => "DEBUG_METALLIC",
            Self::Roughness => "DEBUG_ROUGHNESS",
            Self::Normal => "DEBUG_NORMAL",
            Self::WorldspaceNormal => "DEBUG_WORLDSPACE_NORMAL",
            Self::GeometryNormal => "DEBUG_GEOMETRY_NORMAL",
            Self::Tangent => "DEBUG_TANGENT",
            Self::Bitangent => "DEBUG_BITANGENT",
            Self::BaseColor => "DEBUG_BASECOLOR",
            Self::Occlusion => "DEBUG_OCCLUSION",
            Self::Emissive => "DEBUG_EMISSIVE",
            Self::Specular => "DEBUG_SPECULAR",
            Self::Diffuse => "DEBUG_DIFFUSE",
            Self::Thickness => "DEBUG_THICKNESS",
            Self::Clearcoat => "DEBUG_CLEARCOAT",
            Self::Sheen => "DEBUG_SHEEN",
            Self::Subsurface => "DEBUG_SUBSURFACE",
            Self::Transmission => "DEBUG_TRANSMISSION",
            Self::F0 => "DEBUG_F0",
            Self::Alpha => "DEBUG_ALPHA",
        }
    }
}

/// Host-controlled rendering switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderingParameters {
    /// Apply skins to primitives that carry joint data.
    pub skinning: bool,
    /// Apply morph targets to primitives that carry them.
    pub morphing: bool,
    /// Shade with the scene's punctual lights.
    pub use_punctual: bool,
    /// Shade with the environment's image based lighting.
    pub use_ibl: bool,
    pub tone_map: ToneMap,
    pub debug_output: DebugOutput,
    /// Linear multiplier applied before tone mapping.
    pub exposure: f32,
    /// Linear RGBA.
    pub clear_color: [f32; 4],
    /// Draw the environment cubemap behind the scene.
    pub environment_background: bool,
    /// Rotation of the environment around +Y.
    pub environment_rotation_degrees: f32,
    /// Mip level sampled for the background (0 is sharpest).
    pub background_blur: f32,
}

impl Default for RenderingParameters {
    fn default() -> Self {
        Self {
            skinning: true,
            morphing: true,
            use_punctual: true,
            use_ibl: true,
            tone_map: ToneMap::Linear,
            debug_output: DebugOutput::None,
            exposure: 1.0,
            clear_color: [0.2, 0.2, 0.2, 1.0],
            environment_background: false,
            environment_rotation_degrees: 0.0,
            background_blur: 0.0,
        }
    }
}

impl RenderingParameters {
    #[must_use]
    pub fn clear_color(&self) -> Vec4 {
        Vec4::from_array(self.clear_color)
    }

    /// Writes the tone mapping and debug channel defines.
    pub fn apply_to_defines(&self, defines: &mut ShaderDefines) {
        defines
            .set(DefineKey::ToneMap, DefineValue::Symbol(self.tone_map.define_symbol()))
            .set(DefineKey::Debug, DefineValue::Symbol(self.debug_output.define_symbol()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = RenderingParameters::default();
        assert!(params.use_ibl && params.use_punctual);
        assert_eq!(params.exposure, 1.0);
    }

    #[test]
    fn test_defines() {
        let params = RenderingParameters {
            tone_map: ToneMap::HejlRichard,
            debug_output: DebugOutput::WorldspaceNormal,
            ..Default::default()
        };
        let mut defines = ShaderDefines::new();
        params.apply_to_defines(&mut defines);
        assert_eq!(
            defines.get(DefineKey::ToneMap),
            Some(DefineValue::Symbol("TONEMAP_HEJL_RICHARD"))
        );
        assert_eq!(
            defines.get(DefineKey::Debug),
            Some(DefineValue::Symbol("DEBUG_WORLDSPACE_NORMAL"))
        );
    }
}
