use glam::Mat3;

use crate::gpu::{GpuTexture, GraphicsContext, TextureId};

/// Prefiltered image based lighting data.
///
/// Produced once per panorama by [`IblSampler`](super::IblSampler), owned by
/// the host and only read while drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Diffuse irradiance cubemap (one level).
    pub lambertian: GpuTexture,
    /// Specular cubemap; mip `m` holds roughness `m / (mip_count - 1)`.
    pub ggx: GpuTexture,
    /// Sheen cubemap with the same mip layout as `ggx`.
    pub charlie: GpuTexture,
    pub ggx_lut: GpuTexture,
    pub charlie_lut: GpuTexture,
    /// Sheen albedo scaling LUT used with punctual lights, when supplied.
    pub sheen_e_lut: Option<GpuTexture>,
    pub mip_count: u32,
}

impl Environment {
    /// Sampler uniforms of the environment block, in texture unit order.
    pub const SAMPLER_UNIFORMS: [&'static str; 5] = [
        "u_LambertianEnvSampler",
        "u_GGXEnvSampler",
        "u_GGXLUT",
        "u_CharlieEnvSampler",
        "u_CharlieLUT",
    ];

    /// Textures matching [`Self::SAMPLER_UNIFORMS`].
    #[must_use]
    pub fn textures(&self) -> [TextureId; 5] {
        [
            self.lambertian.id(),
            self.ggx.id(),
            self.ggx_lut.id(),
            self.charlie.id(),
            self.charlie_lut.id(),
        ]
    }

    /// Rotation applied to every environment lookup.
    #[must_use]
    pub fn rotation(degrees: f32) -> Mat3 {
        Mat3::from_rotation_y(degrees.to_radians())
    }

    pub fn destroy(&self, gl: &mut impl GraphicsContext) {
        for texture in [
            &self.lambertian,
            &self.ggx,
            &self.charlie,
            &self.ggx_lut,
            &self.charlie_lut,
        ] {
            texture.destroy(gl);
        }
        if let Some(lut) = &self.sheen_e_lut {
            lut.destroy(gl);
        }
    }
}
