use half::f16;

use crate::errors::{GlintError, Result};
use crate::gpu::{ImageData, TextureFormat};

/// Decoded equirectangular HDR image, linear RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaImage {
    width: u32,
    height: u32,
    rgb: Vec<f32>,
}

impl PanoramaImage {
    /// `rgb` holds `width * height` tightly packed RGB texels.
    pub fn new(width: u32, height: u32, rgb: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || rgb.len() != expected {
            return Err(GlintError::InvalidResource(format!(
                "panorama {width}x{height} has {} floats, expected {expected}",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgba(&self) -> impl Iterator<Item = [f32; 4]> + '_ {
        self.rgb
            .chunks_exact(3)
            .map(|texel| [texel[0], texel[1], texel[2], 1.0])
    }

    /// Converts to an uploadable RGBA image. `Rgba8` clamps to [0, 1].
    #[must_use]
    pub fn to_image(&self, format: TextureFormat) -> ImageData {
        let pixels: Vec<u8> = match format {
            TextureFormat::Rgba32F => {
                let texels: Vec<[f32; 4]> = self.rgba().collect();
                bytemuck::cast_slice(&texels).to_vec()
            }
            TextureFormat::Rgba16F => {
                let halves: Vec<f16> = self.rgba().flatten().map(f16::from_f32).collect();
                bytemuck::cast_slice(&halves).to_vec()
            }
            TextureFormat::Rgba8 => self
                .rgba()
                .flatten()
                .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        };
        ImageData {
            width: self.width,
            height: self.height,
            format,
            pixels,
        }
    }
}
