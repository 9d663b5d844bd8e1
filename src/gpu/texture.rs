use std::cell::Cell;
use std::rc::Rc;

use super::{
    GraphicsContext, SamplerState, TextureDescriptor, TextureFormat, TextureId, TextureKind,
    TextureTarget, TextureUpload,
};
use crate::errors::{GlintError, Result};

/// An owned texture together with the metadata it was created with.
///
/// Destruction is explicit: GPU objects are not reclaimed by `Drop` because
/// releasing them needs the context.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuTexture {
    id: TextureId,
    kind: TextureKind,
    format: TextureFormat,
    width: u32,
    height: u32,
    mip_levels: u32,
}

impl GpuTexture {
    pub fn new(gl: &mut impl GraphicsContext, descriptor: &TextureDescriptor) -> Result<Self> {
        let id = gl.create_texture(descriptor)?;
        Ok(Self {
            id,
            kind: descriptor.kind,
            format: descriptor.format,
            width: descriptor.width,
            height: descriptor.height,
            mip_levels: descriptor.mip_levels,
        })
    }

    /// Creates a 2-D texture and uploads `image` into level 0.
    pub fn from_image(
        gl: &mut impl GraphicsContext,
        label: &'static str,
        image: &ImageData,
        sampler: SamplerState,
    ) -> Result<Self> {
        image.validate()?;
        let texture = Self::new(
            gl,
            &TextureDescriptor {
                label,
                kind: TextureKind::D2,
                format: image.format,
                width: image.width,
                height: image.height,
                mip_levels: 1,
                sampler,
            },
        )?;
        gl.upload_texture(
            texture.id,
            &TextureUpload {
                target: TextureTarget::D2,
                level: 0,
                width: image.width,
                height: image.height,
                data: &image.pixels,
            },
        );
        if sampler.min_filter == super::FilterMode::LinearMipmapLinear {
            gl.generate_mipmaps(texture.id);
        }
        Ok(texture)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn destroy(&self, gl: &mut impl GraphicsContext) {
        gl.delete_texture(self.id);
    }
}

/// A decoded image handed over by the external loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Tightly packed RGBA texels in `format`.
    pub pixels: Vec<u8>,
}

impl ImageData {
    #[must_use]
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            pixels,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * self.format.texel_size();
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(GlintError::InvalidResource(format!(
                "image {}x{} {:?} has {} bytes, expected {expected}",
                self.width,
                self.height,
                self.format,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// Shared slot for a texture handle that is filled once its image has loaded.
///
/// The loader keeps a clone and writes into it from its completion callback;
/// the renderer reads it at draw time. Both run on the same thread, so the
/// write always happens before the next frame's read.
#[derive(Debug, Clone, Default)]
pub struct TextureCell(Rc<Cell<Option<TextureId>>>);

impl TextureCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_texture(texture: TextureId) -> Self {
        Self(Rc::new(Cell::new(Some(texture))))
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<TextureId> {
        self.0.get()
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.0.get().is_some()
    }

    /// Stores `texture`, returning the handle it replaces.
    pub fn set(&self, texture: TextureId) -> Option<TextureId> {
        self.0.replace(Some(texture))
    }

    pub fn take(&self) -> Option<TextureId> {
        self.0.take()
    }

    /// Uploads `image` as a new 2-D texture and publishes it. A texture
    /// previously held by the cell is deleted.
    pub fn fill(
        &self,
        gl: &mut impl GraphicsContext,
        image: &ImageData,
        sampler: SamplerState,
    ) -> Result<()> {
        let texture = GpuTexture::from_image(gl, "Material Texture", image, sampler)?;
        if let Some(previous) = self.set(texture.id()) {
            gl.delete_texture(previous);
        }
        Ok(())
    }
}
