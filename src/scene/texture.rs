use crate::gpu::{GraphicsContext, SamplerState, TextureCell, TextureId};

/// A texture as referenced by materials: image source plus sampling state.
///
/// The GPU handle arrives asynchronously through [`TextureCell`]; until the
/// loader fills it, materials using this texture cannot be drawn.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub name: Option<String>,
    /// Index of the image in the source document, kept for loaders.
    pub source: Option<usize>,
    pub sampler: SamplerState,
    cell: TextureCell,
}

impl Texture {
    #[must_use]
    pub fn new(sampler: SamplerState) -> Self {
        Self {
            sampler,
            ..Self::default()
        }
    }

    /// A texture whose GPU handle is already known.
    #[must_use]
    pub fn loaded(texture: TextureId, sampler: SamplerState) -> Self {
        Self {
            sampler,
            cell: TextureCell::with_texture(texture),
            ..Self::default()
        }
    }

    /// The shared cell a loader writes into.
    #[must_use]
    pub fn cell(&self) -> &TextureCell {
        &self.cell
    }

    #[inline]
    #[must_use]
    pub fn gpu_texture(&self) -> Option<TextureId> {
        self.cell.get()
    }

    pub fn destroy(&self, gl: &mut impl GraphicsContext) {
        if let Some(texture) = self.cell.take() {
            gl.delete_texture(texture);
        }
    }
}
