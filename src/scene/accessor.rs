use std::cell::Cell;

use glam::Vec3;

use crate::errors::{GlintError, Result};
use crate::gpu::{BufferId, BufferTarget, ComponentType, GraphicsContext, VertexLayout};

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// Typed view over tightly packed bytes, as resolved by the loader.
///
/// GPU buffers are created on first use, one per [`BufferTarget`], and live
/// until [`Accessor::destroy`].
#[derive(Debug, Clone)]
pub struct Accessor {
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    data: Vec<u8>,
    vertex_buffer: Cell<Option<BufferId>>,
    index_buffer: Cell<Option<BufferId>>,
}

impl Accessor {
    pub fn new(
        component_type: ComponentType,
        element_type: ElementType,
        count: usize,
        normalized: bool,
        data: Vec<u8>,
    ) -> Result<Self> {
        let accessor = Self {
            component_type,
            element_type,
            count,
            normalized,
            data,
            vertex_buffer: Cell::new(None),
            index_buffer: Cell::new(None),
        };
        let expected = accessor.element_size() * count;
        if accessor.data.len() != expected {
            return Err(GlintError::InvalidResource(format!(
                "accessor of {count} {element_type:?} has {} bytes, expected {expected}",
                accessor.data.len()
            )));
        }
        Ok(accessor)
    }

    /// Float accessor from a flat slice; `values.len()` must be a multiple of
    /// the element's component count.
    pub fn from_f32(element_type: ElementType, values: &[f32]) -> Result<Self> {
        let count = values.len() / element_type.components();
        Self::new(
            ComponentType::F32,
            element_type,
            count,
            false,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    pub fn from_u16(element_type: ElementType, values: &[u16]) -> Result<Self> {
        let count = values.len() / element_type.components();
        Self::new(
            ComponentType::U16,
            element_type,
            count,
            false,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    pub fn from_u32(element_type: ElementType, values: &[u32]) -> Result<Self> {
        let count = values.len() / element_type.components();
        Self::new(
            ComponentType::U32,
            element_type,
            count,
            false,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    #[inline]
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decodes every component to `f32`, applying normalization.
    #[must_use]
    pub fn to_f32_vec(&self) -> Vec<f32> {
        let d = &self.data;
        match self.component_type {
            ComponentType::F32 => d
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            ComponentType::U8 => d
                .iter()
                .map(|&v| self.scale(f32::from(v), 255.0))
                .collect(),
            ComponentType::I8 => d
                .iter()
                .map(|&v| self.scale(f32::from(v as i8), 127.0).max(-1.0))
                .collect(),
            ComponentType::U16 => d
                .chunks_exact(2)
                .map(|c| self.scale(f32::from(u16::from_le_bytes([c[0], c[1]])), 65535.0))
                .collect(),
            ComponentType::I16 => d
                .chunks_exact(2)
                .map(|c| {
                    self.scale(f32::from(i16::from_le_bytes([c[0], c[1]])), 32767.0)
                        .max(-1.0)
                })
                .collect(),
            ComponentType::U32 => d
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
                .collect(),
        }
    }

    fn scale(&self, value: f32, max: f32) -> f32 {
        if self.normalized { value / max } else { value }
    }

    /// Center of the axis-aligned bounds of a VEC3 accessor.
    #[must_use]
    pub fn bounds_center(&self) -> Option<Vec3> {
        if self.element_type != ElementType::Vec3 || self.count == 0 {
            return None;
        }
        let values = self.to_f32_vec();
        let (min, max) = values.chunks_exact(3).fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| {
                let p = Vec3::new(p[0], p[1], p[2]);
                (min.min(p), max.max(p))
            },
        );
        Some((min + max) * 0.5)
    }

    /// How the accessor is read as a vertex attribute.
    #[must_use]
    pub fn vertex_layout(&self) -> VertexLayout {
        VertexLayout {
            components: self.element_type.components() as u32,
            component_type: self.component_type,
            normalized: self.normalized,
            stride: 0,
            offset: 0,
        }
    }

    fn buffer_cell(&self, target: BufferTarget) -> &Cell<Option<BufferId>> {
        match target {
            BufferTarget::Vertex => &self.vertex_buffer,
            BufferTarget::Index => &self.index_buffer,
        }
    }

    /// Returns the GPU buffer for `target`, uploading the data on first call.
    pub fn gpu_buffer(&self, gl: &mut impl GraphicsContext, target: BufferTarget) -> Result<BufferId> {
        let cell = self.buffer_cell(target);
        if let Some(buffer) = cell.get() {
            return Ok(buffer);
        }
        let buffer = gl.create_buffer(target, &self.data)?;
        cell.set(Some(buffer));
        Ok(buffer)
    }

    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.get().is_some() || self.index_buffer.get().is_some()
    }

    pub fn destroy(&self, gl: &mut impl GraphicsContext) {
        for cell in [&self.vertex_buffer, &self.index_buffer] {
            if let Some(buffer) = cell.take() {
                gl.delete_buffer(buffer);
            }
        }
    }
}
