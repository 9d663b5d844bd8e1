use glam::Vec3;
use log::warn;
use smallvec::SmallVec;

use super::accessor::{Accessor, ElementType};
use crate::gpu::Topology;
use crate::shader::PrimitiveFeatures;

/// Morph targets are bound as extra vertex attributes; this is how many the
/// vertex shader declares per attribute kind.
pub const MAX_MORPH_TARGETS: usize = 4;

/// Vertex attribute semantic with its set index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
}

impl Semantic {
    /// Name of the matching `in` variable in the vertex shader.
    #[must_use]
    pub fn attribute_name(self) -> String {
        match self {
            Self::Position => "a_position".to_string(),
            Self::Normal => "a_normal".to_string(),
            Self::Tangent => "a_tangent".to_string(),
            Self::TexCoord(set) => format!("a_texcoord_{set}"),
            Self::Color(set) => format!("a_color_{set}"),
            Self::Joints(set) => format!("a_joints_{set}"),
            Self::Weights(set) => format!("a_weights_{set}"),
        }
    }
}

/// Displacements of one morph target, as accessor indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MorphTarget {
    pub position: Option<usize>,
    pub normal: Option<usize>,
    pub tangent: Option<usize>,
}

/// Material used when one of `variants` is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialMapping {
    pub material: usize,
    pub variants: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub attributes: SmallVec<[(Semantic, usize); 8]>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Topology,
    pub targets: Vec<MorphTarget>,
    pub mappings: Vec<MaterialMapping>,
    /// Set at load for primitives that cannot be drawn.
    pub skip: bool,

    features: PrimitiveFeatures,
    centroid: Vec3,
}

impl Primitive {
    #[must_use]
    pub fn new(position: usize) -> Self {
        let mut primitive = Self::default();
        primitive.attributes.push((Semantic::Position, position));
        primitive
    }

    #[must_use]
    pub fn with_attribute(mut self, semantic: Semantic, accessor: usize) -> Self {
        self.attributes.push((semantic, accessor));
        self
    }

    #[must_use]
    pub fn with_indices(mut self, accessor: usize) -> Self {
        self.indices = Some(accessor);
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn attribute(&self, semantic: Semantic) -> Option<usize> {
        self.attributes
            .iter()
            .find_map(|&(s, accessor)| (s == semantic).then_some(accessor))
    }

    #[inline]
    #[must_use]
    pub fn features(&self) -> PrimitiveFeatures {
        self.features
    }

    /// World-space centroid is `node_world * centroid`.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Material in effect for the active variant, falling back to the default
    /// material when no mapping lists the variant.
    #[must_use]
    pub fn effective_material(&self, variant: Option<usize>) -> Option<usize> {
        variant
            .and_then(|v| {
                self.mappings
                    .iter()
                    .find(|mapping| mapping.variants.contains(&v))
                    .map(|mapping| mapping.material)
            })
            .or(self.material)
    }

    /// Number of vertices (or indices) a draw consumes.
    #[must_use]
    pub fn element_count(&self, accessors: &[Accessor]) -> usize {
        self.indices
            .or_else(|| self.attribute(Semantic::Position))
            .and_then(|i| accessors.get(i))
            .map_or(0, |a| a.count)
    }

    /// Computes features and centroid from the referenced accessors. A
    /// primitive whose position data is missing is marked `skip`.
    pub fn prepare(&mut self, accessors: &[Accessor]) {
        let mut features = PrimitiveFeatures::empty();

        for &(semantic, index) in &self.attributes {
            let Some(accessor) = accessors.get(index) else {
                warn!("primitive attribute {semantic:?} references missing accessor {index}");
                continue;
            };
            features |= match semantic {
                Semantic::Normal => PrimitiveFeatures::HAS_NORMAL_VEC3,
                Semantic::Tangent => PrimitiveFeatures::HAS_TANGENT_VEC4,
                Semantic::TexCoord(0) => PrimitiveFeatures::HAS_TEXCOORD_0_VEC2,
                Semantic::TexCoord(1) => PrimitiveFeatures::HAS_TEXCOORD_1_VEC2,
                Semantic::Color(0) if accessor.element_type == ElementType::Vec3 => {
                    PrimitiveFeatures::HAS_COLOR_0_VEC3
                }
                Semantic::Color(0) => PrimitiveFeatures::HAS_COLOR_0_VEC4,
                Semantic::Joints(0) => PrimitiveFeatures::HAS_JOINTS_0_VEC4,
                Semantic::Joints(1) => PrimitiveFeatures::HAS_JOINTS_1_VEC4,
                Semantic::Weights(0) => PrimitiveFeatures::HAS_WEIGHTS_0_VEC4,
                Semantic::Weights(1) => PrimitiveFeatures::HAS_WEIGHTS_1_VEC4,
                _ => PrimitiveFeatures::empty(),
            };
        }

        for target in self.targets.iter().take(MAX_MORPH_TARGETS) {
            if target.position.is_some() {
                features |= PrimitiveFeatures::HAS_TARGET_POSITION;
            }
            if target.normal.is_some() {
                features |= PrimitiveFeatures::HAS_TARGET_NORMAL;
            }
            if target.tangent.is_some() {
                features |= PrimitiveFeatures::HAS_TARGET_TANGENT;
            }
        }
        self.features = features;

        match self
            .attribute(Semantic::Position)
            .and_then(|i| accessors.get(i))
            .and_then(Accessor::bounds_center)
        {
            Some(center) => self.centroid = center,
            None => {
                warn!("primitive has no usable POSITION data; it will not be drawn");
                self.skip = true;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    /// Default morph weights.
    pub weights: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            name: None,
            primitives,
            weights: Vec::new(),
        }
    }
}
