//! Scene Model
//!
//! The in-memory document an external glTF loader produces:
//! - [`Node`]: transform hierarchy with per-frame world matrices
//! - [`Mesh`] / [`Primitive`]: geometry referencing [`Accessor`]s
//! - [`Material`] / [`Texture`]: shading inputs
//! - [`Skin`], [`Camera`], [`Light`]
//!
//! Entities reference each other by index into the [`Gltf`] collections.
//! Out-of-range indices are tolerated: they are logged and skipped where
//! they are used.

pub mod accessor;
pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod skin;
pub mod texture;

pub use accessor::{Accessor, ElementType};
pub use camera::{Camera, Projection};
pub use light::{Light, LightType, LightUniform};
pub use material::{
    AlphaMode, Clearcoat, Material, MaterialExtensions, MaterialFactors, Sheen, Specular,
    TextureRef, TextureRole,
};
pub use mesh::{MaterialMapping, Mesh, MorphTarget, Primitive, Semantic, MAX_MORPH_TARGETS};
pub use node::{LocalTransform, Node};
pub use skin::Skin;
pub use texture::Texture;

use glam::{Mat4, Vec3};
use log::warn;

use crate::gpu::GraphicsContext;

/// Root nodes of one scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

/// A loaded glTF document.
#[derive(Debug, Clone, Default)]
pub struct Gltf {
    pub nodes: Vec<Node>,
    pub scenes: Vec<Scene>,
    /// Default scene index.
    pub scene: Option<usize>,
    pub meshes: Vec<Mesh>,
    pub accessors: Vec<Accessor>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub skins: Vec<Skin>,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    /// `KHR_materials_variants` names.
    pub variants: Vec<String>,
}

impl Gltf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes load-time data: primitive features and centroids, material
    /// features. Call once after the loader has filled the collections.
    pub fn prepare(&mut self) {
        for mesh in &mut self.meshes {
            for primitive in &mut mesh.primitives {
                primitive.prepare(&self.accessors);
            }
        }
        for material in &mut self.materials {
            material.prepare();
        }
    }

    /// The scene to render: `index` when valid, else the default scene, else
    /// the first one.
    #[must_use]
    pub fn active_scene(&self, index: Option<usize>) -> Option<&Scene> {
        index
            .and_then(|i| self.scenes.get(i))
            .or_else(|| self.scene.and_then(|i| self.scenes.get(i)))
            .or_else(|| self.scenes.first())
    }

    /// Nodes reachable from the scene roots, in depth-first pre-order. Each
    /// node is visited once even if referenced twice.
    #[must_use]
    pub fn reachable_nodes(&self, scene: &Scene) -> Vec<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = scene.nodes.iter().rev().copied().collect();

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                warn!("scene references missing node {index}");
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            order.push(index);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Recomputes world, inverse world and normal matrices for every node
    /// reachable from `scene`.
    pub fn update_world_transforms(&mut self, scene: &Scene) {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> =
            scene.nodes.iter().map(|&root| (root, Mat4::IDENTITY)).collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(index) else {
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let world = parent * node.transform.matrix();
            node.set_world_matrix(world);
            stack.extend(node.children.iter().map(|&child| (child, world)));
        }
    }

    /// Updates every skin used by a reachable node that also has a mesh.
    pub fn update_skins(&mut self, reachable: &[usize]) {
        for &index in reachable {
            let node = &self.nodes[index];
            let (Some(_), Some(skin)) = (node.mesh, node.skin) else {
                continue;
            };
            let inverse_world = node.inverse_world_matrix();
            match self.skins.get_mut(skin) {
                Some(skin) => skin.update(inverse_world, &self.nodes),
                None => warn!("node {index} references missing skin {skin}"),
            }
        }
    }

    /// World-space bounds of all reachable mesh geometry.
    #[must_use]
    pub fn world_bounds(&self, reachable: &[usize]) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        for &index in reachable {
            let node = &self.nodes[index];
            let Some(mesh) = node.mesh.and_then(|m| self.meshes.get(m)) else {
                continue;
            };
            for primitive in &mesh.primitives {
                let Some(position) = primitive
                    .attribute(Semantic::Position)
                    .and_then(|a| self.accessors.get(a))
                else {
                    continue;
                };
                for p in position.to_f32_vec().chunks_exact(3) {
                    let p = node.world_matrix().transform_point3(Vec3::new(p[0], p[1], p[2]));
                    bounds = Some(match bounds {
                        Some((min, max)) => (min.min(p), max.max(p)),
                        None => (p, p),
                    });
                }
            }
        }
        bounds
    }

    /// Releases accessor buffers and loaded textures. Safe to call more than
    /// once.
    pub fn destroy(&mut self, gl: &mut impl GraphicsContext) {
        for accessor in &self.accessors {
            accessor.destroy(gl);
        }
        for texture in &self.textures {
            texture.destroy(gl);
        }
    }
}
