use rustc_hash::FxHashSet;

use super::drawable::{self, Drawable};
use crate::scene::{AlphaMode, Gltf};

/// Summary of what a scene would draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub opaque_material_count: usize,
    pub transparent_material_count: usize,
}

impl SceneStatistics {
    /// Walks the same drawables a frame would draw for `scene` and `variant`.
    /// World transforms are not needed.
    #[must_use]
    pub fn compute(gltf: &Gltf, scene: Option<usize>, variant: Option<usize>) -> Self {
        let Some(scene) = gltf.active_scene(scene) else {
            return Self::default();
        };
        let reachable = gltf.reachable_nodes(scene);
        let mut drawables: Vec<Drawable> = Vec::new();
        drawable::flatten(gltf, &reachable, variant, &mut drawables);

        let mut meshes = FxHashSet::default();
        let mut opaque = FxHashSet::default();
        let mut transparent = FxHashSet::default();
        let mut triangle_count = 0;
        for drawable in &drawables {
            meshes.insert(drawable.mesh);
            let primitive = &gltf.meshes[drawable.mesh].primitives[drawable.primitive];
            triangle_count += primitive
                .mode
                .triangle_count(primitive.element_count(&gltf.accessors));
            if gltf.materials[drawable.material].alpha_mode == AlphaMode::Blend {
                transparent.insert(drawable.material);
            } else {
                opaque.insert(drawable.material);
            }
        }

        Self {
            mesh_count: meshes.len(),
            triangle_count,
            opaque_material_count: opaque.len(),
            transparent_material_count: transparent.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::Topology;
    use crate::scene::{Accessor, ElementType, Material, Mesh, Node, Primitive, Scene};

    #[test]
    fn test_counts() {
        let mut gltf = Gltf::new();
        gltf.accessors
            .push(Accessor::from_f32(ElementType::Vec3, &[0.0; 18]).unwrap());
        gltf.materials.push(Material::new());
        gltf.materials
            .push(Material::new().with_alpha_mode(AlphaMode::Blend));
        let mut strip = Primitive::new(0).with_material(1);
        strip.mode = Topology::TriangleStrip;
        gltf.meshes.push(Mesh::new(vec![
            Primitive::new(0).with_material(0),
            strip,
        ]));
        gltf.nodes = vec![Node::new().with_mesh(0).with_children(vec![1]), Node::new().with_mesh(0)];
        gltf.scenes.push(Scene {
            name: None,
            nodes: vec![0],
        });
        gltf.prepare();

        let stats = SceneStatistics::compute(&gltf, None, None);
        assert_eq!(stats.mesh_count, 1);
        // 6 vertices: 2 triangles as a list, 4 as a strip; two instances.
        assert_eq!(stats.triangle_count, 12);
        assert_eq!(stats.opaque_material_count, 1);
        assert_eq!(stats.transparent_material_count, 1);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(SceneStatistics::compute(&Gltf::new(), None, None), SceneStatistics::default());
    }
}
