//! Per-frame drawable list: flatten, partition, sort.

use std::cmp::Ordering;

use glam::Vec3;
use log::warn;

use crate::scene::{AlphaMode, Gltf};

/// One primitive of one node, rebuilt every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawable {
    pub node: usize,
    pub mesh: usize,
    pub primitive: usize,
    /// Effective material after variant resolution.
    pub material: usize,
}

impl Drawable {
    /// World-space centroid of the primitive.
    #[must_use]
    pub fn world_centroid(&self, gltf: &Gltf) -> Vec3 {
        let centroid = gltf.meshes[self.mesh].primitives[self.primitive].centroid();
        gltf.nodes[self.node]
            .world_matrix()
            .transform_point3(centroid)
    }
}

/// Appends one drawable per primitive of every reachable node with a mesh.
/// Primitives without a (valid) material and primitives marked `skip` are
/// dropped.
pub fn flatten(gltf: &Gltf, reachable: &[usize], variant: Option<usize>, out: &mut Vec<Drawable>) {
    for &node_index in reachable {
        let Some(mesh_index) = gltf.nodes[node_index].mesh else {
            continue;
        };
        let Some(mesh) = gltf.meshes.get(mesh_index) else {
            warn!("node {node_index} references missing mesh {mesh_index}");
            continue;
        };
        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            if primitive.skip {
                continue;
            }
            let Some(material) = primitive.effective_material(variant) else {
                continue;
            };
            if material >= gltf.materials.len() {
                warn!("primitive references missing material {material}");
                continue;
            }
            out.push(Drawable {
                node: node_index,
                mesh: mesh_index,
                primitive: primitive_index,
                material,
            });
        }
    }
}

/// Splits `drawables` into opaque (`Opaque` and `Mask`) and blended,
/// preserving order within each group.
pub fn partition(
    gltf: &Gltf,
    drawables: &[Drawable],
    opaque: &mut Vec<Drawable>,
    blended: &mut Vec<Drawable>,
) {
    for drawable in drawables {
        if gltf.materials[drawable.material].alpha_mode == AlphaMode::Blend {
            blended.push(*drawable);
        } else {
            opaque.push(*drawable);
        }
    }
}

/// Orders by descending distance from `camera_position` to the world
/// centroid. The sort is stable, so equal distances keep flattening order.
pub fn sort_back_to_front(gltf: &Gltf, camera_position: Vec3, drawables: &mut [Drawable]) {
    drawables.sort_by_cached_key(|drawable| {
        let distance = drawable.world_centroid(gltf).distance(camera_position);
        std::cmp::Reverse(OrderedDistance(distance))
    });
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedDistance(f32);

impl Eq for OrderedDistance {}

impl PartialOrd for OrderedDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
