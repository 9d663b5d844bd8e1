use glam::{Mat4, Quat, Vec3};

/// Local transform as authored: either a full matrix or TRS components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalTransform {
    Matrix(Mat4),
    Trs {
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::Trs {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl LocalTransform {
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Matrix(m) => m,
            Self::Trs {
                translation,
                rotation,
                scale,
            } => Mat4::from_scale_rotation_translation(scale, rotation, translation),
        }
    }
}

/// A scene graph node. References are indices into the owning
/// [`Gltf`](super::Gltf) collections.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    pub transform: LocalTransform,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub camera: Option<usize>,
    pub light: Option<usize>,
    /// Morph weights overriding the mesh defaults.
    pub weights: Option<Vec<f32>>,

    // Per-frame caches
    pub(crate) world: Mat4,
    pub(crate) inverse_world: Mat4,
    pub(crate) normal_matrix: Mat4,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: Mat4::IDENTITY,
            inverse_world: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: LocalTransform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<usize>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_skin(mut self, skin: usize) -> Self {
        self.skin = Some(skin);
        self
    }

    #[must_use]
    pub fn with_camera(mut self, camera: usize) -> Self {
        self.camera = Some(camera);
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: usize) -> Self {
        self.light = Some(light);
        self
    }

    /// Stores the world matrix and derives its inverse and normal matrix.
    pub fn set_world_matrix(&mut self, world: Mat4) {
        self.world = world;
        self.inverse_world = world.inverse();
        self.normal_matrix = self.inverse_world.transpose();
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    #[inline]
    #[must_use]
    pub fn inverse_world_matrix(&self) -> Mat4 {
        self.inverse_world
    }

    /// Inverse-transpose of the world matrix.
    #[inline]
    #[must_use]
    pub fn normal_matrix(&self) -> Mat4 {
        self.normal_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trs_matrix() {
        let t = LocalTransform::Trs {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };
        let m = t.matrix();
        assert_eq!(m.transform_point3(Vec3::ONE), Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_normal_matrix_is_inverse_transpose() {
        let mut node = Node::new();
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        node.set_world_matrix(world);
        assert!(node
            .normal_matrix()
            .abs_diff_eq(world.inverse().transpose(), 1e-6));
        assert_eq!(node.world_position(), Vec3::ZERO);
    }
}
