use glam::Mat4;
use log::warn;

use super::accessor::{Accessor, ElementType};
use super::node::Node;
use crate::errors::{GlintError, Result};
use crate::gpu::ComponentType;

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: Option<String>,
    /// Joint node indices; `joints[i]` is joint `i` in the shader.
    joints: Vec<usize>,
    pub skeleton: Option<usize>,
    inverse_bind_matrices: Vec<Mat4>,

    // Per-frame output
    joint_matrices: Vec<Mat4>,
    joint_normal_matrices: Vec<Mat4>,
}

impl Skin {
    /// Missing inverse-bind matrices default to identity.
    #[must_use]
    pub fn new(joints: Vec<usize>, inverse_bind_matrices: Option<Vec<Mat4>>) -> Self {
        let count = joints.len();
        let mut ibm = inverse_bind_matrices.unwrap_or_default();
        ibm.resize(count, Mat4::IDENTITY);
        Self {
            name: None,
            joints,
            skeleton: None,
            inverse_bind_matrices: ibm,
            joint_matrices: vec![Mat4::IDENTITY; count],
            joint_normal_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    /// Decodes inverse-bind matrices from a `MAT4` float accessor.
    pub fn from_accessor(joints: Vec<usize>, accessor: &Accessor) -> Result<Self> {
        if accessor.element_type != ElementType::Mat4
            || accessor.component_type != ComponentType::F32
        {
            return Err(GlintError::InvalidResource(
                "inverse bind matrices must be MAT4 floats".to_string(),
            ));
        }
        let ibm = accessor
            .to_f32_vec()
            .chunks_exact(16)
            .map(Mat4::from_cols_slice)
            .collect();
        Ok(Self::new(joints, Some(ibm)))
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    /// Replaces the joint list. New joints get an identity inverse bind
    /// matrix; the per-frame outputs follow the new length.
    pub fn set_joints(&mut self, joints: Vec<usize>) {
        let count = joints.len();
        self.joints = joints;
        self.inverse_bind_matrices.resize(count, Mat4::IDENTITY);
        self.joint_matrices.resize(count, Mat4::IDENTITY);
        self.joint_normal_matrices.resize(count, Mat4::IDENTITY);
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    #[inline]
    #[must_use]
    pub fn joint_normal_matrices(&self) -> &[Mat4] {
        &self.joint_normal_matrices
    }

    /// Recomputes joint matrices for a skinned mesh on the node with inverse
    /// world matrix `inverse_node_world`:
    ///
    /// `joint = inverse(node world) * joint world * inverse bind`
    ///
    /// Joints referencing missing nodes keep their previous matrix.
    pub fn update(&mut self, inverse_node_world: Mat4, nodes: &[Node]) {
        for (i, &joint) in self.joints.iter().enumerate() {
            let Some(joint_node) = nodes.get(joint) else {
                warn!("skin joint {i} references missing node {joint}");
                continue;
            };
            let matrix = inverse_node_world * joint_node.world_matrix() * self.inverse_bind_matrices[i];
            self.joint_matrices[i] = matrix;
            self.joint_normal_matrices[i] = matrix.inverse().transpose();
        }
    }
}
