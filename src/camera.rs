//! Camera selection and the user orbit camera.
//!
//! Gesture translation happens in the host; this module receives already
//! converted orbit / pan / zoom deltas.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};
use log::warn;

use crate::scene::Gltf;

/// Which camera a frame is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveCamera {
    #[default]
    User,
    /// Index into [`Gltf::cameras`].
    Scene(usize),
}

/// Resolved matrices of the camera used for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub position: Vec3,
}

impl CameraState {
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
            position: view.inverse().w_axis.truncate(),
        }
    }

    /// Inverse view-projection with the camera translation removed; maps NDC
    /// to world-space view directions.
    #[must_use]
    pub fn inverse_view_rotation_projection(&self) -> Mat4 {
        let mut view = self.view;
        view.w_axis = glam::Vec4::W;
        (self.projection * view).inverse()
    }
}

/// Orbit camera around a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Azimuth around +Y, radians.
    pub theta: f32,
    /// Polar angle from +Y, radians.
    pub phi: f32,
    /// Vertical field of view, radians.
    pub yfov: f32,
    pub znear: f32,
    pub zfar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_speed: f32,
}

impl Default for UserCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 3.0,
            theta: 0.0,
            phi: FRAC_PI_2,
            yfov: 45f32.to_radians(),
            znear: 0.01,
            zfar: 100.0,
            min_distance: 1e-3,
            max_distance: 1e5,
            zoom_speed: 0.05,
        }
    }
}

impl UserCamera {
    const PHI_EPS: f32 = 1e-4;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn offset_direction(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.target + self.offset_direction() * self.distance
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.yfov, aspect, self.znear, self.zfar)
    }

    /// Rotates around the target by the given angles in radians.
    pub fn orbit(&mut self, delta_theta: f32, delta_phi: f32) {
        self.theta = (self.theta + delta_theta) % (2.0 * PI);
        self.phi = (self.phi + delta_phi).clamp(Self::PHI_EPS, PI - Self::PHI_EPS);
    }

    /// Moves the target in the view plane. Deltas are fractions of the
    /// visible height at the target distance.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = -self.offset_direction();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let visible_height = 2.0 * self.distance * (0.5 * self.yfov).tan();
        self.target += (right * -delta_x + up * delta_y) * visible_height;
    }

    /// Positive `steps` move closer.
    pub fn zoom(&mut self, steps: f32) {
        let scale = (1.0 - self.zoom_speed).powf(steps);
        self.distance = (self.distance * scale).clamp(self.min_distance, self.max_distance);
    }

    /// Frames an axis-aligned box and adapts the clip planes to its size.
    pub fn fit_to_bounds(&mut self, min: Vec3, max: Vec3) {
        let radius = ((max - min).length() * 0.5).max(1e-4);
        self.target = (min + max) * 0.5;
        self.distance = radius / (0.5 * self.yfov).sin();
        self.znear = (self.distance - radius).max(radius * 1e-3);
        self.zfar = self.distance + radius * 10.0;
        self.max_distance = self.zfar;
        self.min_distance = radius * 1e-2;
    }

    #[must_use]
    pub fn state(&self, aspect: f32) -> CameraState {
        CameraState::new(self.view_matrix(), self.projection_matrix(aspect))
    }
}

/// Resolves the frame camera. A scene camera not placed by any reachable
/// node, or an index out of range, falls back to the user camera.
#[must_use]
pub fn resolve_camera(
    active: ActiveCamera,
    user: &UserCamera,
    gltf: &Gltf,
    reachable: &[usize],
    aspect: f32,
) -> CameraState {
    let ActiveCamera::Scene(index) = active else {
        return user.state(aspect);
    };
    let Some(camera) = gltf.cameras.get(index) else {
        warn!("camera index {index} out of range; using the user camera");
        return user.state(aspect);
    };
    let Some(node) = reachable
        .iter()
        .map(|&i| &gltf.nodes[i])
        .find(|node| node.camera == Some(index))
    else {
        warn!("camera {index} is not placed in the active scene; using the user camera");
        return user.state(aspect);
    };

    CameraState {
        view: node.inverse_world_matrix(),
        projection: camera.projection_matrix(aspect),
        view_projection: camera.projection_matrix(aspect) * node.inverse_world_matrix(),
        position: node.world_position(),
    }
}
