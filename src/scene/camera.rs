use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        yfov: f32,
        /// Overrides the viewport aspect ratio when set.
        aspect_ratio: Option<f32>,
        znear: f32,
        /// `None` means an infinite far plane.
        zfar: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

/// A camera defined in the scene document. Its view comes from the node that
/// references it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: Option<String>,
    pub projection: Projection,
}

impl Camera {
    #[must_use]
    pub fn perspective(yfov: f32, znear: f32, zfar: Option<f32>) -> Self {
        Self {
            name: None,
            projection: Projection::Perspective {
                yfov,
                aspect_ratio: None,
                znear,
                zfar,
            },
        }
    }

    /// OpenGL clip-space projection for a viewport of `aspect`.
    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                yfov,
                aspect_ratio,
                znear,
                zfar,
            } => {
                let aspect = aspect_ratio.unwrap_or(aspect);
                match zfar {
                    Some(zfar) => Mat4::perspective_rh_gl(yfov, aspect, znear, zfar),
                    None => infinite_perspective_gl(yfov, aspect, znear),
                }
            }
            Projection::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            } => Mat4::orthographic_rh_gl(-xmag, xmag, -ymag, ymag, znear, zfar),
        }
    }
}

/// Right-handed infinite perspective with GL depth range `[-1, 1]`.
fn infinite_perspective_gl(yfov: f32, aspect: f32, znear: f32) -> Mat4 {
    let f = 1.0 / (0.5 * yfov).tan();
    Mat4::from_cols_array(&[
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, -1.0, -1.0,
        0.0, 0.0, -2.0 * znear, 0.0,
    ])
}
