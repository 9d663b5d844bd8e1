use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

impl LightType {
    /// Value of the `type` field in the shader's `Light` struct.
    #[must_use]
    pub fn shader_index(self) -> i32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Spot => 2,
        }
    }
}

/// A punctual light (`KHR_lights_punctual`).
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: Option<String>,
    pub kind: LightType,
    pub color: Vec3,
    pub intensity: f32,
    /// `None` means unlimited range.
    pub range: Option<f32>,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightType) -> Self {
        Self {
            name: None,
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            range: None,
            inner_cone_angle: 0.0,
            outer_cone_angle: std::f32::consts::FRAC_PI_4,
        }
    }

    /// Resolves the light placed by a node with world matrix `world`.
    #[must_use]
    pub fn to_uniform(&self, world: Mat4) -> LightUniform {
        LightUniform {
            direction: (world * Vec4::new(0.0, 0.0, -1.0, 0.0))
                .truncate()
                .normalize_or_zero(),
            range: self.range.unwrap_or(0.0),
            color: self.color,
            intensity: self.intensity,
            position: world.w_axis.truncate(),
            inner_cone_cos: self.inner_cone_angle.cos(),
            outer_cone_cos: self.outer_cone_angle.cos(),
            kind: self.kind.shader_index(),
        }
    }
}

/// World-space light as uploaded to `u_Lights[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniform {
    pub direction: Vec3,
    /// 0 means unlimited.
    pub range: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub inner_cone_cos: f32,
    pub outer_cone_cos: f32,
    pub kind: i32,
}
