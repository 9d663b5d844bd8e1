//! Shader Define Sets
//!
//! Feature flags are typed bitsets instead of free-form strings. A primitive
//! computes its [`PrimitiveFeatures`] once at load time from the attributes it
//! carries, a material does the same for [`MaterialFeatures`], and the frame
//! orchestrator unions both with the [`GlobalFeatures`] toggled by the
//! rendering parameters.
//!
//! Valued defines (light count, joint count, tone mapping, ...) are keyed by
//! [`DefineKey`]. Because every component of a [`ShaderDefines`] is stored in a
//! canonical form, two sets built in different insertion orders compare and
//! hash equal.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

bitflags! {
    /// Vertex data present on a primitive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PrimitiveFeatures: u32 {
        const HAS_NORMAL_VEC3 = 1 << 0;
        const HAS_TANGENT_VEC4 = 1 << 1;
        const HAS_TEXCOORD_0_VEC2 = 1 << 2;
        const HAS_TEXCOORD_1_VEC2 = 1 << 3;
        const HAS_COLOR_0_VEC3 = 1 << 4;
        const HAS_COLOR_0_VEC4 = 1 << 5;
        const HAS_JOINTS_0_VEC4 = 1 << 6;
        const HAS_JOINTS_1_VEC4 = 1 << 7;
        const HAS_WEIGHTS_0_VEC4 = 1 << 8;
        const HAS_WEIGHTS_1_VEC4 = 1 << 9;
        const HAS_TARGET_POSITION = 1 << 10;
        const HAS_TARGET_NORMAL = 1 << 11;
        const HAS_TARGET_TANGENT = 1 << 12;
    }
}

impl PrimitiveFeatures {
    /// Flags that require skinning to be active.
    pub const SKINNING: Self = Self::HAS_JOINTS_0_VEC4
        .union(Self::HAS_JOINTS_1_VEC4)
        .union(Self::HAS_WEIGHTS_0_VEC4)
        .union(Self::HAS_WEIGHTS_1_VEC4);

    /// Flags that require morphing to be active.
    pub const MORPHING: Self = Self::HAS_TARGET_POSITION
        .union(Self::HAS_TARGET_NORMAL)
        .union(Self::HAS_TARGET_TANGENT);
}

bitflags! {
    /// Shading model and texture usage of a material.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFeatures: u32 {
        const MATERIAL_METALLICROUGHNESS = 1 << 0;
        const MATERIAL_UNLIT = 1 << 1;
        const MATERIAL_EMISSIVE_STRENGTH = 1 << 2;
        const MATERIAL_CLEARCOAT = 1 << 3;
        const MATERIAL_SHEEN = 1 << 4;
        const MATERIAL_TRANSMISSION = 1 << 5;
        const MATERIAL_IOR = 1 << 6;
        const MATERIAL_SPECULAR = 1 << 7;

        const HAS_BASE_COLOR_MAP = 1 << 8;
        const HAS_METALLIC_ROUGHNESS_MAP = 1 << 9;
        const HAS_NORMAL_MAP = 1 << 10;
        const HAS_OCCLUSION_MAP = 1 << 11;
        const HAS_EMISSIVE_MAP = 1 << 12;
        const HAS_CLEARCOAT_MAP = 1 << 13;
        const HAS_CLEARCOAT_ROUGHNESS_MAP = 1 << 14;
        const HAS_CLEARCOAT_NORMAL_MAP = 1 << 15;
        const HAS_SHEEN_COLOR_MAP = 1 << 16;
        const HAS_SHEEN_ROUGHNESS_MAP = 1 << 17;
        const HAS_TRANSMISSION_MAP = 1 << 18;
        const HAS_SPECULAR_MAP = 1 << 19;
        const HAS_SPECULAR_COLOR_MAP = 1 << 20;
    }
}

bitflags! {
    /// Frame-wide switches derived from the rendering parameters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlobalFeatures: u32 {
        const USE_SKINNING = 1 << 0;
        const USE_MORPHING = 1 << 1;
        const USE_PUNCTUAL = 1 << 2;
        const USE_IBL = 1 << 3;
    }
}

/// Keys of defines that carry a value other than `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefineKey {
    LightCount,
    JointCount,
    WeightCount,
    AlphaMode,
    ToneMap,
    Debug,
}

impl DefineKey {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LightCount => "LIGHT_COUNT",
            Self::JointCount => "JOINT_COUNT",
            Self::WeightCount => "WEIGHT_COUNT",
            Self::AlphaMode => "ALPHAMODE",
            Self::ToneMap => "TONEMAP",
            Self::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefineValue {
    Int(u32),
    /// Another macro name, e.g. `ALPHAMODE_BLEND`.
    Symbol(&'static str),
}

impl fmt::Display for DefineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Symbol(s) => f.write_str(s),
        }
    }
}

/// A canonical set of shader defines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDefines {
    primitive: PrimitiveFeatures,
    material: MaterialFeatures,
    global: GlobalFeatures,
    /// Sorted by key.
    values: SmallVec<[(DefineKey, DefineValue); 6]>,
}

impl ShaderDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_primitive(&mut self, flags: PrimitiveFeatures) -> &mut Self {
        self.primitive |= flags;
        self
    }

    pub fn insert_material(&mut self, flags: MaterialFeatures) -> &mut Self {
        self.material |= flags;
        self
    }

    pub fn insert_global(&mut self, flags: GlobalFeatures) -> &mut Self {
        self.global |= flags;
        self
    }

    /// Sets a valued define, replacing any previous value for `key`.
    pub fn set(&mut self, key: DefineKey, value: DefineValue) -> &mut Self {
        match self.values.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => self.values[idx].1 = value,
            Err(idx) => self.values.insert(idx, (key, value)),
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: DefineKey) -> Option<DefineValue> {
        self.values
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|idx| self.values[idx].1)
    }

    #[inline]
    #[must_use]
    pub fn primitive(&self) -> PrimitiveFeatures {
        self.primitive
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> MaterialFeatures {
        self.material
    }

    #[inline]
    #[must_use]
    pub fn global(&self) -> GlobalFeatures {
        self.global
    }

    /// Returns `true` if a flag or valued define named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries().any(|(key, _)| key == name)
    }

    /// Unions flags and overrides valued defines with those of `other`.
    pub fn merge(&mut self, other: &ShaderDefines) {
        self.primitive |= other.primitive;
        self.material |= other.material;
        self.global |= other.global;
        for &(key, value) in &other.values {
            self.set(key, value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        (self.primitive.bits().count_ones()
            + self.material.bits().count_ones()
            + self.global.bits().count_ones()) as usize
            + self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All defines in canonical order: primitive flags, material flags and
    /// global flags (each in bit order), then valued defines by key.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, DefineValue)> + '_ {
        self.primitive
            .iter_names()
            .map(|(name, _)| name)
            .chain(self.material.iter_names().map(|(name, _)| name))
            .chain(self.global.iter_names().map(|(name, _)| name))
            .map(|name| (name, DefineValue::Int(1)))
            .chain(self.values.iter().map(|&(k, v)| (k.name(), v)))
    }

    /// Appends one `#define NAME VALUE` line per entry.
    pub fn write_lines(&self, out: &mut String) {
        use std::fmt::Write;
        for (name, value) in self.entries() {
            let _ = writeln!(out, "#define {name} {value}");
        }
    }
}
