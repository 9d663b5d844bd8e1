//! Texture unit assignment.
//!
//! Units are handed out explicitly instead of being bumped as a side effect of
//! bind calls. The layout for one draw is a pure function of the material's
//! texture count and the lighting toggles:
//!
//! ```text
//! [ material textures ... | environment (IBL) ... | punctual LUT ]
//! ```

use std::ops::Range;

/// Number of units the environment occupies when IBL is enabled:
/// Lambertian cube, GGX cube, GGX LUT, Charlie cube, Charlie LUT.
pub const ENVIRONMENT_TEXTURE_COUNT: u32 = 5;

/// Hands out consecutive texture units starting at 0.
#[derive(Debug, Clone)]
pub struct TextureSlotAllocator {
    next: u32,
    limit: u32,
}

impl TextureSlotAllocator {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self { next: 0, limit }
    }

    /// Returns the next free unit, or `None` once `limit` units are in use.
    pub fn allocate(&mut self) -> Option<u32> {
        if self.next >= self.limit {
            return None;
        }
        let unit = self.next;
        self.next += 1;
        Some(unit)
    }

    /// Reserves `count` consecutive units.
    pub fn allocate_range(&mut self, count: u32) -> Option<Range<u32>> {
        let end = self.next.checked_add(count)?;
        if end > self.limit {
            return None;
        }
        let range = self.next..end;
        self.next = end;
        Some(range)
    }

    /// Units handed out so far.
    #[inline]
    #[must_use]
    pub fn used(&self) -> u32 {
        self.next
    }
}

/// Unit layout of one draw call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    pub material: Range<u32>,
    pub environment: Option<Range<u32>>,
    pub punctual_lut: Option<u32>,
}

impl SlotPlan {
    /// Lays out units for `material_textures` material samplers followed by
    /// the environment block (when `ibl`) and the punctual LUT (when
    /// `punctual`). Returns `None` if the layout exceeds `limit` units.
    #[must_use]
    pub fn new(material_textures: u32, ibl: bool, punctual: bool, limit: u32) -> Option<Self> {
        let mut allocator = TextureSlotAllocator::new(limit);
        let material = allocator.allocate_range(material_textures)?;
        let environment = if ibl {
            Some(allocator.allocate_range(ENVIRONMENT_TEXTURE_COUNT)?)
        } else {
            None
        };
        let punctual_lut = if punctual {
            Some(allocator.allocate()?)
        } else {
            None
        };

        Some(Self {
            material,
            environment,
            punctual_lut,
        })
    }

    /// Total number of units used.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.punctual_lut.map_or_else(
            || {
                self.environment
                    .as_ref()
                    .map_or(self.material.end, |env| env.end)
            },
            |unit| unit + 1,
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_sequential() {
        let mut slots = TextureSlotAllocator::new(4);
        assert_eq!(slots.allocate(), Some(0));
        assert_eq!(slots.allocate_range(2), Some(1..3));
        assert_eq!(slots.allocate(), Some(3));
        assert_eq!(slots.allocate(), None);
        assert_eq!(slots.used(), 4);
    }

    #[test]
    fn test_plan_material_only() {
        let plan = SlotPlan::new(3, false, false, 16).unwrap();
        assert_eq!(plan.material, 0..3);
        assert_eq!(plan.environment, None);
        assert_eq!(plan.punctual_lut, None);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_plan_environment_follows_material() {
        let plan = SlotPlan::new(2, true, true, 16).unwrap();
        assert_eq!(plan.material, 0..2);
        assert_eq!(plan.environment, Some(2..7));
        assert_eq!(plan.punctual_lut, Some(7));
        assert_eq!(plan.len(), 8);
    }

    #[test]
    fn test_plan_punctual_without_ibl() {
        let plan = SlotPlan::new(0, false, true, 16).unwrap();
        assert_eq!(plan.punctual_lut, Some(0));
    }

    #[test]
    fn test_plan_over_limit() {
        assert!(SlotPlan::new(12, true, false, 16).is_none());
    }
}
