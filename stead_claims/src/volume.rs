// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Claim volumes: a world identifier plus a normalized bounding box.

use stead_index::Aabb3D;

/// An axis-aligned claim volume bound to one world.
///
/// Normalized at construction: each axis min/max is computed independently
/// from the two corner points, so corner order never matters. Immutable
/// after construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Volume {
    world: String,
    aabb: Aabb3D<i32>,
}

impl Volume {
    /// Create a volume from two arbitrary corner blocks in a world.
    pub fn from_corners(
        world: impl Into<String>,
        a: (i32, i32, i32),
        b: (i32, i32, i32),
    ) -> Self {
        Self {
            world: world.into(),
            aabb: Aabb3D::from_corners(a, b),
        }
    }

    /// Create a volume from an already-normalized box in a world.
    pub fn new(world: impl Into<String>, aabb: Aabb3D<i32>) -> Self {
        debug_assert!(
            aabb.min_x <= aabb.max_x && aabb.min_y <= aabb.max_y && aabb.min_z <= aabb.max_z,
            "volume bounds must be normalized"
        );
        Self {
            world: world.into(),
            aabb,
        }
    }

    /// The world this volume lies in.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// The normalized bounding box.
    pub fn aabb(&self) -> Aabb3D<i32> {
        self.aabb
    }

    /// Whether the block lies within the volume.
    ///
    /// The world identifier is compared case-sensitively; bounds are
    /// inclusive on all three axes.
    pub fn contains(&self, world: &str, x: i32, y: i32, z: i32) -> bool {
        self.world == world && self.aabb.contains_point(x, y, z)
    }

    /// Whether this volume overlaps another.
    ///
    /// Volumes in different worlds never overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.world == other.world && self.aabb.overlaps(&other.aabb)
    }

    /// Claim-block cost of this volume: the inclusive block count of its
    /// x/z footprint. The y extent is free.
    pub fn footprint_blocks(&self) -> u64 {
        // Nonnegative by the normalization invariant; counts past u64 range
        // (a near-world-spanning box) saturate.
        u64::try_from(self.aabb.footprint_blocks()).unwrap_or(u64::MAX)
    }

    /// Inclusive block count of the full box, used as the specificity
    /// tie-break in point queries.
    pub fn volume_blocks(&self) -> u64 {
        u64::try_from(self.aabb.volume_blocks()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::Volume;

    #[test]
    fn construction_is_corner_symmetric() {
        let a = Volume::from_corners("overworld", (10, 64, -3), (-2, 5, 17));
        let b = Volume::from_corners("overworld", (-2, 5, 17), (10, 64, -3));
        assert_eq!(a, b);
    }

    #[test]
    fn contains_checks_world_and_corners() {
        let v = Volume::from_corners("overworld", (0, 0, 0), (4, 3, 9));
        assert!(v.contains("overworld", 0, 0, 0));
        assert!(v.contains("overworld", 4, 3, 9));
        assert!(!v.contains("nether", 2, 1, 5), "world ids are exact");
        assert!(!v.contains("Overworld", 2, 1, 5), "comparison is case-sensitive");
    }

    #[test]
    fn overlap_requires_same_world() {
        let a = Volume::from_corners("overworld", (0, 0, 0), (10, 10, 10));
        let b = Volume::from_corners("nether", (0, 0, 0), (10, 10, 10));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&a.clone()));
    }

    #[test]
    fn footprint_matches_ground_area() {
        // 5 blocks along x, 4 along z, 1 tall.
        let v = Volume::from_corners("overworld", (0, 64, 0), (4, 64, 3));
        assert_eq!(v.footprint_blocks(), 20);
        assert_eq!(v.volume_blocks(), 20);

        // Height does not change the cost.
        let tall = Volume::from_corners("overworld", (0, 0, 0), (4, 255, 3));
        assert_eq!(tall.footprint_blocks(), 20);
    }

    #[test]
    fn world_spanning_volumes_saturate_the_block_count() {
        let v = Volume::from_corners(
            "overworld",
            (i32::MIN, 0, i32::MIN),
            (i32::MAX, 0, i32::MAX),
        );
        // The exact footprint is 2^64, one past u64::MAX.
        assert_eq!(v.footprint_blocks(), u64::MAX);
    }
}
