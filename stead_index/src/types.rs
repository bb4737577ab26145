// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::fmt::Debug;

/// Axis-aligned bounding box in 3D with inclusive bounds on every axis.
///
/// Coordinates address whole blocks, so a box with `min == max` on an axis
/// still spans one block there. A single-block box is valid and non-empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aabb3D<T> {
    /// Minimum x (west).
    pub min_x: T,
    /// Minimum y (bottom).
    pub min_y: T,
    /// Minimum z (north).
    pub min_z: T,
    /// Maximum x (east).
    pub max_x: T,
    /// Maximum y (top).
    pub max_y: T,
    /// Maximum z (south).
    pub max_z: T,
}

impl<T> Aabb3D<T> {
    /// Create a new AABB from already-ordered min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, min_z: T, max_x: T, max_y: T, max_z: T) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }
}

impl<T: Copy + Ord> Aabb3D<T> {
    /// Create an AABB from two arbitrary corner points.
    ///
    /// Each axis min/max is computed independently, so the order of the two
    /// corners is irrelevant: `from_corners(a, b) == from_corners(b, a)`.
    #[inline]
    pub fn from_corners(a: (T, T, T), b: (T, T, T)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            min_z: a.2.min(b.2),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
            max_z: a.2.max(b.2),
        }
    }

    /// Whether this AABB contains the point, inclusive on all axes.
    #[inline]
    pub fn contains_point(&self, x: T, y: T, z: T) -> bool {
        self.min_x <= x
            && x <= self.max_x
            && self.min_y <= y
            && y <= self.max_y
            && self.min_z <= z
            && z <= self.max_z
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Bounds are inclusive, so two AABBs that share a face, edge, or corner
    /// block are considered to overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }
}

impl<T: Scalar> Aabb3D<T> {
    /// Inclusive block count of the x/z footprint, in the widened
    /// accumulator type.
    ///
    /// The y extent does not contribute: a ground footprint of 5x4 blocks
    /// covers 20 blocks regardless of how tall the box is.
    #[inline]
    pub fn footprint_blocks(&self) -> T::Acc {
        let w = T::widen(self.max_x) - T::widen(self.min_x) + T::acc_one();
        let d = T::widen(self.max_z) - T::widen(self.min_z) + T::acc_one();
        T::acc_mul(w, d)
    }

    /// Inclusive block count of the full box, in the widened accumulator
    /// type.
    #[inline]
    pub fn volume_blocks(&self) -> T::Acc {
        let w = T::widen(self.max_x) - T::widen(self.min_x) + T::acc_one();
        let h = T::widen(self.max_y) - T::widen(self.min_y) + T::acc_one();
        let d = T::widen(self.max_z) - T::widen(self.min_z) + T::acc_one();
        T::acc_mul(T::acc_mul(w, h), d)
    }
}

/// Integer scalar abstraction for 3D AABBs used by backends.
///
/// Provides an associated widened accumulator type so block counts stay
/// exact for any valid box of the scalar type (`i32` counts fit `i128`
/// exactly; `i64` products beyond `i128` saturate instead of overflowing).
pub trait Scalar: Copy + Ord + Debug {
    /// Widened accumulator type suitable for block-count computations.
    type Acc: Copy
        + Ord
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + Debug;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// One in the accumulator type (inclusive bounds add one block per axis).
    fn acc_one() -> Self::Acc;

    /// Multiply two accumulator values, saturating instead of overflowing.
    ///
    /// A full-range extent is one past the scalar's own range, so products
    /// of extents need this guard even in the widened type.
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc;
}

impl Scalar for i32 {
    type Acc = i128;

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        Self::Acc::from(v)
    }

    #[inline(always)]
    fn acc_one() -> Self::Acc {
        1
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        Self::Acc::from(v)
    }

    #[inline(always)]
    fn acc_one() -> Self::Acc {
        1
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }
}

/// Helper alias for the widened accumulator type `Scalar::Acc` associated with a `T: Scalar`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

#[cfg(test)]
mod tests {
    use super::Aabb3D;

    #[test]
    fn from_corners_is_symmetric() {
        let a = (10, 64, -3);
        let b = (-2, 5, 17);
        assert_eq!(
            Aabb3D::from_corners(a, b),
            Aabb3D::from_corners(b, a),
            "corner order must not matter"
        );
        let aabb = Aabb3D::from_corners(a, b);
        assert_eq!(aabb, Aabb3D::new(-2, 5, -3, 10, 64, 17));
    }

    #[test]
    fn contains_is_inclusive_on_both_corners() {
        let aabb = Aabb3D::from_corners((0, 0, 0), (4, 3, 9));
        assert!(aabb.contains_point(0, 0, 0));
        assert!(aabb.contains_point(4, 3, 9));
        assert!(aabb.contains_point(2, 1, 5));
        assert!(!aabb.contains_point(5, 1, 5));
        assert!(!aabb.contains_point(2, -1, 5));
    }

    #[test]
    fn overlaps_is_symmetric_and_edge_inclusive() {
        let a = Aabb3D::from_corners((0, 0, 0), (10, 10, 10));
        let b = Aabb3D::from_corners((10, 0, 0), (20, 10, 10));
        let c = Aabb3D::from_corners((11, 0, 0), (20, 10, 10));
        assert!(a.overlaps(&b) && b.overlaps(&a), "shared face overlaps");
        assert!(!a.overlaps(&c) && !c.overlaps(&a), "disjoint x never overlaps");
        assert!(a.overlaps(&a), "identical boxes always overlap");
    }

    #[test]
    fn block_counts_are_inclusive() {
        // 5 blocks wide, 1 tall, 4 deep.
        let aabb = Aabb3D::<i32>::from_corners((0, 64, 0), (4, 64, 3));
        assert_eq!(aabb.footprint_blocks(), 20);
        assert_eq!(aabb.volume_blocks(), 20);

        // Single-block box.
        let unit = Aabb3D::<i32>::from_corners((7, 7, 7), (7, 7, 7));
        assert_eq!(unit.footprint_blocks(), 1);
        assert_eq!(unit.volume_blocks(), 1);
    }

    #[test]
    fn block_counts_widen_without_overflow() {
        let aabb = Aabb3D::<i32>::new(
            i32::MIN,
            i32::MIN,
            i32::MIN,
            i32::MAX,
            i32::MAX,
            i32::MAX,
        );
        // 2^32 blocks per axis; the footprint is 2^64 and the volume 2^96,
        // both exact in i128.
        let side = i128::from(i32::MAX) - i128::from(i32::MIN) + 1;
        assert_eq!(aabb.footprint_blocks(), side * side);
        assert_eq!(aabb.volume_blocks(), side * side * side);
    }

    #[test]
    fn i64_block_counts_saturate_instead_of_overflowing() {
        let aabb = Aabb3D::<i64>::new(i64::MIN, 0, i64::MIN, i64::MAX, 0, i64::MAX);
        assert_eq!(aabb.footprint_blocks(), i128::MAX);
        assert_eq!(aabb.volume_blocks(), i128::MAX);
    }
}
