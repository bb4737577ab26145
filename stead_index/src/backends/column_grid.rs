// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform column grid backend for 3D AABBs.
//!
//! This backend buckets AABBs into fixed-size vertical columns keyed by
//! their x/z cell coordinates and answers queries by touching only the
//! columns overlapping the query primitive. It is intended for workloads
//! with:
//! - boxes that are small compared to the world's horizontal extent,
//! - boxes that often span most of the vertical range, and
//! - incremental inserts and removes with no rebuild step.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::types::{Aabb3D, Scalar};

/// Scalar types supported by the column grid backend.
///
/// This is kept separate from [`Scalar`] so that the grid implementation
/// can rely on Euclidean division for the cell mapping.
pub trait GridScalar: Scalar {
    /// Map a scalar coordinate to a grid cell coordinate along one axis.
    ///
    /// The mapping is floor division by `cell_size` with the origin at zero,
    /// so negative coordinates round toward negative infinity. Values whose
    /// cell falls outside the `i32` range are saturated.
    fn cell_coord(value: Self, cell_size: Self) -> i32;
}

impl GridScalar for i32 {
    #[inline]
    fn cell_coord(value: Self, cell_size: Self) -> i32 {
        debug_assert!(cell_size > 0, "grid cell_size must be strictly positive");
        value.div_euclid(cell_size)
    }
}

impl GridScalar for i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
    )]
    #[inline]
    fn cell_coord(value: Self, cell_size: Self) -> i32 {
        debug_assert!(cell_size > 0, "grid cell_size must be strictly positive");
        let coord = value.div_euclid(cell_size);
        if coord >= Self::from(i32::MAX) {
            i32::MAX
        } else if coord <= Self::from(i32::MIN) {
            i32::MIN
        } else {
            coord as i32
        }
    }
}

/// Uniform column grid backend with fixed cell size.
pub struct ColumnGrid<T: GridScalar> {
    cell_size: T,
    columns: HashMap<(i32, i32), Column>,
    slots: Vec<Option<SlotEntry<T>>>,
}

#[derive(Clone, Debug)]
struct SlotEntry<T: GridScalar> {
    aabb: Aabb3D<T>,
    // Columns currently containing this AABB.
    columns: SmallVec<[(i32, i32); 4]>,
}

#[derive(Default)]
struct Column {
    slots: SmallVec<[usize; 8]>,
}

impl<T: GridScalar> Debug for ColumnGrid<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total_slots = self.slots.len();
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        let num_columns = self.columns.len();
        f.debug_struct("ColumnGrid")
            .field("cell_size", &self.cell_size)
            .field("total_slots", &total_slots)
            .field("live_slots", &live_slots)
            .field("columns", &num_columns)
            .finish_non_exhaustive()
    }
}

impl<T: GridScalar> ColumnGrid<T> {
    /// Create a new column grid backend with the given cell size.
    pub fn new(cell_size: T) -> Self {
        Self {
            cell_size,
            columns: HashMap::new(),
            slots: Vec::new(),
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }

    fn slot_entry(&self, slot: usize) -> &SlotEntry<T> {
        self.slots
            .get(slot)
            .expect("grid invariant violated: column references out-of-bounds slot")
            .as_ref()
            .expect("grid invariant violated: column references vacant slot")
    }

    fn remove_from_columns(&mut self, slot: usize, columns: &[(i32, i32)]) {
        for &(cx, cz) in columns {
            let column = self
                .columns
                .get_mut(&(cx, cz))
                .expect("grid invariant violated: missing column while removing slot");

            let pos = column
                .slots
                .iter()
                .position(|&s| s == slot)
                .expect("grid invariant violated: slot not found in expected column");
            column.slots.swap_remove(pos);

            if column.slots.is_empty() {
                // Dropping empty columns keeps the map compact for sparse worlds.
                self.columns.remove(&(cx, cz));
            }
        }
    }

    fn cell_range(&self, min: T, max: T) -> (i32, i32) {
        let c0 = T::cell_coord(min, self.cell_size);
        let c1 = T::cell_coord(max, self.cell_size);
        if c0 <= c1 { (c0, c1) } else { (c1, c0) }
    }

    fn covered_columns(&self, aabb: &Aabb3D<T>) -> SmallVec<[(i32, i32); 4]> {
        let (cx0, cx1) = self.cell_range(aabb.min_x, aabb.max_x);
        let (cz0, cz1) = self.cell_range(aabb.min_z, aabb.max_z);
        let mut out: SmallVec<[(i32, i32); 4]> = SmallVec::new();
        for cx in cx0..=cx1 {
            for cz in cz0..=cz1 {
                out.push((cx, cz));
            }
        }
        out
    }
}

impl<T: GridScalar> Backend<T> for ColumnGrid<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb3D<T>) {
        self.ensure_slot(slot);

        // If this slot was previously used, clean up its old column memberships.
        if let Some(old) = self.slots[slot].take() {
            self.remove_from_columns(slot, &old.columns);
        }

        let columns = self.covered_columns(&aabb);
        for &(cx, cz) in &columns {
            self.columns.entry((cx, cz)).or_default().slots.push(slot);
        }
        self.slots[slot] = Some(SlotEntry { aabb, columns });
    }

    fn update(&mut self, slot: usize, aabb: Aabb3D<T>) {
        // Take the current entry out to avoid aliasing `self` while mutating
        // grid columns.
        let current = if let Some(slot_ref) = self.slots.get_mut(slot) {
            slot_ref.take()
        } else {
            None
        };

        let Some(mut entry) = current else {
            // If the slot does not exist, treat this as an insert.
            self.insert(slot, aabb);
            return;
        };

        // If the AABB is unchanged, restore the entry and skip work.
        if entry.aabb == aabb {
            self.slots[slot] = Some(entry);
            return;
        }

        // Remove from old columns.
        self.remove_from_columns(slot, &entry.columns);

        // Insert into new columns.
        let columns = self.covered_columns(&aabb);
        for &(cx, cz) in &columns {
            self.columns.entry((cx, cz)).or_default().slots.push(slot);
        }
        entry.aabb = aabb;
        entry.columns = columns;
        self.slots[slot] = Some(entry);
    }

    fn remove(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            return;
        }
        if let Some(entry) = self.slots[slot].take() {
            self.remove_from_columns(slot, &entry.columns);
        }
    }

    fn clear(&mut self) {
        self.columns.clear();
        self.slots.clear();
    }

    fn visit_point<F: FnMut(usize)>(&self, x: T, y: T, z: T, mut f: F) {
        let cx = T::cell_coord(x, self.cell_size);
        let cz = T::cell_coord(z, self.cell_size);
        if let Some(column) = self.columns.get(&(cx, cz)) {
            for &slot in &column.slots {
                let entry = self.slot_entry(slot);
                if entry.aabb.contains_point(x, y, z) {
                    f(slot);
                }
            }
        }
    }

    fn visit_volume<F: FnMut(usize)>(&self, volume: Aabb3D<T>, mut f: F) {
        let (cx0, cx1) = self.cell_range(volume.min_x, volume.max_x);
        let (cz0, cz1) = self.cell_range(volume.min_z, volume.max_z);

        let mut seen: HashSet<usize> = HashSet::new();

        for cx in cx0..=cx1 {
            for cz in cz0..=cz1 {
                if let Some(column) = self.columns.get(&(cx, cz)) {
                    for &slot in &column.slots {
                        if !seen.insert(slot) {
                            continue;
                        }
                        let entry = self.slot_entry(slot);
                        if entry.aabb.overlaps(&volume) {
                            f(slot);
                        }
                    }
                }
            }
        }
    }
}

/// Column grid backend over `i32` coordinates.
pub type ColumnGridI32 = ColumnGrid<i32>;
/// Column grid backend over `i64` coordinates.
pub type ColumnGridI64 = ColumnGrid<i64>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn insert_update_remove_roundtrip() {
        let mut grid: ColumnGridI32 = ColumnGridI32::new(16);

        let a = Aabb3D::new(0, 0, 0, 10, 255, 10);
        grid.insert(0, a);

        let mut hits = Vec::new();
        grid.visit_point(5, 100, 5, |s| hits.push(s));
        assert_eq!(hits, vec![0]);

        // Move the AABB; the point should follow.
        let b = Aabb3D::new(40, 0, 40, 50, 255, 50);
        grid.update(0, b);

        hits.clear();
        grid.visit_point(5, 100, 5, |s| hits.push(s));
        assert!(hits.is_empty());

        hits.clear();
        grid.visit_point(45, 100, 45, |s| hits.push(s));
        assert_eq!(hits, vec![0]);

        grid.remove(0);
        hits.clear();
        grid.visit_point(45, 100, 45, |s| hits.push(s));
        assert!(hits.is_empty());
    }

    #[test]
    fn volume_query_deduplicates_slots() {
        let mut grid: ColumnGridI32 = ColumnGridI32::new(8);

        // This AABB spans multiple columns.
        let a = Aabb3D::new(0, 0, 0, 30, 10, 30);
        grid.insert(1, a);

        let q = Aabb3D::new(2, 0, 2, 28, 10, 28);
        let mut hits = Vec::new();
        grid.visit_volume(q, |s| hits.push(s));

        // Slot 1 should be reported exactly once.
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn update_missing_slot_inserts() {
        let mut grid: ColumnGridI32 = ColumnGridI32::new(16);

        let a = Aabb3D::new(0, 0, 0, 10, 10, 10);
        grid.update(5, a);

        let mut hits = Vec::new();
        grid.visit_point(5, 5, 5, |s| hits.push(s));
        assert_eq!(hits, vec![5]);
    }

    #[test]
    fn negative_coordinates_round_toward_negative_infinity() {
        let mut grid: ColumnGridI32 = ColumnGridI32::new(16);
        let a = Aabb3D::new(-30, 0, -30, -10, 10, -10);
        grid.insert(0, a);

        let mut hits = Vec::new();
        grid.visit_point(-20, 5, -20, |s| hits.push(s));
        assert_eq!(hits, vec![0]);

        // A point one column east of the box must not be visited.
        hits.clear();
        grid.visit_point(-9, 5, -20, |s| hits.push(s));
        assert!(hits.is_empty());
    }

    #[test]
    fn point_query_respects_y_within_column() {
        let mut grid: ColumnGridI32 = ColumnGridI32::new(16);
        grid.insert(0, Aabb3D::new(0, 0, 0, 10, 20, 10));
        grid.insert(1, Aabb3D::new(0, 60, 0, 10, 80, 10));

        // Both share the same column, only one contains the point.
        let mut hits = Vec::new();
        grid.visit_point(5, 70, 5, |s| hits.push(s));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn cell_coord_saturates_i64() {
        assert_eq!(GridScalar::cell_coord(i64::MAX, 1), i32::MAX);
        assert_eq!(GridScalar::cell_coord(i64::MIN, 1), i32::MIN);
        assert_eq!(GridScalar::cell_coord(-1_i64, 16), -1);
        assert_eq!(GridScalar::cell_coord(-16_i64, 16), -1);
        assert_eq!(GridScalar::cell_coord(-17_i64, 16), -2);
    }
}
