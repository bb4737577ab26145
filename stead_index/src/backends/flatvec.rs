// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend: linear scans over all live slots.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb3D, Scalar};

/// Flat vector backend with linear scans.
///
/// The simplest and smallest backend. Good for very small sets or when
/// inserts and updates vastly outnumber queries.
#[derive(Clone, Debug, Default)]
pub struct FlatVec<T> {
    slots: Vec<Option<Aabb3D<T>>>,
}

impl<T> FlatVec<T> {
    /// Create an empty flat vector backend.
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }
}

impl<T: Scalar> Backend<T> for FlatVec<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb3D<T>) {
        self.ensure_slot(slot);
        self.slots[slot] = Some(aabb);
    }

    fn update(&mut self, slot: usize, aabb: Aabb3D<T>) {
        // A slot that was never inserted is treated as an insert.
        self.insert(slot, aabb);
    }

    fn remove(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn visit_point<F: FnMut(usize)>(&self, x: T, y: T, z: T, mut f: F) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(aabb) = slot
                && aabb.contains_point(x, y, z)
            {
                f(i);
            }
        }
    }

    fn visit_volume<F: FnMut(usize)>(&self, volume: Aabb3D<T>, mut f: F) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(aabb) = slot
                && aabb.overlaps(&volume)
            {
                f(i);
            }
        }
    }
}
