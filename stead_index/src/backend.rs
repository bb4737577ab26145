// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::types::{Aabb3D, Scalar};

/// Spatial backend abstraction used by [`IndexGeneric`][crate::IndexGeneric].
pub trait Backend<T: Scalar> {
    /// Insert a new slot into the spatial structure.
    fn insert(&mut self, slot: usize, aabb: Aabb3D<T>);

    /// Update an existing slot's AABB.
    fn update(&mut self, slot: usize, aabb: Aabb3D<T>);

    /// Remove a slot from the spatial structure.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Visit slots whose AABB contains the point.
    fn visit_point<F: FnMut(usize)>(&self, x: T, y: T, z: T, f: F);

    /// Visit slots whose AABB overlaps the volume.
    fn visit_volume<F: FnMut(usize)>(&self, volume: Aabb3D<T>, f: F);

    /// Query slots whose AABB contains the point.
    ///
    /// The default implementation collects [`visit_point`][Backend::visit_point].
    fn query_point<'a>(&'a self, x: T, y: T, z: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        self.visit_point(x, y, z, |i| out.push(i));
        Box::new(out.into_iter())
    }

    /// Query slots whose AABB overlaps the volume.
    ///
    /// The default implementation collects [`visit_volume`][Backend::visit_volume].
    fn query_volume<'a>(&'a self, volume: Aabb3D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        self.visit_volume(volume, |i| out.push(i));
        Box::new(out.into_iter())
    }
}
