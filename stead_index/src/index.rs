// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb3D, Scalar};

/// Generational handle for entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<T, P> {
    aabb: Aabb3D<T>,
    payload: P,
}

/// A generic AABB index parameterized by a spatial backend.
///
/// Mutations are applied to the backend immediately: an inserted box is
/// visible to the next query with no separate synchronization step.
///
/// Slot generations live outside the entries so they survive removal: a key
/// for a removed entry stays stale forever, even after its slot is reused.
#[derive(Debug)]
pub struct IndexGeneric<T: Scalar, P: Copy + Debug, B: Backend<T>> {
    entries: Vec<Option<Entry<T, P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    backend: B,
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Scalar,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            backend: B::default(),
        }
    }
}

impl<T, P, B> Default for IndexGeneric<T, P, B>
where
    T: Scalar,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Scalar,
    P: Copy + Debug,
    B: Backend<T>,
{
    /// Create an empty index using an explicit backend instance.
    ///
    /// This is useful when higher layers want to choose a backend type or
    /// configure it before wiring it into the index.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            backend,
        }
    }

    /// Reserve space for at least `n` entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether the index holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Insert a new AABB with payload. Returns a stable handle `Key`.
    pub fn insert(&mut self, aabb: Aabb3D<T>, payload: P) -> Key {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Bumping on reuse keeps every key handed out for this slot stale.
            self.generations[idx] += 1;
            self.entries[idx] = Some(Entry { aabb, payload });
            idx
        } else {
            self.entries.push(Some(Entry { aabb, payload }));
            self.generations.push(1);
            self.entries.len() - 1
        };
        self.backend.insert(idx, aabb);
        Key::new(idx, self.generations[idx])
    }

    /// Update an existing AABB. Stale keys are ignored.
    pub fn update(&mut self, key: Key, aabb: Aabb3D<T>) {
        if let Some(e) = self.entry_mut(key) {
            e.aabb = aabb;
            self.backend.update(key.idx(), aabb);
        }
    }

    /// Remove an existing AABB. Stale keys are ignored.
    pub fn remove(&mut self, key: Key) {
        if self.entry_mut(key).is_some() {
            self.backend.remove(key.idx());
            self.entries[key.idx()] = None;
            self.free_list.push(key.idx());
        }
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generations.clear();
        self.free_list.clear();
        self.backend.clear();
    }

    /// The AABB currently stored for a key, or `None` for stale keys.
    pub fn aabb(&self, key: Key) -> Option<Aabb3D<T>> {
        if self.generations.get(key.idx()).copied() != Some(key.1) {
            return None;
        }
        self.entries.get(key.idx())?.as_ref().map(|e| e.aabb)
    }

    /// Query for entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T, z: T) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut out = Vec::new();
        self.visit_point(x, y, z, |k, p| out.push((k, p)));
        out.into_iter()
    }

    /// Visit entries whose AABB contains the point (does not allocate result storage).
    ///
    /// Calls `f(key, payload)` for each match. The order is backend-dependent.
    pub fn visit_point<F: FnMut(Key, P)>(&self, x: T, y: T, z: T, mut f: F) {
        self.backend.visit_point(x, y, z, |i| {
            if let Some(Some(e)) = self.entries.get(i) {
                f(Key::new(i, self.generations[i]), e.payload);
            }
        });
    }

    /// Query for entries whose AABB overlaps the given volume.
    pub fn query_volume(&self, volume: Aabb3D<T>) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut out = Vec::new();
        self.visit_volume(volume, |k, p| out.push((k, p)));
        out.into_iter()
    }

    /// Visit entries whose AABB overlaps the given volume (does not allocate result storage).
    ///
    /// Calls `f(key, payload)` for each match. The order is backend-dependent.
    pub fn visit_volume<F: FnMut(Key, P)>(&self, volume: Aabb3D<T>, mut f: F) {
        self.backend.visit_volume(volume, |i| {
            if let Some(Some(e)) = self.entries.get(i) {
                f(Key::new(i, self.generations[i]), e.payload);
            }
        });
    }

    fn entry_mut(&mut self, key: Key) -> Option<&mut Entry<T, P>> {
        if self.generations.get(key.idx()).copied() != Some(key.1) {
            return None;
        }
        self.entries.get_mut(key.idx())?.as_mut()
    }
}

/// Default index using a flat vector backend.
pub type Index<T, P> = IndexGeneric<T, P, crate::backends::FlatVec<T>>;

#[cfg(feature = "backend_grid")]
impl<P: Copy + Debug> Index<i32, P> {
    /// Create a column-grid-backed index (i32 coordinates).
    pub fn with_column_grid(
        cell_size: i32,
    ) -> IndexGeneric<i32, P, crate::backends::ColumnGridI32> {
        IndexGeneric::with_backend(crate::backends::ColumnGridI32::new(cell_size))
    }
}

#[cfg(feature = "backend_grid")]
impl<P: Copy + Debug> Index<i64, P> {
    /// Create a column-grid-backed index (i64 coordinates).
    pub fn with_column_grid(
        cell_size: i64,
    ) -> IndexGeneric<i64, P, crate::backends::ColumnGridI64> {
        IndexGeneric::with_backend(crate::backends::ColumnGridI64::new(cell_size))
    }
}
