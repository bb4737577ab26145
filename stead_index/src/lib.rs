// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stead Index: a generic 3D AABB index for block worlds.
//!
//! Stead Index is a reusable building block for spatial queries over
//! axis-aligned volumes with integer block coordinates.
//!
//! - Insert, update, and remove axis-aligned bounding boxes (AABBs) with
//!   user payloads.
//! - Query by point or overlapping volume; mutations take effect
//!   immediately, with no rebuild or synchronization step.
//!
//! It is generic over the integer scalar type `T` and does not depend on any
//! geometry crate. Higher layers (like a claim map) attach world identifiers
//! and domain payloads and feed plain AABBs here.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial
//! strategy without API churn. The default backend is a flat vector (linear
//! scan). The `backend_grid` feature adds a uniform column grid that buckets
//! boxes by their x/z extent, matching the chunk layout of block worlds.
//!
//! ## Features
//!
//! - `backend_grid` *(default)*: enables the column grid backend backed by
//!   `hashbrown`. Disable this feature to avoid the `hashbrown` dependency
//!   and grid types.
//!
//! # Example
//!
//! ```rust
//! use stead_index::{Aabb3D, Index};
//!
//! // Create an index and add two boxes.
//! let mut idx: Index<i32, u32> = Index::new();
//! let k1 = idx.insert(Aabb3D::new(0, 0, 0, 10, 255, 10), 1);
//! let _k2 = idx.insert(Aabb3D::new(20, 0, 20, 30, 255, 30), 2);
//!
//! // Query a point inside the first box.
//! let hits: Vec<_> = idx.query_point(5, 64, 5).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].1, 1);
//!
//! // Move the first box; queries observe the change immediately.
//! idx.update(k1, Aabb3D::new(40, 0, 40, 50, 255, 50));
//! assert_eq!(idx.query_point(5, 64, 5).count(), 0);
//! ```
//!
//! With the `backend_grid` feature enabled (default), you can also use the
//! column grid backend:
//!
//! ```rust
//! # #[cfg(feature = "backend_grid")]
//! # {
//! use stead_index::{Aabb3D, Index};
//!
//! // Use a grid backend with 16-block columns (one chunk per cell).
//! let mut idx = Index::<i32, u32>::with_column_grid(16);
//! let _k = idx.insert(Aabb3D::new(0, 0, 0, 100, 255, 100), 1);
//!
//! let hits: Vec<_> = idx.query_point(50, 70, 50).collect();
//! assert_eq!(hits.len(), 1);
//! # }
//! ```
//!
//! ## Choosing a backend
//!
//! - `FlatVec` (default): simplest and smallest, linear scans. Good for very
//!   small sets or when inserts/updates vastly outnumber queries.
//! - `ColumnGrid` *(feature `backend_grid`)*: uniform x/z column grid with
//!   configurable cell size. A good fit for land claims and similar volumes
//!   that are small compared to the world's horizontal extent but often span
//!   most of its vertical range; point queries touch a single column.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod index;
mod types;

pub use backend::Backend;
pub use index::{Index, IndexGeneric, Key};
pub use types::{Aabb3D, Scalar, ScalarAcc};
