// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple).
//! - `column_grid` (feature `backend_grid`): uniform grid of vertical columns
//!   with configurable cell size.
//!
//! The column grid buckets boxes only on the x/z axes. Land-claim style
//! volumes tend to span most of the vertical range of their world, so
//! partitioning on y would put nearly every box in every y bucket; columns
//! match the chunk layout of block worlds instead.

pub(crate) mod flatvec;
#[cfg(feature = "backend_grid")]
pub(crate) mod column_grid;

#[cfg(feature = "backend_grid")]
pub use column_grid::{ColumnGrid, ColumnGridI32, ColumnGridI64, GridScalar};
pub use flatvec::FlatVec;
