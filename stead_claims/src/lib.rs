// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stead Claims: the land-claim domain core.
//!
//! This crate models owned volumes of a block world and who may do what
//! inside them:
//!
//! - [`Volume`]: an axis-aligned, inclusive box bound to one world.
//! - [`Group`]: ranked permission levels from `None` up to `Owner`.
//! - [`Claim`]: an owned volume with a lazily loaded grant table; sub-claims
//!   nest inside a parent and inherit its owner and world.
//! - [`ClaimMap`]: the in-memory arena of loaded claims, with per-world
//!   spatial indexes for point lookup and overlap checks.
//!
//! Persistence is delegated to a [`ClaimStore`][stead_store::ClaimStore];
//! orchestration (budgets, validation ordering, locking) lives one layer up
//! in `stead_service`.
//!
//! # Example
//!
//! ```rust
//! use stead_claims::{Claim, ClaimMap, Volume};
//! use uuid::Uuid;
//!
//! let mut map = ClaimMap::new();
//! let owner = Uuid::new_v4();
//! let id = map
//!     .insert(Claim::new_root(
//!         owner,
//!         Some("spawn".to_owned()),
//!         Volume::from_corners("overworld", (0, 0, 0), (31, 255, 31)),
//!     ))
//!     .unwrap();
//!
//! assert_eq!(map.find_at("overworld", 10, 64, 10), Some(id));
//! assert_eq!(map.claim(id).unwrap().owner(), owner);
//! ```

mod claim;
mod group;
mod map;
mod volume;

pub use claim::{Claim, GrantError, GrantTable};
pub use group::Group;
pub use map::{ClaimId, ClaimMap, DEFAULT_CELL_SIZE};
pub use volume::Volume;
