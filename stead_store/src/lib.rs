// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stead Store: the persistence contract for claims and permission grants.
//!
//! This crate defines what the domain core needs from a durable store and
//! nothing about how a concrete store works:
//!
//! - [`ClaimRecord`] and [`GrantRecord`]: plain serializable rows, one per
//!   claim and one per (claim, actor) grant.
//! - [`ClaimStore`]: the collaborator trait with create/update/delete,
//!   point-predicate queries, and grant refresh operations. Every method
//!   reports failure as a [`StoreError`] value so callers decide whether a
//!   failure is fatal or merely worth a user-facing message.
//! - [`MemoryStore`]: a mutex-guarded in-process implementation used by
//!   tests and single-process deployments.
//!
//! The store is injected into higher layers at construction time; there is
//! no process-wide store handle.

mod error;
mod memory;
mod records;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use records::{ClaimRecord, ClaimRecordId, GrantRecord};

/// Durable storage collaborator for claims and grants.
///
/// Implementations must be safe to share across threads; the domain core
/// calls them while holding its own coarse lock, so methods may block on
/// I/O but must not call back into the domain.
pub trait ClaimStore: Send + Sync {
    /// Persist a new claim, assigning its record id.
    fn create_claim(&self, record: &mut ClaimRecord) -> Result<(), StoreError>;

    /// Update an existing claim row. Fails with [`StoreError::NotFound`] if
    /// the record was never created.
    fn update_claim(&self, record: &ClaimRecord) -> Result<(), StoreError>;

    /// Delete a claim row and all grants attached to it.
    fn delete_claim(&self, id: ClaimRecordId) -> Result<(), StoreError>;

    /// All claims containing the given block, child claims ordered before
    /// their parents.
    fn claims_at(&self, world: &str, x: i32, y: i32, z: i32)
    -> Result<Vec<ClaimRecord>, StoreError>;

    /// All claims in the given world, in unspecified order.
    fn claims_in_world(&self, world: &str) -> Result<Vec<ClaimRecord>, StoreError>;

    /// Persist a new grant.
    fn create_grant(&self, record: &GrantRecord) -> Result<(), StoreError>;

    /// Update the group of an existing grant, keyed by (claim, actor).
    fn update_grant(&self, record: &GrantRecord) -> Result<(), StoreError>;

    /// The backing grant collection of a claim, refreshed from the store.
    fn grants_for(&self, claim: ClaimRecordId) -> Result<Vec<GrantRecord>, StoreError>;

    /// Delete every grant attached to a claim, keeping the claim itself.
    fn delete_grants_for(&self, claim: ClaimRecordId) -> Result<(), StoreError>;
}
