// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-process store backed by plain collections.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::records::{ClaimRecord, ClaimRecordId, GrantRecord};
use crate::ClaimStore;

/// Mutex-guarded in-memory [`ClaimStore`].
///
/// Used by tests and by single-process deployments that persist elsewhere
/// (or not at all). Ids are assigned monotonically and never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    next_claim_id: i64,
    claims: BTreeMap<i64, ClaimRecord>,
    grants: Vec<GrantRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned mutex means a panic mid-mutation; the tables hold only
        // plain rows, so continuing with them is sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ClaimStore for MemoryStore {
    fn create_claim(&self, record: &mut ClaimRecord) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.next_claim_id += 1;
        let id = ClaimRecordId(tables.next_claim_id);
        record.id = Some(id);
        tables.claims.insert(id.0, record.clone());
        Ok(())
    }

    fn update_claim(&self, record: &ClaimRecord) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::NotFound)?;
        let mut tables = self.lock();
        match tables.claims.get_mut(&id.0) {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn delete_claim(&self, id: ClaimRecordId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if tables.claims.remove(&id.0).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.grants.retain(|g| g.claim != id);
        Ok(())
    }

    fn claims_at(
        &self,
        world: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Vec<ClaimRecord>, StoreError> {
        let tables = self.lock();
        let mut rows: Vec<ClaimRecord> = tables
            .claims
            .values()
            .filter(|r| r.world == world && r.contains_block(x, y, z))
            .cloned()
            .collect();
        // Children before parents, newest children first.
        rows.sort_by(|a, b| b.parent.cmp(&a.parent));
        Ok(rows)
    }

    fn claims_in_world(&self, world: &str) -> Result<Vec<ClaimRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .claims
            .values()
            .filter(|r| r.world == world)
            .cloned()
            .collect())
    }

    fn create_grant(&self, record: &GrantRecord) -> Result<(), StoreError> {
        let mut tables = self.lock();
        debug_assert!(
            !tables
                .grants
                .iter()
                .any(|g| g.claim == record.claim && g.actor == record.actor),
            "grant rows are unique per (claim, actor)"
        );
        tables.grants.push(*record);
        Ok(())
    }

    fn update_grant(&self, record: &GrantRecord) -> Result<(), StoreError> {
        let mut tables = self.lock();
        match tables
            .grants
            .iter_mut()
            .find(|g| g.claim == record.claim && g.actor == record.actor)
        {
            Some(row) => {
                row.group_rank = record.group_rank;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn grants_for(&self, claim: ClaimRecordId) -> Result<Vec<GrantRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .grants
            .iter()
            .filter(|g| g.claim == claim)
            .copied()
            .collect())
    }

    fn delete_grants_for(&self, claim: ClaimRecordId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.grants.retain(|g| g.claim != claim);
        Ok(())
    }
}
