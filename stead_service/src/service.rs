// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The claim service: validation ordering, budgets, and the map lock.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use stead_claims::{Claim, ClaimId, ClaimMap, Group, Volume};
use stead_store::{ClaimRecordId, ClaimStore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::budget::BudgetLedger;
use crate::error::ServiceError;

/// Outcome of a claim mutation that touched the owner's budget.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Handle of the affected claim.
    pub claim: ClaimId,
    /// Claim-block cost of the claim's volume after the operation.
    pub footprint_blocks: u64,
    /// Blocks the owner holds after the operation.
    pub remaining_budget: u64,
}

/// Orchestrates claims over a store and a budget ledger.
///
/// Every operation follows the same order: validate against the in-memory
/// map, persist through the store, then publish to the map. A store failure
/// therefore leaves the map (and any charged budget) exactly as before. One
/// coarse lock guards the whole map; claim mutations are rare and cheap
/// compared to the block events querying them.
#[derive(Debug)]
pub struct ClaimService<S, L> {
    store: S,
    ledger: L,
    map: Mutex<ClaimMap>,
}

impl<S: ClaimStore, L: BudgetLedger> ClaimService<S, L> {
    /// Create a service over a store and ledger with an empty map.
    pub fn new(store: S, ledger: L) -> Self {
        Self::with_map(store, ledger, ClaimMap::new())
    }

    /// Create a service with a pre-built map, for tests and custom cell sizes.
    pub fn with_map(store: S, ledger: L, map: ClaimMap) -> Self {
        Self {
            store,
            ledger,
            map: Mutex::new(map),
        }
    }

    /// The budget ledger, for showing balances outside claim operations.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn lock(&self) -> MutexGuard<'_, ClaimMap> {
        // A panic under the lock aborts the failed operation; the map itself
        // only mutates through its own consistent methods.
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a root claim from two corner blocks.
    ///
    /// The x/z footprint is charged against the owner's budget. Fails
    /// without side effects when the volume overlaps another root claim,
    /// the budget does not cover it, or the store rejects the record.
    pub fn create_claim(
        &self,
        owner: Uuid,
        name: Option<String>,
        world: &str,
        a: (i32, i32, i32),
        b: (i32, i32, i32),
    ) -> Result<ClaimReceipt, ServiceError> {
        let volume = Volume::from_corners(world, a, b);
        let needed = volume.footprint_blocks();

        let mut map = self.lock();
        if map.would_overlap(&volume, None, None) {
            return Err(ServiceError::Overlap);
        }
        if !self.ledger.charge(owner, needed) {
            return Err(ServiceError::InsufficientBudget {
                needed,
                available: self.ledger.available(owner),
            });
        }

        let mut claim = Claim::new_root(owner, name, volume);
        if let Err(e) = claim.save(&self.store, None) {
            self.ledger.refund(owner, needed);
            return Err(e.into());
        }
        let id = map
            .insert(claim)
            .expect("root claims have no parent to go stale");
        info!(%owner, world, blocks = needed, "created a claim");
        Ok(ClaimReceipt {
            claim: id,
            footprint_blocks: needed,
            remaining_budget: self.ledger.available(owner),
        })
    }

    /// Create a sub-claim of `parent` from two corner blocks.
    ///
    /// Owner and world come from the parent; sub-claims are free of budget
    /// and may overlap their parent, but not their siblings.
    pub fn create_subclaim(
        &self,
        parent: ClaimId,
        a: (i32, i32, i32),
        b: (i32, i32, i32),
    ) -> Result<ClaimId, ServiceError> {
        let mut map = self.lock();
        let parent_claim = map.claim(parent).ok_or(ServiceError::UnknownClaim)?.clone();
        let mut child = Claim::new_child(parent, &parent_claim, a, b);

        if map.would_overlap(child.volume(), Some(parent), None) {
            return Err(ServiceError::Overlap);
        }
        let parent_record = parent_claim
            .record_id()
            .ok_or(stead_store::StoreError::NotFound)?;
        child.save(&self.store, Some(parent_record))?;
        Ok(map
            .insert(child)
            .expect("the parent stays alive under the map lock"))
    }

    /// Replace a claim's volume with the box spanned by two new corners.
    ///
    /// Growing a root claim charges the footprint difference; shrinking one
    /// refunds it. Sub-claim resizes never touch the budget. The new volume
    /// is validated like a fresh claim, except against the claim itself.
    pub fn resize_claim(
        &self,
        id: ClaimId,
        a: (i32, i32, i32),
        b: (i32, i32, i32),
    ) -> Result<ClaimReceipt, ServiceError> {
        let mut map = self.lock();
        let current = map.claim(id).ok_or(ServiceError::UnknownClaim)?.clone();
        let parent = current.parent();
        let volume = Volume::from_corners(current.volume().world(), a, b);

        if map.would_overlap(&volume, parent, Some(id)) {
            return Err(ServiceError::Overlap);
        }

        let owner = current.owner();
        let old_cost = current.volume().footprint_blocks();
        let new_cost = volume.footprint_blocks();
        let charges_budget = parent.is_none();
        if charges_budget && new_cost > old_cost {
            let needed = new_cost - old_cost;
            if !self.ledger.charge(owner, needed) {
                return Err(ServiceError::InsufficientBudget {
                    needed,
                    available: self.ledger.available(owner),
                });
            }
        }

        let parent_record = parent.and_then(|p| map.claim(p).and_then(Claim::record_id));
        let staged = current.with_volume(volume.clone());
        if let Err(e) = staged.update(&self.store, parent_record) {
            if charges_budget && new_cost > old_cost {
                self.ledger.refund(owner, new_cost - old_cost);
            }
            return Err(e.into());
        }
        map.set_volume(id, volume);
        if charges_budget && new_cost < old_cost {
            self.ledger.refund(owner, old_cost - new_cost);
        }
        Ok(ClaimReceipt {
            claim: id,
            footprint_blocks: new_cost,
            remaining_budget: self.ledger.available(owner),
        })
    }

    /// Delete a claim and its whole subtree, refunding a root's footprint.
    ///
    /// Records are deleted leaf-first, each cascading its grants; a store
    /// failure midway stops the cascade with every already-deleted claim
    /// consistently gone from both store and map.
    pub fn delete_claim(&self, id: ClaimId) -> Result<u64, ServiceError> {
        let mut map = self.lock();
        let target = map.claim(id).ok_or(ServiceError::UnknownClaim)?;
        let owner = target.owner();
        let refund = if target.parent().is_none() {
            target.volume().footprint_blocks()
        } else {
            0
        };

        for victim in map.subtree(id) {
            map.claim(victim)
                .expect("subtree handles are alive")
                .delete(&self.store)?;
            map.remove(victim);
        }
        self.ledger.refund(owner, refund);
        info!(%owner, blocks = refund, "deleted a claim");
        Ok(refund)
    }

    /// Grant `group` to an actor within a claim.
    ///
    /// Granting [`Group::Owner`] fails with
    /// [`ServiceError::GrantNotAssignable`]; ownership is synthesized from
    /// the claim record, never granted.
    pub fn set_group(
        &self,
        id: ClaimId,
        actor: Uuid,
        group: Group,
    ) -> Result<(), ServiceError> {
        let mut map = self.lock();
        let claim = map.claim_mut(id).ok_or(ServiceError::UnknownClaim)?;
        claim.set_group(&self.store, actor, group)?;
        Ok(())
    }

    /// The effective group of an actor within a claim.
    pub fn resolve_group(&self, id: ClaimId, actor: Uuid) -> Result<Group, ServiceError> {
        let mut map = self.lock();
        let claim = map.claim_mut(id).ok_or(ServiceError::UnknownClaim)?;
        Ok(claim.resolve_group(&self.store, actor)?)
    }

    /// Whether the actor's effective group within a claim covers `required`.
    pub fn is_allowed(
        &self,
        id: ClaimId,
        actor: Uuid,
        required: Group,
    ) -> Result<bool, ServiceError> {
        Ok(self.resolve_group(id, actor)?.encompasses(required))
    }

    /// Whether the actor may act at a block.
    ///
    /// Resolves the most specific claim containing the block and checks the
    /// actor's group there. Unclaimed blocks allow everything.
    pub fn is_allowed_at(
        &self,
        world: &str,
        position: (i32, i32, i32),
        actor: Uuid,
        required: Group,
    ) -> Result<bool, ServiceError> {
        let mut map = self.lock();
        let (x, y, z) = position;
        match map.find_at(world, x, y, z) {
            Some(id) => {
                let claim = map.claim_mut(id).expect("find_at returns live handles");
                Ok(claim.resolve_group(&self.store, actor)?.encompasses(required))
            }
            None => Ok(true),
        }
    }

    /// The most specific claim containing a block, if any.
    pub fn find_at(&self, world: &str, x: i32, y: i32, z: i32) -> Option<ClaimId> {
        self.lock().find_at(world, x, y, z)
    }

    /// A snapshot of the claim behind a handle.
    pub fn claim(&self, id: ClaimId) -> Option<Claim> {
        self.lock().claim(id).cloned()
    }

    /// Load every stored claim of a world into the map.
    ///
    /// Roots are inserted first, then children in dependency order, however
    /// deeply nested. Records already present in the map are skipped, so
    /// reloading a world is idempotent. Records whose parent is missing from
    /// the store are skipped with a warning rather than failing the whole
    /// load. Returns the number of claims inserted.
    pub fn load_world(&self, world: &str) -> Result<usize, ServiceError> {
        let records = self.store.claims_in_world(world)?;
        let mut map = self.lock();
        let mut by_record: BTreeMap<ClaimRecordId, ClaimId> = map
            .iter()
            .filter_map(|(id, claim)| claim.record_id().map(|rid| (rid, id)))
            .collect();
        let mut loaded = 0;

        let mut pending: Vec<_> = records
            .into_iter()
            .filter(|r| r.id.is_some_and(|rid| !by_record.contains_key(&rid)))
            .collect();
        loop {
            let before = pending.len();
            let mut rest = Vec::new();
            for record in pending {
                let parent = match record.parent {
                    None => None,
                    Some(pid) => match by_record.get(&pid) {
                        Some(id) => Some(*id),
                        None => {
                            rest.push(record);
                            continue;
                        }
                    },
                };
                let id = map
                    .insert(Claim::from_record(&record, parent))
                    .expect("parents are inserted before their children");
                loaded += 1;
                if let Some(rid) = record.id {
                    by_record.insert(rid, id);
                }
            }
            if rest.is_empty() {
                break;
            }
            if rest.len() == before {
                warn!(world, orphans = rest.len(), "skipping claims with missing parents");
                break;
            }
            pending = rest;
        }
        info!(world, loaded, "loaded world claims");
        Ok(loaded)
    }
}
