// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The claim entity: ownership, volume, and per-actor permission grants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use stead_store::{ClaimRecord, ClaimRecordId, ClaimStore, GrantRecord, StoreError};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::group::Group;
use crate::map::ClaimId;
use crate::volume::Volume;

/// The per-actor grant table of a claim.
///
/// Grants live in the store; the table starts [`Unloaded`][Self::Unloaded]
/// and is materialized at most once, on first non-trivial access. Mutations
/// either update the loaded map in place or replace it with a fresh load so
/// later lookups stay consistent with the store.
#[derive(Clone, Debug)]
pub enum GrantTable {
    /// The backing collection has not been fetched yet.
    Unloaded,
    /// The backing collection, keyed by actor.
    Loaded(HashMap<Uuid, Group>),
}

impl GrantTable {
    /// Whether the backing collection has been materialized.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Failure reported by a grant mutation on a claim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    /// The owner group cannot be granted; ownership is only ever synthesized.
    #[error("the owner group cannot be granted")]
    NotAssignable,

    /// The persistence layer failed; the grant table is unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A claim or sub-claim owned by an actor.
///
/// A root claim is created from two corner blocks and an owner; a sub-claim
/// inherits owner and world from its parent and holds the parent's
/// [`ClaimId`] for lookup (the claim map owns the child links). Field edits
/// only become durable through an explicit [`save`][Self::save] or
/// [`update`][Self::update] call.
#[derive(Clone, Debug)]
pub struct Claim {
    record_id: Option<ClaimRecordId>,
    owner: Uuid,
    name: Option<String>,
    created_at: DateTime<Utc>,
    volume: Volume,
    parent: Option<ClaimId>,
    grants: GrantTable,
}

impl Claim {
    /// Create a new root claim. Not persisted until [`save`][Self::save].
    pub fn new_root(owner: Uuid, name: Option<String>, volume: Volume) -> Self {
        Self {
            record_id: None,
            owner,
            name,
            created_at: Utc::now(),
            volume,
            parent: None,
            // A claim that was never persisted cannot have stored grants.
            grants: GrantTable::Loaded(HashMap::new()),
        }
    }

    /// Create a sub-claim of `parent` from two corner blocks.
    ///
    /// Owner and world are copied from the parent, never chosen by the
    /// caller. Not persisted until [`save`][Self::save].
    pub fn new_child(
        parent_id: ClaimId,
        parent: &Claim,
        a: (i32, i32, i32),
        b: (i32, i32, i32),
    ) -> Self {
        Self {
            record_id: None,
            owner: parent.owner,
            name: None,
            created_at: Utc::now(),
            volume: Volume::from_corners(parent.volume.world(), a, b),
            parent: Some(parent_id),
            grants: GrantTable::Loaded(HashMap::new()),
        }
    }

    /// Rebuild a claim from its stored record.
    ///
    /// `parent` is the map handle of the already-inserted parent claim, if
    /// any. The grant table starts unloaded and is fetched on demand.
    pub fn from_record(record: &ClaimRecord, parent: Option<ClaimId>) -> Self {
        Self {
            record_id: record.id,
            owner: record.owner,
            name: record.name.clone(),
            created_at: record.created_at,
            volume: Volume::new(
                record.world.clone(),
                stead_index::Aabb3D::new(
                    record.min_x,
                    record.min_y,
                    record.min_z,
                    record.max_x,
                    record.max_y,
                    record.max_z,
                ),
            ),
            parent,
            grants: GrantTable::Unloaded,
        }
    }

    /// The store record for this claim's current state.
    ///
    /// `parent_record` is the record id of the parent claim; the caller
    /// resolves it since claims hold map handles, not record ids.
    pub fn to_record(&self, parent_record: Option<ClaimRecordId>) -> ClaimRecord {
        let aabb = self.volume.aabb();
        ClaimRecord {
            id: self.record_id,
            owner: self.owner,
            name: self.name.clone(),
            created_at: self.created_at,
            world: self.volume.world().to_owned(),
            min_x: aabb.min_x,
            min_y: aabb.min_y,
            min_z: aabb.min_z,
            max_x: aabb.max_x,
            max_y: aabb.max_y,
            max_z: aabb.max_z,
            parent: parent_record,
        }
    }

    /// Store-assigned record id, `None` until first persisted.
    pub fn record_id(&self) -> Option<ClaimRecordId> {
        self.record_id
    }

    /// The owning actor.
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Optional display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rename the claim. Durable after the next [`update`][Self::update].
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The claim's volume.
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// A copy of this claim carrying a different volume.
    ///
    /// Used to stage a resize for persistence before the map publishes it;
    /// the new volume must lie in the claim's current world.
    pub fn with_volume(&self, volume: Volume) -> Self {
        let mut copy = self.clone();
        copy.set_volume(volume);
        copy
    }

    pub(crate) fn set_volume(&mut self, volume: Volume) {
        debug_assert_eq!(
            self.volume.world(),
            volume.world(),
            "a claim never changes worlds"
        );
        self.volume = volume;
    }

    /// Map handle of the parent claim for sub-claims, `None` for roots.
    pub fn parent(&self) -> Option<ClaimId> {
        self.parent
    }

    /// The grant table, for inspecting load state.
    pub fn grant_table(&self) -> &GrantTable {
        &self.grants
    }

    /// Whether the block lies within this claim.
    pub fn contains_point(&self, world: &str, x: i32, y: i32, z: i32) -> bool {
        self.volume.contains(world, x, y, z)
    }

    /// The effective group of an actor in this claim.
    ///
    /// The owner always resolves to [`Group::Owner`], even over an explicit
    /// lower grant. Everyone else resolves to their stored grant, or
    /// [`Group::None`] without one. The first non-trivial call materializes
    /// the grant table from the store.
    pub fn resolve_group(
        &mut self,
        store: &dyn ClaimStore,
        actor: Uuid,
    ) -> Result<Group, StoreError> {
        if actor == self.owner {
            return Ok(Group::Owner);
        }
        let grants = self.load_grants(store)?;
        Ok(grants.get(&actor).copied().unwrap_or(Group::None))
    }

    /// Whether the actor's effective group covers `required`.
    pub fn is_allowed(
        &mut self,
        store: &dyn ClaimStore,
        actor: Uuid,
        required: Group,
    ) -> Result<bool, StoreError> {
        Ok(self.resolve_group(store, actor)?.encompasses(required))
    }

    /// Grant `group` to an actor, updating an existing grant in place.
    ///
    /// An existing grant is updated in the store and the loaded table; a new
    /// grant is created and the backing collection refreshed so later loads
    /// stay consistent. Granting [`Group::Owner`] is refused with
    /// [`GrantError::NotAssignable`]: ownership is synthesized from the
    /// claim record, never stored.
    pub fn set_group(
        &mut self,
        store: &dyn ClaimStore,
        actor: Uuid,
        group: Group,
    ) -> Result<(), GrantError> {
        if group == Group::Owner {
            return Err(GrantError::NotAssignable);
        }
        let claim = self.record_id.ok_or(StoreError::NotFound)?;
        let known = self.load_grants(store)?.contains_key(&actor);

        let row = GrantRecord {
            claim,
            actor,
            group_rank: group.rank(),
        };
        if known {
            if let Err(e) = store.update_grant(&row) {
                error!(%actor, ?e, "failed to update a grant");
                return Err(e.into());
            }
            if let GrantTable::Loaded(map) = &mut self.grants {
                map.insert(actor, group);
            }
        } else {
            if let Err(e) = store.create_grant(&row) {
                error!(%actor, ?e, "failed to create a grant");
                return Err(e.into());
            }
            // Refresh from the store rather than patching the map, so the
            // table reflects whatever the store actually holds.
            self.grants = GrantTable::Unloaded;
            self.load_grants(store)?;
        }
        Ok(())
    }

    /// Revoke every grant of this claim at once.
    ///
    /// The store rows are deleted and the table replaced with an empty one,
    /// so later resolutions see no grants without another load.
    pub fn clear_groups(&mut self, store: &dyn ClaimStore) -> Result<(), StoreError> {
        let claim = self.record_id.ok_or(StoreError::NotFound)?;
        if let Err(e) = store.delete_grants_for(claim) {
            error!(owner = %self.owner, ?e, "failed to clear grants");
            return Err(e);
        }
        self.grants = GrantTable::Loaded(HashMap::new());
        Ok(())
    }

    /// Persist this claim as a new record, assigning its record id.
    pub fn save(
        &mut self,
        store: &dyn ClaimStore,
        parent_record: Option<ClaimRecordId>,
    ) -> Result<(), StoreError> {
        let mut record = self.to_record(parent_record);
        match store.create_claim(&mut record) {
            Ok(()) => {
                self.record_id = record.id;
                Ok(())
            }
            Err(e) => {
                error!(owner = %self.owner, ?e, "failed to create a claim");
                Err(e)
            }
        }
    }

    /// Persist this claim's current state over its existing record.
    pub fn update(
        &self,
        store: &dyn ClaimStore,
        parent_record: Option<ClaimRecordId>,
    ) -> Result<(), StoreError> {
        match store.update_claim(&self.to_record(parent_record)) {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(owner = %self.owner, ?e, "failed to update a claim");
                Err(e)
            }
        }
    }

    /// Delete this claim's record (and its grants) from the store.
    pub fn delete(&self, store: &dyn ClaimStore) -> Result<(), StoreError> {
        let id = self.record_id.ok_or(StoreError::NotFound)?;
        match store.delete_claim(id) {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(owner = %self.owner, ?e, "failed to delete a claim");
                Err(e)
            }
        }
    }

    fn load_grants(&mut self, store: &dyn ClaimStore) -> Result<&HashMap<Uuid, Group>, StoreError> {
        if let GrantTable::Unloaded = self.grants {
            let claim = self.record_id.ok_or(StoreError::NotFound)?;
            let rows = store.grants_for(claim)?;
            let mut map = HashMap::with_capacity(rows.len());
            for row in rows {
                // Unknown ranks come from a newer schema; treat them as no
                // grant rather than failing the whole table.
                if let Some(group) = Group::from_rank(row.group_rank) {
                    map.insert(row.actor, group);
                }
            }
            self.grants = GrantTable::Loaded(map);
        }
        match &self.grants {
            GrantTable::Loaded(map) => Ok(map),
            GrantTable::Unloaded => unreachable!("grants were just loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stead_store::MemoryStore;

    fn persisted_claim(store: &MemoryStore, owner: Uuid) -> Claim {
        let mut claim = Claim::new_root(
            owner,
            None,
            Volume::from_corners("overworld", (0, 0, 0), (10, 255, 10)),
        );
        claim.save(store, None).unwrap();
        claim
    }

    #[test]
    fn owner_resolves_to_owner_even_with_lower_grant() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut claim = persisted_claim(&store, owner);

        claim.set_group(&store, owner, Group::Guest).unwrap();
        assert_eq!(claim.resolve_group(&store, owner).unwrap(), Group::Owner);
    }

    #[test]
    fn unknown_actor_resolves_to_none() {
        let store = MemoryStore::new();
        let mut claim = persisted_claim(&store, Uuid::new_v4());
        let stranger = Uuid::new_v4();

        assert_eq!(claim.resolve_group(&store, stranger).unwrap(), Group::None);
        assert!(claim.is_allowed(&store, stranger, Group::None).unwrap());
        assert!(!claim.is_allowed(&store, stranger, Group::Guest).unwrap());
    }

    #[test]
    fn set_group_upserts_without_duplicates() {
        let store = MemoryStore::new();
        let mut claim = persisted_claim(&store, Uuid::new_v4());
        let actor = Uuid::new_v4();

        claim.set_group(&store, actor, Group::Guest).unwrap();
        claim.set_group(&store, actor, Group::Manager).unwrap();

        assert_eq!(claim.resolve_group(&store, actor).unwrap(), Group::Manager);
        let rows = store.grants_for(claim.record_id().unwrap()).unwrap();
        assert_eq!(rows.len(), 1, "upsert must not duplicate the grant row");
        assert_eq!(rows[0].group_rank, Group::Manager.rank());
    }

    #[test]
    fn grant_table_loads_lazily_from_record() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let mut original = persisted_claim(&store, owner);
        original.set_group(&store, actor, Group::Member).unwrap();

        // A claim rebuilt from its record starts unloaded and materializes
        // the table on first resolution.
        let record = original.to_record(None);
        let mut reloaded = Claim::from_record(&record, None);
        assert!(!reloaded.grant_table().is_loaded());
        assert_eq!(reloaded.resolve_group(&store, actor).unwrap(), Group::Member);
        assert!(reloaded.grant_table().is_loaded());
    }

    #[test]
    fn is_allowed_tracks_group_order() {
        let store = MemoryStore::new();
        let mut claim = persisted_claim(&store, Uuid::new_v4());
        let actor = Uuid::new_v4();
        claim.set_group(&store, actor, Group::Member).unwrap();

        assert!(claim.is_allowed(&store, actor, Group::Guest).unwrap());
        assert!(claim.is_allowed(&store, actor, Group::Member).unwrap());
        assert!(!claim.is_allowed(&store, actor, Group::Manager).unwrap());
    }

    #[test]
    fn clear_groups_revokes_everything_at_once() {
        let store = MemoryStore::new();
        let mut claim = persisted_claim(&store, Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        claim.set_group(&store, a, Group::Member).unwrap();
        claim.set_group(&store, b, Group::Manager).unwrap();

        claim.clear_groups(&store).unwrap();
        assert_eq!(claim.resolve_group(&store, a).unwrap(), Group::None);
        assert_eq!(claim.resolve_group(&store, b).unwrap(), Group::None);
        assert!(store.grants_for(claim.record_id().unwrap()).unwrap().is_empty());
    }

    #[test]
    fn unpersisted_claim_rejects_grants() {
        let store = MemoryStore::new();
        let mut claim = Claim::new_root(
            Uuid::new_v4(),
            None,
            Volume::from_corners("overworld", (0, 0, 0), (5, 5, 5)),
        );
        assert_eq!(
            claim.set_group(&store, Uuid::new_v4(), Group::Guest),
            Err(GrantError::Store(StoreError::NotFound))
        );
    }

    #[test]
    fn owner_group_is_never_stored() {
        let store = MemoryStore::new();
        let mut claim = persisted_claim(&store, Uuid::new_v4());
        let actor = Uuid::new_v4();

        assert_eq!(
            claim.set_group(&store, actor, Group::Owner),
            Err(GrantError::NotAssignable)
        );
        assert!(store.grants_for(claim.record_id().unwrap()).unwrap().is_empty());
        assert_eq!(claim.resolve_group(&store, actor).unwrap(), Group::None);
    }
}
