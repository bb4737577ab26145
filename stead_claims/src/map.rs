// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The in-memory claim map: a slot arena of claims with per-world spatial
//! indexes for point lookup and overlap checks.

use std::collections::HashMap;

use stead_index::{Aabb3D, IndexGeneric, Key};

use crate::claim::Claim;
use crate::volume::Volume;

type WorldIndex = IndexGeneric<i32, ClaimId, stead_index::backends::ColumnGridI32>;

/// Default index cell size, matching the 16-block chunk grid most block
/// worlds are laid out on.
pub const DEFAULT_CELL_SIZE: i32 = 16;

/// Generational handle for claims in a [`ClaimMap`].
///
/// Handles go stale when the claim is removed; every accessor checks the
/// generation, so a stale handle reads as "no such claim" rather than
/// aliasing a slot reused by a later claim.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClaimId(u32, u32);

impl ClaimId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Claim handles are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Deterministic "newer" order on claim handles.
///
/// A reused slot always carries a higher generation, and within one
/// generation growth a higher slot index was allocated later.
fn id_is_newer(a: ClaimId, b: ClaimId) -> bool {
    a.1 > b.1 || (a.1 == b.1 && a.0 > b.0)
}

#[derive(Debug)]
struct Slot {
    claim: Claim,
    children: Vec<ClaimId>,
    index_key: Key,
}

/// All loaded claims of a process, indexed for spatial queries.
///
/// The map owns the child links; each [`Claim`] only holds its parent's
/// handle. One spatial index is kept per world, created lazily.
///
/// Slot generations live outside the slots so they survive removal: a
/// handle for a removed claim stays stale forever, even after its slot is
/// reused.
#[derive(Debug)]
pub struct ClaimMap {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    worlds: HashMap<String, WorldIndex>,
    cell_size: i32,
}

impl Default for ClaimMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimMap {
    /// Create an empty map with the default index cell size.
    pub fn new() -> Self {
        Self::with_cell_size(DEFAULT_CELL_SIZE)
    }

    /// Create an empty map with an explicit index cell size.
    pub fn with_cell_size(cell_size: i32) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            worlds: HashMap::new(),
            cell_size,
        }
    }

    /// Number of live claims.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the map holds no live claims.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Whether the handle refers to a live claim.
    pub fn is_alive(&self, id: ClaimId) -> bool {
        self.slot(id).is_some()
    }

    /// The claim behind a handle, or `None` for stale handles.
    pub fn claim(&self, id: ClaimId) -> Option<&Claim> {
        self.slot(id).map(|s| &s.claim)
    }

    /// Mutable access to the claim behind a handle.
    ///
    /// Volume edits must go through [`set_volume`][Self::set_volume] so the
    /// spatial index stays in sync; this is for the remaining fields.
    pub fn claim_mut(&mut self, id: ClaimId) -> Option<&mut Claim> {
        self.slot_mut(id).map(|s| &mut s.claim)
    }

    /// The parent handle of a claim, `None` for roots and stale handles.
    pub fn parent_of(&self, id: ClaimId) -> Option<ClaimId> {
        self.claim(id).and_then(Claim::parent)
    }

    /// The direct sub-claims of a claim.
    pub fn children_of(&self, id: ClaimId) -> &[ClaimId] {
        self.slot(id).map_or(&[], |s| s.children.as_slice())
    }

    /// Iterate over every live claim and its handle, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ClaimId, &Claim)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|s| (ClaimId::new(idx, self.generations[idx]), &s.claim))
        })
    }

    /// The claim and all its descendants, children before parents.
    ///
    /// The order is safe for cascading deletes: every claim appears before
    /// its parent.
    pub fn subtree(&self, id: ClaimId) -> Vec<ClaimId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: ClaimId, out: &mut Vec<ClaimId>) {
        if !self.is_alive(id) {
            return;
        }
        for child in self.children_of(id).to_vec() {
            self.collect_subtree(child, out);
        }
        out.push(id);
    }

    /// Insert a claim, wiring it into its parent and world index.
    ///
    /// Returns `None` without inserting anything when the claim names a
    /// parent that is not alive in this map.
    pub fn insert(&mut self, claim: Claim) -> Option<ClaimId> {
        let parent = claim.parent();
        if let Some(parent) = parent
            && !self.is_alive(parent)
        {
            return None;
        }
        let aabb = claim.volume().aabb();
        let world = claim.volume().world().to_owned();

        let idx = if let Some(idx) = self.free_list.pop() {
            // Bumping on reuse keeps every handle issued for this slot stale.
            self.generations[idx] += 1;
            idx
        } else {
            self.slots.push(None);
            self.generations.push(1);
            self.slots.len() - 1
        };
        let id = ClaimId::new(idx, self.generations[idx]);

        let index = self
            .worlds
            .entry(world)
            .or_insert_with(|| WorldIndex::with_backend(
                stead_index::backends::ColumnGridI32::new(self.cell_size),
            ));
        let index_key = index.insert(aabb, id);

        self.slots[idx] = Some(Slot {
            claim,
            children: Vec::new(),
            index_key,
        });

        if let Some(parent) = parent
            && let Some(slot) = self.slot_mut(parent)
        {
            slot.children.push(id);
        }
        Some(id)
    }

    /// Remove a claim and its whole subtree. Stale handles are ignored.
    ///
    /// Returns the removed claim itself, so callers can inspect it after
    /// the map no longer holds it.
    pub fn remove(&mut self, id: ClaimId) -> Option<Claim> {
        if !self.is_alive(id) {
            return None;
        }
        if let Some(parent) = self.parent_of(id)
            && let Some(slot) = self.slot_mut(parent)
        {
            slot.children.retain(|c| *c != id);
        }

        let mut removed = None;
        for victim in self.subtree(id) {
            let slot = self.slots[victim.idx()]
                .take()
                .expect("subtree handles are alive by construction");
            if let Some(index) = self.worlds.get_mut(slot.claim.volume().world()) {
                index.remove(slot.index_key);
            }
            self.free_list.push(victim.idx());
            if victim == id {
                removed = Some(slot.claim);
            }
        }
        removed
    }

    /// Replace a claim's volume, keeping the spatial index in sync.
    ///
    /// The new volume must lie in the claim's current world; claims never
    /// change worlds.
    pub fn set_volume(&mut self, id: ClaimId, volume: Volume) {
        if self.generations.get(id.idx()).copied() != Some(id.1) {
            return;
        }
        let Some(slot) = self.slots.get_mut(id.idx()).and_then(Option::as_mut) else {
            return;
        };
        debug_assert_eq!(
            slot.claim.volume().world(),
            volume.world(),
            "a claim never changes worlds"
        );
        let aabb = volume.aabb();
        let key = slot.index_key;
        slot.claim.set_volume(volume);
        if let Some(index) = self.worlds.get_mut(slot.claim.volume().world()) {
            index.update(key, aabb);
        }
    }

    /// The most specific claim containing a block, if any.
    ///
    /// Among all claims containing the point, sub-claims beat root claims,
    /// a smaller volume beats a larger one, and a newer handle breaks the
    /// remaining ties. The result is deterministic for any fixed map state.
    pub fn find_at(&self, world: &str, x: i32, y: i32, z: i32) -> Option<ClaimId> {
        let index = self.worlds.get(world)?;
        let mut best: Option<ClaimId> = None;
        index.visit_point(x, y, z, |_, id| {
            // The index can briefly disagree with the arena only through a
            // bug; skip anything the arena no longer knows.
            if self.is_alive(id) && self.beats(id, best) {
                best = Some(id);
            }
        });
        best
    }

    fn beats(&self, candidate: ClaimId, best: Option<ClaimId>) -> bool {
        let Some(best) = best else { return true };
        let c = self.claim(candidate).expect("candidate is alive");
        let b = self.claim(best).expect("best is alive");
        let c_sub = c.parent().is_some();
        let b_sub = b.parent().is_some();
        if c_sub != b_sub {
            return c_sub;
        }
        match c.volume().volume_blocks().cmp(&b.volume().volume_blocks()) {
            core::cmp::Ordering::Less => true,
            core::cmp::Ordering::Greater => false,
            core::cmp::Ordering::Equal => id_is_newer(candidate, best),
        }
    }

    /// Whether a volume would illegally overlap existing claims.
    ///
    /// A root candidate (`parent` is `None`) is checked against other root
    /// claims only; sub-claims may freely cross their parent's interior. A
    /// sub-claim candidate is checked against its siblings under the same
    /// parent only. `excluding` exempts one claim, for resize checks against
    /// the claim's own current volume.
    pub fn would_overlap(
        &self,
        volume: &Volume,
        parent: Option<ClaimId>,
        excluding: Option<ClaimId>,
    ) -> bool {
        match parent {
            None => {
                let Some(index) = self.worlds.get(volume.world()) else {
                    return false;
                };
                let mut hit = false;
                index.visit_volume(volume.aabb(), |_, id| {
                    if Some(id) != excluding
                        && self.claim(id).is_some_and(|c| c.parent().is_none())
                    {
                        hit = true;
                    }
                });
                hit
            }
            Some(parent) => self.children_of(parent).iter().any(|sibling| {
                Some(*sibling) != excluding
                    && self
                        .claim(*sibling)
                        .is_some_and(|c| c.volume().overlaps(volume))
            }),
        }
    }

    /// Visit every live claim whose volume overlaps the given box in a world.
    pub fn visit_overlapping<F: FnMut(ClaimId, &Claim)>(
        &self,
        world: &str,
        aabb: Aabb3D<i32>,
        mut f: F,
    ) {
        let Some(index) = self.worlds.get(world) else {
            return;
        };
        let mut hits = Vec::new();
        index.visit_volume(aabb, |_, id| hits.push(id));
        for id in hits {
            if let Some(claim) = self.claim(id) {
                f(id, claim);
            }
        }
    }

    fn slot(&self, id: ClaimId) -> Option<&Slot> {
        if self.generations.get(id.idx()).copied() != Some(id.1) {
            return None;
        }
        self.slots.get(id.idx())?.as_ref()
    }

    fn slot_mut(&mut self, id: ClaimId) -> Option<&mut Slot> {
        if self.generations.get(id.idx()).copied() != Some(id.1) {
            return None;
        }
        self.slots.get_mut(id.idx())?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn root(map: &mut ClaimMap, min: (i32, i32, i32), max: (i32, i32, i32)) -> ClaimId {
        map.insert(Claim::new_root(
            Uuid::new_v4(),
            None,
            Volume::from_corners("overworld", min, max),
        ))
        .unwrap()
    }

    fn child(
        map: &mut ClaimMap,
        parent: ClaimId,
        min: (i32, i32, i32),
        max: (i32, i32, i32),
    ) -> ClaimId {
        let parent_claim = map.claim(parent).unwrap().clone();
        map.insert(Claim::new_child(parent, &parent_claim, min, max))
            .unwrap()
    }

    #[test]
    fn find_at_prefers_sub_claims() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let inner = child(&mut map, outer, (10, 0, 10), (20, 255, 20));

        assert_eq!(map.find_at("overworld", 15, 64, 15), Some(inner));
        assert_eq!(map.find_at("overworld", 50, 64, 50), Some(outer));
        assert_eq!(map.find_at("overworld", 200, 64, 200), None);
        assert_eq!(map.find_at("nether", 15, 64, 15), None);
    }

    #[test]
    fn find_at_breaks_sibling_ties_by_volume_then_recency() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let big = child(&mut map, outer, (0, 0, 0), (40, 255, 40));
        let small = child(&mut map, outer, (0, 0, 0), (10, 255, 10));

        // Both sub-claims contain the point; the smaller one wins.
        assert_eq!(map.find_at("overworld", 5, 64, 5), Some(small));
        assert_eq!(map.find_at("overworld", 30, 64, 30), Some(big));

        // Identical volumes fall back to the newer handle.
        let twin = child(&mut map, outer, (0, 0, 0), (10, 255, 10));
        assert_eq!(map.find_at("overworld", 5, 64, 5), Some(twin));
    }

    #[test]
    fn root_overlap_ignores_sub_claims_of_other_roots() {
        let mut map = ClaimMap::new();
        let a = root(&mut map, (0, 0, 0), (50, 255, 50));
        let _a_sub = child(&mut map, a, (40, 0, 40), (50, 255, 50));

        // Crossing the neighbor root is illegal.
        let clash = Volume::from_corners("overworld", (45, 0, 45), (60, 255, 60));
        assert!(map.would_overlap(&clash, None, None));

        // Disjoint from every root is fine, and other worlds never clash.
        let clear = Volume::from_corners("overworld", (60, 0, 60), (70, 255, 70));
        assert!(!map.would_overlap(&clear, None, None));
        let nether = Volume::from_corners("nether", (0, 0, 0), (50, 255, 50));
        assert!(!map.would_overlap(&nether, None, None));
    }

    #[test]
    fn sub_claim_overlap_checks_siblings_only() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let _sibling = child(&mut map, outer, (0, 0, 0), (20, 255, 20));

        // Overlapping the parent interior is fine, overlapping a sibling is not.
        let inside = Volume::from_corners("overworld", (30, 0, 30), (40, 255, 40));
        assert!(!map.would_overlap(&inside, Some(outer), None));
        let clash = Volume::from_corners("overworld", (15, 0, 15), (30, 255, 30));
        assert!(map.would_overlap(&clash, Some(outer), None));
    }

    #[test]
    fn excluding_exempts_the_resized_claim_itself() {
        let mut map = ClaimMap::new();
        let a = root(&mut map, (0, 0, 0), (50, 255, 50));

        let grown = Volume::from_corners("overworld", (0, 0, 0), (60, 255, 60));
        assert!(map.would_overlap(&grown, None, None));
        assert!(!map.would_overlap(&grown, None, Some(a)));
    }

    #[test]
    fn set_volume_moves_the_index_entry() {
        let mut map = ClaimMap::new();
        let a = root(&mut map, (0, 0, 0), (10, 255, 10));

        map.set_volume(a, Volume::from_corners("overworld", (100, 0, 100), (110, 255, 110)));
        assert_eq!(map.find_at("overworld", 5, 64, 5), None);
        assert_eq!(map.find_at("overworld", 105, 64, 105), Some(a));
    }

    #[test]
    fn remove_cascades_and_handles_go_stale() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let inner = child(&mut map, outer, (10, 0, 10), (20, 255, 20));
        let nested = child(&mut map, inner, (12, 0, 12), (15, 255, 15));

        let removed = map.remove(outer).unwrap();
        assert!(removed.parent().is_none());
        for id in [outer, inner, nested] {
            assert!(!map.is_alive(id));
        }
        assert_eq!(map.find_at("overworld", 13, 64, 13), None);
        assert!(map.is_empty());

        // Slots are reused under a fresh generation; old handles stay stale.
        let replacement = root(&mut map, (0, 0, 0), (10, 255, 10));
        assert!(map.is_alive(replacement));
        assert!(!map.is_alive(outer));

        // A stale handle must not reach the slot's new occupant either.
        assert!(map.claim(outer).is_none());
        map.set_volume(
            outer,
            Volume::from_corners("overworld", (50, 0, 50), (60, 255, 60)),
        );
        assert_eq!(map.find_at("overworld", 5, 64, 5), Some(replacement));
        assert!(map.remove(outer).is_none());
        assert!(map.is_alive(replacement));
    }

    #[test]
    fn insert_refuses_a_stale_parent_handle() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let snapshot = map.claim(outer).unwrap().clone();
        map.remove(outer);

        let orphan = Claim::new_child(outer, &snapshot, (10, 0, 10), (20, 255, 20));
        assert!(map.insert(orphan).is_none());
        assert!(map.is_empty());
        assert_eq!(map.find_at("overworld", 15, 64, 15), None);
    }

    #[test]
    fn iter_walks_live_claims_only() {
        let mut map = ClaimMap::new();
        let a = root(&mut map, (0, 0, 0), (10, 255, 10));
        let b = root(&mut map, (20, 0, 20), (30, 255, 30));
        map.remove(a);

        let ids: Vec<ClaimId> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn subtree_lists_children_before_parents() {
        let mut map = ClaimMap::new();
        let outer = root(&mut map, (0, 0, 0), (100, 255, 100));
        let inner = child(&mut map, outer, (10, 0, 10), (20, 255, 20));
        let nested = child(&mut map, inner, (12, 0, 12), (15, 255, 15));

        let order = map.subtree(outer);
        assert_eq!(order, vec![nested, inner, outer]);
    }
}
