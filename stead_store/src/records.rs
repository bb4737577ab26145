// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable rows for claims and grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a persisted claim row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimRecordId(pub i64);

/// One persisted claim: ownership, world, and the six bounding coordinates.
///
/// `owner`, `world`, and the bounds are mandatory; `id` is `None` until the
/// record has been created in a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Store-assigned id; `None` before the first create.
    pub id: Option<ClaimRecordId>,
    /// Owning actor.
    pub owner: Uuid,
    /// Optional display name.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// World identifier (case-sensitive).
    pub world: String,
    /// Minimum x.
    pub min_x: i32,
    /// Minimum y.
    pub min_y: i32,
    /// Minimum z.
    pub min_z: i32,
    /// Maximum x.
    pub max_x: i32,
    /// Maximum y.
    pub max_y: i32,
    /// Maximum z.
    pub max_z: i32,
    /// Record id of the parent claim for sub-claims, `None` for roots.
    pub parent: Option<ClaimRecordId>,
}

impl ClaimRecord {
    /// Whether the record's bounds contain the block, ignoring the world.
    pub fn contains_block(&self, x: i32, y: i32, z: i32) -> bool {
        self.min_x <= x
            && x <= self.max_x
            && self.min_y <= y
            && y <= self.max_y
            && self.min_z <= z
            && z <= self.max_z
    }
}

/// One persisted permission grant: the group an actor holds in a claim.
///
/// Grants are keyed by `(claim, actor)`; a store never holds two rows for
/// the same pair. The group is stored as its numeric rank so the store does
/// not depend on the domain enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    /// The claim this grant belongs to.
    pub claim: ClaimRecordId,
    /// The actor the group is granted to.
    pub actor: Uuid,
    /// Numeric rank of the granted group.
    pub group_rank: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> ClaimRecord {
        ClaimRecord {
            id: Some(ClaimRecordId(7)),
            owner: Uuid::new_v4(),
            name: Some("spawn".to_owned()),
            created_at: Utc::now(),
            world: "overworld".to_owned(),
            min_x: -5,
            min_y: 0,
            min_z: -5,
            max_x: 5,
            max_y: 255,
            max_z: 5,
            parent: None,
        }
    }

    #[test]
    fn contains_block_is_inclusive() {
        let record = sample_claim();
        assert!(record.contains_block(-5, 0, -5));
        assert!(record.contains_block(5, 255, 5));
        assert!(!record.contains_block(6, 10, 0));
    }

    #[test]
    fn claim_record_roundtrips_through_json() {
        let record = sample_claim();
        let json = serde_json::to_string(&record).unwrap();
        let back: ClaimRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn grant_record_roundtrips_through_json() {
        let record = GrantRecord {
            claim: ClaimRecordId(3),
            actor: Uuid::new_v4(),
            group_rank: 2,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: GrantRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
