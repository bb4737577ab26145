// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ranked permission groups.

/// Permission level an actor holds within a claim.
///
/// Groups form a total order by capability: every group encompasses itself
/// and everything below it. [`Group::Owner`] is never stored in a grant
/// table; it is synthesized when the querying actor is the claim's owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Group {
    /// No access granted.
    #[default]
    None,
    /// May interact with doors, buttons, and other non-destructive blocks.
    Guest,
    /// May build and break within the claim.
    Member,
    /// May additionally manage grants and sub-claims.
    Manager,
    /// Full control; implied by claim ownership, never granted explicitly.
    Owner,
}

impl Group {
    /// Whether this group's capability covers the required group.
    ///
    /// Reflexive and transitive over the rank order; `None` encompasses only
    /// `None`, `Owner` encompasses everything.
    #[inline]
    pub fn encompasses(self, required: Self) -> bool {
        self >= required
    }

    /// Numeric rank of the group, as stored in grant rows.
    pub const fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Guest => 1,
            Self::Member => 2,
            Self::Manager => 3,
            Self::Owner => 4,
        }
    }

    /// The group for a stored numeric rank, or `None` for unknown ranks.
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::None),
            1 => Some(Self::Guest),
            2 => Some(Self::Member),
            3 => Some(Self::Manager),
            4 => Some(Self::Owner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Group;

    const ALL: [Group; 5] = [
        Group::None,
        Group::Guest,
        Group::Member,
        Group::Manager,
        Group::Owner,
    ];

    #[test]
    fn encompasses_is_reflexive_and_transitive() {
        for a in ALL {
            assert!(a.encompasses(a), "{a:?} must encompass itself");
            for b in ALL {
                for c in ALL {
                    if a.encompasses(b) && b.encompasses(c) {
                        assert!(a.encompasses(c), "{a:?} >= {b:?} >= {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn owner_encompasses_everything() {
        for g in ALL {
            assert!(Group::Owner.encompasses(g));
        }
    }

    #[test]
    fn none_encompasses_only_none() {
        assert!(Group::None.encompasses(Group::None));
        assert!(!Group::None.encompasses(Group::Guest));
        assert!(!Group::None.encompasses(Group::Owner));
    }

    #[test]
    fn rank_roundtrips() {
        for g in ALL {
            assert_eq!(Group::from_rank(g.rank()), Some(g));
        }
        assert_eq!(Group::from_rank(200), None);
    }
}
