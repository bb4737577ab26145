// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Service failure taxonomy.

use stead_claims::GrantError;
use stead_store::StoreError;
use thiserror::Error;

/// Failure reported by a [`ClaimService`][crate::ClaimService] operation.
///
/// Every variant leaves the service consistent: a failed operation charges
/// no budget and publishes nothing to the spatial index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The requested volume overlaps a claim it may not overlap.
    #[error("the volume overlaps an existing claim")]
    Overlap,

    /// The owner's claim-block budget does not cover the footprint.
    #[error("insufficient claim blocks: need {needed}, have {available}")]
    InsufficientBudget {
        /// Blocks the operation would charge.
        needed: u64,
        /// Blocks the owner currently has.
        available: u64,
    },

    /// The claim handle is stale or was never issued by this service.
    #[error("no such claim")]
    UnknownClaim,

    /// The owner group cannot be granted; ownership is only ever synthesized.
    #[error("the owner group cannot be granted")]
    GrantNotAssignable,

    /// The persistence layer failed; nothing was published.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GrantError> for ServiceError {
    fn from(e: GrantError) -> Self {
        match e {
            GrantError::NotAssignable => Self::GrantNotAssignable,
            GrantError::Store(e) => Self::Store(e),
        }
    }
}
