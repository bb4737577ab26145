// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Store failure taxonomy.

use thiserror::Error;

/// Failure reported by a [`ClaimStore`][crate::ClaimStore] operation.
///
/// Store failures never terminate the process: callers convert them into
/// user-facing messages or retries at the command boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store rejected or failed the operation.
    #[error("store backend failure: {0}")]
    Backend(String),

    /// The addressed record does not exist in the store.
    #[error("record not found")]
    NotFound,
}
