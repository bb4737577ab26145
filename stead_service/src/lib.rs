// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stead Service: orchestration for land claims.
//!
//! [`ClaimService`] ties the domain core together: it validates new and
//! resized volumes against the in-memory claim map, settles claim-block
//! costs with a [`BudgetLedger`], persists through a
//! [`ClaimStore`][stead_store::ClaimStore], and only then publishes changes
//! to the spatial index. One coarse lock keeps those steps atomic per
//! operation.
//!
//! # Example
//!
//! ```rust
//! use stead_service::{BudgetLedger, ClaimService, MemoryLedger};
//! use stead_store::MemoryStore;
//! use uuid::Uuid;
//!
//! let owner = Uuid::new_v4();
//! let ledger = MemoryLedger::new();
//! ledger.deposit(owner, 100);
//! let service = ClaimService::new(MemoryStore::new(), ledger);
//!
//! let receipt = service
//!     .create_claim(owner, None, "overworld", (0, 64, 0), (4, 64, 3))
//!     .unwrap();
//! assert_eq!(receipt.footprint_blocks, 20);
//! assert_eq!(receipt.remaining_budget, 80);
//!
//! service.delete_claim(receipt.claim).unwrap();
//! assert_eq!(service.ledger().available(owner), 100);
//! ```

mod budget;
mod error;
mod service;

pub use budget::{BudgetLedger, MemoryLedger};
pub use error::ServiceError;
pub use service::{ClaimReceipt, ClaimService};
