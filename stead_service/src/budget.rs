// Copyright 2025 the Stead Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Claim-block budgets.
//!
//! Each actor holds a balance of claim blocks. Root claims charge their x/z
//! footprint against the owner's balance; deleting or shrinking a root claim
//! refunds blocks. How blocks are earned (playtime, purchase, fiat from an
//! admin) is the ledger implementation's business.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// Balance book for claim blocks.
///
/// The service calls this under its own lock, but ledgers may also be shown
/// to actors outside any claim operation, so implementations synchronize
/// themselves.
pub trait BudgetLedger: Send + Sync {
    /// Blocks the actor currently holds.
    fn available(&self, actor: Uuid) -> u64;

    /// Deduct `blocks` from the actor's balance.
    ///
    /// Returns `false` without deducting anything when the balance does not
    /// cover the charge.
    fn charge(&self, actor: Uuid, blocks: u64) -> bool;

    /// Return `blocks` to the actor's balance.
    fn refund(&self, actor: Uuid, blocks: u64);
}

/// Mutex-guarded in-memory [`BudgetLedger`].
///
/// Unknown actors have a zero balance until granted blocks with
/// [`deposit`][Self::deposit].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<Uuid, u64>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `blocks` to the actor's balance.
    pub fn deposit(&self, actor: Uuid, blocks: u64) {
        let mut balances = self.lock();
        *balances.entry(actor).or_insert(0) += blocks;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, u64>> {
        // Balances are plain counters; a poisoned lock stays usable.
        self.balances.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BudgetLedger for MemoryLedger {
    fn available(&self, actor: Uuid) -> u64 {
        self.lock().get(&actor).copied().unwrap_or(0)
    }

    fn charge(&self, actor: Uuid, blocks: u64) -> bool {
        let mut balances = self.lock();
        match balances.get_mut(&actor) {
            Some(balance) if *balance >= blocks => {
                *balance -= blocks;
                true
            }
            Some(_) => false,
            None => blocks == 0,
        }
    }

    fn refund(&self, actor: Uuid, blocks: u64) {
        let mut balances = self.lock();
        *balances.entry(actor).or_insert(0) += blocks;
    }
}
