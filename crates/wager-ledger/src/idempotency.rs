//! Resolution idempotency guard: prevents double-crediting a winner.
//!
//! Each bet can be resolved into ledger entries exactly once. Attempting to
//! post a second resolution for the same `BetId` returns
//! [`WagerError::AlreadyResolved`].
//!
//! The guard lives inside the ledger, so it is copied, committed and rolled
//! back together with the entries it protects. A key is only dropped when the
//! administrative group erase removes the bet's entries as well.

use std::collections::HashSet;

use wager_types::{BetId, Result, WagerError};

/// Tracks which bets already have resolution entries.
#[derive(Debug, Clone, Default)]
pub struct ResolutionGuard {
    resolved: HashSet<BetId>,
}

impl ResolutionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a bet as resolved.
    ///
    /// # Errors
    /// Returns [`WagerError::AlreadyResolved`] if `bet_id` was already marked.
    pub fn mark_resolved(&mut self, bet_id: BetId) -> Result<()> {
        if !self.resolved.insert(bet_id) {
            return Err(WagerError::AlreadyResolved(bet_id));
        }
        Ok(())
    }

    pub fn is_resolved(&self, bet_id: &BetId) -> bool {
        self.resolved.contains(bet_id)
    }

    /// Drop a bet's key. Only the administrative group erase calls this,
    /// after the bet's entries are gone too.
    pub fn forget(&mut self, bet_id: &BetId) {
        self.resolved.remove(bet_id);
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
