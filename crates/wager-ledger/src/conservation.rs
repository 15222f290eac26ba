//! Resolution conservation checker.
//!
//! Invariant re-checked after a bet's resolution entries are posted, before
//! the unit of work commits:
//! ```text
//! FullPot:  credit(winner) == pot          ∧ debit(loser) == min(stakes)
//! ZeroSum:  credit(winner) == min(stakes)  ∧ debit(loser) == min(stakes)
//! Disputed: Σ balance entries == 0
//! ```
//! No party other than the two matched users may receive a balance entry.
//! A failure aborts the unit, so nothing from the resolution is persisted.

use wager_types::{
    Match, Resolution, Result, SettlementPolicy, Side, Transaction, UserId, WagerError,
};

/// Validates the balance entries of one bet against its match.
#[derive(Debug, Clone, Copy)]
pub struct ConservationCheck {
    policy: SettlementPolicy,
}

impl ConservationCheck {
    #[must_use]
    pub fn new(policy: SettlementPolicy) -> Self {
        Self { policy }
    }

    /// Expected net movement for `(winner, loser)` under this policy.
    #[must_use]
    pub fn expected(&self, matched: &Match) -> (i128, i128) {
        let min = i128::from(matched.matched_amount());
        let credit = match self.policy {
            SettlementPolicy::FullPot => {
                i128::from(matched.originator_amount) + i128::from(matched.counterparty_amount)
            }
            SettlementPolicy::ZeroSum => min,
        };
        (credit, -min)
    }

    /// Verify `entries` (every ledger entry referencing the bet).
    ///
    /// # Errors
    /// Returns [`WagerError::LedgerIntegrity`] if any party's net differs
    /// from what the resolution implies.
    pub fn verify_resolution(
        &self,
        entries: &[&Transaction],
        matched: &Match,
        resolution: Resolution,
    ) -> Result<()> {
        let net = |user: UserId| -> i128 {
            entries
                .iter()
                .filter(|tx| tx.user_id == user && tx.tx_type.is_balance_affecting())
                .map(|tx| i128::from(tx.amount))
                .sum()
        };

        if let Some(stray) = entries.iter().find(|tx| {
            tx.tx_type.is_balance_affecting() && matched.side_of(tx.user_id).is_none()
        }) {
            return Err(violation(format!(
                "bet {}: balance entry {} for non-party {}",
                matched.bet_id, stray.id, stray.user_id
            )));
        }

        let (expect_winner, expect_loser, winner, loser) = match resolution {
            Resolution::Agreed { originator_won } => {
                let side = Side::winner(originator_won);
                let (credit, debit) = self.expected(matched);
                (credit, debit, matched.party(side), matched.party(side.opposite()))
            }
            Resolution::Disputed => (0, 0, matched.originator_id, matched.counterparty_id),
        };

        let (got_winner, got_loser) = (net(winner), net(loser));
        if got_winner != expect_winner || got_loser != expect_loser {
            return Err(violation(format!(
                "bet {} ({:?}, {}): winner {winner} net {got_winner} != {expect_winner}, \
                 loser {loser} net {got_loser} != {expect_loser}",
                matched.bet_id, resolution, self.policy
            )));
        }
        Ok(())
    }
}

impl Default for ConservationCheck {
    fn default() -> Self {
        Self::new(SettlementPolicy::default())
    }
}

fn violation(reason: String) -> WagerError {
    tracing::warn!(%reason, "Resolution conservation violated");
    WagerError::LedgerIntegrity { reason }
}
