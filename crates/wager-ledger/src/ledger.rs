//! The append-only, hash-chained ledger.
//!
//! Entries are only ever pushed onto the end. Each entry's hash commits to
//! the previous entry's hash, so any in-place edit or deletion breaks
//! [`Ledger::verify_chain`]:
//!
//! ```text
//! entry_hash = SHA-256(domain || prev_hash || id || user || bet? || group? || amount || type || description || created_at)
//! ```
//!
//! Balances are always computed by aggregation over the entries; there is no
//! running total that could drift from the log.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use wager_types::{
    BetId, GroupId, Posting, Result, Transaction, TransactionId, UserId, WagerError, constants,
};

use crate::idempotency::ResolutionGuard;

/// Append-only log of [`Transaction`]s.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<Transaction>,
    /// Hash of the last entry (all zeroes when empty).
    head: [u8; 32],
    /// Bets that already carry resolution entries.
    resolutions: ResolutionGuard,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry at time `at`.
    ///
    /// # Errors
    /// Returns [`WagerError::LedgerIntegrity`] if the posting's amount does not
    /// fit its type (activity entries must be 0, balance entries nonzero).
    pub fn append(&mut self, posting: Posting, at: DateTime<Utc>) -> Result<TransactionId> {
        check_posting(&posting)?;
        Ok(self.push(posting, at))
    }

    /// Append the entries that resolve `bet_id`, at most once per bet.
    ///
    /// All postings are validated before any is appended.
    ///
    /// # Errors
    /// - `AlreadyResolved` if the bet already has resolution entries
    /// - `LedgerIntegrity` if a posting is malformed or names another bet
    pub fn post_resolution(
        &mut self,
        bet_id: BetId,
        postings: Vec<Posting>,
        at: DateTime<Utc>,
    ) -> Result<Vec<TransactionId>> {
        for posting in &postings {
            check_posting(posting)?;
            if posting.bet_id != Some(bet_id) {
                return Err(WagerError::LedgerIntegrity {
                    reason: format!(
                        "resolution posting for {bet_id} references {:?}",
                        posting.bet_id
                    ),
                });
            }
        }
        self.resolutions.mark_resolved(bet_id)?;

        let ids = postings
            .into_iter()
            .map(|posting| self.push(posting, at))
            .collect();
        Ok(ids)
    }

    fn push(&mut self, posting: Posting, at: DateTime<Utc>) -> TransactionId {
        let mut tx = Transaction {
            id: TransactionId::new(),
            user_id: posting.user_id,
            bet_id: posting.bet_id,
            group_id: posting.group_id,
            amount: posting.amount,
            tx_type: posting.tx_type,
            description: posting.description,
            created_at: at,
            prev_hash: self.head,
            entry_hash: [0u8; 32],
        };
        tx.entry_hash = entry_digest(&tx);
        self.head = tx.entry_hash;

        tracing::debug!(
            tx = %tx.id,
            user = %tx.user_id,
            kind = %tx.tx_type,
            amount = tx.amount,
            hash = %tx.short_hash(),
            "Ledger entry appended"
        );

        let id = tx.id;
        self.entries.push(tx);
        id
    }

    /// Balance of `user` in `group`: the sum of every entry scoped to that group.
    #[must_use]
    pub fn balance(&self, group_id: GroupId, user_id: UserId) -> i64 {
        self.entries
            .iter()
            .filter(|tx| tx.user_id == user_id && tx.group_id == Some(group_id))
            .map(|tx| tx.amount)
            .sum()
    }

    /// All entries for a user, newest first.
    #[must_use]
    pub fn history(&self, user_id: UserId) -> Vec<&Transaction> {
        self.entries
            .iter()
            .rev()
            .filter(|tx| tx.user_id == user_id)
            .collect()
    }

    /// All entries referencing a bet, in append order.
    #[must_use]
    pub fn for_bet(&self, bet_id: BetId) -> Vec<&Transaction> {
        self.entries
            .iter()
            .filter(|tx| tx.bet_id == Some(bet_id))
            .collect()
    }

    /// Whether the bet already has resolution entries.
    #[must_use]
    pub fn is_resolved(&self, bet_id: &BetId) -> bool {
        self.resolutions.is_resolved(bet_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry.
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.head
    }

    /// Hex form of [`Ledger::head`], for logs and receipts.
    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head)
    }

    /// Re-walk the chain from genesis and check every link and digest.
    ///
    /// # Errors
    /// Returns [`WagerError::LedgerIntegrity`] at the first broken link.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev = [0u8; 32];
        for (index, tx) in self.entries.iter().enumerate() {
            if tx.prev_hash != prev {
                return Err(integrity(format!(
                    "entry #{index} ({}) does not link to its predecessor",
                    tx.id
                )));
            }
            if entry_digest(tx) != tx.entry_hash {
                return Err(integrity(format!(
                    "entry #{index} ({}) hash mismatch",
                    tx.id
                )));
            }
            if tx.tx_type.is_balance_affecting() == (tx.amount == 0) {
                return Err(integrity(format!(
                    "entry #{index} ({}) has amount {} for type {}",
                    tx.id, tx.amount, tx.tx_type
                )));
            }
            prev = tx.entry_hash;
        }
        if prev != self.head {
            return Err(integrity("head does not match the last entry".to_string()));
        }
        Ok(())
    }

    /// Administrative bulk erase of every entry tied to one of `bet_ids`.
    ///
    /// This is the single exception to append-only. Entries without a bet
    /// (membership activity, settlements) stay. The surviving entries are
    /// re-chained so the log verifies afterwards. Returns the number of
    /// entries removed.
    pub fn erase_bets(&mut self, bet_ids: &[BetId]) -> usize {
        let before = self.entries.len();
        for bet_id in bet_ids {
            self.resolutions.forget(bet_id);
        }
        self.entries
            .retain(|tx| tx.bet_id.is_none_or(|bet_id| !bet_ids.contains(&bet_id)));

        let mut prev = [0u8; 32];
        for tx in &mut self.entries {
            tx.prev_hash = prev;
            tx.entry_hash = entry_digest(tx);
            prev = tx.entry_hash;
        }
        self.head = prev;

        let removed = before - self.entries.len();
        tracing::warn!(bets = bet_ids.len(), removed, "Ledger entries erased for bets");
        removed
    }
}

fn check_posting(posting: &Posting) -> Result<()> {
    if posting.tx_type.is_balance_affecting() == (posting.amount == 0) {
        return Err(integrity(format!(
            "{} entry for {} cannot carry amount {}",
            posting.tx_type, posting.user_id, posting.amount
        )));
    }
    Ok(())
}

fn integrity(reason: String) -> WagerError {
    tracing::warn!(%reason, "Ledger integrity check failed");
    WagerError::LedgerIntegrity { reason }
}

/// SHA-256 over the entry's predecessor hash and its own fields
/// (everything except `entry_hash`).
fn entry_digest(tx: &Transaction) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::LEDGER_HASH_DOMAIN);
    hasher.update(tx.prev_hash);
    hasher.update(tx.id.0.as_bytes());
    hasher.update(tx.user_id.0.as_bytes());
    match tx.bet_id {
        Some(bet) => {
            hasher.update([1u8]);
            hasher.update(bet.0.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    match tx.group_id {
        Some(group) => {
            hasher.update([1u8]);
            hasher.update(group.0.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(tx.amount.to_le_bytes());
    hasher.update(tx.tx_type.as_str().as_bytes());
    hasher.update((tx.description.len() as u64).to_le_bytes());
    hasher.update(tx.description.as_bytes());
    hasher.update(tx.created_at.timestamp_micros().to_le_bytes());
    hasher.finalize().into()
}
