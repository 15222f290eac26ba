//! Balances, history and manual settlement.
//!
//! Settlement is self-reported: the user marks their group balance as paid or
//! received, and one `settlement` entry for the negated balance zeroes it.

use wager_ledger::{SettlementReceipt, settlement_posting};
use wager_types::{Caller, GroupId, Result, Transaction, UserId};

use crate::engine::WagerEngine;
use crate::store::Store;

impl<S: Store> WagerEngine<S> {
    /// Zero the caller's balance in a group.
    ///
    /// # Errors
    /// - `NotFound` if the group does not exist
    /// - `ValidationFailed` ("nothing to settle") if the balance is already zero
    pub fn settle_bets(&self, caller: &Caller, group_id: GroupId) -> Result<SettlementReceipt> {
        let user = caller.require()?;

        self.commit("settle_bets", |tables, now| {
            tables.group(group_id)?;
            let balance = tables.ledger().balance(group_id, user);
            let (posting, direction) = settlement_posting(group_id, user, balance)?;
            let amount = posting.amount;
            let transaction_id = tables.ledger_mut().append(posting, now)?;

            tracing::info!(
                group = %group_id,
                user = %user,
                balance,
                %direction,
                tx = %transaction_id,
                "Balance settled"
            );
            Ok(SettlementReceipt {
                transaction_id,
                amount,
                direction,
            })
        })
    }

    /// The user's balance in a group, aggregated from the ledger.
    ///
    /// A deleted group has no balance: its bet entries are gone while
    /// settlements made in it stay in history.
    ///
    /// # Errors
    /// `NotFound` if the group does not exist.
    pub fn balance(&self, group_id: GroupId, user_id: UserId) -> Result<i64> {
        self.view(|tables| {
            tables.group(group_id)?;
            Ok(tables.ledger().balance(group_id, user_id))
        })
    }

    /// Every ledger entry for the user, newest first.
    ///
    /// # Errors
    /// `StoreFailure` if the store cannot be read.
    pub fn history(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        self.view(|tables| {
            Ok(tables
                .ledger()
                .history(user_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    /// Re-walk the ledger hash chain.
    ///
    /// # Errors
    /// `LedgerIntegrity` at the first broken link.
    pub fn verify_ledger(&self) -> Result<()> {
        self.view(|tables| {
            let ledger = tables.ledger();
            ledger.verify_chain()?;
            tracing::debug!(entries = ledger.len(), head = %ledger.head_hex(), "Ledger verified");
            Ok(())
        })
    }
}
