//! The engine facade.
//!
//! [`WagerEngine`] holds no mutable state of its own: every operation resolves
//! the caller, then runs one unit of work against the store. Operations are
//! grouped by component in sibling modules (`lifecycle`, `bid_pool`,
//! `consensus`, `membership`, `settlement`), each adding an `impl` block.

use chrono::{DateTime, Utc};
use wager_types::{EngineConfig, ErrorKind, Result};

use crate::store::{MemoryStore, Store};
use crate::tables::Tables;

/// Request-scoped entry point for every wager operation.
#[derive(Debug)]
pub struct WagerEngine<S: Store = MemoryStore> {
    store: S,
    config: EngineConfig,
}

impl WagerEngine<MemoryStore> {
    /// An engine over a fresh in-memory store with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: MemoryStore::new(),
            config: EngineConfig::default(),
        }
    }
}

impl<S: Store> WagerEngine<S> {
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = wager_types::constants::ENGINE_NAME,
            version = wager_types::constants::VERSION,
            policy = %config.settlement_policy,
            reject_late_outcomes = config.reject_late_outcomes,
            max_stake = config.max_stake,
            "Wager engine started"
        );
        Ok(Self { store, config })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one unit of work, logging why it failed if it did.
    pub(crate) fn commit<T, F>(&self, op: &'static str, unit: F) -> Result<T>
    where
        F: FnOnce(&mut Tables, DateTime<Utc>) -> Result<T>,
    {
        self.store.transact(unit).inspect_err(|err| {
            if err.kind() == ErrorKind::StoreFailure {
                tracing::error!(
                    op,
                    error = %err,
                    detail = err.detail().unwrap_or_default(),
                    "Unit of work failed"
                );
            } else {
                tracing::debug!(op, error = %err, "Unit of work rejected");
            }
        })
    }

    /// Consistent read against the store.
    pub(crate) fn view<T, F>(&self, view: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        self.store.read(view)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wager_types::{Caller, NewBet, SettlementPolicy, UserId, WagerError};

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            max_stake: 0,
            ..EngineConfig::default()
        };
        let err = WagerEngine::new(MemoryStore::new(), config).unwrap_err();
        assert!(matches!(err, WagerError::Configuration(_)));
    }

    #[test]
    fn config_is_exposed() {
        let engine = WagerEngine::new(
            MemoryStore::new(),
            EngineConfig::default().with_policy(SettlementPolicy::ZeroSum),
        )
        .unwrap();
        assert_eq!(engine.config().settlement_policy, SettlementPolicy::ZeroSum);
    }

    #[test]
    fn failed_commit_leaves_no_trace() {
        let engine = WagerEngine::in_memory();
        let alice = Caller::user(UserId::new());
        let group = engine.create_group(&alice, "poker night", "").unwrap();
        let entries_before = engine.history(alice.require().unwrap()).unwrap().len();

        engine.store().fail_next_commit();
        let err = engine
            .create_bet(&alice, NewBet::dummy(group, 100, 50))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);

        assert!(engine.bets_in_group(group).unwrap().is_empty());
        assert_eq!(
            engine.history(alice.require().unwrap()).unwrap().len(),
            entries_before
        );
        engine.verify_ledger().unwrap();
    }

    #[test]
    fn failed_accept_leaves_bet_open() {
        let engine = WagerEngine::in_memory();
        let alice_id = UserId::new();
        let alice = Caller::user(alice_id);
        let bob = Caller::user(UserId::new());
        let group = engine.create_group(&alice, "poker night", "").unwrap();
        engine.join_group(&bob, group).unwrap();
        let bet = engine.create_bet(&alice, NewBet::dummy(group, 100, 50)).unwrap();
        let bid = engine.place_bid(&bob, bet, 60).unwrap();

        engine.store().fail_next_commit();
        assert!(engine.accept_bid(&alice, bid).is_err());

        let after = engine.bet(bet).unwrap();
        assert_eq!(after.state, wager_types::BetState::Open);
        assert_eq!(after.version, 0);
        assert!(engine.match_for_bet(bet).is_err());
        assert!(engine.bids_for_bet(bet).unwrap()[0].is_active());

        engine.accept_bid(&alice, bid).unwrap();
    }
}
