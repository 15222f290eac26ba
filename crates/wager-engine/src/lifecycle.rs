//! Bet creation, cancellation and reads.
//!
//! ```text
//! create_bet ──▶ OPEN ──close_bet (no bids)──▶ CANCELLED
//! ```
//! The `OPEN -> ACTIVE` edge belongs to the bid pool, and the terminal edges
//! out of `ACTIVE` belong to outcome consensus.

use chrono::{DateTime, Utc};
use wager_types::{
    Bet, BetId, BetState, Caller, GroupId, NewBet, Posting, Result, TransactionType, WagerError,
    constants,
};

use crate::engine::WagerEngine;
use crate::store::Store;

impl<S: Store> WagerEngine<S> {
    /// Create an `OPEN` bet in a group the caller belongs to.
    ///
    /// # Errors
    /// - `NotAuthenticated` for an anonymous caller
    /// - `NotFound` if the group does not exist
    /// - `NotAuthorized` if the caller is not a member
    /// - `ValidationFailed` for empty text, out-of-range stakes or bad deadlines
    pub fn create_bet(&self, caller: &Caller, req: NewBet) -> Result<BetId> {
        let user = caller.require()?;
        let max_stake = self.config().max_stake;

        self.commit("create_bet", |tables, now| {
            tables.group(req.group_id)?;
            tables.require_member(req.group_id, user)?;
            validate_new_bet(&req, max_stake, now)?;

            let category = match req.category.trim() {
                "" => constants::DEFAULT_CATEGORY.to_string(),
                other => other.to_string(),
            };
            let bet = Bet {
                id: BetId::new(),
                group_id: req.group_id,
                originator_id: user,
                title: req.title.trim().to_string(),
                description: req.description.trim().to_string(),
                category,
                originator_stake: req.originator_stake,
                min_counter_stake: req.min_counter_stake,
                bid_window_end: req.bid_window_end,
                resolution_deadline: req.resolution_deadline,
                state: BetState::Open,
                version: 0,
                created_at: now,
            };
            let (id, group_id) = (bet.id, bet.group_id);
            let activity = Posting::activity(
                user,
                TransactionType::BetCreate,
                format!("Started bet: {}", bet.title),
            )
            .for_bet(id, group_id);

            tracing::info!(
                bet = %id,
                group = %group_id,
                originator = %user,
                stake = bet.originator_stake,
                min_counter = bet.min_counter_stake,
                "Bet created"
            );
            tables.insert_bet(bet)?;
            tables.ledger_mut().append(activity, now)?;
            Ok(id)
        })
    }

    /// Cancel an `OPEN` bet that never received a bid.
    ///
    /// # Errors
    /// - `NotFound` if the bet does not exist
    /// - `NotAuthorized` unless the caller originated the bet
    /// - `InvalidState` unless the bet is `OPEN`
    /// - `ValidationFailed` if any bid (of any status) exists
    pub fn close_bet(&self, caller: &Caller, bet_id: BetId) -> Result<()> {
        let user = caller.require()?;

        self.commit("close_bet", |tables, now| {
            let bet = tables.bet(bet_id)?;
            if bet.originator_id != user {
                return Err(WagerError::unauthorized("only the bet creator can close it"));
            }
            if bet.state != BetState::Open {
                return Err(WagerError::bet_state(bet_id, BetState::Open, bet.state));
            }
            if tables.bids_for_bet(bet_id).next().is_some() {
                return Err(WagerError::validation("cannot close with bids"));
            }

            let bet = tables.compare_and_set_bet_state(bet_id, BetState::Open, BetState::Cancelled)?;
            let activity = Posting::activity(
                user,
                TransactionType::BetClose,
                format!("Closed bet: {}", bet.title),
            )
            .for_bet(bet_id, bet.group_id);
            tables.ledger_mut().append(activity, now)?;

            tracing::info!(bet = %bet_id, originator = %user, "Bet closed");
            Ok(())
        })
    }

    /// # Errors
    /// `NotFound` if the bet does not exist.
    pub fn bet(&self, bet_id: BetId) -> Result<Bet> {
        self.view(|tables| tables.bet(bet_id).cloned())
    }

    /// Every bet in a group, oldest first.
    ///
    /// # Errors
    /// `StoreFailure` if the store cannot be read.
    pub fn bets_in_group(&self, group_id: GroupId) -> Result<Vec<Bet>> {
        self.view(|tables| Ok(tables.bets_in_group(group_id).cloned().collect()))
    }
}

fn validate_new_bet(req: &NewBet, max_stake: u64, now: DateTime<Utc>) -> Result<()> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(WagerError::validation("title is required"));
    }
    if title.len() > constants::MAX_TITLE_LEN {
        return Err(WagerError::validation(format!(
            "title must be at most {} characters",
            constants::MAX_TITLE_LEN
        )));
    }
    if req.description.trim().is_empty() {
        return Err(WagerError::validation("description is required"));
    }
    for (what, amount) in [
        ("stake", req.originator_stake),
        ("minimum counter stake", req.min_counter_stake),
    ] {
        if amount == 0 {
            return Err(WagerError::validation(format!("{what} must be positive")));
        }
        if amount > max_stake {
            return Err(WagerError::validation(format!(
                "{what} must be at most {max_stake}"
            )));
        }
    }
    if req.bid_window_end <= now {
        return Err(WagerError::validation("bidding window must end in the future"));
    }
    if req.bid_window_end > req.resolution_deadline {
        return Err(WagerError::validation(
            "bidding window must end before the resolution deadline",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wager_types::{ErrorKind, UserId};

    fn setup() -> (WagerEngine, Caller, GroupId) {
        let engine = WagerEngine::in_memory();
        let alice = Caller::user(UserId::new());
        let group = engine.create_group(&alice, "book club", "").unwrap();
        (engine, alice, group)
    }

    #[test]
    fn create_writes_bet_and_activity() {
        let (engine, alice, group) = setup();
        let bet_id = engine
            .create_bet(&alice, NewBet::dummy(group, 100, 50))
            .unwrap();

        let bet = engine.bet(bet_id).unwrap();
        assert_eq!(bet.state, BetState::Open);
        assert_eq!(bet.originator_id, alice.require().unwrap());
        assert_eq!(bet.category, "weather");

        let history = engine.history(alice.require().unwrap()).unwrap();
        assert_eq!(history[0].tx_type, TransactionType::BetCreate);
        assert_eq!(history[0].description, format!("Started bet: {}", bet.title));
        assert_eq!(history[0].amount, 0);
    }

    #[test]
    fn anonymous_cannot_create() {
        let (engine, _, group) = setup();
        let err = engine
            .create_bet(&Caller::anonymous(), NewBet::dummy(group, 100, 50))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    }

    #[test]
    fn non_member_cannot_create() {
        let (engine, _, group) = setup();
        let err = engine
            .create_bet(&Caller::user(UserId::new()), NewBet::dummy(group, 100, 50))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    #[test]
    fn invalid_requests_rejected() {
        let (engine, alice, group) = setup();
        let cases: Vec<(&str, Box<dyn Fn(&mut NewBet)>)> = vec![
            ("title", Box::new(|r: &mut NewBet| r.title = "   ".into())),
            ("description", Box::new(|r: &mut NewBet| r.description.clear())),
            ("stake", Box::new(|r: &mut NewBet| r.originator_stake = 0)),
            ("minimum", Box::new(|r: &mut NewBet| r.min_counter_stake = constants::MAX_STAKE + 1)),
            (
                "future",
                Box::new(|r: &mut NewBet| r.bid_window_end = Utc::now() - Duration::minutes(1)),
            ),
            (
                "deadline",
                Box::new(|r: &mut NewBet| r.resolution_deadline = r.bid_window_end - Duration::minutes(1)),
            ),
        ];
        for (needle, mutate) in cases {
            let mut req = NewBet::dummy(group, 100, 50);
            mutate(&mut req);
            let err = engine.create_bet(&alice, req).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationFailed, "case {needle}");
            assert!(format!("{err}").contains(needle), "case {needle}: {err}");
        }
        assert!(engine.bets_in_group(group).unwrap().is_empty());
    }

    #[test]
    fn blank_category_defaults() {
        let (engine, alice, group) = setup();
        let mut req = NewBet::dummy(group, 100, 50);
        req.category = " ".into();
        let id = engine.create_bet(&alice, req).unwrap();
        assert_eq!(engine.bet(id).unwrap().category, constants::DEFAULT_CATEGORY);
    }

    #[test]
    fn close_requires_originator_and_open() {
        let (engine, alice, group) = setup();
        let bob = Caller::user(UserId::new());
        engine.join_group(&bob, group).unwrap();
        let bet = engine.create_bet(&alice, NewBet::dummy(group, 100, 50)).unwrap();

        let err = engine.close_bet(&bob, bet).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        engine.close_bet(&alice, bet).unwrap();
        let closed = engine.bet(bet).unwrap();
        assert_eq!(closed.state, BetState::Cancelled);
        assert_eq!(closed.version, 1);

        let err = engine.close_bet(&alice, bet).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(format!("{err}").contains("is cancelled, expected open"));
    }

    #[test]
    fn close_unknown_bet() {
        let (engine, alice, _) = setup();
        let err = engine.close_bet(&alice, BetId::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
