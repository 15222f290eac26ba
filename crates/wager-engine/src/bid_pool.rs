//! The bid pool: competing offers on an `OPEN` bet, and the single-acceptance rule.
//!
//! Acceptance is one unit of work:
//! 1. Re-check the bid is `ACTIVE` and the caller originated the bet
//! 2. Conditionally move the bet `OPEN -> ACTIVE` (the race guard)
//! 3. Create the match, copying both stakes
//! 4. Mark the bid `ACCEPTED` and reject every sibling still `ACTIVE`
//!
//! Two concurrent acceptances on one bet serialize in the store; the second
//! finds the bet `ACTIVE` and fails with `InvalidState`.

use wager_types::{
    Bet, BetId, BetState, Bid, BidId, BidStatus, Caller, Match, MatchId, Posting, Result,
    TransactionType, WagerError,
};

use crate::engine::WagerEngine;
use crate::store::Store;

impl<S: Store> WagerEngine<S> {
    /// Offer `amount` against an `OPEN` bet.
    ///
    /// # Errors
    /// - `NotFound` if the bet does not exist
    /// - `InvalidState` unless the bet is `OPEN`
    /// - `NotAuthorized` if the bidder is not in the bet's group
    /// - `ValidationFailed` for a self-bid, a closed window, or an amount
    ///   below the minimum or above the stake limit
    pub fn place_bid(&self, caller: &Caller, bet_id: BetId, amount: u64) -> Result<BidId> {
        let user = caller.require()?;
        let max_stake = self.config().max_stake;

        self.commit("place_bid", |tables, now| {
            let bet = tables.bet(bet_id)?;
            if bet.state != BetState::Open {
                return Err(WagerError::bet_state(bet_id, BetState::Open, bet.state));
            }
            tables.require_member(bet.group_id, user)?;
            if bet.originator_id == user {
                return Err(WagerError::validation("cannot bid on your own bet"));
            }
            if bet.bid_window_closed(now) {
                return Err(WagerError::validation("bidding window has closed"));
            }
            if amount < bet.min_counter_stake {
                return Err(WagerError::validation(format!(
                    "bid must be at least {}",
                    bet.min_counter_stake
                )));
            }
            if amount > max_stake {
                return Err(WagerError::validation(format!(
                    "bid must be at most {max_stake}"
                )));
            }

            let bid = Bid {
                id: BidId::new(),
                bet_id,
                bidder_id: user,
                amount,
                status: BidStatus::Active,
                created_at: now,
            };
            let bid_id = bid.id;
            let activity = Posting::activity(
                user,
                TransactionType::BidCreate,
                format!("Placed bid on: {}", bet.title),
            )
            .for_bet(bet_id, bet.group_id);

            tables.insert_bid(bid)?;
            tables.ledger_mut().append(activity, now)?;

            tracing::info!(bet = %bet_id, bid = %bid_id, bidder = %user, amount, "Bid placed");
            Ok(bid_id)
        })
    }

    /// Accept a bid, forming the bet's one and only match.
    ///
    /// # Errors
    /// - `NotFound` if the bid (or its bet) does not exist
    /// - `NotAuthorized` unless the caller originated the bet
    /// - `InvalidState` if the bet is no longer `OPEN` or the bid no longer `ACTIVE`
    pub fn accept_bid(&self, caller: &Caller, bid_id: BidId) -> Result<MatchId> {
        let user = caller.require()?;

        self.commit("accept_bid", |tables, now| {
            let bid = tables.bid(bid_id)?.clone();
            let bet: Bet = tables.bet(bid.bet_id)?.clone();
            if bet.originator_id != user {
                return Err(WagerError::unauthorized(
                    "only the bet creator can accept bids",
                ));
            }

            if let Err(err) =
                tables.compare_and_set_bet_state(bet.id, BetState::Open, BetState::Active)
            {
                tracing::warn!(
                    bet = %bet.id,
                    bid = %bid_id,
                    state = %bet.state,
                    "Bid acceptance lost: bet is no longer open"
                );
                return Err(err);
            }
            tables.compare_and_set_bid_status(bid_id, BidStatus::Active, BidStatus::Accepted)?;
            let rejected = tables.reject_siblings(bet.id, bid_id);

            let matched = Match {
                id: MatchId::new(),
                bet_id: bet.id,
                bid_id,
                originator_id: bet.originator_id,
                originator_amount: bet.originator_stake,
                counterparty_id: bid.bidder_id,
                counterparty_amount: bid.amount,
                created_at: now,
            };
            let match_id = matched.id;
            tables.insert_match(matched)?;

            tracing::info!(
                bet = %bet.id,
                bid = %bid_id,
                match_id = %match_id,
                originator_amount = bet.originator_stake,
                counterparty_amount = bid.amount,
                rejected,
                "Bid accepted, bet active"
            );
            Ok(match_id)
        })
    }

    /// Every bid on a bet, oldest first.
    ///
    /// # Errors
    /// `NotFound` if the bet does not exist.
    pub fn bids_for_bet(&self, bet_id: BetId) -> Result<Vec<Bid>> {
        self.view(|tables| {
            tables.bet(bet_id)?;
            Ok(tables.bids_for_bet(bet_id).cloned().collect())
        })
    }

    /// # Errors
    /// `NotFound` if the bet has no match (yet).
    pub fn match_for_bet(&self, bet_id: BetId) -> Result<Match> {
        self.view(|tables| tables.match_for_bet(bet_id).cloned())
    }
}
