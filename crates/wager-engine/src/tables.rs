//! The tables a unit of work reads and writes.
//!
//! Rows are keyed by UUIDv7 ids in `BTreeMap`s, so iteration follows creation
//! order. State fields are only written through the conditional updates
//! ([`Tables::compare_and_set_bet_state`], [`Tables::compare_and_set_bid_status`]),
//! which re-check the source state at write time.

use std::collections::BTreeMap;

use wager_ledger::Ledger;
use wager_types::{
    Bet, BetId, BetState, Bid, BidId, BidStatus, Exposure, Group, GroupId, Match, Membership,
    OutcomeSubmission, Result, UserId, WagerError,
};

/// Everything the engine persists.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    groups: BTreeMap<GroupId, Group>,
    memberships: BTreeMap<(GroupId, UserId), Membership>,
    bets: BTreeMap<BetId, Bet>,
    bids: BTreeMap<BidId, Bid>,
    /// At most one match per bet.
    matches: BTreeMap<BetId, Match>,
    submissions: BTreeMap<BetId, Vec<OutcomeSubmission>>,
    ledger: Ledger,
}

/// Row counts removed by [`Tables::erase_group`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Erased {
    pub bets: usize,
    pub bids: usize,
    pub memberships: usize,
    pub ledger_entries: usize,
}

impl Tables {
    // =====================================================================
    // Groups and memberships
    // =====================================================================

    pub fn insert_group(&mut self, group: Group) -> Result<()> {
        if self.groups.contains_key(&group.id) {
            return Err(WagerError::store(format!("duplicate group id {}", group.id)));
        }
        self.groups.insert(group.id, group);
        Ok(())
    }

    pub fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(&id)
            .ok_or_else(|| WagerError::not_found("group", id))
    }

    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut Group> {
        self.groups
            .get_mut(&id)
            .ok_or_else(|| WagerError::not_found("group", id))
    }

    pub fn membership(&self, group_id: GroupId, user_id: UserId) -> Option<&Membership> {
        self.memberships.get(&(group_id, user_id))
    }

    /// The caller's membership, or `NotAuthorized` if they are not in the group.
    pub fn require_member(&self, group_id: GroupId, user_id: UserId) -> Result<&Membership> {
        self.membership(group_id, user_id)
            .ok_or_else(|| WagerError::unauthorized("not a member of this group"))
    }

    pub fn insert_membership(&mut self, membership: Membership) -> Result<()> {
        let key = (membership.group_id, membership.user_id);
        if self.memberships.contains_key(&key) {
            return Err(WagerError::validation("already a member of this group"));
        }
        self.memberships.insert(key, membership);
        Ok(())
    }

    pub fn remove_membership(&mut self, group_id: GroupId, user_id: UserId) -> Result<Membership> {
        self.memberships
            .remove(&(group_id, user_id))
            .ok_or_else(|| WagerError::not_found("membership", user_id))
    }

    pub fn members_of(&self, group_id: GroupId) -> impl Iterator<Item = &Membership> {
        self.memberships
            .values()
            .filter(move |m| m.group_id == group_id)
    }

    // =====================================================================
    // Bets
    // =====================================================================

    pub fn insert_bet(&mut self, bet: Bet) -> Result<()> {
        if self.bets.contains_key(&bet.id) {
            return Err(WagerError::store(format!("duplicate bet id {}", bet.id)));
        }
        self.bets.insert(bet.id, bet);
        Ok(())
    }

    pub fn bet(&self, id: BetId) -> Result<&Bet> {
        self.bets
            .get(&id)
            .ok_or_else(|| WagerError::not_found("bet", id))
    }

    pub fn bets_in_group(&self, group_id: GroupId) -> impl Iterator<Item = &Bet> {
        self.bets.values().filter(move |b| b.group_id == group_id)
    }

    /// Move a bet from `expected` to `next`, bumping its version.
    ///
    /// # Errors
    /// - `NotFound` if the bet does not exist
    /// - `InvalidState` if the bet is no longer in `expected`
    /// - `StoreFailure` if `expected -> next` is not a legal transition
    pub fn compare_and_set_bet_state(
        &mut self,
        id: BetId,
        expected: BetState,
        next: BetState,
    ) -> Result<&Bet> {
        let bet = self
            .bets
            .get_mut(&id)
            .ok_or_else(|| WagerError::not_found("bet", id))?;
        if bet.state != expected {
            return Err(WagerError::bet_state(id, expected, bet.state));
        }
        if !expected.can_transition_to(next) {
            return Err(WagerError::store(format!(
                "illegal bet transition {expected} -> {next} for {id}"
            )));
        }
        bet.state = next;
        bet.version += 1;
        Ok(bet)
    }

    // =====================================================================
    // Bids
    // =====================================================================

    pub fn insert_bid(&mut self, bid: Bid) -> Result<()> {
        if self.bids.contains_key(&bid.id) {
            return Err(WagerError::store(format!("duplicate bid id {}", bid.id)));
        }
        self.bids.insert(bid.id, bid);
        Ok(())
    }

    pub fn bid(&self, id: BidId) -> Result<&Bid> {
        self.bids
            .get(&id)
            .ok_or_else(|| WagerError::not_found("bid", id))
    }

    /// All bids on a bet, oldest first.
    pub fn bids_for_bet(&self, bet_id: BetId) -> impl Iterator<Item = &Bid> {
        self.bids.values().filter(move |b| b.bet_id == bet_id)
    }

    /// Conditional bid status write.
    ///
    /// # Errors
    /// - `NotFound` if the bid does not exist
    /// - `InvalidState` if the bid is no longer in `expected`
    /// - `StoreFailure` if `expected -> next` is not a legal transition
    pub fn compare_and_set_bid_status(
        &mut self,
        id: BidId,
        expected: BidStatus,
        next: BidStatus,
    ) -> Result<&Bid> {
        let bid = self
            .bids
            .get_mut(&id)
            .ok_or_else(|| WagerError::not_found("bid", id))?;
        if bid.status != expected {
            return Err(WagerError::bid_status(id, expected, bid.status));
        }
        if !expected.can_transition_to(next) {
            return Err(WagerError::store(format!(
                "illegal bid transition {expected} -> {next} for {id}"
            )));
        }
        bid.status = next;
        Ok(bid)
    }

    /// Reject every still-active bid on `bet_id` except `keep`. Returns how many.
    pub fn reject_siblings(&mut self, bet_id: BetId, keep: BidId) -> usize {
        let mut rejected = 0;
        for bid in self.bids.values_mut() {
            if bid.bet_id == bet_id && bid.id != keep && bid.status == BidStatus::Active {
                bid.status = BidStatus::Rejected;
                rejected += 1;
            }
        }
        rejected
    }

    // =====================================================================
    // Matches and outcome submissions
    // =====================================================================

    pub fn insert_match(&mut self, matched: Match) -> Result<()> {
        if self.matches.contains_key(&matched.bet_id) {
            return Err(WagerError::store(format!(
                "bet {} already has a match",
                matched.bet_id
            )));
        }
        self.matches.insert(matched.bet_id, matched);
        Ok(())
    }

    pub fn match_for_bet(&self, bet_id: BetId) -> Result<&Match> {
        self.matches
            .get(&bet_id)
            .ok_or_else(|| WagerError::not_found("match", bet_id))
    }

    pub fn insert_submission(&mut self, submission: OutcomeSubmission) {
        self.submissions
            .entry(submission.bet_id)
            .or_default()
            .push(submission);
    }

    /// Submissions for a bet, in arrival order.
    pub fn submissions_for(&self, bet_id: BetId) -> &[OutcomeSubmission] {
        self.submissions.get(&bet_id).map_or(&[], Vec::as_slice)
    }

    // =====================================================================
    // Exposure
    // =====================================================================

    /// The member's live bets and active bids within `group_id`.
    pub fn exposure(&self, group_id: GroupId, user_id: UserId) -> Exposure {
        let live_bets = self
            .bets_in_group(group_id)
            .filter(|b| b.originator_id == user_id && b.state.is_live())
            .map(|b| b.id)
            .collect();
        let active_bids = self
            .bids
            .values()
            .filter(|bid| bid.bidder_id == user_id && bid.is_active())
            .filter(|bid| {
                self.bets
                    .get(&bid.bet_id)
                    .is_some_and(|bet| bet.group_id == group_id)
            })
            .map(|bid| bid.id)
            .collect();
        Exposure {
            live_bets,
            active_bids,
        }
    }

    /// Every live bet and active bid in the group, whoever owns them.
    pub fn group_exposure(&self, group_id: GroupId) -> Exposure {
        let live_bets: Vec<BetId> = self
            .bets_in_group(group_id)
            .filter(|b| b.state.is_live())
            .map(|b| b.id)
            .collect();
        let active_bids = self
            .bids
            .values()
            .filter(|bid| bid.is_active() && live_bets.contains(&bid.bet_id))
            .map(|bid| bid.id)
            .collect();
        Exposure {
            live_bets,
            active_bids,
        }
    }

    // =====================================================================
    // Ledger
    // =====================================================================

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    // =====================================================================
    // Administrative erase
    // =====================================================================

    /// Remove the group, its bets and every row that hangs off them.
    ///
    /// Ledger entries without a bet survive, so members keep their join,
    /// exit and settlement history.
    pub fn erase_group(&mut self, group_id: GroupId) -> Erased {
        let bet_ids: Vec<BetId> = self.bets_in_group(group_id).map(|b| b.id).collect();

        let bids_before = self.bids.len();
        self.bids.retain(|_, bid| !bet_ids.contains(&bid.bet_id));
        for bet_id in &bet_ids {
            self.bets.remove(bet_id);
            self.matches.remove(bet_id);
            self.submissions.remove(bet_id);
        }

        let members_before = self.memberships.len();
        self.memberships.retain(|(g, _), _| *g != group_id);
        self.groups.remove(&group_id);

        Erased {
            bets: bet_ids.len(),
            bids: bids_before - self.bids.len(),
            memberships: members_before - self.memberships.len(),
            ledger_entries: self.ledger.erase_bets(&bet_ids),
        }
    }
}
