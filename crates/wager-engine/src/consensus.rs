//! Outcome consensus: two attestations resolve or dispute an `ACTIVE` bet.
//!
//! Insert, tally, state change and ledger postings happen in one unit of
//! work, so the second submission is the only one that can resolve the bet.
//! The ledger's resolution guard refuses a second set of postings for the
//! same bet regardless.

use wager_ledger::{ConservationCheck, resolution_postings};
use wager_types::{
    BetId, BetState, Caller, OutcomeReceipt, OutcomeSubmission, Resolution, Result, SubmissionId,
    WagerError, constants,
};

use crate::engine::WagerEngine;
use crate::store::Store;

impl<S: Store> WagerEngine<S> {
    /// File the caller's attestation of who won (`true` = the originator).
    ///
    /// # Errors
    /// - `NotFound` if the bet does not exist
    /// - `InvalidState` unless the bet is `ACTIVE` (including after resolution)
    /// - `NotAuthorized` unless the caller is one of the two matched parties
    /// - `ValidationFailed` on a repeat submission, oversized evidence, or a
    ///   late submission when late outcomes are rejected
    pub fn submit_outcome(
        &self,
        caller: &Caller,
        bet_id: BetId,
        value: bool,
        evidence: Option<String>,
    ) -> Result<OutcomeReceipt> {
        let user = caller.require()?;
        let config = self.config().clone();

        let evidence = evidence
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        self.commit("submit_outcome", |tables, now| {
            let bet = tables.bet(bet_id)?.clone();
            if bet.state != BetState::Active {
                return Err(WagerError::bet_state(bet_id, BetState::Active, bet.state));
            }
            let matched = tables.match_for_bet(bet_id)?.clone();
            if matched.side_of(user).is_none() {
                return Err(WagerError::unauthorized("not a participant in this bet"));
            }
            if tables
                .submissions_for(bet_id)
                .iter()
                .any(|s| s.submitted_by == user)
            {
                return Err(WagerError::validation(
                    "you have already submitted an outcome for this bet",
                ));
            }
            if evidence
                .as_ref()
                .is_some_and(|e| e.len() > config.max_evidence_len)
            {
                return Err(WagerError::validation(format!(
                    "evidence must be at most {} bytes",
                    config.max_evidence_len
                )));
            }
            if config.reject_late_outcomes && bet.resolution_overdue(now) {
                return Err(WagerError::validation("resolution deadline has passed"));
            }

            let submission_id = SubmissionId::new();
            tables.insert_submission(OutcomeSubmission {
                id: submission_id,
                bet_id,
                submitted_by: user,
                value,
                evidence,
                created_at: now,
            });

            let submissions = tables.submissions_for(bet_id);
            if submissions.len() < constants::REQUIRED_SUBMISSIONS {
                tracing::debug!(
                    bet = %bet_id,
                    submitter = %user,
                    value,
                    "First outcome submission recorded"
                );
                return Ok(OutcomeReceipt {
                    submission_id,
                    resolution: None,
                });
            }

            let resolution = Resolution::from_values(submissions[0].value, submissions[1].value);
            tables.compare_and_set_bet_state(bet_id, BetState::Active, resolution.terminal_state())?;

            let postings =
                resolution_postings(&bet, &matched, resolution, config.settlement_policy)?;
            let ledger = tables.ledger_mut();
            if let Err(err) = ledger.post_resolution(bet_id, postings, now) {
                tracing::warn!(bet = %bet_id, error = %err, "Resolution posting refused");
                return Err(err);
            }
            ConservationCheck::new(config.settlement_policy).verify_resolution(
                &ledger.for_bet(bet_id),
                &matched,
                resolution,
            )?;

            match resolution {
                Resolution::Agreed { originator_won } => tracing::info!(
                    bet = %bet_id,
                    winner = %matched.party(wager_types::Side::winner(originator_won)),
                    state = %resolution.terminal_state(),
                    policy = %config.settlement_policy,
                    "Bet resolved"
                ),
                Resolution::Disputed => tracing::info!(
                    bet = %bet_id,
                    originator = %matched.originator_id,
                    counterparty = %matched.counterparty_id,
                    "Bet disputed"
                ),
            }
            Ok(OutcomeReceipt {
                submission_id,
                resolution: Some(resolution),
            })
        })
    }

    /// Submissions filed for a bet, in arrival order.
    ///
    /// # Errors
    /// `NotFound` if the bet does not exist.
    pub fn submissions_for(&self, bet_id: BetId) -> Result<Vec<OutcomeSubmission>> {
        self.view(|tables| {
            tables.bet(bet_id)?;
            Ok(tables.submissions_for(bet_id).to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wager_types::{EngineConfig, ErrorKind, NewBet, UserId};

    use crate::store::{ManualClock, MemoryStore};

    struct Active {
        engine: WagerEngine<MemoryStore<ManualClock>>,
        clock: ManualClock,
        alice: Caller,
        bob: Caller,
        bet: BetId,
    }

    fn active_bet(config: EngineConfig) -> Active {
        let clock = ManualClock::default();
        let engine = WagerEngine::new(MemoryStore::with_clock(clock.clone()), config).unwrap();
        let alice = Caller::user(UserId::new());
        let bob = Caller::user(UserId::new());
        let group = engine.create_group(&alice, "darts", "").unwrap();
        engine.join_group(&bob, group).unwrap();
        let bet = engine.create_bet(&alice, NewBet::dummy(group, 100, 50)).unwrap();
        let bid = engine.place_bid(&bob, bet, 60).unwrap();
        engine.accept_bid(&alice, bid).unwrap();
        Active {
            engine,
            clock,
            alice,
            bob,
            bet,
        }
    }

    #[test]
    fn first_submission_does_not_resolve() {
        let a = active_bet(EngineConfig::default());
        let receipt = a
            .engine
            .submit_outcome(&a.alice, a.bet, true, Some("photo of the scoreboard".into()))
            .unwrap();
        assert_eq!(receipt.resolution, None);
        assert_eq!(a.engine.bet(a.bet).unwrap().state, BetState::Active);

        let subs = a.engine.submissions_for(a.bet).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, receipt.submission_id);
        assert_eq!(subs[0].evidence.as_deref(), Some("photo of the scoreboard"));
    }

    #[test]
    fn repeat_submission_rejected() {
        let a = active_bet(EngineConfig::default());
        a.engine.submit_outcome(&a.alice, a.bet, true, None).unwrap();
        let err = a
            .engine
            .submit_outcome(&a.alice, a.bet, false, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(a.engine.submissions_for(a.bet).unwrap().len(), 1);
    }

    #[test]
    fn outsider_rejected() {
        let a = active_bet(EngineConfig::default());
        let err = a
            .engine
            .submit_outcome(&Caller::user(UserId::new()), a.bet, true, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(err.user_message().contains("not a participant"));
    }

    #[test]
    fn open_bet_cannot_take_outcomes() {
        let engine = WagerEngine::in_memory();
        let alice = Caller::user(UserId::new());
        let group = engine.create_group(&alice, "darts", "").unwrap();
        let bet = engine.create_bet(&alice, NewBet::dummy(group, 100, 50)).unwrap();
        let err = engine.submit_outcome(&alice, bet, true, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn agreement_resolves() {
        let a = active_bet(EngineConfig::default());
        a.engine.submit_outcome(&a.bob, a.bet, false, None).unwrap();
        let receipt = a.engine.submit_outcome(&a.alice, a.bet, false, None).unwrap();
        assert_eq!(
            receipt.resolution,
            Some(Resolution::Agreed {
                originator_won: false
            })
        );
        assert_eq!(a.engine.bet(a.bet).unwrap().state, BetState::CounterpartyWon);
    }

    #[test]
    fn oversized_evidence_rejected() {
        let config = EngineConfig {
            max_evidence_len: 8,
            ..EngineConfig::default()
        };
        let a = active_bet(config);
        let err = a
            .engine
            .submit_outcome(&a.alice, a.bet, true, Some("x".repeat(9)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        a.engine
            .submit_outcome(&a.alice, a.bet, true, Some("x".repeat(8)))
            .unwrap();
    }

    #[test]
    fn lifecycle_checks_precede_evidence_length() {
        let a = active_bet(EngineConfig::default());
        a.engine.submit_outcome(&a.alice, a.bet, true, None).unwrap();
        a.engine.submit_outcome(&a.bob, a.bet, true, None).unwrap();
        let oversized = "x".repeat(5000);

        let err = a
            .engine
            .submit_outcome(&a.alice, a.bet, true, Some(oversized.clone()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = a
            .engine
            .submit_outcome(&a.alice, BetId::new(), true, Some(oversized))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(a.engine.submissions_for(a.bet).unwrap().len(), 2);
    }

    #[test]
    fn late_outcomes_accepted_by_default() {
        let a = active_bet(EngineConfig::default());
        let deadline = a.engine.bet(a.bet).unwrap().resolution_deadline;
        a.clock.set(deadline + Duration::days(3));
        a.engine.submit_outcome(&a.alice, a.bet, true, None).unwrap();
    }

    #[test]
    fn late_outcomes_rejected_when_configured() {
        let config = EngineConfig {
            reject_late_outcomes: true,
            ..EngineConfig::default()
        };
        let a = active_bet(config);
        let deadline = a.engine.bet(a.bet).unwrap().resolution_deadline;

        a.clock.set(deadline);
        a.engine.submit_outcome(&a.alice, a.bet, true, None).unwrap();

        a.clock.advance(Duration::seconds(1));
        let err = a.engine.submit_outcome(&a.bob, a.bet, true, None).unwrap_err();
        assert!(format!("{err}").contains("resolution deadline has passed"));
        assert_eq!(a.engine.bet(a.bet).unwrap().state, BetState::Active);
    }
}
