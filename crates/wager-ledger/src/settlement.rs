//! Outcome and settlement arithmetic.
//!
//! Turns a tallied [`Resolution`] into the postings the ledger records, and a
//! nonzero group balance into the entry that zeroes it. Pure functions: the
//! caller appends the postings inside its unit of work.
//!
//! ## Agreed outcome
//!
//! | Policy    | Winner                 | Loser                 |
//! |-----------|------------------------|-----------------------|
//! | `FullPot` | `+ (orig + counter)`   | `- min(orig, counter)`|
//! | `ZeroSum` | `+ min(orig, counter)` | `- min(orig, counter)`|
//!
//! Each side also gets a zero-amount `bet_win` / `bet_loss` activity entry.
//! A disputed outcome posts one zero-amount `bet_dispute` entry per party.

use serde::{Deserialize, Serialize};
use wager_types::{
    Bet, GroupId, Match, Posting, Resolution, Result, SettlementPolicy, Side, TransactionId,
    TransactionType, UserId, WagerError,
};

/// The postings that resolve `bet` under `resolution`.
///
/// # Errors
/// Returns [`WagerError::LedgerIntegrity`] if the match does not belong to
/// the bet or an amount does not fit the ledger's signed range.
pub fn resolution_postings(
    bet: &Bet,
    matched: &Match,
    resolution: Resolution,
    policy: SettlementPolicy,
) -> Result<Vec<Posting>> {
    if matched.bet_id != bet.id {
        return Err(WagerError::LedgerIntegrity {
            reason: format!("match {} belongs to {}, not {}", matched.id, matched.bet_id, bet.id),
        });
    }

    let postings = match resolution {
        Resolution::Agreed { originator_won } => {
            let winner_side = Side::winner(originator_won);
            let winner = matched.party(winner_side);
            let loser = matched.party(winner_side.opposite());

            let credit = match policy {
                SettlementPolicy::FullPot => matched.pot(),
                SettlementPolicy::ZeroSum => matched.matched_amount(),
            };
            let credit = to_signed(credit)?;
            let debit = -to_signed(matched.matched_amount())?;

            vec![
                Posting::balance(winner, credit, TransactionType::Win, "Bet win")
                    .for_bet(bet.id, bet.group_id),
                Posting::balance(loser, debit, TransactionType::Loss, "Bet loss")
                    .for_bet(bet.id, bet.group_id),
                Posting::activity(winner, TransactionType::BetWin, format!("Won bet: {}", bet.title))
                    .for_bet(bet.id, bet.group_id),
                Posting::activity(loser, TransactionType::BetLoss, format!("Lost bet: {}", bet.title))
                    .for_bet(bet.id, bet.group_id),
            ]
        }
        Resolution::Disputed => [matched.originator_id, matched.counterparty_id]
            .into_iter()
            .map(|user| {
                Posting::activity(
                    user,
                    TransactionType::BetDispute,
                    format!("Bet disputed: {}", bet.title),
                )
                .for_bet(bet.id, bet.group_id)
            })
            .collect(),
    };
    Ok(postings)
}

fn to_signed(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| WagerError::LedgerIntegrity {
        reason: format!("amount {amount} exceeds the ledger range"),
    })
}

/// Which way money moved when a balance was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementDirection {
    /// The user was owed money and marked it as received.
    Received,
    /// The user owed money and marked it as sent.
    Paid,
}

impl std::fmt::Display for SettlementDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// What `settle_bets` reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub transaction_id: TransactionId,
    /// Signed amount of the settlement entry (the negated prior balance).
    pub amount: i64,
    pub direction: SettlementDirection,
}

/// The single entry that brings `balance` back to zero.
///
/// # Errors
/// Returns [`WagerError::ValidationFailed`] when the balance is already zero.
pub fn settlement_posting(
    group_id: GroupId,
    user_id: UserId,
    balance: i64,
) -> Result<(Posting, SettlementDirection)> {
    let (description, direction) = match balance.signum() {
        1 => ("Marked payment as received", SettlementDirection::Received),
        -1 => ("Marked payment as sent", SettlementDirection::Paid),
        _ => return Err(WagerError::validation("nothing to settle")),
    };
    let amount = balance.checked_neg().ok_or_else(|| WagerError::LedgerIntegrity {
        reason: format!("balance {balance} cannot be negated"),
    })?;
    let posting =
        Posting::balance(user_id, amount, TransactionType::Settlement, description).in_group(group_id);
    Ok((posting, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wager_types::{BidId, MatchId};

    fn setup(stake: u64, counter: u64) -> (Bet, Match) {
        let originator = UserId::new();
        let bet = Bet::dummy(GroupId::new(), originator, stake, counter);
        let matched = Match {
            id: MatchId::new(),
            bet_id: bet.id,
            bid_id: BidId::new(),
            originator_id: originator,
            originator_amount: stake,
            counterparty_id: UserId::new(),
            counterparty_amount: counter,
            created_at: Utc::now(),
        };
        (bet, matched)
    }

    fn amount_for(postings: &[Posting], user: UserId) -> i64 {
        postings
            .iter()
            .filter(|p| p.user_id == user)
            .map(|p| p.amount)
            .sum()
    }

    #[test]
    fn full_pot_originator_wins() {
        let (bet, m) = setup(100, 60);
        let postings = resolution_postings(
            &bet,
            &m,
            Resolution::Agreed { originator_won: true },
            SettlementPolicy::FullPot,
        )
        .unwrap();

        assert_eq!(postings.len(), 4);
        assert_eq!(amount_for(&postings, m.originator_id), 160);
        assert_eq!(amount_for(&postings, m.counterparty_id), -60);
        assert_eq!(postings[0].description, "Bet win");
        assert_eq!(postings[1].description, "Bet loss");
        assert_eq!(postings[2].description, format!("Won bet: {}", bet.title));
        assert_eq!(postings[3].tx_type, TransactionType::BetLoss);
        assert!(postings.iter().all(|p| p.bet_id == Some(bet.id)));
        assert!(postings.iter().all(|p| p.group_id == Some(bet.group_id)));
    }

    #[test]
    fn loser_never_debited_more_than_own_stake() {
        let (bet, m) = setup(100, 60);
        let postings = resolution_postings(
            &bet,
            &m,
            Resolution::Agreed { originator_won: false },
            SettlementPolicy::FullPot,
        )
        .unwrap();
        assert_eq!(amount_for(&postings, m.counterparty_id), 160);
        assert_eq!(amount_for(&postings, m.originator_id), -60);
    }

    #[test]
    fn zero_sum_nets_to_zero() {
        let (bet, m) = setup(100, 60);
        let postings = resolution_postings(
            &bet,
            &m,
            Resolution::Agreed { originator_won: true },
            SettlementPolicy::ZeroSum,
        )
        .unwrap();
        assert_eq!(amount_for(&postings, m.originator_id), 60);
        assert_eq!(amount_for(&postings, m.counterparty_id), -60);
        assert_eq!(postings.iter().map(|p| p.amount).sum::<i64>(), 0);
    }

    #[test]
    fn dispute_posts_activity_only() {
        let (bet, m) = setup(100, 60);
        let postings =
            resolution_postings(&bet, &m, Resolution::Disputed, SettlementPolicy::FullPot).unwrap();
        assert_eq!(postings.len(), 2);
        assert!(postings.iter().all(|p| p.amount == 0));
        assert!(postings.iter().all(|p| p.tx_type == TransactionType::BetDispute));
        assert_eq!(postings[0].description, format!("Bet disputed: {}", bet.title));
    }

    #[test]
    fn foreign_match_rejected() {
        let (bet, mut m) = setup(100, 60);
        m.bet_id = wager_types::BetId::new();
        let err = resolution_postings(&bet, &m, Resolution::Disputed, SettlementPolicy::FullPot)
            .unwrap_err();
        assert!(matches!(err, WagerError::LedgerIntegrity { .. }));
    }

    #[test]
    fn settlement_negates_balance() {
        let group = GroupId::new();
        let user = UserId::new();

        let (p, dir) = settlement_posting(group, user, 160).unwrap();
        assert_eq!(p.amount, -160);
        assert_eq!(dir, SettlementDirection::Received);
        assert_eq!(p.description, "Marked payment as received");
        assert_eq!(p.group_id, Some(group));
        assert_eq!(p.bet_id, None);

        let (p, dir) = settlement_posting(group, user, -60).unwrap();
        assert_eq!(p.amount, 60);
        assert_eq!(dir, SettlementDirection::Paid);
        assert_eq!(p.description, "Marked payment as sent");
    }

    #[test]
    fn direction_wire_names() {
        assert_eq!(
            serde_json::to_string(&SettlementDirection::Paid).unwrap(),
            "\"paid\""
        );
        assert_eq!(SettlementDirection::Received.to_string(), "received");
    }

    #[test]
    fn nothing_to_settle() {
        let err = settlement_posting(GroupId::new(), UserId::new(), 0).unwrap_err();
        assert_eq!(err.kind(), wager_types::ErrorKind::ValidationFailed);
    }
}
