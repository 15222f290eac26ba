//! The binding pairing created when a bid is accepted.
//!
//! A [`Match`] copies both stakes at acceptance time, so later edits to the
//! bet or bid can never change what was agreed. Immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, BidId, MatchId, UserId};

/// One of the two parties to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Originator,
    Counterparty,
}

impl Side {
    /// The side that wins when the agreed attestation value is `originator_won`.
    #[must_use]
    pub fn winner(originator_won: bool) -> Self {
        if originator_won {
            Self::Originator
        } else {
            Self::Counterparty
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Originator => Self::Counterparty,
            Self::Counterparty => Self::Originator,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Originator => write!(f, "originator"),
            Self::Counterparty => write!(f, "counterparty"),
        }
    }
}

/// A bet's locked-in pairing of originator and counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub bet_id: BetId,
    /// The bid whose acceptance created this match.
    pub bid_id: BidId,
    pub originator_id: UserId,
    pub originator_amount: u64,
    pub counterparty_id: UserId,
    pub counterparty_amount: u64,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Which side `user` is on, if either.
    #[must_use]
    pub fn side_of(&self, user: UserId) -> Option<Side> {
        if user == self.originator_id {
            Some(Side::Originator)
        } else if user == self.counterparty_id {
            Some(Side::Counterparty)
        } else {
            None
        }
    }

    #[must_use]
    pub fn party(&self, side: Side) -> UserId {
        match side {
            Side::Originator => self.originator_id,
            Side::Counterparty => self.counterparty_id,
        }
    }

    /// Sum of both stakes.
    #[must_use]
    pub fn pot(&self) -> u64 {
        self.originator_amount.saturating_add(self.counterparty_amount)
    }

    /// The smaller of the two stakes: the most either party can lose.
    #[must_use]
    pub fn matched_amount(&self) -> u64 {
        self.originator_amount.min(self.counterparty_amount)
    }
}
