//! Bid types: competing offers to take the other side of a bet.
//!
//! Status moves only `ACTIVE → ACCEPTED` or `ACTIVE → REJECTED`. Exactly one
//! bid per bet can ever be accepted; its siblings are rejected in the same
//! unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, BidId, UserId};

/// Lifecycle status of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Waiting for the originator. Older records call this `pending`.
    #[serde(alias = "pending")]
    Active,
    /// Chosen by the originator. Backs the bet's match.
    Accepted,
    /// A sibling was accepted instead.
    Rejected,
}

impl BidStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Accepted | Self::Rejected))
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// An offer from a prospective counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub bet_id: BetId,
    pub bidder_id: UserId,
    /// Counter-stake offered. Never below the bet's minimum.
    pub amount: u64,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BidStatus::Active
    }
}
