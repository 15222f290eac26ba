//! # Bet: the proposed wager and its lifecycle
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  bid accepted  ┌────────┐  agreement   ┌────────────────────────────────┐
//!   │ OPEN ├───────────────▶│ ACTIVE ├─────────────▶│ ORIGINATOR_WON / COUNTERPARTY_WON │
//!   └──┬───┘                └───┬────┘              └────────────────────────────────┘
//!      │ close (no bids)        │ disagreement
//!      ▼                        ▼
//!   ┌───────────┐          ┌──────────┐
//!   │ CANCELLED │          │ DISPUTED │
//!   └───────────┘          └──────────┘
//! ```
//!
//! Transitions are **monotonic**: nothing re-enters `OPEN` or `ACTIVE`, and
//! the four terminal states have no outgoing edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, GroupId, UserId, constants};

/// The lifecycle state of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetState {
    /// Accepting bids. Initial state.
    Open,
    /// A bid was accepted and a match formed. Awaiting attestations.
    Active,
    /// Both parties attested that the originator won.
    OriginatorWon,
    /// Both parties attested that the counterparty won.
    CounterpartyWon,
    /// The two attestations disagreed. Needs out-of-band intervention.
    Disputed,
    /// Closed by the originator before any bid arrived.
    Cancelled,
}

impl BetState {
    /// Can a bet in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Active | Self::Cancelled)
                | (
                    Self::Active,
                    Self::OriginatorWon | Self::CounterpartyWon | Self::Disputed
                )
        )
    }

    /// Returns `true` for states with no outgoing transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open | Self::Active)
    }

    /// Returns `true` while the bet still exposes its originator
    /// (`OPEN` or `ACTIVE`).
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    /// The terminal state for an agreed outcome.
    #[must_use]
    pub fn resolved(originator_won: bool) -> Self {
        if originator_won {
            Self::OriginatorWon
        } else {
            Self::CounterpartyWon
        }
    }
}

impl std::fmt::Display for BetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Active => write!(f, "active"),
            Self::OriginatorWon => write!(f, "originator_won"),
            Self::CounterpartyWon => write!(f, "counterparty_won"),
            Self::Disputed => write!(f, "disputed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A proposed wager inside a group.
///
/// `state` and `version` are written only by the engine, and only through a
/// conditional update that re-checks the source state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub group_id: GroupId,
    pub originator_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// What the originator puts up. Copied into the match on acceptance.
    pub originator_stake: u64,
    /// Smallest bid amount the originator will consider.
    pub min_counter_stake: u64,
    /// Bids arriving after this instant are rejected.
    pub bid_window_end: DateTime<Utc>,
    /// Advisory deadline for outcome attestations.
    pub resolution_deadline: DateTime<Utc>,
    pub state: BetState,
    /// Bumped on every state write. Optimistic-concurrency token.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// Has the bidding window closed at `now`?
    #[must_use]
    pub fn bid_window_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.bid_window_end
    }

    /// Has the resolution deadline passed at `now`?
    #[must_use]
    pub fn resolution_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.resolution_deadline
    }
}

impl std::fmt::Display for Bet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bet[{}] \"{}\" stake={} min={} ({})",
            self.id, self.title, self.originator_stake, self.min_counter_stake, self.state,
        )
    }
}

/// Caller-supplied fields for creating a bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBet {
    pub group_id: GroupId,
    pub title: String,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub originator_stake: u64,
    pub min_counter_stake: u64,
    pub bid_window_end: DateTime<Utc>,
    pub resolution_deadline: DateTime<Utc>,
}

fn default_category() -> String {
    constants::DEFAULT_CATEGORY.to_string()
}

/// Dummy bets for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Bet {
    /// An `OPEN` bet whose windows are an hour and a day away.
    pub fn dummy(group_id: GroupId, originator_id: UserId, stake: u64, min: u64) -> Self {
        let now = Utc::now();
        Self {
            id: BetId::new(),
            group_id,
            originator_id,
            title: format!("dummy bet #{}", rand::random::<u16>()),
            description: "test".to_string(),
            category: default_category(),
            originator_stake: stake,
            min_counter_stake: min,
            bid_window_end: now + chrono::Duration::hours(1),
            resolution_deadline: now + chrono::Duration::days(1),
            state: BetState::Open,
            version: 0,
            created_at: now,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl NewBet {
    /// Request for a bet with an hour-long bidding window.
    pub fn dummy(group_id: GroupId, stake: u64, min: u64) -> Self {
        let now = Utc::now();
        Self {
            group_id,
            title: "Will it rain on Saturday?".to_string(),
            description: "Measured at the downtown station".to_string(),
            category: "weather".to_string(),
            originator_stake: stake,
            min_counter_stake: min,
            bid_window_end: now + chrono::Duration::hours(1),
            resolution_deadline: now + chrono::Duration::days(1),
        }
    }
}
