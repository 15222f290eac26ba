//! Group membership types and the exposure report used by the membership guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, BidId, GroupId, UserId};

/// A private betting group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A member's role inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// A (group, user) membership row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

/// A member's open exposure within one group.
///
/// Non-empty in either set blocks exit and removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    /// Bets the member originated that are still `open` or `active`.
    pub live_bets: Vec<BetId>,
    /// Bids the member placed that are still `active`.
    pub active_bids: Vec<BidId>,
}

impl Exposure {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_bets.is_empty() && self.active_bids.is_empty()
    }
}

impl std::fmt::Display for Exposure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.live_bets.len(), self.active_bids.len()) {
            (0, 0) => write!(f, "no open bets or pending bids"),
            (bets, 0) => write!(f, "{bets} open or active bet(s)"),
            (0, bids) => write!(f, "{bids} pending bid(s)"),
            (bets, bids) => write!(f, "{bets} open or active bet(s) and {bids} pending bid(s)"),
        }
    }
}
