//! Ledger entry types.
//!
//! A [`Transaction`] is an immutable, append-only record. Balance-affecting
//! entries carry a nonzero amount; activity/audit entries carry zero. Each
//! entry commits to its predecessor through `prev_hash`, so the log is
//! tamper-evident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, GroupId, TransactionId, UserId};

/// Type tag of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    BetCreate,
    BidCreate,
    BetClose,
    /// Winner's credit on an agreed resolution.
    Win,
    /// Loser's debit on an agreed resolution.
    Loss,
    BetWin,
    BetLoss,
    BetDispute,
    /// Manual zeroing of a group balance.
    Settlement,
    GroupCreate,
    GroupUpdate,
    GroupJoin,
    GroupExit,
    MemberRemove,
    GroupDelete,
}

impl TransactionType {
    /// Entry types that move a balance. Everything else is activity with amount 0.
    #[must_use]
    pub fn is_balance_affecting(&self) -> bool {
        matches!(self, Self::Win | Self::Loss | Self::Settlement)
    }

    /// Stable wire/hash label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BetCreate => "bet_create",
            Self::BidCreate => "bid_create",
            Self::BetClose => "bet_close",
            Self::Win => "win",
            Self::Loss => "loss",
            Self::BetWin => "bet_win",
            Self::BetLoss => "bet_loss",
            Self::BetDispute => "bet_dispute",
            Self::Settlement => "settlement",
            Self::GroupCreate => "group_create",
            Self::GroupUpdate => "group_update",
            Self::GroupJoin => "group_join",
            Self::GroupExit => "group_exit",
            Self::MemberRemove => "member_remove",
            Self::GroupDelete => "group_delete",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A draft ledger entry, before the ledger assigns id, timestamp and hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub user_id: UserId,
    pub bet_id: Option<BetId>,
    pub group_id: Option<GroupId>,
    pub amount: i64,
    pub tx_type: TransactionType,
    pub description: String,
}

impl Posting {
    /// A zero-amount activity entry.
    #[must_use]
    pub fn activity(
        user_id: UserId,
        tx_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            bet_id: None,
            group_id: None,
            amount: 0,
            tx_type,
            description: description.into(),
        }
    }

    /// A balance-affecting entry.
    #[must_use]
    pub fn balance(
        user_id: UserId,
        amount: i64,
        tx_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            bet_id: None,
            group_id: None,
            amount,
            tx_type,
            description: description.into(),
        }
    }

    /// Scope the entry to a bet (and the bet's group).
    #[must_use]
    pub fn for_bet(mut self, bet_id: BetId, group_id: GroupId) -> Self {
        self.bet_id = Some(bet_id);
        self.group_id = Some(group_id);
        self
    }

    /// Scope the entry to a group without a bet.
    #[must_use]
    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub bet_id: Option<BetId>,
    /// Group the entry counts toward, stamped from the bet or set directly.
    pub group_id: Option<GroupId>,
    /// Signed amount. 0 for activity entries.
    pub amount: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Hash of the previous entry (all zeroes for the first one).
    pub prev_hash: [u8; 32],
    /// SHA-256 over `prev_hash` and this entry's fields.
    pub entry_hash: [u8; 32],
}

impl Transaction {
    #[must_use]
    pub fn is_activity(&self) -> bool {
        self.amount == 0
    }

    /// Short hex form of the entry hash, for logs.
    #[must_use]
    pub fn short_hash(&self) -> String {
        hex::encode(&self.entry_hash[..6])
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tx[{}] {} {} {:+} \"{}\"",
            self.short_hash(),
            self.user_id,
            self.tx_type,
            self.amount,
            self.description,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_affecting_types() {
        assert!(TransactionType::Win.is_balance_affecting());
        assert!(TransactionType::Loss.is_balance_affecting());
        assert!(TransactionType::Settlement.is_balance_affecting());
        assert!(!TransactionType::BetWin.is_balance_affecting());
        assert!(!TransactionType::GroupJoin.is_balance_affecting());
    }

    #[test]
    fn labels_match_wire_names() {
        for t in [
            TransactionType::BetCreate,
            TransactionType::BidCreate,
            TransactionType::BetDispute,
            TransactionType::MemberRemove,
            TransactionType::Settlement,
        ] {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn posting_scoping() {
        let user = UserId::new();
        let bet = BetId::new();
        let group = GroupId::new();
        let p = Posting::activity(user, TransactionType::BidCreate, "Placed bid on: x")
            .for_bet(bet, group);
        assert_eq!(p.amount, 0);
        assert_eq!(p.bet_id, Some(bet));
        assert_eq!(p.group_id, Some(group));

        let s = Posting::balance(user, -40, TransactionType::Settlement, "Marked payment as sent")
            .in_group(group);
        assert_eq!(s.bet_id, None);
        assert_eq!(s.group_id, Some(group));
    }

    #[test]
    fn type_field_serialized_as_type() {
        let tx = Transaction {
            id: TransactionId::new(),
            user_id: UserId::new(),
            bet_id: None,
            group_id: None,
            amount: 0,
            tx_type: TransactionType::GroupJoin,
            description: "Joined group: friends".into(),
            created_at: Utc::now(),
            prev_hash: [0u8; 32],
            entry_hash: [7u8; 32],
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "group_join");
        assert!(tx.is_activity());
        assert_eq!(tx.short_hash(), "070707070707");
    }
}
