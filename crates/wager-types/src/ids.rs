//! Globally unique identifiers used throughout the wager engine.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting, so a
//! table keyed by id iterates in creation order.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUIDv7-backed identifier newtype with a short display prefix.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a member account. Issued by the auth collaborator.
    UserId,
    "user"
);

entity_id!(
    /// Unique identifier for a private betting group.
    GroupId,
    "group"
);

entity_id!(
    /// Unique identifier for a proposed wager.
    BetId,
    "bet"
);

entity_id!(
    /// Unique identifier for an offer to take the other side of a bet.
    BidId,
    "bid"
);

entity_id!(
    /// Unique identifier for the binding pairing created on bid acceptance.
    MatchId,
    "match"
);

entity_id!(
    /// Unique identifier for one party's outcome attestation.
    SubmissionId,
    "sub"
);

entity_id!(
    /// Unique identifier for a ledger entry.
    TransactionId,
    "tx"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(BetId::new(), BetId::new());
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert!(a < b);
    }

    #[test]
    fn display_carries_prefix() {
        let id = BetId::from_bytes([0u8; 16]);
        assert_eq!(
            id.to_string(),
            "bet:00000000-0000-0000-0000-000000000000"
        );
        assert!(GroupId::new().to_string().starts_with("group:"));
    }

    #[test]
    fn serde_is_transparent_uuid() {
        let id = MatchId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
        let back: MatchId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
