//! Error types for the wager engine.
//!
//! All errors use the `WG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by class:
//! - 1xx: Identity / authorization
//! - 2xx: State machine
//! - 3xx: Validation
//! - 4xx: Membership guard
//! - 5xx: Lookup
//! - 9xx: Storage / internal
//!
//! Every error is recovered at the operation boundary. [`WagerError::kind`]
//! gives the caller the coarse class; [`WagerError::user_message`] gives the
//! one sentence to show a person.

use thiserror::Error;

use crate::{BetId, BetState, BidStatus, Exposure, GroupId, UserId};

/// Coarse failure class reported at the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotAuthenticated,
    NotAuthorized,
    InvalidState,
    ValidationFailed,
    HasOpenExposure,
    NotFound,
    StoreFailure,
}

/// Central error enum for all engine operations.
#[derive(Debug, Error)]
pub enum WagerError {
    // =================================================================
    // Identity / Authorization (1xx)
    // =================================================================
    /// No caller identity was supplied.
    #[error("WG_ERR_100: You must be logged in to do that")]
    NotAuthenticated,

    /// The caller lacks the role or ownership the action needs.
    #[error("WG_ERR_101: Not authorized: {reason}")]
    NotAuthorized { reason: String },

    // =================================================================
    // State Machine (2xx)
    // =================================================================
    /// An entity is not in the state the operation requires.
    #[error("WG_ERR_200: {entity} {id} is {actual}, expected {expected}")]
    InvalidState {
        entity: &'static str,
        id: String,
        expected: String,
        actual: String,
    },

    /// The ledger already holds a resolution for this bet.
    #[error("WG_ERR_201: Bet already resolved: {0}")]
    AlreadyResolved(BetId),

    // =================================================================
    // Validation (3xx)
    // =================================================================
    /// Missing or malformed input, amount below minimum, self-bid, etc.
    #[error("WG_ERR_300: Validation failed: {reason}")]
    ValidationFailed { reason: String },

    // =================================================================
    // Membership Guard (4xx)
    // =================================================================
    /// The member still has open bets or pending bids in the group.
    #[error("WG_ERR_400: Member {user} still has {exposure}")]
    HasOpenExposure { user: UserId, exposure: Exposure },

    /// The group still has live bets, so it cannot be deleted.
    #[error("WG_ERR_401: Group {group} still has {exposure}")]
    GroupHasOpenExposure { group: GroupId, exposure: Exposure },

    // =================================================================
    // Lookup (5xx)
    // =================================================================
    /// A referenced entity does not exist.
    #[error("WG_ERR_500: {entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // =================================================================
    // Storage / Internal (9xx)
    // =================================================================
    /// The underlying store failed. The detail is for logs only.
    #[error("WG_ERR_900: Storage failure")]
    StoreFailure { detail: String },

    /// The append-only ledger failed an integrity check.
    #[error("WG_ERR_901: Ledger integrity violation: {reason}")]
    LedgerIntegrity { reason: String },

    /// Configuration error (malformed JSON, out-of-range limits, etc.).
    #[error("WG_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, WagerError>;

impl WagerError {
    /// A bet was not in `expected`.
    #[must_use]
    pub fn bet_state(bet_id: BetId, expected: BetState, actual: BetState) -> Self {
        Self::InvalidState {
            entity: "bet",
            id: bet_id.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// A bid was not in `expected`.
    #[must_use]
    pub fn bid_status(bid_id: impl std::fmt::Display, expected: BidStatus, actual: BidStatus) -> Self {
        Self::InvalidState {
            entity: "bid",
            id: bid_id.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn store(detail: impl Into<String>) -> Self {
        Self::StoreFailure {
            detail: detail.into(),
        }
    }

    /// The coarse class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::InvalidState { .. } | Self::AlreadyResolved(_) => ErrorKind::InvalidState,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::HasOpenExposure { .. } | Self::GroupHasOpenExposure { .. } => {
                ErrorKind::HasOpenExposure
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::StoreFailure { .. } | Self::LedgerIntegrity { .. } | Self::Configuration(_) => {
                ErrorKind::StoreFailure
            }
        }
    }

    /// One human-readable sentence for the person who made the request.
    ///
    /// Storage-class errors collapse to a generic sentence so internals never
    /// reach the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "You must be logged in to do that.".to_string(),
            Self::NotAuthorized { reason } => format!("Not allowed: {reason}."),
            Self::InvalidState {
                entity,
                expected,
                actual,
                ..
            } => format!("This {entity} is {actual}; the action needs it to be {expected}."),
            Self::AlreadyResolved(_) => "This bet has already been resolved.".to_string(),
            Self::ValidationFailed { reason } => format!("{}.", capitalize(reason)),
            Self::HasOpenExposure { exposure, .. } => {
                format!("Resolve your {exposure} in this group first.")
            }
            Self::GroupHasOpenExposure { exposure, .. } => {
                format!("This group still has {exposure}.")
            }
            Self::NotFound { entity, .. } => format!("{} not found.", capitalize(entity)),
            Self::StoreFailure { .. } | Self::LedgerIntegrity { .. } | Self::Configuration(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Internal detail for logs. `None` for errors whose message already says it all.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::StoreFailure { detail } => Some(detail.as_str()),
            Self::LedgerIntegrity { reason } => Some(reason.as_str()),
            Self::Configuration(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<serde_json::Error> for WagerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BidId;

    #[test]
    fn error_display_contains_prefix() {
        let err = WagerError::not_found("bet", BetId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("WG_ERR_500"), "Got: {msg}");
    }

    #[test]
    fn invalid_state_names_expected_and_actual() {
        let err = WagerError::bet_state(BetId::new(), BetState::Open, BetState::Active);
        let msg = format!("{err}");
        assert!(msg.contains("WG_ERR_200"));
        assert!(msg.contains("is active"));
        assert!(msg.contains("expected open"));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn bid_status_error() {
        let err = WagerError::bid_status(BidId::new(), BidStatus::Active, BidStatus::Rejected);
        assert!(format!("{err}").contains("bid"));
        assert_eq!(
            err.user_message(),
            "This bid is rejected; the action needs it to be active."
        );
    }

    #[test]
    fn store_failure_does_not_leak_detail() {
        let err = WagerError::store("mutex poisoned at tables.rs:42");
        assert_eq!(format!("{err}"), "WG_ERR_900: Storage failure");
        assert!(!err.user_message().contains("mutex"));
        assert_eq!(err.detail(), Some("mutex poisoned at tables.rs:42"));
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
    }

    #[test]
    fn exposure_message_names_sets() {
        let err = WagerError::HasOpenExposure {
            user: UserId::new(),
            exposure: Exposure {
                live_bets: vec![BetId::new()],
                active_bids: vec![],
            },
        };
        assert_eq!(err.kind(), ErrorKind::HasOpenExposure);
        assert!(err.user_message().contains("1 open or active bet(s)"));
        assert!(!err.user_message().contains("bid"));
    }

    #[test]
    fn group_exposure_message_is_not_personal() {
        let err = WagerError::GroupHasOpenExposure {
            group: GroupId::new(),
            exposure: Exposure {
                live_bets: vec![BetId::new(), BetId::new()],
                active_bids: vec![],
            },
        };
        assert_eq!(err.kind(), ErrorKind::HasOpenExposure);
        assert_eq!(
            err.user_message(),
            "This group still has 2 open or active bet(s)."
        );
        assert!(format!("{err}").starts_with("WG_ERR_401"));
    }

    #[test]
    fn validation_message_is_a_sentence() {
        let err = WagerError::validation("cannot close with bids");
        assert_eq!(err.user_message(), "Cannot close with bids.");
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(WagerError::NotAuthenticated.kind(), ErrorKind::NotAuthenticated);
        assert_eq!(
            WagerError::unauthorized("admins only").kind(),
            ErrorKind::NotAuthorized
        );
        assert_eq!(
            WagerError::AlreadyResolved(BetId::new()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            WagerError::LedgerIntegrity { reason: "x".into() }.kind(),
            ErrorKind::StoreFailure
        );
    }

    #[test]
    fn all_errors_have_wg_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(WagerError::NotAuthenticated),
            Box::new(WagerError::validation("x")),
            Box::new(WagerError::AlreadyResolved(BetId::new())),
            Box::new(WagerError::Configuration("bad".into())),
            Box::new(WagerError::store("x")),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("WG_ERR_"), "Error missing WG_ERR_ prefix: {msg}");
        }
    }
}
