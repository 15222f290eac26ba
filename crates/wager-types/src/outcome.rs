//! Outcome attestation types.
//!
//! Each party to a match files at most one [`OutcomeSubmission`]. When the
//! second one lands, the pair is tallied into a [`Resolution`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BetId, BetState, SubmissionId, UserId};

/// One party's attested claim of who won.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSubmission {
    pub id: SubmissionId,
    pub bet_id: BetId,
    pub submitted_by: UserId,
    /// `true` = the originator won.
    pub value: bool,
    pub evidence: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// How a pair of attestations resolved a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Resolution {
    /// Both parties agreed on the winner.
    Agreed { originator_won: bool },
    /// The parties named different winners.
    Disputed,
}

impl Resolution {
    /// Tally two attestation values.
    #[must_use]
    pub fn from_values(first: bool, second: bool) -> Self {
        if first == second {
            Self::Agreed {
                originator_won: first,
            }
        } else {
            Self::Disputed
        }
    }

    /// The terminal bet state this resolution drives.
    #[must_use]
    pub fn terminal_state(self) -> BetState {
        match self {
            Self::Agreed { originator_won } => BetState::resolved(originator_won),
            Self::Disputed => BetState::Disputed,
        }
    }
}

/// What `submit_outcome` reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeReceipt {
    pub submission_id: SubmissionId,
    /// `Some` when this submission was the second one and resolved the bet.
    pub resolution: Option<Resolution>,
}
