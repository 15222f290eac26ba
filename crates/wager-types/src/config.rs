//! Configuration types for the wager engine.

use serde::{Deserialize, Serialize};

use crate::{Result, WagerError, constants};

/// How an agreed outcome is turned into ledger amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// Winner is credited the full pot; loser is debited the smaller stake.
    /// A bettor staking more than the counterpart only risks the counterpart's stake.
    #[default]
    FullPot,
    /// Winner is credited and loser debited the smaller stake. Entries net to zero.
    ZeroSum,
}

impl std::fmt::Display for SettlementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullPot => write!(f, "full_pot"),
            Self::ZeroSum => write!(f, "zero_sum"),
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ledger arithmetic for agreed outcomes.
    pub settlement_policy: SettlementPolicy,
    /// Reject attestations filed after the bet's resolution deadline.
    pub reject_late_outcomes: bool,
    /// Largest stake or bid amount accepted.
    pub max_stake: u64,
    /// Maximum evidence length in bytes.
    pub max_evidence_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settlement_policy: SettlementPolicy::default(),
            reject_late_outcomes: false,
            max_stake: constants::MAX_STAKE,
            max_evidence_len: constants::MAX_EVIDENCE_LEN,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject limits the ledger cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.max_stake == 0 {
            return Err(WagerError::Configuration("max_stake must be > 0".into()));
        }
        if self.max_stake > constants::MAX_STAKE {
            return Err(WagerError::Configuration(format!(
                "max_stake {} exceeds the hard limit {}",
                self.max_stake,
                constants::MAX_STAKE
            )));
        }
        Ok(())
    }

    /// Builder-style override of the settlement policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.settlement_policy = policy;
        self
    }
}
