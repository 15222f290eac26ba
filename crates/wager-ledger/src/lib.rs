//! # wager-ledger
//!
//! **Ledger plane**: the append-only record of every balance-affecting and
//! activity event, and the arithmetic that turns outcomes into entries.
//!
//! ## Architecture
//!
//! The engine hands the ledger [`Posting`](wager_types::Posting)s; the ledger:
//! 1. Validates the posting (activity entries carry 0, balance entries don't)
//! 2. Refuses a second resolution for the same bet (idempotency guard)
//! 3. Stamps id and timestamp and chains the entry hash onto the log head
//! 4. Answers balance queries by aggregation, never from a running total
//!
//! Settlement arithmetic lives in [`settlement`]; [`conservation`] re-checks
//! the posted entries against the configured policy before a unit commits.

pub mod conservation;
pub mod idempotency;
pub mod ledger;
pub mod settlement;

pub use conservation::ConservationCheck;
pub use idempotency::ResolutionGuard;
pub use ledger::Ledger;
pub use settlement::{SettlementDirection, SettlementReceipt, resolution_postings, settlement_posting};
