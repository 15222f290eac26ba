//! # wager-types
//!
//! Shared types, errors, and configuration for the **wager engine**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`BetId`], [`BidId`], [`MatchId`], [`SubmissionId`], [`TransactionId`], [`UserId`], [`GroupId`]
//! - **Bet model**: [`Bet`], [`BetState`], [`NewBet`]
//! - **Bid model**: [`Bid`], [`BidStatus`]
//! - **Match model**: [`Match`], [`Side`]
//! - **Attestation model**: [`OutcomeSubmission`], [`Resolution`], [`OutcomeReceipt`]
//! - **Ledger model**: [`Transaction`], [`TransactionType`], [`Posting`]
//! - **Membership model**: [`Group`], [`Membership`], [`MemberRole`], [`Exposure`]
//! - **Request context**: [`Caller`]
//! - **Configuration**: [`EngineConfig`], [`SettlementPolicy`]
//! - **Errors**: [`WagerError`] with `WG_ERR_` prefix codes, classified by [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod bet;
pub mod bid;
pub mod caller;
pub mod config;
pub mod constants;
pub mod error;
pub mod group;
pub mod ids;
pub mod matching;
pub mod outcome;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use wager_types::{Bet, BetState, Bid, Match, WagerError, ...};

pub use bet::*;
pub use bid::*;
pub use caller::*;
pub use config::*;
pub use error::*;
pub use group::*;
pub use ids::*;
pub use matching::*;
pub use outcome::*;
pub use transaction::*;

// Constants are accessed via `wager_types::constants::FOO`
// (not re-exported to avoid name collisions).
