//! # wager-engine
//!
//! Lifecycle engine for peer-to-peer wagers inside private groups.
//!
//! - [`WagerEngine`]: request-scoped facade; one store unit of work per operation
//! - [`Store`] / [`MemoryStore`]: the persistence contract and its reference implementation
//! - [`Tables`]: the rows a unit of work reads and writes, with conditional state updates
//!
//! ## Bet lifecycle
//!
//! ```text
//!  create_bet      accept_bid            submit_outcome x2
//! ──────────▶ OPEN ──────────▶ ACTIVE ───────────────────▶ ORIGINATOR_WON
//!               │                  │                       COUNTERPARTY_WON
//!               │ close_bet        │ values disagree
//!               ▼                  ▼
//!           CANCELLED          DISPUTED
//! ```
//!
//! Every multi-record write (bet + activity entry, match + bid statuses,
//! terminal state + ledger postings) commits as one unit or not at all.

pub mod bid_pool;
pub mod consensus;
pub mod engine;
pub mod lifecycle;
pub mod membership;
pub mod settlement;
pub mod store;
pub mod tables;

pub use engine::WagerEngine;
pub use membership::GroupDeletion;
pub use store::{Clock, ManualClock, MemoryStore, Store, SystemClock};
pub use tables::{Erased, Tables};
