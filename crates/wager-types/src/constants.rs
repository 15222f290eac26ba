//! System-wide constants for the wager engine.

/// Largest stake or bid amount accepted. Keeps every pot and ledger amount
/// well inside `i64`.
pub const MAX_STAKE: u64 = 1_000_000_000;

/// Maximum length (bytes) of outcome evidence text.
pub const MAX_EVIDENCE_LEN: usize = 4096;

/// Maximum length (bytes) of a bet title.
pub const MAX_TITLE_LEN: usize = 200;

/// Number of attestations that resolve a bet: one per party.
pub const REQUIRED_SUBMISSIONS: usize = 2;

/// Category assigned when the creator leaves it blank.
pub const DEFAULT_CATEGORY: &str = "other";

/// Domain separator for ledger entry hashes.
pub const LEDGER_HASH_DOMAIN: &[u8] = b"wager:ledger:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "wager-engine";
