//! The store contract and the reference in-memory store.
//!
//! Every mutating operation runs as exactly one unit of work
//! ([`Store::transact`]): the closure sees a consistent view of all tables,
//! and its writes become visible all together when it returns `Ok`, or not at
//! all when it returns `Err`. Units are serializable, which is what makes the
//! engine's check-then-act sequences (accept a bid, tally outcomes) race-free.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use wager_types::{Result, WagerError};

use crate::tables::Tables;

// =========================================================================
// Clock
// =========================================================================

/// Source of wall-clock time for a store.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant, so a
/// test can keep one handle and give another to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.lock();
        *instant += by;
    }

    fn lock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

// =========================================================================
// Store contract
// =========================================================================

/// Persistence contract the engine runs against.
pub trait Store: Send + Sync {
    /// Run `unit` as one serializable unit of work.
    ///
    /// `unit` receives the tables and the unit's timestamp. Its writes are
    /// committed only if it returns `Ok`.
    ///
    /// # Errors
    /// Whatever `unit` returns, or `StoreFailure` if the commit itself fails.
    fn transact<T, F>(&self, unit: F) -> Result<T>
    where
        F: FnOnce(&mut Tables, DateTime<Utc>) -> Result<T>;

    /// Read from a consistent snapshot.
    fn read<T, F>(&self, view: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> T;

    /// Current time. Never goes backwards.
    fn now(&self) -> Result<DateTime<Utc>>;
}

// =========================================================================
// MemoryStore
// =========================================================================

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    /// Latest instant handed out; time observed through the store never
    /// precedes it.
    last_tick: Option<DateTime<Utc>>,
}

impl State {
    fn tick(&mut self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let now = match self.last_tick {
            Some(last) if last > wall => last,
            _ => wall,
        };
        self.last_tick = Some(now);
        now
    }
}

/// Reference store: all tables behind one mutex.
///
/// A unit runs against a scratch copy of the tables, which replaces the live
/// copy only when the unit succeeds. Commits are therefore O(size of the
/// tables); this store is meant for tests and single-process deployments.
#[derive(Debug)]
pub struct MemoryStore<C: Clock = SystemClock> {
    state: Mutex<State>,
    clock: C,
    #[cfg(any(test, feature = "test-helpers"))]
    fail_next_commit: std::sync::atomic::AtomicBool,
}

impl MemoryStore<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
            #[cfg(any(test, feature = "test-helpers"))]
            fail_next_commit: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| {
            tracing::error!("Memory store lock poisoned");
            WagerError::store("memory store lock poisoned by a panicked unit of work")
        })
    }

    #[cfg(any(test, feature = "test-helpers"))]
    fn commit_fault(&self) -> Result<()> {
        if self
            .fail_next_commit
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(WagerError::store("injected commit failure"));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-helpers")))]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn commit_fault(&self) -> Result<()> {
        Ok(())
    }
}

/// Fault injection for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl<C: Clock> MemoryStore<C> {
    /// Make the next unit fail at commit time, after its closure succeeded.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl<C: Clock> Store for MemoryStore<C> {
    fn transact<T, F>(&self, unit: F) -> Result<T>
    where
        F: FnOnce(&mut Tables, DateTime<Utc>) -> Result<T>,
    {
        let mut state = self.lock()?;
        let now = state.tick(self.clock.now());

        let mut scratch = state.tables.clone();
        let out = unit(&mut scratch, now)?;
        self.commit_fault()?;

        state.tables = scratch;
        Ok(out)
    }

    fn read<T, F>(&self, view: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> T,
    {
        let state = self.lock()?;
        Ok(view(&state.tables))
    }

    fn now(&self) -> Result<DateTime<Utc>> {
        let mut state = self.lock()?;
        Ok(state.tick(self.clock.now()))
    }
}
