//! The exchange slot: a one-value handoff primitive shared by the producer
//! and every consumer.
//!
//! The slot holds at most one unclaimed value. The producer blocks in
//! [`ExchangeSlot::publish`] until the previous value has been claimed, so
//! values are offered in input order with no overwrite. Consumers claim
//! through [`ExchangeSlot::claim_timeout`], which takes the value and clears
//! the readiness flag in one critical section, so a published value is
//! claimed by exactly one consumer.
//!
//! The termination flag is a plain atomic outside the lock: it only ever
//! transitions false to true, and readers act solely on its eventual-true
//! observation. Consumers wait with a bounded timeout, so a wakeup racing
//! the flag costs at most one poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use eyre::{Result, eyre};

/// Outcome of a single claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The slot held a value and this caller took it.
    Value(i64),
    /// The producer has finished and nothing is left to drain.
    Closed,
    /// Nothing became ready within the timeout.
    TimedOut,
}

#[derive(Debug, Default)]
struct SlotState {
    value: i64,
    ready: bool,
}

/// Single-slot exchange between one producer and many consumers.
#[derive(Debug, Default)]
pub struct ExchangeSlot {
    state: Mutex<SlotState>,
    /// Signalled when a value is published.
    slot_filled: Condvar,
    /// Signalled when a value is claimed.
    slot_taken: Condvar,
    /// Termination flag, raised exactly once after the last publish.
    done: AtomicBool,
}

impl ExchangeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one value, blocking until the previously published value has
    /// been claimed.
    pub fn publish(&self, value: i64) -> Result<()> {
        let mut state = self.lock()?;
        while state.ready {
            state = self
                .slot_taken
                .wait(state)
                .map_err(|_| eyre!("exchange slot lock poisoned"))?;
        }
        state.value = value;
        state.ready = true;
        drop(state);
        self.slot_filled.notify_one();
        Ok(())
    }

    /// Raise the termination flag and wake every waiting consumer.
    ///
    /// Taken together with the bounded waits in [`claim_timeout`], a consumer
    /// can never sleep through the close.
    ///
    /// [`claim_timeout`]: ExchangeSlot::claim_timeout
    pub fn close(&self) {
        // Hold the lock across the store so a consumer between its done-check
        // and its wait cannot miss the wakeup.
        let guard = self.state.lock();
        self.done.store(true, Ordering::Release);
        drop(guard);
        self.slot_filled.notify_all();
    }

    /// Whether the producer has finished publishing.
    pub fn is_closed(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Attempt to claim the outstanding value, waiting up to `timeout` for
    /// one to appear.
    ///
    /// Returns [`Claim::Closed`] only once the slot is both closed and
    /// drained; a value published before the close is still handed out.
    pub fn claim_timeout(&self, timeout: Duration) -> Result<Claim> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock()?;
        loop {
            if state.ready {
                let value = state.value;
                state.ready = false;
                drop(state);
                self.slot_taken.notify_one();
                return Ok(Claim::Value(value));
            }
            if self.done.load(Ordering::Acquire) {
                return Ok(Claim::Closed);
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(Claim::TimedOut);
            };
            let (guard, _timeout_result) = self
                .slot_filled
                .wait_timeout(state, remaining)
                .map_err(|_| eyre!("exchange slot lock poisoned"))?;
            // Re-check `ready` under the lock: another consumer may have
            // claimed the value between the wakeup and the reacquire.
            state = guard;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SlotState>> {
        self.state
            .lock()
            .map_err(|_| eyre!("exchange slot lock poisoned"))
    }
}
