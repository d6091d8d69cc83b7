//! Consumer worker: claims values from the exchange slot and accumulates a
//! local sum until the slot is closed and drained, or until a cancellation
//! request is honored.
//!
//! Cancellation is cooperative: the disruptor only sets this worker's cancel
//! token, and the worker honors it at its two checkpoints, after a claim's
//! post-pause and after an idle poll. It is never honored while the slot
//! lock is held, so a claim can never be torn. A cancelled worker's entire
//! local sum is discarded; the final total comes out smaller than the true
//! input sum. That loss is the point of the cancel strategy, not a defect
//! to recover from.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use eyre::Result;
use log::debug;
use rand::Rng;

use crate::slot::{Claim, ExchangeSlot};

/// Sentinel stored in the privilege cell when no worker is privileged.
pub const NO_PRIVILEGE: usize = usize::MAX;

/// Terminal result of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Ran until the slot closed; carries the local sum to fold into the
    /// total.
    Completed(i64),
    /// Honored a cancellation request; the local sum is discarded.
    Cancelled,
}

/// One consumer in the pool. Identity is assigned by the coordinator at
/// spawn time and stable for the worker's lifetime.
pub struct Worker {
    id: usize,
    slot: Arc<ExchangeSlot>,
    privileged: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
    max_pause_ms: u64,
    debug: bool,
}

impl Worker {
    pub fn new(
        id: usize,
        slot: Arc<ExchangeSlot>,
        privileged: Arc<AtomicUsize>,
        cancel: Arc<AtomicBool>,
        max_pause_ms: u64,
        debug: bool,
    ) -> Self {
        Self {
            id,
            slot,
            privileged,
            cancel,
            max_pause_ms,
            debug,
        }
    }

    /// The poll/claim loop.
    pub fn run(self) -> Result<WorkerOutcome> {
        let mut local_sum: i64 = 0;
        loop {
            match self.slot.claim_timeout(crate::POLL_INTERVAL)? {
                Claim::Value(value) => {
                    local_sum += value;
                    if self.debug {
                        println!("({}, {})", self.id, local_sum);
                    }
                    self.pause_after_claim();
                    if self.cancel_requested() {
                        debug!("worker {}: cancelled, dropping local sum {local_sum}", self.id);
                        return Ok(WorkerOutcome::Cancelled);
                    }
                }
                Claim::TimedOut => {
                    if self.cancel_requested() {
                        debug!("worker {}: cancelled, dropping local sum {local_sum}", self.id);
                        return Ok(WorkerOutcome::Cancelled);
                    }
                }
                Claim::Closed => {
                    debug!("worker {}: slot closed, local sum {local_sum}", self.id);
                    return Ok(WorkerOutcome::Completed(local_sum));
                }
            }
        }
    }

    /// Post-claim pause. A privileged worker skips the pause once and gives
    /// the privilege back; everyone else sleeps a random duration below the
    /// configured bound (no pause when the bound is zero).
    fn pause_after_claim(&self) {
        if self
            .privileged
            .compare_exchange(self.id, NO_PRIVILEGE, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }
        if self.max_pause_ms > 0 {
            let micros = rand::rng().random_range(0..self.max_pause_ms.saturating_mul(1000));
            thread::sleep(Duration::from_micros(micros));
        }
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn spawn_worker(
        slot: &Arc<ExchangeSlot>,
        privileged: usize,
        cancelled: bool,
    ) -> (Worker, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let privileged = Arc::new(AtomicUsize::new(privileged));
        let cancel = Arc::new(AtomicBool::new(cancelled));
        let worker = Worker::new(
            0,
            Arc::clone(slot),
            Arc::clone(&privileged),
            Arc::clone(&cancel),
            0,
            false,
        );
        (worker, privileged, cancel)
    }

    #[test]
    fn test_sums_all_published_values() {
        let slot = Arc::new(ExchangeSlot::new());
        let (worker, _, _) = spawn_worker(&slot, NO_PRIVILEGE, false);
        let handle = thread::spawn(move || worker.run());

        for v in [1, 2, 3] {
            slot.publish(v).unwrap();
        }
        slot.close();

        assert_eq!(handle.join().unwrap().unwrap(), WorkerOutcome::Completed(6));
    }

    #[test]
    fn test_pending_cancel_is_honored_at_idle_checkpoint() {
        let slot = Arc::new(ExchangeSlot::new());
        let (worker, _, _) = spawn_worker(&slot, NO_PRIVILEGE, true);
        // Slot never closes; the worker must exit through the cancel
        // checkpoint and discard its (empty) sum.
        assert_eq!(worker.run().unwrap(), WorkerOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_after_claim_discards_local_sum() {
        let slot = Arc::new(ExchangeSlot::new());
        slot.publish(40).unwrap();
        let (worker, _, cancel) = spawn_worker(&slot, NO_PRIVILEGE, false);
        cancel.store(true, Ordering::SeqCst);
        // The claim succeeds, then the checkpoint fires: the claimed value
        // never reaches the total.
        assert_eq!(worker.run().unwrap(), WorkerOutcome::Cancelled);
    }

    #[test]
    fn test_privileged_worker_returns_privilege() {
        let slot = Arc::new(ExchangeSlot::new());
        slot.publish(5).unwrap();
        slot.close();
        let (worker, privileged, _) = spawn_worker(&slot, 0, false);
        assert_eq!(worker.run().unwrap(), WorkerOutcome::Completed(5));
        assert_eq!(privileged.load(Ordering::SeqCst), NO_PRIVILEGE);
    }
}
