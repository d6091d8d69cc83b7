//! The disruptor: a chaos thread that interferes with randomly chosen
//! consumers until the producer raises the termination flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use clap::ValueEnum;
use log::debug;
use rand::Rng;

use crate::slot::ExchangeSlot;
use crate::worker::NO_PRIVILEGE;

/// Disruption strategy, selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Mark a random worker privileged so it skips its next post-claim
    /// pause. Creates scheduling bias, loses no data.
    Redirect,
    /// Request cancellation of a random worker. A cancelled worker's
    /// partial sum is discarded, so the final total may come out short.
    Cancel,
    /// No disruption thread.
    Off,
}

/// Issues disruption requests against random workers in a tight loop.
pub struct Disruptor {
    slot: Arc<ExchangeSlot>,
    privileged: Arc<AtomicUsize>,
    cancels: Vec<Arc<AtomicBool>>,
    strategy: Strategy,
}

impl Disruptor {
    pub fn new(
        slot: Arc<ExchangeSlot>,
        privileged: Arc<AtomicUsize>,
        cancels: Vec<Arc<AtomicBool>>,
        strategy: Strategy,
    ) -> Self {
        Self {
            slot,
            privileged,
            cancels,
            strategy,
        }
    }

    /// Spin until the termination flag is up, issuing requests with no pause
    /// beyond a scheduler yield. Requests are not deduplicated: the same
    /// worker may be targeted repeatedly, including after it has exited.
    /// Late requests are no-ops.
    pub fn run(self) {
        let worker_count = self.cancels.len();
        let mut rng = rand::rng();
        let mut requests: u64 = 0;

        while !self.slot.is_closed() {
            match self.strategy {
                Strategy::Redirect => {
                    // Only hand out a new privilege once the previous holder
                    // has consumed it.
                    if self.privileged.load(Ordering::Acquire) == NO_PRIVILEGE {
                        let target = rng.random_range(0..worker_count);
                        self.privileged.store(target, Ordering::Release);
                        requests += 1;
                    }
                }
                Strategy::Cancel => {
                    let target = rng.random_range(0..worker_count);
                    self.cancels[target].store(true, Ordering::Release);
                    requests += 1;
                }
                Strategy::Off => return,
            }
            thread::yield_now();
        }

        debug!("disruptor: issued {requests} requests");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tokens(n: usize) -> Vec<Arc<AtomicBool>> {
        (0..n).map(|_| Arc::new(AtomicBool::new(false))).collect()
    }

    #[test]
    fn test_exits_once_slot_closes() {
        let slot = Arc::new(ExchangeSlot::new());
        slot.close();
        let privileged = Arc::new(AtomicUsize::new(NO_PRIVILEGE));
        let disruptor = Disruptor::new(
            Arc::clone(&slot),
            Arc::clone(&privileged),
            tokens(3),
            Strategy::Redirect,
        );
        disruptor.run();
        assert_eq!(privileged.load(Ordering::SeqCst), NO_PRIVILEGE);
    }

    #[test]
    fn test_redirect_marks_some_worker_privileged() {
        let slot = Arc::new(ExchangeSlot::new());
        let privileged = Arc::new(AtomicUsize::new(NO_PRIVILEGE));
        let disruptor = Disruptor::new(
            Arc::clone(&slot),
            Arc::clone(&privileged),
            tokens(4),
            Strategy::Redirect,
        );
        let handle = thread::spawn(move || disruptor.run());

        thread::sleep(Duration::from_millis(20));
        let marked = privileged.load(Ordering::SeqCst);
        assert!(marked < 4, "a worker identity should be privileged, got {marked}");

        slot.close();
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_sets_at_least_one_token() {
        let slot = Arc::new(ExchangeSlot::new());
        let cancels = tokens(4);
        let disruptor = Disruptor::new(
            Arc::clone(&slot),
            Arc::new(AtomicUsize::new(NO_PRIVILEGE)),
            cancels.clone(),
            Strategy::Cancel,
        );
        let handle = thread::spawn(move || disruptor.run());

        thread::sleep(Duration::from_millis(20));
        slot.close();
        handle.join().unwrap();

        assert!(cancels.iter().any(|c| c.load(Ordering::SeqCst)));
    }
}
