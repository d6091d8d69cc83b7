//! Coordinator: owns the shared state, spawns the producer, disruptor, and
//! worker pool, and reduces the workers' partial sums into the final total.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::thread;

use eyre::{Context, Result, eyre};
use log::{debug, warn};

use crate::disruptor::{Disruptor, Strategy};
use crate::producer::Producer;
use crate::slot::ExchangeSlot;
use crate::worker::{NO_PRIVILEGE, Worker, WorkerOutcome};

/// Configuration and lifecycle for one handoff run.
pub struct Coordinator {
    workers: usize,
    max_pause_ms: u64,
    debug: bool,
    strategy: Strategy,
}

impl Coordinator {
    /// `workers` must be at least 1 (enforced by the CLI before any threads
    /// are spawned).
    pub fn new(workers: usize, max_pause_ms: u64, debug: bool, strategy: Strategy) -> Self {
        Self {
            workers,
            max_pause_ms,
            debug,
            strategy,
        }
    }

    /// Run the full handoff: hand every value to the worker pool, then
    /// reduce the completed workers' local sums.
    ///
    /// Cancelled workers contribute nothing; their discarded sums are logged
    /// at WARN and the total simply comes out smaller.
    pub fn run(&self, values: Vec<i64>) -> Result<i64> {
        let slot = Arc::new(ExchangeSlot::new());
        let privileged = Arc::new(AtomicUsize::new(NO_PRIVILEGE));
        let cancels: Vec<Arc<AtomicBool>> = (0..self.workers)
            .map(|_| Arc::new(AtomicBool::new(false)))
            .collect();

        debug!(
            "coordinator: spawning {} workers, strategy {:?}, {} values",
            self.workers,
            self.strategy,
            values.len()
        );

        let mut worker_handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = Worker::new(
                id,
                Arc::clone(&slot),
                Arc::clone(&privileged),
                Arc::clone(&cancels[id]),
                self.max_pause_ms,
                self.debug,
            );
            let handle = thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn(move || worker.run())
                .context("failed to spawn consumer thread")?;
            worker_handles.push(handle);
        }

        let producer = Producer::new(Arc::clone(&slot), values);
        let producer_handle = thread::Builder::new()
            .name("producer".into())
            .spawn(move || producer.run())
            .context("failed to spawn producer thread")?;

        let disruptor_handle = match self.strategy {
            Strategy::Off => None,
            strategy => {
                let disruptor = Disruptor::new(
                    Arc::clone(&slot),
                    Arc::clone(&privileged),
                    cancels.clone(),
                    strategy,
                );
                Some(
                    thread::Builder::new()
                        .name("disruptor".into())
                        .spawn(move || disruptor.run())
                        .context("failed to spawn disruptor thread")?,
                )
            }
        };

        producer_handle
            .join()
            .map_err(|_| eyre!("producer thread panicked"))??;
        if let Some(handle) = disruptor_handle {
            handle
                .join()
                .map_err(|_| eyre!("disruptor thread panicked"))?;
        }

        let mut total: i64 = 0;
        for (id, handle) in worker_handles.into_iter().enumerate() {
            match handle
                .join()
                .map_err(|_| eyre!("consumer thread panicked"))??
            {
                WorkerOutcome::Completed(sum) => {
                    debug!("coordinator: worker {id} completed with local sum {sum}");
                    total += sum;
                }
                WorkerOutcome::Cancelled => {
                    warn!("coordinator: worker {id} was cancelled, partial sum discarded");
                }
            }
        }
        Ok(total)
    }
}
