//! handoff - single-slot producer/consumer value handoff with chaos injection
//!
//! One producer thread hands a sequence of integers to a pool of consumer
//! threads through a single shared slot, while a disruptor thread
//! asynchronously interferes with randomly chosen consumers to exercise the
//! handoff under preemption.
//!
//! # Architecture
//!
//! ```text
//! stdin ──> producer ──publish──> [ExchangeSlot] ──claim──> consumer 0..N
//!                                       ▲                        │
//!                                   disruptor ──privilege/cancel─┘
//! ```
//!
//! The slot holds exactly one in-flight value: the producer blocks until the
//! previous value has been claimed, and each published value is claimed by
//! exactly one consumer. Consumers accumulate local sums which the
//! coordinator reduces into the final total.
//!
//! # Example
//!
//! ```ignore
//! use handoff::{Coordinator, Strategy};
//!
//! let coordinator = Coordinator::new(3, 0, false, Strategy::Off);
//! let total = coordinator.run(vec![1, 2, 3, 4, 5])?;
//! assert_eq!(total, 15);
//! ```

use std::time::Duration;

pub mod cli;
pub mod coordinator;
pub mod disruptor;
pub mod input;
pub mod producer;
pub mod slot;
pub mod worker;

pub use coordinator::Coordinator;
pub use disruptor::{Disruptor, Strategy};
pub use producer::Producer;
pub use slot::{Claim, ExchangeSlot};
pub use worker::{Worker, WorkerOutcome};

/// How long an idle consumer waits for the slot to fill before re-checking
/// its cancellation checkpoint.
pub const POLL_INTERVAL: Duration = Duration::from_micros(100);
