//! Producer: feeds the input sequence through the exchange slot.

use std::sync::Arc;

use eyre::Result;
use log::debug;

use crate::slot::ExchangeSlot;

/// Publishes an ordered sequence of integers one at a time, then raises the
/// termination flag.
pub struct Producer {
    slot: Arc<ExchangeSlot>,
    values: Vec<i64>,
}

impl Producer {
    pub fn new(slot: Arc<ExchangeSlot>, values: Vec<i64>) -> Self {
        Self { slot, values }
    }

    /// Publish every value in order, blocking on each until the previous one
    /// has been claimed.
    ///
    /// The termination flag is raised unconditionally, even if publishing
    /// fails, so consumers are never left polling a slot nobody will fill.
    pub fn run(self) -> Result<()> {
        let count = self.values.len();
        let result = self
            .values
            .into_iter()
            .try_for_each(|value| self.slot.publish(value));
        self.slot.close();
        debug!("producer: published {count} values, termination flag raised");
        result
    }
}
