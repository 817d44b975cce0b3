//! The safety-net refresh.
//!
//! Event-driven triggers can be missed (an event the daemon never hears
//! about, a change that lands while a fetch is in flight).  [`BackupTimer`]
//! sends a [`TriggerReason::BackupTimer`] on a fixed interval regardless of
//! what the coordinator is doing, so the label always converges eventually.

use crate::command::{Command, TriggerReason};
use crate::coordinator::Event;
use crate::traits::TriggerSource;
use log::{debug, info};
use std::convert::Infallible;
use std::sync::mpsc;
use std::time::Duration;

/// A [`TriggerSource`] that fires every `interval`.
pub struct BackupTimer {
    interval: Duration,
}

impl BackupTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl TriggerSource for BackupTimer {
    type Error = Infallible;

    /// Loop until the coordinator's queue is closed.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Infallible> {
        info!("backup refresh every {:?}", self.interval);
        loop {
            std::thread::sleep(self.interval);
            debug!("backup refresh");
            if sink
                .send(Event::Command(Command::Trigger(TriggerReason::BackupTimer)))
                .is_err()
            {
                debug!("queue closed, stopping backup timer");
                return Ok(());
            }
        }
    }
}
