use std::sync::{Arc, Mutex};

use async_channel::Receiver;
use tracing::trace;

use crate::types::{ObjectOutcome, TransferReport};

/// Folds the outcomes of all workers into the transfer report.
pub struct Reporter {
    receiver: Receiver<ObjectOutcome>,
    report: Arc<Mutex<TransferReport>>,
}

impl Reporter {
    pub fn new(receiver: Receiver<ObjectOutcome>, report: Arc<Mutex<TransferReport>>) -> Self {
        Self { receiver, report }
    }

    /// Returns when every sender has been dropped.
    pub async fn report(&self) {
        trace!("reporter has started.");

        while let Ok(outcome) = self.receiver.recv().await {
            self.report.lock().unwrap().record(outcome);
        }

        trace!("reporter has been completed.");
    }
}
