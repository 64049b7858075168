use async_channel::{Receiver, Sender};

use crate::Config;
use crate::storage::{Destination, Source};
use crate::types::token::PipelineCancellationToken;
use crate::types::{SourceObject, TransferStatistics};

pub struct Stage {
    pub config: Config,
    pub source: Option<Source>,
    pub destination: Option<Destination>,
    pub receiver: Option<Receiver<SourceObject>>,
    pub sender: Option<Sender<SourceObject>>,
    pub stats_sender: Sender<TransferStatistics>,
    pub cancellation_token: PipelineCancellationToken,
}

impl Stage {
    pub fn new(
        config: Config,
        source: Option<Source>,
        destination: Option<Destination>,
        receiver: Option<Receiver<SourceObject>>,
        sender: Option<Sender<SourceObject>>,
        stats_sender: Sender<TransferStatistics>,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        Self {
            config,
            source,
            destination,
            receiver,
            sender,
            stats_sender,
            cancellation_token,
        }
    }

    pub async fn send_stats(&self, stats: TransferStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }
}
