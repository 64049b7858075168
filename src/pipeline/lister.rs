use anyhow::{Result, anyhow};
use tracing::trace;

use super::stage::Stage;

pub struct ObjectLister {
    base: Stage,
}

impl ObjectLister {
    pub fn new(base: Stage) -> Self {
        Self { base }
    }

    pub async fn list_source(&self, max_keys: i32) -> Result<()> {
        let (Some(source), Some(sender)) = (&self.base.source, &self.base.sender) else {
            return Err(anyhow!("lister stage requires a source and a sender."));
        };

        trace!("list source objects has started.");
        if let Err(e) = source.list_objects(sender, max_keys).await {
            // the run stopped consuming the listing
            if sender.is_closed() {
                trace!("list source objects has been stopped.");
                return Ok(());
            }
            return Err(e);
        }
        trace!("list source objects has been completed.");

        Ok(())
    }
}
