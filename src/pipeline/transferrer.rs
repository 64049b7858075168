use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_channel::Sender;
use tracing::{debug, error, info, trace};

use super::existence_index::ExistenceIndex;
use super::folder_cache::FolderCache;
use super::stage::Stage;
use crate::storage::{ObjectReader, is_fatal_error};
use crate::types::TransferStatistics::{TransferComplete, TransferError, TransferSkip};
use crate::types::async_callback::AsyncReadWithCallback;
use crate::types::object_path::ObjectPath;
use crate::types::{DEFAULT_CONTENT_TYPE, ObjectOutcome, SourceObject, TransferOutcome};

/// A worker that copies source objects into their destination folders.
pub struct ObjectTransferrer {
    base: Stage,
    worker_index: u16,
    folder_cache: Arc<FolderCache>,
    existence_index: Arc<ExistenceIndex>,
    outcome_sender: Sender<ObjectOutcome>,
}

impl ObjectTransferrer {
    pub fn new(
        base: Stage,
        worker_index: u16,
        folder_cache: Arc<FolderCache>,
        existence_index: Arc<ExistenceIndex>,
        outcome_sender: Sender<ObjectOutcome>,
    ) -> Self {
        Self {
            base,
            worker_index,
            folder_cache,
            existence_index,
            outcome_sender,
        }
    }

    /// Transfers `initial_object` first, if any, then everything received from the lister.
    pub async fn transfer(&self, initial_object: Option<SourceObject>) -> Result<()> {
        trace!(
            worker_index = self.worker_index,
            "transfer worker has started."
        );

        let receiver = self
            .base
            .receiver
            .as_ref()
            .ok_or_else(|| anyhow!("transfer worker requires a receiver."))?;

        if let Some(object) = initial_object {
            if !self.handle(object).await? {
                return Ok(());
            }
        }

        loop {
            tokio::select! {
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(object) => {
                            if !self.handle(object).await? {
                                return Ok(());
                            }
                        },
                        Err(_) => {
                            // normal shutdown
                            trace!(worker_index = self.worker_index, "transfer worker has been completed.");
                            break;
                        }
                    }
                },
                _ = self.base.cancellation_token.cancelled() => {
                    info!(worker_index = self.worker_index, "transfer worker has been cancelled.");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Returns false when the run has been cancelled.
    async fn handle(&self, object: SourceObject) -> Result<bool> {
        // an in-flight upload is dropped on cancellation
        let outcome = tokio::select! {
            biased;
            _ = self.base.cancellation_token.cancelled() => {
                info!(worker_index = self.worker_index, key = object.key(), "transfer worker has been cancelled.");
                return Ok(false);
            }
            outcome = self.transfer_object(&object) => outcome,
        };

        self.send_outcome(object, outcome).await?;

        Ok(true)
    }

    async fn transfer_object(&self, object: &SourceObject) -> Result<TransferOutcome> {
        let path = ObjectPath::parse(object.key())?;
        let folder = self.folder_cache.resolve(&path.segments).await?;

        if !self
            .existence_index
            .claim(&folder.id, &path.leaf_name)
            .await?
        {
            debug!(
                worker_index = self.worker_index,
                key = object.key(),
                "object already exists in the destination folder. skipping."
            );
            return Ok(TransferOutcome::Skipped);
        }

        let (source, destination) = match (&self.base.source, &self.base.destination) {
            (Some(source), Some(destination)) => (source, destination),
            _ => return Err(anyhow!("transfer worker requires a source and a destination.")),
        };

        let body = source.open_read_stream(object).await?;
        let content_type = self.choose_content_type(body.content_type, &path.leaf_name);
        let reader: ObjectReader = Box::new(AsyncReadWithCallback::new(
            body.reader,
            self.base.stats_sender.clone(),
        ));

        let file_id = destination
            .upload_file(
                &folder.id,
                &path.leaf_name,
                &content_type,
                object.size(),
                reader,
            )
            .await
            .with_context(|| format!("failed to upload into '{}'.", folder.path))?;

        debug!(
            worker_index = self.worker_index,
            key = object.key(),
            file_id = file_id,
            content_type = content_type,
            size = object.size(),
            "object has been copied."
        );

        Ok(TransferOutcome::Copied {
            bytes: object.size(),
        })
    }

    fn choose_content_type(&self, source_content_type: Option<String>, name: &str) -> String {
        choose_content_type(source_content_type, name, self.base.config.no_guess_mime_type)
    }

    async fn send_outcome(
        &self,
        object: SourceObject,
        outcome: Result<TransferOutcome>,
    ) -> Result<()> {
        let key = object.key().to_string();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let fatal = is_fatal_error(&e);
                let reason = format!("{e:#}");

                error!(
                    worker_index = self.worker_index,
                    key = key,
                    error = reason,
                    source = e.source(),
                    fatal = fatal,
                    "failed to transfer object."
                );

                TransferOutcome::Failed { reason, fatal }
            }
        };

        let stats = match &outcome {
            TransferOutcome::Copied { .. } => TransferComplete { key: key.clone() },
            TransferOutcome::Skipped => TransferSkip { key: key.clone() },
            TransferOutcome::Failed { .. } => TransferError { key: key.clone() },
        };
        self.base.send_stats(stats).await;

        self.outcome_sender
            .send(ObjectOutcome { key, outcome })
            .await
            .context("async_channel::Sender::send() failed.")
    }
}

/// The source's content type wins; otherwise it is guessed from the file name.
pub fn choose_content_type(
    source_content_type: Option<String>,
    name: &str,
    no_guess_mime_type: bool,
) -> String {
    if let Some(content_type) = source_content_type.filter(|content_type| !content_type.is_empty())
    {
        return content_type;
    }

    if no_guess_mime_type {
        return DEFAULT_CONTENT_TYPE.to_string();
    }

    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}
