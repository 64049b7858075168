use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Error, Result, anyhow};
use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

use crate::Config;
use crate::pipeline::existence_index::ExistenceIndex;
use crate::pipeline::folder_cache::{FolderCache, resolve_root_folder};
use crate::pipeline::lister::ObjectLister;
use crate::pipeline::reporter::Reporter;
use crate::pipeline::stage::Stage;
use crate::pipeline::transferrer::ObjectTransferrer;
use crate::storage::{Destination, Source, StoragePair};
use crate::types::token::PipelineCancellationToken;
use crate::types::{
    DestinationFolderRef, ObjectOutcome, SourceObject, TransferReport, TransferStatistics,
};

const CHANNEL_CAPACITY: usize = 20000;

pub mod existence_index;
pub mod folder_cache;
mod lister;
mod reporter;
pub mod single_flight;
mod stage;
mod storage_factory;
mod transferrer;

/// One run of the copy: list the source, resolve folders, skip or upload each object.
pub struct Pipeline {
    config: Config,
    source: Source,
    destination: Destination,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<TransferStatistics>,
    stats_receiver: Receiver<TransferStatistics>,
    has_error: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<Error>>>,
    ready: bool,
    transfer_report: Arc<Mutex<TransferReport>>,
}

impl Pipeline {
    pub async fn new(config: Config, cancellation_token: PipelineCancellationToken) -> Result<Self> {
        let StoragePair {
            source,
            destination,
        } = storage_factory::create_storage_pair(config.clone(), cancellation_token.clone())
            .await?;

        Ok(Self::with_storage(
            config,
            source,
            destination,
            cancellation_token,
        ))
    }

    /// Builds a pipeline over the given storages instead of the ones named in `config`.
    pub fn with_storage(
        config: Config,
        source: Source,
        destination: Destination,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        Self {
            config,
            source,
            destination,
            cancellation_token,
            stats_sender,
            stats_receiver,
            has_error: Arc::new(AtomicBool::new(false)),
            errors: Arc::new(Mutex::new(VecDeque::<Error>::new())),
            ready: true,
            transfer_report: Arc::new(Mutex::new(TransferReport::default())),
        }
    }

    pub async fn run(&mut self) {
        if !self.ready {
            panic!("it can be executed only once.")
        }
        self.ready = false;

        if self.check_source().await {
            self.transfer().await;
        }

        self.shutdown();
    }

    fn shutdown(&self) {
        self.close_stats_sender();
    }

    /// Failure here aborts the run before the destination is touched.
    async fn check_source(&self) -> bool {
        if let Err(e) = self.source.check_accessible().await {
            self.print_and_store_error(Some(e), "source is not accessible.");
            return false;
        }

        true
    }

    /// Failure here aborts the run before any object is transferred.
    async fn resolve_root(&self) -> Option<(DestinationFolderRef, bool)> {
        match resolve_root_folder(
            &self.destination,
            self.config.drive_parent_folder_id.as_deref(),
            &self.config.drive_folder,
        )
        .await
        {
            Ok(root) => Some(root),
            Err(e) => {
                self.print_and_store_error(Some(e), "failed to resolve the destination folder.");
                None
            }
        }
    }

    async fn transfer(&self) {
        let source_objects = self.list_source();

        // the destination is not touched until the source yields an object
        let first_object = tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => None,
            result = source_objects.recv() => result.ok(),
        };
        let Some(first_object) = first_object else {
            info!(
                folder = self.config.drive_folder,
                "source has no objects to transfer."
            );
            return;
        };

        let Some((root, root_created)) = self.resolve_root().await else {
            // stops the lister
            source_objects.close();
            return;
        };

        let existence_index = Arc::new(ExistenceIndex::new(dyn_clone::clone_box(
            &*self.destination,
        )));
        if root_created {
            existence_index.mark_empty(&root.id);
        }

        info!(
            folder = self.config.drive_folder,
            id = root.id,
            "transfer has started."
        );

        let folder_cache = Arc::new(FolderCache::new(
            root,
            dyn_clone::clone_box(&*self.destination),
            existence_index.clone(),
        ));

        let outcomes = self.transfer_objects(
            first_object,
            source_objects,
            folder_cache,
            existence_index,
        );
        if let Err(e) = self.report(outcomes).await {
            self.print_and_store_error(Some(anyhow!(e)), "reporter failed.");
        }
    }

    fn list_source(&self) -> Receiver<SourceObject> {
        let (sender, next_stage_receiver) = async_channel::bounded::<SourceObject>(CHANNEL_CAPACITY);
        let stage = self.create_stage(None, Some(sender));
        let object_lister = ObjectLister::new(stage);
        let has_error = self.has_error.clone();
        let error_list = self.errors.clone();
        let max_keys = self.config.max_keys;

        tokio::spawn(async move {
            let result = object_lister.list_source(max_keys).await;
            match result {
                Ok(()) => {}
                Err(e) => {
                    log_error(has_error, error_list, e, "list source objects failed.");
                }
            }
        });

        next_stage_receiver
    }

    /// `first_object` has already been taken from the listing. The first worker transfers it.
    fn transfer_objects(
        &self,
        first_object: SourceObject,
        source_objects: Receiver<SourceObject>,
        folder_cache: Arc<FolderCache>,
        existence_index: Arc<ExistenceIndex>,
    ) -> Receiver<ObjectOutcome> {
        let (outcome_sender, next_stage_receiver) =
            async_channel::bounded::<ObjectOutcome>(CHANNEL_CAPACITY);

        let mut first_object = Some(first_object);
        for worker_index in 0..(self.config.worker_size) {
            let stage = self.create_stage(Some(source_objects.clone()), None);
            let object_transferrer = ObjectTransferrer::new(
                stage,
                worker_index,
                folder_cache.clone(),
                existence_index.clone(),
                outcome_sender.clone(),
            );
            let initial_object = first_object.take();
            let has_error = self.has_error.clone();
            let error_list = self.errors.clone();

            tokio::spawn(async move {
                let result = object_transferrer.transfer(initial_object).await;
                match result {
                    Ok(_) => {}
                    Err(e) => {
                        log_error(has_error, error_list, e, "transfer objects failed.");
                    }
                }
            });
        }

        trace!(worker_size = self.config.worker_size, "transfer workers have been started.");

        next_stage_receiver
    }

    fn report(&self, outcomes: Receiver<ObjectOutcome>) -> JoinHandle<()> {
        let reporter = Reporter::new(outcomes, self.transfer_report.clone());

        tokio::spawn(async move {
            reporter.report().await;
        })
    }

    fn create_stage(
        &self,
        receiver: Option<Receiver<SourceObject>>,
        sender: Option<Sender<SourceObject>>,
    ) -> Stage {
        Stage::new(
            self.config.clone(),
            Some(dyn_clone::clone_box(&*self.source)),
            Some(dyn_clone::clone_box(&*self.destination)),
            receiver,
            sender,
            self.stats_sender.clone(),
            self.cancellation_token.clone(),
        )
    }

    fn print_and_store_error(&self, e: Option<Error>, message: &str) {
        self.has_error.store(true, Ordering::SeqCst);

        if let Some(e) = e {
            let error = format!("{e:#}");
            let source = e.source();

            error!(error = error, source = source, message);
            self.errors.lock().unwrap().push_back(e);
        } else {
            error!("{}", message.to_string());
            self.errors
                .lock()
                .unwrap()
                .push_back(anyhow!(message.to_string()));
        }
    }

    pub fn get_stats_receiver(&self) -> Receiver<TransferStatistics> {
        self.stats_receiver.clone()
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    pub fn get_errors_and_consume(&self) -> Option<Vec<Error>> {
        if !self.has_error() {
            return None;
        }

        let mut error_list = self.errors.lock().unwrap();
        Some(error_list.drain(..).collect())
    }

    /// The report is final once `run` has returned.
    pub fn get_transfer_report(&self) -> TransferReport {
        self.transfer_report.lock().unwrap().clone()
    }

    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }
}

fn log_error(
    has_error: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<Error>>>,
    e: Error,
    message: &str,
) {
    has_error.store(true, Ordering::SeqCst);

    let error = format!("{e:#}");
    let source = e.source();

    error!(error = error, source = source, message);

    let mut error_list = errors.lock().unwrap();
    error_list.push_back(e);
}
