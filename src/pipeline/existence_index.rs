use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::pipeline::single_flight::SingleFlightMap;
use crate::storage::{Destination, is_fatal_error};
use crate::types::error::TransferError;

/// Names of the children of each destination folder, listed once per folder and run.
///
/// Entries are never invalidated, so files created by someone else during the run are not
/// seen once their folder has been listed. Names uploaded by this run are tracked separately
/// as claims.
pub struct ExistenceIndex {
    destination: Destination,
    folders: SingleFlightMap<Arc<HashSet<String>>, TransferError>,
    claimed: Mutex<HashSet<(String, String)>>,
}

impl ExistenceIndex {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            folders: SingleFlightMap::new(),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Reserves `name` in the folder for the caller.
    ///
    /// Returns false when the name already exists there or another object of this run has
    /// claimed it, e.g. `a/b.txt` and `a//b.txt`. A claim is kept even if its upload fails.
    pub async fn claim(&self, folder_id: &str, name: &str) -> Result<bool, TransferError> {
        if self.exists(folder_id, name).await? {
            return Ok(false);
        }

        Ok(self
            .claimed
            .lock()
            .unwrap()
            .insert((folder_id.to_string(), name.to_string())))
    }

    pub async fn exists(&self, folder_id: &str, name: &str) -> Result<bool, TransferError> {
        let names = self
            .folders
            .get_or_try_init(folder_id, || self.list_names(folder_id))
            .await?;

        Ok(names.contains(name))
    }

    /// Registers a folder created in this run, so it is never listed.
    pub fn mark_empty(&self, folder_id: &str) {
        self.folders
            .insert_ready(folder_id, Arc::new(HashSet::new()));
    }

    pub fn indexed_folder_count(&self) -> usize {
        self.folders.ready_len()
    }

    async fn list_names(&self, folder_id: &str) -> Result<Arc<HashSet<String>>, TransferError> {
        let children = self
            .destination
            .list_children(folder_id)
            .await
            .map_err(|e| TransferError::FolderListing {
                folder_id: folder_id.to_string(),
                message: format!("{e:#}"),
                fatal: is_fatal_error(&e),
            })?;

        debug!(
            folder_id = folder_id,
            count = children.len(),
            "destination folder has been indexed."
        );

        Ok(Arc::new(
            children.into_iter().map(|child| child.name).collect(),
        ))
    }
}
