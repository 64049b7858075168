use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::pipeline::existence_index::ExistenceIndex;
use crate::pipeline::single_flight::SingleFlightMap;
use crate::storage::{Destination, is_fatal_error};
use crate::types::DestinationFolderRef;
use crate::types::error::TransferError;
use crate::types::object_path::folder_key;

/// Run-scoped map from a folder path (e.g. `a/b/c`) to its destination folder id.
///
/// Every folder on a path is looked up or created once per run, however many workers ask
/// for it at the same time.
pub struct FolderCache {
    root: DestinationFolderRef,
    destination: Destination,
    existence_index: Arc<ExistenceIndex>,
    folders: SingleFlightMap<String, TransferError>,
}

impl FolderCache {
    pub fn new(
        root: DestinationFolderRef,
        destination: Destination,
        existence_index: Arc<ExistenceIndex>,
    ) -> Self {
        Self {
            root,
            destination,
            existence_index,
            folders: SingleFlightMap::new(),
        }
    }

    pub fn root(&self) -> &DestinationFolderRef {
        &self.root
    }

    /// Resolves the folder chain left to right. An empty chain is the root.
    pub async fn resolve(&self, segments: &[String]) -> Result<DestinationFolderRef, TransferError> {
        let mut parent_id = self.root.id.clone();

        for depth in 1..=segments.len() {
            let path = folder_key(&segments[..depth]);
            let name = &segments[depth - 1];

            parent_id = self
                .folders
                .get_or_try_init(&path, || self.find_or_create(parent_id, name, &path))
                .await?;
        }

        Ok(DestinationFolderRef {
            path: folder_key(segments),
            id: parent_id,
        })
    }

    pub fn resolved_folder_count(&self) -> usize {
        self.folders.ready_len()
    }

    async fn find_or_create(
        &self,
        parent_id: String,
        name: &str,
        path: &str,
    ) -> Result<String, TransferError> {
        self.find_or_create_folder(&parent_id, name, path)
            .await
            .map_err(|e| TransferError::FolderResolution {
                path: path.to_string(),
                message: format!("{e:#}"),
                fatal: is_fatal_error(&e),
            })
    }

    async fn find_or_create_folder(&self, parent_id: &str, name: &str, path: &str) -> Result<String> {
        if let Some(id) = self.destination.find_folder(Some(parent_id), name).await? {
            debug!(path = path, id = id, "existing folder found.");
            return Ok(id);
        }

        let id = self.destination.create_folder(Some(parent_id), name).await?;
        // must be registered before waiters can see the id
        self.existence_index.mark_empty(&id);

        info!(path = path, id = id, "folder created.");

        Ok(id)
    }
}

/// Finds the top-level destination folder by name, creating it when absent.
///
/// Returns the folder and whether it has been created by this call.
pub async fn resolve_root_folder(
    destination: &Destination,
    parent_id: Option<&str>,
    name: &str,
) -> Result<(DestinationFolderRef, bool)> {
    if let Some(id) = destination.find_folder(parent_id, name).await? {
        debug!(name = name, id = id, "destination folder found.");
        return Ok((
            DestinationFolderRef {
                path: String::new(),
                id,
            },
            false,
        ));
    }

    let id = destination.create_folder(parent_id, name).await?;
    info!(name = name, id = id, "destination folder created.");

    Ok((
        DestinationFolderRef {
            path: String::new(),
            id,
        },
        true,
    ))
}
