use anyhow::{Error, Result};
use async_channel::Sender;
use async_trait::async_trait;
use dyn_clone::DynClone;
use tokio::io::AsyncRead;

use crate::config::ClientConfig;
use crate::types::error::TransferError;
use crate::types::token::PipelineCancellationToken;
use crate::types::{DriveEntry, SourceObject, StoragePath};
use crate::Config;

pub mod drive;
pub mod local;
pub mod memory;
pub mod s3;

pub type Source = Box<dyn SourceTrait + Send + Sync>;
pub type Destination = Box<dyn DestinationTrait + Send + Sync>;
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

pub struct StoragePair {
    pub source: Source,
    pub destination: Destination,
}

/// The byte stream of a source object.
pub struct SourceBody {
    pub reader: ObjectReader,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait SourceFactory {
    async fn create(
        config: Config,
        path: StoragePath,
        cancellation_token: PipelineCancellationToken,
        client_config: Option<ClientConfig>,
    ) -> Result<Source>;
}

/// Object lister and reader of the bucket being copied.
#[async_trait]
pub trait SourceTrait: DynClone {
    /// Fails when the bucket (or directory) does not exist or cannot be read.
    async fn check_accessible(&self) -> Result<()>;

    /// Streams every object into `sender`. Directory markers are not sent.
    async fn list_objects(&self, sender: &Sender<SourceObject>, max_keys: i32) -> Result<()>;

    async fn open_read_stream(&self, object: &SourceObject) -> Result<SourceBody>;
}

/// Folder creator and file uploader of the document store.
///
/// Names are passed raw; implementations escape them for their own query language.
#[async_trait]
pub trait DestinationTrait: DynClone {
    async fn list_children(&self, parent_id: &str) -> Result<Vec<DriveEntry>>;

    /// Returns the first folder named `name` under `parent_id`, or anywhere when `parent_id` is None.
    async fn find_folder(&self, parent_id: Option<&str>, name: &str) -> Result<Option<String>>;

    async fn create_folder(&self, parent_id: Option<&str>, name: &str) -> Result<String>;

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        size: u64,
        reader: ObjectReader,
    ) -> Result<String>;
}

/// Authentication and authorization failures abort the run with a non-zero exit status.
pub fn is_fatal_error(e: &Error) -> bool {
    if let Some(error) = e.downcast_ref::<TransferError>() {
        return error.is_fatal();
    }

    drive::is_auth_error(e) || s3::is_auth_error(e)
}
