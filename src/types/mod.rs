use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use zeroize_derive::{Zeroize, ZeroizeOnDrop};

pub mod async_callback;
pub mod error;
pub mod object_path;
pub mod token;

pub const DRIVE_FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const TRANSFER_REPORT_SUMMARY_NAME: &str = "TRANSFER_SUMMARY";

/// An object in the source bucket, as produced by a lister.
///
/// The key is relative to the source prefix and never ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    key: String,
    size: u64,
}

impl SourceObject {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_directory_marker(key: &str) -> bool {
        key.ends_with('/')
    }
}

/// A destination folder that has been looked up or created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFolderRef {
    pub path: String,
    pub id: String,
}

/// A child of a destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Copied { bytes: u64 },
    Skipped,
    Failed { reason: String, fatal: bool },
}

/// The outcome of one source object, sent from the workers to the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOutcome {
    pub key: String,
    pub outcome: TransferOutcome,
}

#[derive(Debug, PartialEq)]
pub enum TransferStatistics {
    TransferBytes(u64),
    TransferComplete { key: String },
    TransferSkip { key: String },
    TransferError { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub key: String,
    pub reason: String,
    pub fatal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub copied: u64,
    pub skipped: u64,
    pub failed: u64,
    pub transferred_bytes: u64,
    pub failures: Vec<TransferFailure>,
}

impl TransferReport {
    pub fn record(&mut self, outcome: ObjectOutcome) {
        match outcome.outcome {
            TransferOutcome::Copied { bytes } => {
                self.copied += 1;
                self.transferred_bytes += bytes;
            }
            TransferOutcome::Skipped => {
                self.skipped += 1;
            }
            TransferOutcome::Failed { reason, fatal } => {
                self.failed += 1;
                self.failures.push(TransferFailure {
                    key: outcome.key,
                    reason,
                    fatal,
                });
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.copied + self.skipped + self.failed
    }

    pub fn has_fatal_failure(&self) -> bool {
        self.failures.iter().any(|failure| failure.fatal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoragePath {
    S3 { bucket: String, prefix: String },
    Gcs { bucket: String, prefix: String },
    Local(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum S3Credentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}

/// OAuth2 bearer token for the Drive API.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DriveAccessToken {
    pub token: String,
}

impl Debug for DriveAccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut token = f.debug_struct("DriveAccessToken");
        token.field("token", &"** redacted **");
        token.finish()
    }
}

/// Where the Drive access token comes from.
#[derive(Debug, Clone)]
pub enum DriveCredential {
    AccessToken(DriveAccessToken),
    ServiceAccountFile(PathBuf),
    ApplicationDefault,
}
