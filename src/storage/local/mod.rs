use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use tokio::fs::File;
use tracing::{trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::Config;
use crate::config::ClientConfig;
use crate::storage::{Source, SourceBody, SourceFactory, SourceTrait};
use crate::types::token::PipelineCancellationToken;
use crate::types::{SourceObject, StoragePath};

pub struct LocalSourceFactory {}

#[async_trait]
impl SourceFactory for LocalSourceFactory {
    async fn create(
        config: Config,
        path: StoragePath,
        cancellation_token: PipelineCancellationToken,
        _client_config: Option<ClientConfig>,
    ) -> Result<Source> {
        LocalSource::boxed_new(config, path, cancellation_token)
    }
}

/// A directory tree used as the source bucket. Keys are paths relative to the root, `/`-separated.
#[derive(Clone)]
struct LocalSource {
    path: PathBuf,
    follow_symlinks: bool,
    cancellation_token: PipelineCancellationToken,
}

impl LocalSource {
    fn boxed_new(
        config: Config,
        path: StoragePath,
        cancellation_token: PipelineCancellationToken,
    ) -> Result<Source> {
        let StoragePath::Local(local_path) = path else {
            return Err(anyhow!("local path expected."));
        };

        Ok(Box::new(LocalSource {
            path: local_path,
            follow_symlinks: config.follow_symlinks,
            cancellation_token,
        }))
    }

    fn build_object_from_dir_entry(&self, entry: &DirEntry) -> Result<Option<SourceObject>> {
        if entry.file_type().is_dir() || entry.file_type().is_symlink() {
            return Ok(None);
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("failed to read metadata: {}", entry.path().display()))?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let mut key = remove_local_path_prefix(entry.path(), &self.path);
        if cfg!(windows) {
            key = convert_windows_directory_char_to_slash(&key);
        }

        Ok(Some(SourceObject::new(key, metadata.len())))
    }
}

#[async_trait]
impl SourceTrait for LocalSource {
    async fn check_accessible(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("source directory not found: {}", self.path.display()))?;

        if !metadata.is_dir() {
            return Err(anyhow!(
                "source is not a directory: {}",
                self.path.display()
            ));
        }

        Ok(())
    }

    async fn list_objects(&self, sender: &Sender<SourceObject>, _max_keys: i32) -> Result<()> {
        for entry in WalkDir::new(&self.path).follow_links(self.follow_symlinks) {
            if self.cancellation_token.is_cancelled() {
                trace!("list_objects() canceled.");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(inner) = e.io_error() {
                        if inner.kind() == io::ErrorKind::NotFound {
                            continue;
                        }
                    }

                    let path = e
                        .path()
                        .unwrap_or_else(|| Path::new(""))
                        .to_string_lossy()
                        .to_string();
                    let error = e.to_string();
                    warn!(path = path, error = error, "failed to list local files.");
                    continue;
                }
            };

            let object = match self.build_object_from_dir_entry(&entry) {
                Ok(Some(object)) => object,
                Ok(None) => continue,
                Err(e) => {
                    let path = entry.path().to_string_lossy().to_string();
                    let error = format!("{e:#}");
                    warn!(path = path, error = error, "failed to list local files.");
                    continue;
                }
            };

            if let Err(e) = sender
                .send(object)
                .await
                .context("async_channel::Sender::send() failed.")
            {
                return if !sender.is_closed() { Err(e) } else { Ok(()) };
            }
        }

        Ok(())
    }

    async fn open_read_stream(&self, object: &SourceObject) -> Result<SourceBody> {
        let path = self.path.join(object.key());
        let file = File::open(&path)
            .await
            .with_context(|| format!("tokio::fs::File::open() failed. path={}", path.display()))?;

        Ok(SourceBody {
            reader: Box::new(file),
            content_type: None,
        })
    }
}

fn remove_local_path_prefix(path: &Path, prefix: &Path) -> String {
    let relative = path.strip_prefix(prefix).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        // the source itself is a file
        return path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
    }

    relative.to_string_lossy().to_string()
}

fn convert_windows_directory_char_to_slash(path: &str) -> String {
    path.replace('\\', "/")
}
