//! In-memory source and destination.
//!
//! Both keep their state behind an `Arc`, so clones handed to a pipeline share it with
//! the instance a test keeps for inspection. Failures can be injected per name.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::storage::drive::DriveApiError;
use crate::storage::{DestinationTrait, ObjectReader, SourceBody, SourceTrait};
use crate::types::{DriveEntry, SourceObject};

#[derive(Default)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Default)]
struct MemorySourceState {
    keys: Vec<String>,
    objects: HashMap<String, MemoryObject>,
    failing_keys: HashSet<String>,
    inaccessible: bool,
    listing_fails_after: Option<usize>,
}

#[derive(Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<MemorySourceState>>,
}

impl MemorySource {
    /// Objects are listed in the given order.
    pub fn with_objects(
        objects: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let source = MemorySource::default();
        for (key, data) in objects {
            source.put_object(key, data, None);
        }
        source
    }

    pub fn put_object(
        &self,
        key: impl Into<String>,
        data: impl Into<Vec<u8>>,
        content_type: Option<&str>,
    ) {
        let key = key.into();
        let mut state = lock(&self.state);
        if !state.objects.contains_key(&key) {
            state.keys.push(key.clone());
        }
        state.objects.insert(
            key,
            MemoryObject {
                data: data.into(),
                content_type: content_type.map(|content_type| content_type.to_string()),
            },
        );
    }

    /// Reading `key` fails.
    pub fn fail_open(&self, key: impl Into<String>) {
        lock(&self.state).failing_keys.insert(key.into());
    }

    /// Listing fails after `count` objects have been sent, as for a failing page.
    pub fn fail_listing_after(&self, count: usize) {
        lock(&self.state).listing_fails_after = Some(count);
    }

    /// `check_accessible` fails, as for a bucket that does not exist.
    pub fn set_inaccessible(&self) {
        lock(&self.state).inaccessible = true;
    }
}

#[async_trait]
impl SourceTrait for MemorySource {
    async fn check_accessible(&self) -> Result<()> {
        if lock(&self.state).inaccessible {
            return Err(anyhow!("bucket not found."));
        }
        Ok(())
    }

    async fn list_objects(&self, sender: &Sender<SourceObject>, _max_keys: i32) -> Result<()> {
        let (objects, listing_fails_after) = {
            let state = lock(&self.state);
            let objects: Vec<SourceObject> = state
                .keys
                .iter()
                .filter(|key| !SourceObject::is_directory_marker(key))
                .map(|key| SourceObject::new(key.clone(), state.objects[key].data.len() as u64))
                .collect();
            (objects, state.listing_fails_after)
        };

        for (index, object) in objects.into_iter().enumerate() {
            if listing_fails_after == Some(index) {
                return Err(anyhow!("failed to list objects: page {index} is unavailable."));
            }
            if sender.send(object).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    async fn open_read_stream(&self, object: &SourceObject) -> Result<SourceBody> {
        let state = lock(&self.state);
        if state.failing_keys.contains(object.key()) {
            return Err(anyhow!("failed to read object: {}", object.key()));
        }

        let stored = state
            .objects
            .get(object.key())
            .ok_or_else(|| anyhow!("object not found: {}", object.key()))?;

        Ok(SourceBody {
            reader: Box::new(std::io::Cursor::new(stored.data.clone())),
            content_type: stored.content_type.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDriveNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub is_folder: bool,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct MemoryDriveState {
    nodes: Vec<MemoryDriveNode>,
    next_id: u64,
    create_folder_calls: u64,
    upload_file_calls: u64,
    list_children_calls: u64,
    find_folder_calls: u64,
    failing_folder_names: HashSet<String>,
    failing_file_names: HashSet<String>,
    denied_file_names: HashSet<String>,
    auth_error: bool,
    create_delay: Option<Duration>,
}

impl MemoryDriveState {
    fn insert(&mut self, node: MemoryDriveNode) -> String {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    fn generate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn check_auth(&self) -> Result<()> {
        if self.auth_error {
            return Err(DriveApiError {
                status: 401,
                reason: Some("authError".to_string()),
                message: "Invalid Credentials".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryDrive {
    state: Arc<Mutex<MemoryDriveState>>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        MemoryDrive::default()
    }

    /// `create_folder` sleeps before it creates anything, widening race windows.
    pub fn set_create_delay(&self, delay: Duration) {
        lock(&self.state).create_delay = Some(delay);
    }

    /// Creating a folder named `name` fails with a server error.
    pub fn fail_create_folder(&self, name: impl Into<String>) {
        lock(&self.state).failing_folder_names.insert(name.into());
    }

    /// Uploading a file named `name` fails.
    pub fn fail_upload(&self, name: impl Into<String>) {
        lock(&self.state).failing_file_names.insert(name.into());
    }

    /// Uploading a file named `name` fails with `403 insufficientPermissions`.
    pub fn deny_upload(&self, name: impl Into<String>) {
        lock(&self.state).denied_file_names.insert(name.into());
    }

    /// Every call fails with `401 Unauthorized`.
    pub fn set_auth_error(&self) {
        lock(&self.state).auth_error = true;
    }

    pub fn add_folder(&self, parent_id: Option<&str>, name: &str) -> String {
        let mut state = lock(&self.state);
        let id = state.generate_id("folder");
        state.insert(MemoryDriveNode {
            id,
            parent_id: parent_id.map(|parent_id| parent_id.to_string()),
            name: name.to_string(),
            is_folder: true,
            content: Vec::new(),
            content_type: None,
        })
    }

    pub fn add_file(&self, parent_id: &str, name: &str, content: &[u8]) -> String {
        let mut state = lock(&self.state);
        let id = state.generate_id("file");
        state.insert(MemoryDriveNode {
            id,
            parent_id: Some(parent_id.to_string()),
            name: name.to_string(),
            is_folder: false,
            content: content.to_vec(),
            content_type: None,
        })
    }

    pub fn create_folder_calls(&self) -> u64 {
        lock(&self.state).create_folder_calls
    }

    pub fn upload_file_calls(&self) -> u64 {
        lock(&self.state).upload_file_calls
    }

    pub fn list_children_calls(&self) -> u64 {
        lock(&self.state).list_children_calls
    }

    pub fn find_folder_calls(&self) -> u64 {
        lock(&self.state).find_folder_calls
    }

    pub fn nodes(&self) -> Vec<MemoryDriveNode> {
        lock(&self.state).nodes.clone()
    }

    /// Children of `parent_id` named `name`, including duplicates.
    pub fn children_named(&self, parent_id: Option<&str>, name: &str) -> Vec<MemoryDriveNode> {
        lock(&self.state)
            .nodes
            .iter()
            .filter(|node| node.parent_id.as_deref() == parent_id && node.name == name)
            .cloned()
            .collect()
    }

    /// Looks up a node by a `/`-separated path starting at a top-level folder.
    pub fn find_by_path(&self, path: &str) -> Option<MemoryDriveNode> {
        let state = lock(&self.state);
        let mut parent_id: Option<String> = None;
        let mut found = None;
        for name in path.split('/').filter(|name| !name.is_empty()) {
            let node = state
                .nodes
                .iter()
                .find(|node| node.parent_id == parent_id && node.name == name)?;
            parent_id = Some(node.id.clone());
            found = Some(node.clone());
        }
        found
    }
}

#[async_trait]
impl DestinationTrait for MemoryDrive {
    async fn list_children(&self, parent_id: &str) -> Result<Vec<DriveEntry>> {
        let mut state = lock(&self.state);
        state.list_children_calls += 1;
        state.check_auth()?;

        Ok(state
            .nodes
            .iter()
            .filter(|node| node.parent_id.as_deref() == Some(parent_id))
            .map(|node| DriveEntry {
                id: node.id.clone(),
                name: node.name.clone(),
                is_folder: node.is_folder,
            })
            .collect())
    }

    async fn find_folder(&self, parent_id: Option<&str>, name: &str) -> Result<Option<String>> {
        let mut state = lock(&self.state);
        state.find_folder_calls += 1;
        state.check_auth()?;

        Ok(state
            .nodes
            .iter()
            .find(|node| {
                node.is_folder
                    && node.name == name
                    && parent_id.is_none_or(|parent_id| node.parent_id.as_deref() == Some(parent_id))
            })
            .map(|node| node.id.clone()))
    }

    async fn create_folder(&self, parent_id: Option<&str>, name: &str) -> Result<String> {
        let delay = {
            let mut state = lock(&self.state);
            state.create_folder_calls += 1;
            state.check_auth()?;
            state.create_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        if state.failing_folder_names.contains(name) {
            return Err(DriveApiError {
                status: 500,
                reason: Some("backendError".to_string()),
                message: format!("failed to create folder: {name}"),
            }
            .into());
        }

        let id = state.generate_id("folder");
        Ok(state.insert(MemoryDriveNode {
            id,
            parent_id: parent_id.map(|parent_id| parent_id.to_string()),
            name: name.to_string(),
            is_folder: true,
            content: Vec::new(),
            content_type: None,
        }))
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        _size: u64,
        mut reader: ObjectReader,
    ) -> Result<String> {
        {
            let mut state = lock(&self.state);
            state.upload_file_calls += 1;
            state.check_auth()?;
            if state.failing_file_names.contains(name) {
                return Err(anyhow!("failed to upload file: {name}"));
            }
            if state.denied_file_names.contains(name) {
                return Err(DriveApiError {
                    status: 403,
                    reason: Some("insufficientPermissions".to_string()),
                    message: format!("insufficient permissions to upload: {name}"),
                }
                .into());
            }
        }

        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;

        let mut state = lock(&self.state);
        let id = state.generate_id("file");
        Ok(state.insert(MemoryDriveNode {
            id,
            parent_id: Some(parent_id.to_string()),
            name: name.to_string(),
            is_folder: false,
            content,
            content_type: Some(content_type.to_string()),
        }))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking test thread must not poison the fixtures of other tasks
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
