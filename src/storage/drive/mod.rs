use anyhow::{Context, Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};

use crate::config::DriveClientConfig;
use crate::storage::{Destination, DestinationTrait, ObjectReader};
use crate::types::{DRIVE_FOLDER_MIME_TYPE, DriveEntry};

pub use auth::{AccessTokenProvider, SharedTokenProvider, TokenError};
pub use error::DriveApiError;

mod auth;
mod client_builder;
mod error;
pub mod query;

const LIST_PAGE_SIZE: &str = "1000";
const UPLOAD_CONTENT_TYPE_HEADER: &str = "X-Upload-Content-Type";
const UPLOAD_CONTENT_LENGTH_HEADER: &str = "X-Upload-Content-Length";

/// Google Drive v3 REST client.
#[derive(Clone)]
pub struct DriveDestination {
    client: Client,
    token_provider: SharedTokenProvider,
    api_base_url: String,
    upload_base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<File>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct File {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

impl DriveDestination {
    pub async fn boxed_new(config: &DriveClientConfig) -> Result<Destination> {
        let token_provider = auth::create_token_provider(&config.credential).await?;

        Ok(Box::new(DriveDestination::new(config, token_provider)?))
    }

    pub fn new(config: &DriveClientConfig, token_provider: SharedTokenProvider) -> Result<Self> {
        Ok(DriveDestination {
            client: config.create_client()?,
            token_provider,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn access_token(&self) -> Result<String> {
        self.token_provider.access_token().await
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base_url)
    }

    async fn list_files(&self, query: &str, fields: &str) -> Result<Vec<File>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.files_url())
                .bearer_auth(self.access_token().await?)
                .query(&[
                    ("q", query),
                    ("fields", fields),
                    ("pageSize", LIST_PAGE_SIZE),
                    ("spaces", "drive"),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ]);
            if let Some(page_token) = &page_token {
                request = request.query(&[("pageToken", page_token)]);
            }

            let response = request
                .send()
                .await
                .context("Drive files.list request failed.")?;
            let file_list: FileList = check_response(response)
                .await
                .context("Drive files.list failed.")?
                .json()
                .await
                .context("Drive files.list response is invalid.")?;

            files.extend(file_list.files);

            match file_list.next_page_token {
                Some(next_page_token) => page_token = Some(next_page_token),
                None => break,
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl DestinationTrait for DriveDestination {
    async fn list_children(&self, parent_id: &str) -> Result<Vec<DriveEntry>> {
        let files = self
            .list_files(
                &query::children_query(parent_id),
                "nextPageToken,files(id,name,mimeType)",
            )
            .await?;

        trace!(
            parent_id = parent_id,
            count = files.len(),
            "listed children of the folder."
        );

        Ok(files
            .into_iter()
            .map(|file| DriveEntry {
                is_folder: file.mime_type == DRIVE_FOLDER_MIME_TYPE,
                id: file.id,
                name: file.name,
            })
            .collect())
    }

    async fn find_folder(&self, parent_id: Option<&str>, name: &str) -> Result<Option<String>> {
        let files = self
            .list_files(
                &query::folder_query(parent_id, name),
                "nextPageToken,files(id,name)",
            )
            .await?;

        Ok(files.into_iter().next().map(|file| file.id))
    }

    async fn create_folder(&self, parent_id: Option<&str>, name: &str) -> Result<String> {
        let metadata = FileMetadata {
            name,
            mime_type: Some(DRIVE_FOLDER_MIME_TYPE),
            parents: parent_id.into_iter().collect(),
        };

        let response = self
            .client
            .post(self.files_url())
            .bearer_auth(self.access_token().await?)
            .query(&[("fields", "id"), ("supportsAllDrives", "true")])
            .json(&metadata)
            .send()
            .await
            .context("Drive files.create request failed.")?;
        let file: File = check_response(response)
            .await
            .context("Drive files.create failed.")?
            .json()
            .await
            .context("Drive files.create response is invalid.")?;

        debug!(name = name, id = file.id, "folder created.");

        Ok(file.id)
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content_type: &str,
        size: u64,
        reader: ObjectReader,
    ) -> Result<String> {
        let metadata = FileMetadata {
            name,
            mime_type: None,
            parents: vec![parent_id],
        };

        // the file appears in Drive only when the session receives its last byte
        let response = self
            .client
            .post(format!("{}/files", self.upload_base_url))
            .bearer_auth(self.access_token().await?)
            .query(&[
                ("uploadType", "resumable"),
                ("fields", "id"),
                ("supportsAllDrives", "true"),
            ])
            .header(UPLOAD_CONTENT_TYPE_HEADER, content_type)
            .header(UPLOAD_CONTENT_LENGTH_HEADER, size)
            .json(&metadata)
            .send()
            .await
            .context("Drive resumable upload initiation request failed.")?;
        let response = check_response(response)
            .await
            .context("Drive resumable upload initiation failed.")?;

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|location| location.to_str().ok())
            .map(|location| location.to_string())
            .ok_or_else(|| anyhow!("Drive resumable upload session URL not found."))?;

        let response = self
            .client
            .put(session_url)
            .bearer_auth(self.access_token().await?)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(ReaderStream::new(reader)))
            .send()
            .await
            .context("Drive resumable upload request failed.")?;
        let file: File = check_response(response)
            .await
            .context("Drive resumable upload failed.")?
            .json()
            .await
            .context("Drive resumable upload response is invalid.")?;

        Ok(file.id)
    }
}

async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DriveApiError::from_response_body(status.as_u16(), &body).into())
}

pub(crate) fn is_auth_error(e: &Error) -> bool {
    e.downcast_ref::<TokenError>().is_some()
        || e
            .downcast_ref::<DriveApiError>()
            .is_some_and(|error| error.is_auth_error())
}
