use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::DriveClientConfig;

const QUOTA_PROJECT_HEADER: &str = "x-goog-user-project";

impl DriveClientConfig {
    pub fn create_client(&self) -> Result<Client> {
        let mut builder = Client::builder().default_headers(self.build_default_headers()?);

        if let Some(connect_timeout) = self.connect_timeout_milliseconds {
            builder = builder.connect_timeout(Duration::from_millis(connect_timeout));
        }
        if let Some(read_timeout) = self.read_timeout_milliseconds {
            builder = builder.read_timeout(Duration::from_millis(read_timeout));
        }

        builder
            .build()
            .context("reqwest::ClientBuilder::build() failed.")
    }

    fn build_default_headers(&self) -> Result<HeaderMap> {
        // the bearer token is set per request
        let mut headers = HeaderMap::new();

        if let Some(quota_project) = &self.quota_project {
            headers.insert(
                QUOTA_PROJECT_HEADER,
                HeaderValue::from_str(quota_project)
                    .context("quota project contains invalid characters.")?,
            );
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DriveAccessToken, DriveCredential};

    fn drive_client_config(quota_project: Option<&str>) -> DriveClientConfig {
        DriveClientConfig {
            credential: DriveCredential::AccessToken(DriveAccessToken {
                token: "ya29.token".to_string(),
            }),
            quota_project: quota_project.map(|project| project.to_string()),
            api_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base_url: "https://www.googleapis.com/upload/drive/v3".to_string(),
            connect_timeout_milliseconds: Some(1000),
            read_timeout_milliseconds: None,
        }
    }

    #[test]
    fn default_headers() {
        let headers = drive_client_config(Some("my-project"))
            .build_default_headers()
            .unwrap();

        assert_eq!(headers.get(QUOTA_PROJECT_HEADER).unwrap(), "my-project");
        assert!(headers.get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn default_headers_without_quota_project() {
        let headers = drive_client_config(None).build_default_headers().unwrap();

        assert!(headers.get(QUOTA_PROJECT_HEADER).is_none());
    }

    #[test]
    fn invalid_quota_project_is_rejected() {
        assert!(drive_client_config(Some("my\nproject")).create_client().is_err());
    }
}
