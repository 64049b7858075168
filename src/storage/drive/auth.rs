use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::types::{DriveAccessToken, DriveCredential};

pub const DRIVE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive"];

/// Supplies the bearer token of every Drive request.
///
/// Providers backed by a service account or application default credentials cache the token
/// and refresh it before it expires, so a long run keeps a valid token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

pub type SharedTokenProvider = Arc<dyn AccessTokenProvider>;

#[derive(Error, Debug)]
#[error("failed to obtain a Drive access token: {0}")]
pub struct TokenError(pub String);

/// A token given on the command line. It is never refreshed.
struct StaticAccessToken {
    token: DriveAccessToken,
}

#[async_trait]
impl AccessTokenProvider for StaticAccessToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.token.clone())
    }
}

struct GcpAuthTokenProvider {
    provider: Arc<dyn gcp_auth::TokenProvider>,
}

#[async_trait]
impl AccessTokenProvider for GcpAuthTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .provider
            .token(DRIVE_SCOPES)
            .await
            .map_err(|e| TokenError(e.to_string()))?;

        Ok(token.as_str().to_string())
    }
}

pub async fn create_token_provider(credential: &DriveCredential) -> Result<SharedTokenProvider> {
    match credential {
        DriveCredential::AccessToken(token) => Ok(Arc::new(StaticAccessToken {
            token: token.clone(),
        })),
        DriveCredential::ServiceAccountFile(path) => {
            let service_account = gcp_auth::CustomServiceAccount::from_file(path)
                .map_err(|e| TokenError(e.to_string()))
                .with_context(|| format!("invalid service account file: {}", path.display()))?;

            debug!(path = %path.display(), "Drive credential: service account.");

            Ok(Arc::new(GcpAuthTokenProvider {
                provider: Arc::new(service_account),
            }))
        }
        DriveCredential::ApplicationDefault => {
            let provider = gcp_auth::provider()
                .await
                .map_err(|e| TokenError(e.to_string()))
                .context("application default credentials not found.")?;

            debug!("Drive credential: application default credentials.");

            Ok(Arc::new(GcpAuthTokenProvider { provider }))
        }
    }
}
