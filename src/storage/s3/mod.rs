use std::sync::Arc;

use anyhow::{Context, Error, Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use aws_smithy_types::body::SdkBody;
use tracing::{debug, trace};

use crate::Config;
use crate::config::ClientConfig;
use crate::storage::{Source, SourceBody, SourceFactory, SourceTrait};
use crate::types::token::PipelineCancellationToken;
use crate::types::{SourceObject, StoragePath};

mod client_builder;

const AUTH_ERROR_CODES: [&str; 4] = [
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "InvalidSecurity",
];

pub struct S3SourceFactory {}

#[async_trait]
impl SourceFactory for S3SourceFactory {
    async fn create(
        config: Config,
        path: StoragePath,
        cancellation_token: PipelineCancellationToken,
        client_config: Option<ClientConfig>,
    ) -> Result<Source> {
        let client_config =
            client_config.ok_or_else(|| anyhow!("source client config not found."))?;

        S3Source::boxed_new(
            config,
            path,
            cancellation_token,
            Arc::new(client_config.create_client().await),
        )
    }
}

/// Source over the S3 API. Cloud Storage buckets are read through its S3-compatible endpoint.
#[derive(Clone)]
struct S3Source {
    bucket: String,
    prefix: String,
    cancellation_token: PipelineCancellationToken,
    client: Arc<Client>,
}

impl S3Source {
    fn boxed_new(
        _config: Config,
        path: StoragePath,
        cancellation_token: PipelineCancellationToken,
        client: Arc<Client>,
    ) -> Result<Source> {
        let (bucket, prefix) = match path {
            StoragePath::S3 { bucket, prefix } | StoragePath::Gcs { bucket, prefix } => {
                (bucket, prefix)
            }
            StoragePath::Local(path) => {
                return Err(anyhow!("bucket path expected: {}", path.display()));
            }
        };

        Ok(Box::new(S3Source {
            bucket,
            prefix,
            cancellation_token,
            client,
        }))
    }
}

#[async_trait]
impl SourceTrait for S3Source {
    async fn check_accessible(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .context("aws_sdk_s3::client::head_bucket() failed.")?;

        Ok(())
    }

    async fn list_objects(&self, sender: &Sender<SourceObject>, max_keys: i32) -> Result<()> {
        let mut continuation_token = None;
        loop {
            if self.cancellation_token.is_cancelled() {
                trace!("list_objects() canceled.");
                break;
            }

            let list_objects_output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation_token)
                .max_keys(max_keys)
                .send()
                .await
                .context("aws_sdk_s3::client::list_objects_v2() failed.")?;

            for object in list_objects_output.contents() {
                let Some(key) = object.key() else {
                    continue;
                };

                let key_without_prefix = remove_s3_prefix(key, &self.prefix);
                if key_without_prefix.is_empty() {
                    debug!(key = key, "key that is same as prefix is skipped.");
                    continue;
                }
                if SourceObject::is_directory_marker(&key_without_prefix) {
                    debug!(key = key, "directory marker is skipped.");
                    continue;
                }

                let size = object.size().unwrap_or_default().max(0) as u64;
                if let Err(e) = sender
                    .send(SourceObject::new(key_without_prefix, size))
                    .await
                    .context("async_channel::Sender::send() failed.")
                {
                    return if !sender.is_closed() { Err(e) } else { Ok(()) };
                }
            }

            if !list_objects_output.is_truncated().unwrap_or_default() {
                break;
            }

            continuation_token = list_objects_output
                .next_continuation_token()
                .map(|token| token.to_string());
        }

        Ok(())
    }

    async fn open_read_stream(&self, object: &SourceObject) -> Result<SourceBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(generate_full_key(&self.prefix, object.key()))
            .send()
            .await
            .context("aws_sdk_s3::client::get_object() failed.")?;

        let content_type = output.content_type().map(|content_type| content_type.to_string());

        Ok(SourceBody {
            reader: Box::new(output.body.into_async_read()),
            content_type,
        })
    }
}

pub fn remove_s3_prefix(key: &str, prefix: &str) -> String {
    key.to_string().replacen(prefix, "", 1)
}

pub fn generate_full_key(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

pub(crate) fn is_auth_error(e: &Error) -> bool {
    if let Some(error) = e.downcast_ref::<SdkError<HeadBucketError, Response<SdkBody>>>() {
        return is_auth_sdk_error(error);
    }

    if let Some(error) = e.downcast_ref::<SdkError<ListObjectsV2Error, Response<SdkBody>>>() {
        return is_auth_sdk_error(error);
    }

    if let Some(error) = e.downcast_ref::<SdkError<GetObjectError, Response<SdkBody>>>() {
        return is_auth_sdk_error(error);
    }

    false
}

fn is_auth_sdk_error<E: ProvideErrorMetadata>(e: &SdkError<E, Response<SdkBody>>) -> bool {
    let SdkError::ServiceError(service_error) = e else {
        return false;
    };

    // HEAD responses carry no error body
    if let Some(code) = service_error.err().code() {
        return AUTH_ERROR_CODES.contains(&code);
    }

    matches!(service_error.raw().status().as_u16(), 401 | 403)
}
