use anyhow::Result;

use crate::Config;
use crate::storage::drive::DriveDestination;
use crate::storage::local::LocalSourceFactory;
use crate::storage::s3::S3SourceFactory;
use crate::storage::{Source, SourceFactory, StoragePair};
use crate::types::StoragePath;
use crate::types::token::PipelineCancellationToken;

pub async fn create_storage_pair(
    config: Config,
    cancellation_token: PipelineCancellationToken,
) -> Result<StoragePair> {
    let source = create_source(config.clone(), cancellation_token).await?;
    let destination = DriveDestination::boxed_new(&config.drive_client_config).await?;

    Ok(StoragePair {
        source,
        destination,
    })
}

async fn create_source(
    config: Config,
    cancellation_token: PipelineCancellationToken,
) -> Result<Source> {
    let source_path = config.source.clone();
    let client_config = config.source_client_config.clone();

    let factory_fn = match source_path {
        StoragePath::S3 { .. } | StoragePath::Gcs { .. } => S3SourceFactory::create,
        StoragePath::Local(_) => LocalSourceFactory::create,
    };

    factory_fn(config, source_path, cancellation_token, client_config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::args::parse_from_args;
    use crate::types::token::create_pipeline_cancellation_token;

    #[tokio::test]
    async fn create_gcs_storage_pair() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-access-key",
            "source_access_key",
            "--source-secret-access-key",
            "source_secret_access_key",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];
        let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

        let result = create_storage_pair(config, create_pipeline_cancellation_token()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_storage_pair_source_local() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "./test_data/",
            "Backup",
        ];
        let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

        let storage_pair = create_storage_pair(config, create_pipeline_cancellation_token())
            .await
            .unwrap();

        storage_pair.source.check_accessible().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_service_account_file_fails() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-service-account-file",
            "./test_data/test_config/config",
            "./test_data/",
            "Backup",
        ];
        let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

        let result = create_storage_pair(config, create_pipeline_cancellation_token()).await;

        assert!(result.is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
