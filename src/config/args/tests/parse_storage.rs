#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn gcs_source_uses_interoperability_endpoint() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket/some/prefix",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.source,
            StoragePath::Gcs {
                bucket: "source-bucket".to_string(),
                prefix: "some/prefix".to_string(),
            }
        );
        assert_eq!(config.drive_folder, "Backup");

        let client_config = config.source_client_config.unwrap();
        assert_eq!(client_config.endpoint_url, Some(GCS_ENDPOINT_URL.to_string()));
        assert_eq!(client_config.region, Some(GCS_REGION.to_string()));
        assert!(client_config.force_path_style);
        assert_eq!(
            client_config.request_checksum_calculation,
            RequestChecksumCalculation::WhenRequired
        );
        assert_eq!(
            client_config.response_checksum_validation,
            ResponseChecksumValidation::WhenRequired
        );
    }

    #[test]
    fn gcs_source_with_custom_endpoint() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "--source-endpoint-url",
            "http://localhost:4443",
            "--source-region",
            "us-east1",
            "gs://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();
        let client_config = config.source_client_config.unwrap();

        assert_eq!(
            client_config.endpoint_url,
            Some("http://localhost:4443".to_string())
        );
        assert_eq!(client_config.region, Some("us-east1".to_string()));
    }

    #[test]
    fn s3_source() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "--source-region",
            "ap-northeast-1",
            "s3://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.source,
            StoragePath::S3 {
                bucket: "source-bucket".to_string(),
                prefix: "".to_string(),
            }
        );

        let client_config = config.source_client_config.unwrap();
        assert!(client_config.endpoint_url.is_none());
        assert!(!client_config.force_path_style);
        assert_eq!(client_config.region, Some("ap-northeast-1".to_string()));
    }

    #[test]
    fn local_source() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "./test_data/",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert!(matches!(config.source, StoragePath::Local(_)));
        assert!(config.source_client_config.is_none());
        assert!(config.follow_symlinks);
    }

    #[test]
    fn local_source_must_be_directory() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "./test_data/no_such_directory",
            "Backup",
        ];

        assert_eq!(
            build_config_from_args(args).unwrap_err(),
            SOURCE_LOCAL_STORAGE_DIR_NOT_FOUND
        );
    }

    #[test]
    fn local_source_with_endpoint_url() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "--source-endpoint-url",
            "https://storage.googleapis.com",
            "./test_data/",
            "Backup",
        ];

        assert_eq!(
            build_config_from_args(args).unwrap_err(),
            SOURCE_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL
        );
    }

    #[test]
    fn ignore_symlinks_requires_local_source() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "--ignore-symlinks",
            "gs://source-bucket",
            "Backup",
        ];

        assert_eq!(
            build_config_from_args(args).unwrap_err(),
            SOURCE_REMOTE_STORAGE_SPECIFIED_WITH_IGNORE_SYMLINKS
        );
    }

    #[test]
    fn missing_drive_folder() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn empty_drive_folder() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn drive_parent_folder_id() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "--drive-parent-folder-id",
            "0AParentId",
            "gs://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.drive_parent_folder_id,
            Some("0AParentId".to_string())
        );
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
