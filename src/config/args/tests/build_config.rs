#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn build_with_default_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.worker_size, DEFAULT_WORKER_SIZE);
        assert_eq!(config.max_keys, DEFAULT_MAX_KEYS);
        assert!(config.drive_parent_folder_id.is_none());
        assert!(!config.no_guess_mime_type);
        assert!(config.auto_complete_shell.is_none());

        let client_config = config.source_client_config.as_ref().unwrap();
        assert!(
            client_config
                .client_config_location
                .aws_config_file
                .is_none()
        );
        assert!(
            client_config
                .client_config_location
                .aws_shared_credentials_file
                .is_none()
        );
        assert_eq!(
            client_config.retry_config.aws_max_attempts,
            DEFAULT_AWS_MAX_ATTEMPTS
        );
        assert_eq!(
            client_config.retry_config.initial_backoff_milliseconds,
            DEFAULT_INITIAL_BACKOFF_MILLISECONDS
        );
        assert!(
            client_config
                .cli_timeout_config
                .operation_timeout_milliseconds
                .is_none()
        );
        assert!(!client_config.disable_stalled_stream_protection);
    }

    #[test]
    fn build_with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-profile",
            "gcs",
            "--aws-config-file",
            "./test_data/test_config/config",
            "--aws-shared-credentials-file",
            "./test_data/test_config/credentials",
            "--worker-size",
            "32",
            "--max-keys",
            "100",
            "--no-guess-mime-type",
            "--aws-max-attempts",
            "3",
            "--initial-backoff-milliseconds",
            "200",
            "--operation-timeout-milliseconds",
            "1000",
            "--operation-attempt-timeout-milliseconds",
            "500",
            "--connect-timeout-milliseconds",
            "300",
            "--read-timeout-milliseconds",
            "400",
            "--disable-stalled-stream-protection",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.worker_size, 32);
        assert_eq!(config.max_keys, 100);
        assert!(config.no_guess_mime_type);

        let client_config = config.source_client_config.as_ref().unwrap();
        assert_eq!(
            client_config.client_config_location.aws_config_file,
            Some(PathBuf::from("./test_data/test_config/config"))
        );
        assert_eq!(
            client_config
                .client_config_location
                .aws_shared_credentials_file,
            Some(PathBuf::from("./test_data/test_config/credentials"))
        );
        assert_eq!(client_config.retry_config.aws_max_attempts, 3);
        assert_eq!(client_config.retry_config.initial_backoff_milliseconds, 200);
        assert_eq!(
            client_config.cli_timeout_config.operation_timeout_milliseconds,
            Some(1000)
        );
        assert_eq!(
            client_config
                .cli_timeout_config
                .operation_attempt_timeout_milliseconds,
            Some(500)
        );
        assert_eq!(
            client_config.cli_timeout_config.connect_timeout_milliseconds,
            Some(300)
        );
        assert_eq!(
            client_config.cli_timeout_config.read_timeout_milliseconds,
            Some(400)
        );
        assert!(client_config.disable_stalled_stream_protection);
    }

    #[test]
    fn workers_alias() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--workers",
            "4",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.worker_size, 4);
    }

    #[test]
    fn zero_workers() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--worker-size",
            "0",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        assert!(build_config_from_args(args).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
