#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn parse_from_args_profile() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-profile",
            "source_profile",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        let config_args = parse_from_args(args).unwrap();
        let client_config = config_args.build_source_client_config().unwrap();

        if let S3Credentials::Profile(profile_name) = client_config.credential {
            assert_eq!(profile_name, "source_profile".to_string());
        } else {
            // skipcq: RS-W1021
            assert!(false, "no source client profile");
        }
    }

    #[test]
    fn parse_from_args_access_keys() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-access-key",
            "source_access_key",
            "--source-secret-access-key",
            "source_secret_access_key",
            "--source-session-token",
            "source_session_token",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        let config_args = parse_from_args(args).unwrap();
        let client_config = config_args.build_source_client_config().unwrap();

        if let S3Credentials::Credentials { access_keys } = client_config.credential {
            assert_eq!(access_keys.access_key, "source_access_key".to_string());
            assert_eq!(
                access_keys.secret_access_key,
                "source_secret_access_key".to_string()
            );
            assert_eq!(
                access_keys.session_token,
                Some("source_session_token".to_string())
            );
        } else {
            // skipcq: RS-W1021
            assert!(false, "no source access keys");
        }
    }

    #[test]
    fn parse_from_args_from_environment() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.token",
            "s3://source-bucket",
            "Backup",
        ];

        let config_args = parse_from_args(args).unwrap();
        let client_config = config_args.build_source_client_config().unwrap();

        assert!(matches!(
            client_config.credential,
            S3Credentials::FromEnvironment
        ));
    }

    #[test]
    fn profile_conflicts_with_access_keys() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-profile",
            "source_profile",
            "--source-access-key",
            "source_access_key",
            "--source-secret-access-key",
            "source_secret_access_key",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn access_key_requires_secret() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-access-key",
            "source_access_key",
            "--drive-access-token",
            "ya29.token",
            "gs://source-bucket",
            "Backup",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn local_source_requires_no_credential() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "bucket2drive",
            "--source-profile",
            "source_profile",
            "--drive-access-token",
            "ya29.token",
            "./test_data/",
            "Backup",
        ];

        let result = build_config_from_args(args);
        assert_eq!(result.unwrap_err(), NO_SOURCE_CREDENTIAL_REQUIRED);
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
