use std::time::Duration;

use aws_config::meta::region::{ProvideRegion, RegionProviderChain};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, ConfigLoader};
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Builder;
use aws_smithy_runtime_api::client::stalled_stream_protection::StalledStreamProtectionConfig;
use aws_smithy_types::timeout::TimeoutConfig;
use aws_types::SdkConfig;
use aws_types::region::Region;

use crate::config::ClientConfig;
use crate::types::S3Credentials;

impl ClientConfig {
    pub async fn create_client(&self) -> Client {
        let mut config_builder = Builder::from(&self.load_sdk_config().await)
            .force_path_style(self.force_path_style)
            .request_checksum_calculation(self.request_checksum_calculation)
            .response_checksum_validation(self.response_checksum_validation);

        if let Some(timeout_config) = self.build_timeout_config() {
            config_builder = config_builder.timeout_config(timeout_config);
        }

        Client::from_conf(config_builder.build())
    }

    async fn load_sdk_config(&self) -> SdkConfig {
        let stalled_stream_protection = if self.disable_stalled_stream_protection {
            StalledStreamProtectionConfig::disabled()
        } else {
            StalledStreamProtectionConfig::enabled().build()
        };

        let mut config_loader = self
            .load_config_credential(
                aws_config::defaults(BehaviorVersion::latest())
                    .stalled_stream_protection(stalled_stream_protection),
            )
            .region(self.build_region_provider())
            .retry_config(self.build_retry_config());

        if let Some(endpoint_url) = &self.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint_url);
        };

        config_loader.load().await
    }

    fn load_config_credential(&self, mut config_loader: ConfigLoader) -> ConfigLoader {
        match &self.credential {
            S3Credentials::Credentials { access_keys } => {
                let credentials = aws_sdk_s3::config::Credentials::new(
                    access_keys.access_key.to_string(),
                    access_keys.secret_access_key.to_string(),
                    access_keys.session_token.clone(),
                    None,
                    "",
                );
                config_loader = config_loader.credentials_provider(credentials);
            }
            S3Credentials::Profile(profile_name) => {
                let mut builder = aws_config::profile::ProfileFileCredentialsProvider::builder();

                if let Some(aws_shared_credentials_file) = self
                    .client_config_location
                    .aws_shared_credentials_file
                    .as_ref()
                {
                    let profile_files = EnvConfigFiles::builder()
                        .with_file(EnvConfigFileKind::Credentials, aws_shared_credentials_file)
                        .build();
                    builder = builder.profile_files(profile_files)
                }

                config_loader =
                    config_loader.credentials_provider(builder.profile_name(profile_name).build());
            }
            S3Credentials::FromEnvironment => {}
        }
        config_loader
    }

    fn build_region_provider(&self) -> Box<dyn ProvideRegion> {
        let mut builder = aws_config::profile::ProfileFileRegionProvider::builder();

        if let S3Credentials::Profile(profile_name) = &self.credential {
            if let Some(aws_config_file) = self.client_config_location.aws_config_file.as_ref() {
                let profile_files = EnvConfigFiles::builder()
                    .with_file(EnvConfigFileKind::Config, aws_config_file)
                    .build();
                builder = builder.profile_files(profile_files);
            }
            builder = builder.profile_name(profile_name)
        }

        let provider_region = if matches!(&self.credential, S3Credentials::FromEnvironment) {
            RegionProviderChain::first_try(self.region.clone().map(Region::new))
                .or_default_provider()
        } else {
            RegionProviderChain::first_try(self.region.clone().map(Region::new))
                .or_else(builder.build())
        };

        Box::new(provider_region)
    }

    fn build_retry_config(&self) -> RetryConfig {
        RetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    fn build_timeout_config(&self) -> Option<TimeoutConfig> {
        let timeouts = &self.cli_timeout_config;
        if timeouts.operation_timeout_milliseconds.is_none()
            && timeouts.operation_attempt_timeout_milliseconds.is_none()
            && timeouts.connect_timeout_milliseconds.is_none()
            && timeouts.read_timeout_milliseconds.is_none()
        {
            // leave the SDK defaults alone
            return None;
        }

        let mut builder = TimeoutConfig::builder();
        if let Some(timeout) = timeouts.operation_timeout_milliseconds {
            builder = builder.operation_timeout(Duration::from_millis(timeout));
        }
        if let Some(timeout) = timeouts.operation_attempt_timeout_milliseconds {
            builder = builder.operation_attempt_timeout(Duration::from_millis(timeout));
        }
        if let Some(timeout) = timeouts.connect_timeout_milliseconds {
            builder = builder.connect_timeout(Duration::from_millis(timeout));
        }
        if let Some(timeout) = timeouts.read_timeout_milliseconds {
            builder = builder.read_timeout(Duration::from_millis(timeout));
        }

        Some(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use aws_smithy_types::checksum_config::{
        RequestChecksumCalculation, ResponseChecksumValidation,
    };

    use super::*;
    use crate::config::CLITimeoutConfig;
    use crate::types::{AccessKeys, ClientConfigLocation};

    fn client_config(credential: S3Credentials, region: Option<&str>) -> ClientConfig {
        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: Some("./test_data/test_config/config".into()),
                aws_shared_credentials_file: Some("./test_data/test_config/credentials".into()),
            },
            credential,
            region: region.map(|region| region.to_string()),
            endpoint_url: Some("https://storage.googleapis.com".to_string()),
            force_path_style: true,
            retry_config: crate::config::RetryConfig {
                aws_max_attempts: 10,
                initial_backoff_milliseconds: 100,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: None,
                operation_attempt_timeout_milliseconds: None,
                connect_timeout_milliseconds: None,
                read_timeout_milliseconds: None,
            },
            disable_stalled_stream_protection: false,
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
            response_checksum_validation: ResponseChecksumValidation::WhenRequired,
        }
    }

    fn hmac_keys() -> S3Credentials {
        S3Credentials::Credentials {
            access_keys: AccessKeys {
                access_key: "GOOG1EXAMPLE".to_string(),
                secret_access_key: "my_secret_access_key".to_string(),
                session_token: None,
            },
        }
    }

    #[tokio::test]
    async fn create_client_from_credentials() {
        init_dummy_tracing_subscriber();

        let client = client_config(hmac_keys(), Some("auto")).create_client().await;

        let retry_config = client.config().retry_config().unwrap();
        assert_eq!(retry_config.max_attempts(), 10);
        assert_eq!(retry_config.initial_backoff(), Duration::from_millis(100));

        // the SDK has a default connect timeout
        let timeout_config = client.config().timeout_config().unwrap();
        assert!(timeout_config.operation_timeout().is_none());
        assert!(timeout_config.connect_timeout().is_some());

        assert_eq!(client.config().region().unwrap().to_string(), "auto");
    }

    #[tokio::test]
    async fn create_client_with_timeouts() {
        init_dummy_tracing_subscriber();

        let mut config = client_config(hmac_keys(), Some("auto"));
        config.cli_timeout_config = CLITimeoutConfig {
            operation_timeout_milliseconds: Some(1000),
            operation_attempt_timeout_milliseconds: Some(2000),
            connect_timeout_milliseconds: Some(3000),
            read_timeout_milliseconds: Some(4000),
        };
        let client = config.create_client().await;

        let timeout_config = client.config().timeout_config().unwrap();
        assert_eq!(
            timeout_config.operation_timeout(),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            timeout_config.operation_attempt_timeout(),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(
            timeout_config.connect_timeout(),
            Some(Duration::from_millis(3000))
        );
        assert_eq!(
            timeout_config.read_timeout(),
            Some(Duration::from_millis(4000))
        );
    }

    #[tokio::test]
    async fn create_client_from_profile_region() {
        init_dummy_tracing_subscriber();

        let client = client_config(S3Credentials::Profile("gcs".to_string()), None)
            .create_client()
            .await;

        assert_eq!(client.config().region().unwrap().to_string(), "auto");
    }

    #[tokio::test]
    async fn region_argument_overrides_profile() {
        init_dummy_tracing_subscriber();

        let client = client_config(
            S3Credentials::Profile("gcs".to_string()),
            Some("us-east1"),
        )
        .create_client()
        .await;

        assert_eq!(client.config().region().unwrap().to_string(), "us-east1");
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
