use aws_smithy_types::checksum_config::{
    RequestChecksumCalculation, ResponseChecksumValidation,
};

use crate::types::{ClientConfigLocation, DriveCredential, S3Credentials, StoragePath};

pub mod args;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: StoragePath,
    pub drive_folder: String,
    pub drive_parent_folder_id: Option<String>,
    pub source_client_config: Option<ClientConfig>,
    pub drive_client_config: DriveClientConfig,
    pub tracing_config: Option<TracingConfig>,
    pub worker_size: u16,
    pub follow_symlinks: bool,
    pub no_guess_mime_type: bool,
    pub max_keys: i32,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

/// S3-compatible client settings of the source bucket.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
    pub request_checksum_calculation: RequestChecksumCalculation,
    pub response_checksum_validation: ResponseChecksumValidation,
}

#[derive(Debug, Clone)]
pub struct DriveClientConfig {
    pub credential: DriveCredential,
    /// Sent as `x-goog-user-project` for quota and billing.
    pub quota_project: Option<String>,
    pub api_base_url: String,
    pub upload_base_url: String,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
