use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use aws_smithy_types::checksum_config::{
    RequestChecksumCalculation, ResponseChecksumValidation,
};
use clap::Parser;
use clap::builder::{ArgPredicate, NonEmptyStringValueParser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
#[cfg(feature = "version")]
use shadow_rs::shadow;

use crate::Config;
use crate::config::args::value_parser::{file_exist, storage_path, url};
use crate::config::{
    CLITimeoutConfig, ClientConfig, DriveClientConfig, RetryConfig, TracingConfig,
};
use crate::types::{
    AccessKeys, ClientConfigLocation, DriveAccessToken, DriveCredential, S3Credentials,
    StoragePath,
};

mod tests;
mod value_parser;

pub const DEFAULT_DRIVE_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const GCS_ENDPOINT_URL: &str = "https://storage.googleapis.com";
pub const GCS_REGION: &str = "auto";

const DEFAULT_WORKER_SIZE: u16 = 10;
const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_IGNORE_SYMLINKS: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_NO_GUESS_MIME_TYPE: bool = false;
const DEFAULT_MAX_KEYS: i32 = 1000;
const DEFAULT_DISABLE_STALLED_STREAM_PROTECTION: bool = false;

const SOURCE_LOCAL_STORAGE_DIR_NOT_FOUND: &str = "directory must be specified as a source\n";
const SOURCE_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL: &str =
    "with --source-endpoint-url, source storage must be s3:// or gs://\n";
const SOURCE_REMOTE_STORAGE_SPECIFIED_WITH_IGNORE_SYMLINKS: &str =
    "with --ignore-symlinks, source storage must be local storage\n";
const NO_SOURCE_CREDENTIAL_REQUIRED: &str = "no source credential required\n";
const EMPTY_DRIVE_ACCESS_TOKEN: &str = "Drive access token must not be empty\n";

#[cfg(feature = "version")]
shadow!(build);

#[derive(Parser, Clone, Debug)]
#[cfg_attr(feature = "version", command(version=format!("{} ({} {}), {}", build::PKG_VERSION, build::SHORT_COMMIT, build::BUILD_TARGET, build::RUST_VERSION)))]
pub struct CLIArgs {
    #[arg(env, help = "gs://<BUCKET_NAME>[/prefix], s3://<BUCKET_NAME>[/prefix] or local path", value_parser = storage_path::check_storage_path, default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "gs://ignored"), required = false)]
    source: String,

    #[arg(env, help = "name of the destination folder in Google Drive. created when absent", value_parser = NonEmptyStringValueParser::new(), default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "ignored"), required = false)]
    drive_folder: String,

    /// id of the Drive folder (or shared drive) that holds the destination folder.
    /// The default is the root of My Drive
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Drive Options")]
    drive_parent_folder_id: Option<String>,

    /// Google Cloud project used for quota and billing of Drive API requests
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Drive Options")]
    project: Option<String>,

    /// OAuth2 access token with the Drive scope. It is not refreshed.
    /// Without any Drive credential option, application default credentials are used
    #[arg(long, env, hide_env_values = true, conflicts_with_all = ["drive_access_token_file", "drive_service_account_file"], help_heading = "Drive Options")]
    drive_access_token: Option<String>,

    /// file that contains an OAuth2 access token with the Drive scope. It is not refreshed
    #[arg(long, env, value_name = "FILE", value_parser = file_exist::is_file_exist, conflicts_with_all = ["drive_service_account_file"], help_heading = "Drive Options")]
    drive_access_token_file: Option<String>,

    /// service account key file (JSON). Its token is refreshed during the run
    #[arg(long, env, value_name = "FILE", value_parser = file_exist::is_file_exist, help_heading = "Drive Options")]
    drive_service_account_file: Option<String>,

    /// connect timeout (milliseconds) of Drive API requests.
    #[arg(long, env, value_name = "connect_timeout", help_heading = "Drive Options")]
    drive_connect_timeout_milliseconds: Option<u64>,

    /// read timeout (milliseconds) of Drive API requests.
    /// The default has no timeout.
    #[arg(long, env, value_name = "read_timeout", help_heading = "Drive Options")]
    drive_read_timeout_milliseconds: Option<u64>,

    /// base URL of the Drive API
    #[arg(long, env, default_value = DEFAULT_DRIVE_API_BASE_URL, value_parser = url::check_scheme, help_heading = "Drive Options")]
    drive_api_base_url: String,

    /// base URL of the Drive upload API
    #[arg(long, env, default_value = DEFAULT_DRIVE_UPLOAD_BASE_URL, value_parser = url::check_scheme, help_heading = "Drive Options")]
    drive_upload_base_url: String,

    /// location of the file that the AWS CLI uses to store configuration profiles
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_config_file: Option<PathBuf>,

    /// location of the file that the AWS CLI uses to store access keys
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_shared_credentials_file: Option<PathBuf>,

    /// source AWS CLI profile
    #[arg(long, env, conflicts_with_all = ["source_access_key", "source_secret_access_key", "source_session_token"], help_heading = "AWS Configuration")]
    source_profile: Option<String>,

    /// source access key (a Cloud Storage HMAC key for gs://)
    #[arg(long, env, conflicts_with_all = ["source_profile"], requires = "source_secret_access_key", help_heading = "AWS Configuration")]
    source_access_key: Option<String>,

    /// source secret access key
    #[arg(long, env, hide_env_values = true, conflicts_with_all = ["source_profile"], requires = "source_access_key", help_heading = "AWS Configuration")]
    source_secret_access_key: Option<String>,

    /// source session token
    #[arg(long, env, hide_env_values = true, conflicts_with_all = ["source_profile"], requires = "source_access_key", help_heading = "AWS Configuration")]
    source_session_token: Option<String>,

    /// source region. gs:// defaults to `auto`
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Source Options")]
    source_region: Option<String>,

    /// source endpoint url. gs:// defaults to https://storage.googleapis.com
    #[arg(long, env, value_parser = url::check_scheme, help_heading = "Source Options")]
    source_endpoint_url: Option<String>,

    /// force path-style addressing for source endpoint. always on for gs://
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Source Options")]
    source_force_path_style: bool,

    /// number of workers for transfer
    #[arg(long, env, visible_alias = "workers", default_value_t = DEFAULT_WORKER_SIZE, value_parser = clap::value_parser!(u16).range(1..), help_heading = "Performance")]
    worker_size: u16,

    /// trace verbosity(-v: show info, -vv: show debug, -vvv show trace)
    #[clap(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// show trace as json format
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing/Logging")]
    json_tracing: bool,

    /// enable aws sdk tracing
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Tracing/Logging")]
    aws_sdk_tracing: bool,

    /// show span event tracing
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing/Logging")]
    span_events_tracing: bool,

    /// disable ANSI terminal colors
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing/Logging")]
    disable_color_tracing: bool,

    /// maximum retry attempts of source requests
    #[arg(long, env, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, value_name = "max_attempts", help_heading = "Retry Options")]
    aws_max_attempts: u32,

    /// a multiplier value used when calculating backoff times as part of an exponential backoff with jitter strategy.
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, value_name = "initial_backoff", help_heading = "Retry Options")]
    initial_backoff_milliseconds: u64,

    /// source operation timeout (milliseconds). For details, see the AWS SDK for Rust TimeoutConfig documentation.
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "operation_timeout",
        help_heading = "Timeout Options"
    )]
    operation_timeout_milliseconds: Option<u64>,

    /// source operation attempt timeout (milliseconds).
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "operation_attempt_timeout",
        help_heading = "Timeout Options"
    )]
    operation_attempt_timeout_milliseconds: Option<u64>,

    /// source connect timeout (milliseconds).
    /// The default has AWS SDK default timeout (Currently 3100 milliseconds).
    #[arg(
        long,
        env,
        value_name = "connect_timeout",
        help_heading = "Timeout Options"
    )]
    connect_timeout_milliseconds: Option<u64>,

    /// source read timeout (milliseconds).
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "read_timeout",
        help_heading = "Timeout Options"
    )]
    read_timeout_milliseconds: Option<u64>,

    /// ignore symbolic links of a local source
    #[arg(long, env, default_value_t = DEFAULT_IGNORE_SYMLINKS, help_heading = "Advanced")]
    ignore_symlinks: bool,

    /// do not try to guess the mime type when the source has none
    #[arg(long, env, default_value_t = DEFAULT_NO_GUESS_MIME_TYPE, help_heading = "Advanced")]
    no_guess_mime_type: bool,

    /// maximum number of objects returned in a single list object request
    #[arg(long, env, default_value_t = DEFAULT_MAX_KEYS, value_parser = clap::value_parser!(i32).range(1..=32767), help_heading = "Advanced")]
    max_keys: i32,

    /// generate a auto completions script. Valid values: bash, fish, zsh, powershell, elvish.
    #[arg(long, env, value_name = "SHELL", value_parser = clap_complete::shells::Shell::from_str, help_heading = "Advanced")]
    auto_complete_shell: Option<clap_complete::shells::Shell>,

    /// disable stalled stream protection
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_STALLED_STREAM_PROTECTION, help_heading = "Advanced")]
    disable_stalled_stream_protection: bool,
}

pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    crate::Config::try_from(config_args)
}

impl CLIArgs {
    fn validate_storage_config(&self) -> Result<(), String> {
        self.check_source_local_storage()?;
        self.check_source_credentials_conflict()?;
        self.check_endpoint_url_conflict()?;
        self.check_ignore_symlinks_conflict()?;

        Ok(())
    }

    fn check_source_local_storage(&self) -> Result<(), String> {
        let source = storage_path::parse_storage_path(&self.source);

        if let StoragePath::Local(path) = source {
            if !path.is_dir() {
                return Err(SOURCE_LOCAL_STORAGE_DIR_NOT_FOUND.to_string());
            }
        }

        Ok(())
    }

    fn is_source_local(&self) -> bool {
        matches!(
            storage_path::parse_storage_path(&self.source),
            StoragePath::Local(_)
        )
    }

    fn check_source_credentials_conflict(&self) -> Result<(), String> {
        if self.is_source_local()
            && (self.source_profile.is_some() || self.source_access_key.is_some())
        {
            return Err(NO_SOURCE_CREDENTIAL_REQUIRED.to_string());
        }

        Ok(())
    }

    fn check_endpoint_url_conflict(&self) -> Result<(), String> {
        if self.is_source_local() && self.source_endpoint_url.is_some() {
            return Err(SOURCE_LOCAL_STORAGE_SPECIFIED_WITH_ENDPOINT_URL.to_string());
        }

        Ok(())
    }

    fn check_ignore_symlinks_conflict(&self) -> Result<(), String> {
        if !self.is_source_local() && self.ignore_symlinks {
            return Err(SOURCE_REMOTE_STORAGE_SPECIFIED_WITH_IGNORE_SYMLINKS.to_string());
        }

        Ok(())
    }

    fn build_source_client_config(&self) -> Option<ClientConfig> {
        let is_gcs = match storage_path::parse_storage_path(&self.source) {
            StoragePath::Local(_) => return None,
            StoragePath::Gcs { .. } => true,
            StoragePath::S3 { .. } => false,
        };

        let credential = if let Some(source_profile) = self.source_profile.clone() {
            S3Credentials::Profile(source_profile)
        } else if let (Some(access_key), Some(secret_access_key)) = (
            self.source_access_key.clone(),
            self.source_secret_access_key.clone(),
        ) {
            S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key,
                    secret_access_key,
                    session_token: self.source_session_token.clone(),
                },
            }
        } else {
            S3Credentials::FromEnvironment
        };

        // Cloud Storage interoperability: fixed endpoint, path style, no AWS-specific checksums
        let (region, endpoint_url, force_path_style, response_checksum_validation) = if is_gcs {
            (
                self.source_region
                    .clone()
                    .or_else(|| Some(GCS_REGION.to_string())),
                self.source_endpoint_url
                    .clone()
                    .or_else(|| Some(GCS_ENDPOINT_URL.to_string())),
                true,
                ResponseChecksumValidation::WhenRequired,
            )
        } else {
            (
                self.source_region.clone(),
                self.source_endpoint_url.clone(),
                self.source_force_path_style,
                ResponseChecksumValidation::WhenSupported,
            )
        };

        Some(ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region,
            endpoint_url,
            force_path_style,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
            disable_stalled_stream_protection: self.disable_stalled_stream_protection,
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
            response_checksum_validation,
        })
    }

    fn build_drive_client_config(&self) -> Result<DriveClientConfig, String> {
        Ok(DriveClientConfig {
            credential: self.build_drive_credential()?,
            quota_project: self.project.clone(),
            api_base_url: self.drive_api_base_url.clone(),
            upload_base_url: self.drive_upload_base_url.clone(),
            connect_timeout_milliseconds: self.drive_connect_timeout_milliseconds,
            read_timeout_milliseconds: self.drive_read_timeout_milliseconds,
        })
    }

    fn build_drive_credential(&self) -> Result<DriveCredential, String> {
        let token = if let Some(token) = self.drive_access_token.as_ref() {
            token.trim().to_string()
        } else if let Some(token_file) = self.drive_access_token_file.as_ref() {
            std::fs::read_to_string(token_file)
                .map_err(|e| format!("failed to read {token_file}: {e}\n"))?
                .trim()
                .to_string()
        } else if let Some(service_account_file) = self.drive_service_account_file.as_ref() {
            return Ok(DriveCredential::ServiceAccountFile(PathBuf::from(
                service_account_file,
            )));
        } else {
            return Ok(DriveCredential::ApplicationDefault);
        };

        if token.is_empty() {
            return Err(EMPTY_DRIVE_ACCESS_TOKEN.to_string());
        }

        Ok(DriveCredential::AccessToken(DriveAccessToken { token }))
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(value: CLIArgs) -> Result<Self, Self::Error> {
        value.validate_storage_config()?;

        let tracing_config = value.verbosity.log_level().map(|log_level| TracingConfig {
            tracing_level: log_level,
            json_tracing: value.json_tracing,
            aws_sdk_tracing: value.aws_sdk_tracing,
            span_events_tracing: value.span_events_tracing,
            disable_color_tracing: value.disable_color_tracing,
        });

        let source_client_config = value.build_source_client_config();
        let drive_client_config = value.build_drive_client_config()?;

        Ok(Config {
            source: storage_path::parse_storage_path(&value.source),
            drive_folder: value.drive_folder,
            drive_parent_folder_id: value.drive_parent_folder_id,

            source_client_config,
            drive_client_config,

            tracing_config,

            worker_size: value.worker_size,
            follow_symlinks: !value.ignore_symlinks,
            no_guess_mime_type: value.no_guess_mime_type,
            max_keys: value.max_keys,
            auto_complete_shell: value.auto_complete_shell,
        })
    }
}
