use percent_encoding::percent_decode_str;
use url::{ParseError, Url};

use crate::types::StoragePath;

const INVALID_SCHEME: &str = "scheme must be s3:// or gs:// .";
const INVALID_PATH: &str = "path must be a valid URL or a local path.";
const NO_BUCKET_NAME_SPECIFIED: &str = "bucket name must be specified.";
const NO_PATH_SPECIFIED: &str = "path must be specified.";

pub fn check_storage_path(path: &str) -> Result<String, String> {
    let result = Url::parse(path);
    if result == Err(ParseError::RelativeUrlWithoutBase) {
        if path.is_empty() {
            return Err(NO_PATH_SPECIFIED.to_string());
        }

        if !path.ends_with(std::path::MAIN_SEPARATOR) {
            return Ok(format!("{}{}", path, std::path::MAIN_SEPARATOR));
        }

        return Ok(path.to_string());
    }

    let parsed = match result {
        Ok(parsed) => parsed,
        Err(_) => return Err(INVALID_PATH.to_string()),
    };

    match parsed.scheme() {
        "s3" | "gs" => {
            if parsed.host_str().is_none_or(|host| host.is_empty()) {
                return Err(NO_BUCKET_NAME_SPECIFIED.to_string());
            }
        }
        _ => {
            if !is_windows_absolute_path(path) {
                return Err(INVALID_SCHEME.to_string());
            }
        }
    }

    Ok(path.to_string())
}

/// `path` must have passed `check_storage_path`. Anything else is treated as a local path.
pub fn parse_storage_path(path: &str) -> StoragePath {
    if is_windows_absolute_path(path) {
        return parse_local_path(path);
    }

    match Url::parse(path) {
        Ok(parsed) if parsed.scheme() == "s3" || parsed.scheme() == "gs" => {
            let (bucket, prefix) = parse_bucket_and_prefix(&parsed);
            if parsed.scheme() == "gs" {
                StoragePath::Gcs { bucket, prefix }
            } else {
                StoragePath::S3 { bucket, prefix }
            }
        }
        _ => parse_local_path(path),
    }
}

fn parse_local_path(path: &str) -> StoragePath {
    StoragePath::Local(path.into())
}

fn parse_bucket_and_prefix(parsed: &Url) -> (String, String) {
    let bucket = parsed.host_str().unwrap_or_default().to_string();
    let mut prefix = parsed.path().to_string();

    // remove first '/'
    if !prefix.is_empty() {
        prefix.remove(0);
    }

    let prefix = percent_decode_str(&prefix)
        .decode_utf8_lossy()
        .to_string();

    (bucket, prefix)
}

fn is_windows_absolute_path(path: &str) -> bool {
    if !cfg!(windows) {
        return false;
    }

    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn check_valid_url() {
        init_dummy_tracing_subscriber();

        check_storage_path("/etc/").unwrap();
        check_storage_path("etc/dir").unwrap();
        check_storage_path("../dir").unwrap();
        check_storage_path("./dir/").unwrap();

        check_storage_path("s3://my-bucket").unwrap();
        check_storage_path("s3://my-bucket/xyz/").unwrap();
        check_storage_path("s3://my-bucket/hello/こんばんは/☃").unwrap();

        check_storage_path("gs://my-bucket").unwrap();
        check_storage_path("gs://my-bucket/").unwrap();
        check_storage_path("gs://my-bucket/some/prefix").unwrap();
    }

    #[test]
    fn local_path_gets_trailing_separator() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            check_storage_path("dir1").unwrap(),
            format!("dir1{}", std::path::MAIN_SEPARATOR)
        );
    }

    #[test]
    fn parse_local_unix_absolute_path() {
        init_dummy_tracing_subscriber();

        if let StoragePath::Local(path) = parse_storage_path("/dir1") {
            assert_eq!(path, PathBuf::from("/dir1"));
        } else {
            // skipcq: RS-W1021
            assert!(false, "local path not found");
        }
    }

    #[test]
    fn parse_gcs_url() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            parse_storage_path("gs://source-bucket"),
            StoragePath::Gcs {
                bucket: "source-bucket".to_string(),
                prefix: "".to_string()
            }
        );
        assert_eq!(
            parse_storage_path("gs://source-bucket/"),
            StoragePath::Gcs {
                bucket: "source-bucket".to_string(),
                prefix: "".to_string()
            }
        );
        assert_eq!(
            parse_storage_path("gs://source-bucket/some/prefix/"),
            StoragePath::Gcs {
                bucket: "source-bucket".to_string(),
                prefix: "some/prefix/".to_string()
            }
        );
    }

    #[test]
    fn parse_s3_url() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            parse_storage_path("s3://test-bucket/dir1/dir2/my_key"),
            StoragePath::S3 {
                bucket: "test-bucket".to_string(),
                prefix: "dir1/dir2/my_key".to_string()
            }
        );
        assert_eq!(
            parse_storage_path("s3://test-bucket//my_key"),
            StoragePath::S3 {
                bucket: "test-bucket".to_string(),
                prefix: "/my_key".to_string()
            }
        );
    }

    #[test]
    fn parse_url_with_utf8_key() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            parse_storage_path("gs://test-bucket/こんにちは/Καλησπέρα σας"),
            StoragePath::Gcs {
                bucket: "test-bucket".to_string(),
                prefix: "こんにちは/Καλησπέρα σας".to_string()
            }
        );
    }

    #[test]
    fn empty_local_path() {
        init_dummy_tracing_subscriber();

        assert_eq!(check_storage_path("").unwrap_err(), NO_PATH_SPECIFIED);
    }

    #[test]
    fn invalid_scheme() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            check_storage_path("https://my-bucket").unwrap_err(),
            INVALID_SCHEME
        );
    }

    #[test]
    fn no_bucket_name() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            check_storage_path("gs://").unwrap_err(),
            NO_BUCKET_NAME_SPECIFIED
        );
        assert_eq!(
            check_storage_path("s3://").unwrap_err(),
            NO_BUCKET_NAME_SPECIFIED
        );
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
