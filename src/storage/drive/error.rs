use serde::Deserialize;
use thiserror::Error;

const AUTH_ERROR_REASONS: [&str; 3] = ["authError", "insufficientPermissions", "accessNotConfigured"];
const INSUFFICIENT_SCOPES_MESSAGE: &str = "insufficient authentication scopes";

/// A non-success response of the Drive API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Drive API error: status={status}, reason={reason:?}, message={message}")]
pub struct DriveApiError {
    pub status: u16,
    pub reason: Option<String>,
    pub message: String,
}

impl DriveApiError {
    /// Builds the error from a response body. Bodies that are not Google error JSON are kept as the message.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => DriveApiError {
                status,
                reason: response
                    .error
                    .errors
                    .into_iter()
                    .next()
                    .and_then(|detail| detail.reason),
                message: response.error.message,
            },
            Err(_) => DriveApiError {
                status,
                reason: None,
                message: body.trim().to_string(),
            },
        }
    }

    pub fn is_auth_error(&self) -> bool {
        if self.status == 401 {
            return true;
        }
        if self.status != 403 {
            return false;
        }

        self.reason
            .as_deref()
            .is_some_and(|reason| AUTH_ERROR_REASONS.contains(&reason))
            || self
                .message
                .to_lowercase()
                .contains(INSUFFICIENT_SCOPES_MESSAGE)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}
