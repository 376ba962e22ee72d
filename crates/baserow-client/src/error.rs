//! Error types for the Baserow client SDK.
//!
//! Every failing HTTP status (>= 400) is translated into an [`ApiError`] in
//! exactly one place, [`ApiError::from_response`]. Transport failures keep
//! the transport's own error type inside [`ClientError::Http`].

use serde_json::Value;
use std::fmt;

/// Errors that can occur when using the Baserow client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status code >= 400
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Successful status, but the body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the API error if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code for API errors.
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }

    /// Returns true if the service reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Body of a failed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// The body decoded as JSON
    Json(Value),
    /// The body was not JSON; raw text is kept as-is
    Text(String),
}

impl ErrorDetail {
    /// Decode a response body, falling back to its text form.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(json) => ErrorDetail::Json(json),
            Err(_) => ErrorDetail::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// The JSON body, if the response carried one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ErrorDetail::Json(v) => Some(v),
            ErrorDetail::Text(_) => None,
        }
    }

    /// Baserow reports failures as `{"error": "<CODE>", "detail": ...}`.
    pub fn error_code(&self) -> Option<&str> {
        self.as_json()?.get("error")?.as_str()
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetail::Json(v) => write!(f, "{}", v),
            ErrorDetail::Text(t) => f.write_str(t),
        }
    }
}

/// A failed API call: status code, request URL and decoded body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Baserow API error\nstatus code: {status_code}\nURL: {url}\nresponse: {detail}")]
pub struct ApiError {
    /// HTTP status code
    pub status_code: u16,
    /// Full request URL, including the query string
    pub url: String,
    /// Decoded JSON body, or the raw text when the body is not JSON
    pub detail: ErrorDetail,
}

impl ApiError {
    /// Build the error from the parts of a failed response.
    pub fn from_response(status_code: u16, url: impl Into<String>, body: &[u8]) -> Self {
        Self {
            status_code,
            url: url.into(),
            detail: ErrorDetail::from_body(body),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
