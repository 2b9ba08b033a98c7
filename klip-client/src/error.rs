//! Client error types

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Message used when a failed envelope carries no `msg`
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// Client error type
///
/// Every failure of the request client and the printer API is folded into
/// one of these kinds.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Malformed JSON body
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Well-formed envelope with a non-success code
    #[error("{message}")]
    Logical { code: i64, message: String },

    /// 401 response, the session token has been dropped
    #[error("Session expired, please log in again")]
    AuthExpired,

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Error built from a non-success status
    pub fn http_status(status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
        }
    }

    /// Whether this error ended the session
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Check the status and decode a plain JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::http_status(status));
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
