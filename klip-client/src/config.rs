//! Client configuration

use crate::link::LinkConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Default panel API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1.0";
/// Default printer host base URL (Moonraker port)
pub const DEFAULT_PRINTER_BASE_URL: &str = "http://localhost:7125";
/// Default printer host websocket endpoint
pub const DEFAULT_WS_URL: &str = "ws://localhost:7125/websocket";

/// Client configuration for talking to the panel API and the printer host
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Panel API base URL (e.g., "http://localhost:8080/api/v1.0")
    pub api_base_url: String,

    /// Printer host base URL for the REST endpoints
    pub printer_base_url: String,

    /// Request timeout for the panel API
    pub request_timeout: Duration,

    /// Request timeout for the printer host REST endpoints
    pub printer_timeout: Duration,

    /// Envelope code that marks success
    pub success_code: i64,

    /// Initial token, e.g. restored by the caller
    pub token: Option<String>,

    /// File the session token is persisted to
    pub token_file: Option<PathBuf>,

    /// Websocket link settings
    pub link: LinkConfig,
}

impl ClientConfig {
    /// Create a configuration for the given panel API base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            printer_base_url: DEFAULT_PRINTER_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(15_000),
            printer_timeout: Duration::from_millis(5_000),
            success_code: shared::API_CODE_SUCCESS,
            token: None,
            token_file: None,
            link: LinkConfig::default(),
        }
    }

    /// Set the printer host base URL
    pub fn with_printer_base_url(mut self, url: impl Into<String>) -> Self {
        self.printer_base_url = url.into();
        self
    }

    /// Set the websocket endpoint
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.link.ws_url = url.into();
        self
    }

    /// Set the panel API request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the printer host request timeout
    pub fn with_printer_timeout(mut self, timeout: Duration) -> Self {
        self.printer_timeout = timeout;
        self
    }

    /// Set the envelope success code
    pub fn with_success_code(mut self, code: i64) -> Self {
        self.success_code = code;
        self
    }

    /// Set the initial token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Persist the session token to a file
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Replace the websocket link settings
    pub fn with_link(mut self, link: LinkConfig) -> Self {
        self.link = link;
        self
    }

    /// Create a request client from this configuration
    pub fn build_request_client(&self) -> crate::ClientResult<crate::RequestClient> {
        crate::RequestClient::new(self)
    }

    /// Create a printer REST client from this configuration
    pub fn build_printer_api(&self) -> crate::ClientResult<crate::PrinterApi> {
        crate::PrinterApi::new(self)
    }

    /// Create a websocket link from this configuration
    pub fn build_link(&self) -> crate::PrinterLink {
        crate::PrinterLink::new(self.link.clone())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.success_code, 1);
        assert_eq!(config.link.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.link.reconnect_delay, Duration::from_millis(5000));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("http://panel")
            .with_printer_base_url("http://printer")
            .with_ws_url("ws://printer/websocket")
            .with_timeout(Duration::from_secs(1))
            .with_token("t");

        assert_eq!(config.printer_base_url, "http://printer");
        assert_eq!(config.link.ws_url, "ws://printer/websocket");
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.token.as_deref(), Some("t"));
    }
}
