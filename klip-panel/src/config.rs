use klip_client::ClientConfig;
use klip_client::config::{DEFAULT_API_BASE_URL, DEFAULT_PRINTER_BASE_URL, DEFAULT_WS_URL};
use std::path::PathBuf;
use std::time::Duration;

/// Panel configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | KLIP_API_URL | http://localhost:8080/api/v1.0 | panel API base URL |
/// | KLIP_PRINTER_URL | http://localhost:7125 | printer host REST base URL |
/// | KLIP_WS_URL | ws://localhost:7125/websocket | printer host websocket |
/// | KLIP_REQUEST_TIMEOUT_MS | 15000 | panel API request timeout |
/// | KLIP_RECONNECT_DELAY_MS | 5000 | websocket reconnect delay |
/// | KLIP_TOKEN_FILE | (unset) | file the session token is kept in |
///
/// # Example
///
/// ```ignore
/// KLIP_PRINTER_URL=http://voron.local:7125 klip-panel info
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub api_url: String,
    pub printer_url: String,
    pub ws_url: String,
    pub request_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    /// No persistence when unset
    pub token_file: Option<PathBuf>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE_URL.into(),
            printer_url: DEFAULT_PRINTER_BASE_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            request_timeout_ms: 15_000,
            reconnect_delay_ms: 5_000,
            token_file: None,
        }
    }
}

impl PanelConfig {
    /// Load from environment variables, defaults for anything unset or
    /// unparsable
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: get("KLIP_API_URL").unwrap_or(defaults.api_url),
            printer_url: get("KLIP_PRINTER_URL").unwrap_or(defaults.printer_url),
            ws_url: get("KLIP_WS_URL").unwrap_or(defaults.ws_url),
            request_timeout_ms: get("KLIP_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            reconnect_delay_ms: get("KLIP_RECONNECT_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reconnect_delay_ms),
            token_file: get("KLIP_TOKEN_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Command-line values win over the environment
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        printer_url: Option<String>,
        ws_url: Option<String>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(url) = printer_url {
            self.printer_url = url;
        }
        if let Some(url) = ws_url {
            self.ws_url = url;
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.api_url)
            .with_printer_base_url(&self.printer_url)
            .with_timeout(Duration::from_millis(self.request_timeout_ms));
        config.link = config
            .link
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms));
        config = config.with_ws_url(&self.ws_url);
        if let Some(path) = &self.token_file {
            config = config.with_token_file(path);
        }
        config
    }
}
