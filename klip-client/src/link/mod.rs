// klip-client/src/link/mod.rs
// Printer link - websocket configuration, state and handler types

mod client;

pub use client::PrinterLink;
pub use tokio_tungstenite::tungstenite::Error as WsError;

use crate::config::DEFAULT_WS_URL;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;

/// Objects subscribed on every open
pub const DEFAULT_SUBSCRIBED_OBJECTS: &[&str] = &["print_stats", "heater_bed", "extruder", "toolhead"];

/// Link configuration
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Websocket endpoint of the printer host
    pub ws_url: String,
    /// Printer objects subscribed on open
    pub objects: Vec<String>,
    /// Reconnect after the socket closes
    pub auto_reconnect: bool,
    /// Delay before the first reconnect attempt
    pub reconnect_delay: Duration,
    /// Backoff ceiling; equal to `reconnect_delay` means a fixed delay
    pub max_reconnect_delay: Duration,
    /// Max consecutive reconnect attempts (0 = unlimited)
    pub max_reconnect_attempts: u32,
    /// Give up opening the socket after this long
    pub connect_timeout: Duration,
}

impl Default for LinkConfig {
    /// Fixed 5 second delay, retried forever
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            objects: DEFAULT_SUBSCRIBED_OBJECTS.iter().map(|s| s.to_string()).collect(),
            auto_reconnect: true,
            reconnect_delay: Duration::from_millis(5000),
            max_reconnect_delay: Duration::from_millis(5000),
            max_reconnect_attempts: 0,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl LinkConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            ..Self::default()
        }
    }

    /// Replace the subscribed object set
    pub fn with_objects<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects = objects.into_iter().map(Into::into).collect();
        self
    }

    /// Fixed reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self.max_reconnect_delay = delay;
        self
    }

    /// Exponential backoff with jitter from `reconnect_delay` up to `max_delay`
    pub fn with_backoff(mut self, max_delay: Duration) -> Self {
        self.max_reconnect_delay = max_delay;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether attempt number `attempt` (0-based) may run
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.auto_reconnect
            && (self.max_reconnect_attempts == 0 || attempt < self.max_reconnect_attempts)
    }

    /// Delay before attempt number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.max_reconnect_delay <= self.reconnect_delay {
            return self.reconnect_delay;
        }
        let backoff = self
            .reconnect_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_reconnect_delay);
        // up to 20% jitter, never above the ceiling
        backoff.mul_f64(rand::thread_rng().gen_range(0.8..=1.0))
    }
}

/// Connection state, owned by the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Open => "open",
            LinkState::Closing => "closing",
        };
        f.write_str(s)
    }
}

/// Link lifecycle events, broadcast across reconnects
#[derive(Debug, Clone)]
pub enum LinkEvent {
    Opened,
    Message(Value),
    Error(String),
    Closed,
    /// A reconnect attempt (1-based) is scheduled after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// Attempt limit reached, no further reconnects
    GaveUp,
}

/// Per-connection callbacks
///
/// Handlers passed to [`PrinterLink::connect`] only see the connection they
/// were installed on; automatic reconnects connect without handlers. Use
/// [`PrinterLink::events`] to follow every connection.
pub trait LinkHandler: Send + Sync {
    fn on_message(&self, _message: &Value) {}
    fn on_error(&self, _error: &WsError) {}
    fn on_close(&self) {}
}

type MessageFn = Box<dyn Fn(&Value) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&WsError) + Send + Sync>;
type CloseFn = Box<dyn Fn() + Send + Sync>;

/// Closure-based [`LinkHandler`], every callback optional
#[derive(Default)]
pub struct Handlers {
    message: Option<MessageFn>,
    error: Option<ErrorFn>,
    close: Option<CloseFn>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl Fn(&WsError) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn with_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }
}

impl LinkHandler for Handlers {
    fn on_message(&self, message: &Value) {
        if let Some(f) = &self.message {
            f(message);
        }
    }

    fn on_error(&self, error: &WsError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }

    fn on_close(&self) {
        if let Some(f) = &self.close {
            f();
        }
    }
}
