//! Klip Client - printer host and panel API client
//!
//! - [`RequestClient`]: panel REST API with session token injection and one
//!   normalized error type
//! - [`PrinterLink`]: websocket to the printer host with fixed subscription
//!   and automatic reconnect
//! - [`PrinterApi`]: printer host REST endpoints (info, G-code, queries)

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod link;
pub mod printer;
pub mod session;

pub use api::{AuthApi, FileApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{RequestClient, SessionEvent};
pub use link::{Handlers, LinkConfig, LinkEvent, LinkHandler, LinkState, PrinterLink, WsError};
pub use printer::{PrinterApi, PrinterService};
pub use session::{Session, TokenStore};

// Re-export shared types for convenience
pub use shared::{ApiResponse, FileListResponse, LoginResponse, PrinterInfo, WsMessage};
