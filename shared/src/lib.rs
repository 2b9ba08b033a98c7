//! Shared types for the Klip printer panel
//!
//! Wire types exchanged with the panel API and the printer host, plus the
//! small G-code and temperature helpers used by every front end.

pub mod client;
pub mod gcode;
pub mod printer;
pub mod response;
pub mod temperature;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::{FileItem, FileListResponse, LoginRequest, LoginResponse};
pub use printer::{PrinterInfo, WsMessage};
pub use response::{API_CODE_SUCCESS, ApiResponse};
