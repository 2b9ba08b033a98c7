//! Application state shared by the CLI commands
//!
//! - [`AuthStore`]: login state on top of the request client session
//! - [`PrinterStore`]: printer snapshot, G-code and the websocket link

mod auth;
mod printer;

pub use auth::{AuthStore, User};
pub use printer::{PrinterStore, UNKNOWN_STATUS};
