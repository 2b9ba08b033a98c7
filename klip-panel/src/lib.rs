//! Klip Panel - command line front end for a Klipper printer
//!
//! Wires the panel API client, the printer REST API and the printer link
//! into stores the commands in `main.rs` drive.

pub mod config;
pub mod logger;
pub mod stores;

pub use config::PanelConfig;
pub use stores::{AuthStore, PrinterStore, User};
