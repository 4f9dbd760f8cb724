//! Minimal configuration module for aichatconf core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{InventoryEndpoint, SyncOptions, DEFAULT_CLIENT_NAME};
