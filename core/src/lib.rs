//! # aichatconf Core
//!
//! Core library for aichatconf - keeps the model list of an
//! [aichat](https://github.com/sigoden/aichat) client in sync with an Ollama
//! model inventory.
//!
//! The config document is edited in place: entries, comments and formatting
//! that a sync does not touch are written back exactly as they were read.

// Core modules
pub mod config;
pub mod document;
pub mod error;
pub mod inventory;
pub mod locator;
pub mod reconcile;
pub mod sync;

// Re-export commonly used types
pub use config::{InventoryEndpoint, SyncOptions};
pub use document::{Document, NodeKind};
pub use error::{Error, Result};
pub use inventory::{ModelInfo, ModelInventory, OllamaClient};
pub use reconcile::{ExcludeFilter, ReconcileReport, Reconciler};
pub use sync::{SyncReport, SyncSession};

/// Current version of the aichatconf-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing; logs go to stderr
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
