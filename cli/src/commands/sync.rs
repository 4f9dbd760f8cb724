//! Model synchronization command

use crate::config::CliConfigLoader;
use crate::output::OutputTarget;
use aichatconf_core::{OllamaClient, SyncSession};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Read the config, sync the client's models with its Ollama server and
/// write the result
///
/// Nothing is written unless the whole run succeeds.
pub async fn sync_command(config_loader: CliConfigLoader, target: OutputTarget) -> Result<()> {
    let loaded = config_loader.load().await?;

    let mut session = SyncSession::open(&loaded.text, loaded.options)
        .with_context(|| format!("Failed to process config file: {}", loaded.path.display()))?;

    let endpoint = session.endpoint();
    let inventory = OllamaClient::new(&endpoint)?;
    debug!("ollama server for client {}: {}", session.client_name(), inventory.base_url());

    let report = session.synchronize(&inventory).await?;
    debug!(
        "client {}: {} kept, {} removed, {} added",
        report.client,
        report.models.kept.len(),
        report.models.removed.len(),
        report.models.added.len()
    );
    if report.models.is_unchanged() && report.default_model.is_none() {
        info!("models of client {} are up to date", report.client);
    }

    target.write(&session.render()).await
}
