//! CLI configuration loader for aichatconf
//!
//! The aichat config file is resolved in priority order:
//! 1. --config path (or `AICHATCONF_CONFIG`)
//! 2. `$AICHAT_CONFIG_DIR/config.yaml`
//! 3. Platform config directory: `<config_dir>/aichat/config.yaml`
//!
//! `~` and environment variables in the path are expanded.

use aichatconf_core::SyncOptions;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable aichat itself reads its config directory from
pub const AICHAT_CONFIG_DIR_ENV: &str = "AICHAT_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.yaml";

/// A config file read from disk, with the options of the run
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub text: String,
    pub options: SyncOptions,
}

/// CLI configuration loader
#[derive(Debug)]
pub struct CliConfigLoader {
    /// Override config file path
    config_override: Option<PathBuf>,
    client_override: Option<String>,
    exclude: Vec<String>,
    default_model: Option<String>,
    sort: bool,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            config_override: None,
            client_override: None,
            exclude: Vec::new(),
            default_model: None,
            sort: true,
        }
    }

    /// Set config file override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set client name override
    pub fn with_client_override(mut self, client: String) -> Self {
        self.client_override = Some(client);
        self
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = Some(model);
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Resolve the config path, read the file and build the sync options
    pub async fn load(&self) -> Result<LoadedConfig> {
        let path = self.resolve_path()?;
        info!("aichat configuration read: {}", path.display());
        let text = Self::load_file(&path).await?;

        Ok(LoadedConfig {
            path,
            text,
            options: self.options()?,
        })
    }

    /// Path of the config file to read
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(override_path) = &self.config_override {
            return expand_path(override_path);
        }

        if let Some(dir) = std::env::var_os(AICHAT_CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(expand_path(Path::new(&dir))?.join(CONFIG_FILE_NAME));
        }

        dirs::config_dir()
            .map(|dir| dir.join("aichat").join(CONFIG_FILE_NAME))
            .ok_or_else(|| anyhow!("Cannot determine the aichat config directory, use --config"))
    }

    fn options(&self) -> Result<SyncOptions> {
        let mut options = SyncOptions::new()
            .with_exclude(self.exclude.iter().cloned())
            .with_sort_models(self.sort);
        if let Some(client) = &self.client_override {
            options = options.with_client_name(client.clone());
        }
        if let Some(model) = &self.default_model {
            options = options.with_default_model(model.clone());
        }

        options
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;
        Ok(options)
    }

    async fn load_file(path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~` and `$VARS` in `path`
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand config path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
