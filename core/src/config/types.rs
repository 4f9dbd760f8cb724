//! Resolved configuration types for aichatconf core
//!
//! Core only accepts fully resolved, validated options.
//! Locating and reading the config file happens in the CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Client name used when neither an option nor the default model names one
pub const DEFAULT_CLIENT_NAME: &str = "ollama";

fn default_sort_models() -> bool {
    true
}

/// Options for one synchronization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Client entry to synchronize; defaults to the client of the
    /// top-level default model, then to `ollama`
    #[serde(default)]
    pub client_name: Option<String>,
    /// Substrings; inventory models containing any of them are ignored
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Substring selecting the new default model
    #[serde(default)]
    pub default_model: Option<String>,
    /// Sort the models list by name
    #[serde(default = "default_sort_models")]
    pub sort_models: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            client_name: None,
            exclude: Vec::new(),
            default_model: None,
            sort_models: default_sort_models(),
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Set the default-model substring; an empty value leaves it unset
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.default_model = (!model.trim().is_empty()).then_some(model);
        self
    }

    pub fn with_sort_models(mut self, sort: bool) -> Self {
        self.sort_models = sort;
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.client_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "client_name".to_string(),
                    value: format!("'{}'", name),
                });
            }
        }
        if let Some(model) = &self.default_model {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "default_model".to_string(),
                    value: format!("'{}'", model),
                });
            }
        }
        Ok(())
    }
}

/// Where the inventory of a client lives, as written in its entry
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEndpoint {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
}

impl InventoryEndpoint {
    pub fn new(api_base: Option<String>, api_key: Option<String>) -> Self {
        Self { api_base, api_key }
    }
}

impl std::fmt::Debug for InventoryEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryEndpoint")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
