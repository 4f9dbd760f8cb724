//! One synchronization run over a config document

use crate::config::{InventoryEndpoint, SyncOptions, DEFAULT_CLIENT_NAME};
use crate::document::{Document, Mapping};
use crate::error::{ConfigError, Result};
use crate::inventory::ModelInventory;
use crate::locator::{self, DefaultModel};
use crate::reconcile::{select_default_model, ExcludeFilter, ReconcileOptions, ReconcileReport, Reconciler};
use tracing::info;

/// What a run changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Name of the synchronized client entry
    pub client: String,
    pub models: ReconcileReport,
    /// New value of the top-level `model` key, when it was set
    pub default_model: Option<String>,
}

/// A parsed config with its target client resolved
///
/// ```no_run
/// # async fn run(text: &str) -> aichatconf_core::Result<String> {
/// use aichatconf_core::{OllamaClient, SyncOptions, SyncSession};
///
/// let mut session = SyncSession::open(text, SyncOptions::default())?;
/// let inventory = OllamaClient::new(&session.endpoint())?;
/// session.synchronize(&inventory).await?;
/// Ok(session.render())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncSession {
    document: Document,
    options: SyncOptions,
    client_name: String,
    client: Mapping,
}

impl SyncSession {
    /// Parse `text` and find the client to synchronize
    ///
    /// The client is the one named in the options, else the client of the
    /// top-level default model, else `ollama`.
    pub fn open(text: &str, options: SyncOptions) -> Result<Self> {
        options.validate()?;
        let document = Document::parse(text)?;
        let root = document.root();

        let default_model = locator::default_model(root);
        match &default_model {
            Some(model) => info!("default model found: {}", model),
            None => info!("default model not found"),
        }
        info!("clients found: {}", locator::clients(root).len());

        let client_name = options
            .client_name
            .clone()
            .or_else(|| default_model.as_ref().map(|m| m.client.clone()))
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());
        let client = locator::find_client(root, &client_name).ok_or_else(|| {
            ConfigError::ClientNotFound {
                name: client_name.clone(),
            }
        })?;
        let model_count = locator::models(&client).map_or(0, |models| models.len());
        info!("models found: {}", model_count);

        Ok(Self {
            document,
            options,
            client_name,
            client,
        })
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Inventory location from the client entry's `api_base` and `api_key`
    pub fn endpoint(&self) -> InventoryEndpoint {
        let endpoint = locator::endpoint(&self.client);
        if endpoint.api_key.is_some() {
            info!("api_key found");
        }
        match &endpoint.api_base {
            Some(api_base) => info!("api_base found: {}", api_base),
            None => info!("api_base not found, use default"),
        }
        endpoint
    }

    /// Reconcile the client's models with `inventory`, then apply the
    /// default-model option
    pub async fn synchronize(&mut self, inventory: &dyn ModelInventory) -> Result<SyncReport> {
        let listed = inventory.list_models().await?;
        info!("{} models found: {}", inventory.provider_name(), listed.len());
        let authoritative = ExcludeFilter::new(&self.options.exclude).apply(listed);

        let reconciler = Reconciler::new(ReconcileOptions {
            sort: self.options.sort_models,
        });
        let models = locator::ensure_models(&self.client);
        let report = reconciler.reconcile(&models, &authoritative, inventory).await?;

        let default_model = match self.options.default_model.clone() {
            Some(wanted) => self.apply_default_model(&wanted),
            None => None,
        };

        Ok(SyncReport {
            client: self.client_name.clone(),
            models: report,
            default_model,
        })
    }

    fn apply_default_model(&self, wanted: &str) -> Option<String> {
        let selected = locator::models(&self.client).and_then(|models| select_default_model(&models, wanted));
        let Some(model) = selected else {
            info!("default model setting skip, model not found: {}", wanted);
            return None;
        };

        let value = DefaultModel::new(self.client_name.clone(), model);
        locator::set_default_model(self.document.root(), &value);
        info!("set default model: {}", value);
        Some(value.to_string())
    }

    /// Render the document
    pub fn render(&self) -> String {
        self.document.render()
    }
}
