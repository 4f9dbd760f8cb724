//! Synchronizes a `models` sequence with an authoritative list of names
//!
//! A run prunes entries the inventory no longer has, appends entries for
//! new names (enriched with what the inventory knows about them) and sorts
//! the result by name. Entries that survive are never rebuilt, so their
//! fields and comments come out unchanged.

pub mod fields;
pub mod filter;

pub use fields::ModelFields;
pub use filter::ExcludeFilter;

use crate::document::{append_mapping, ensure_block, remove_item, reorder, Sequence};
use crate::error::Result;
use crate::inventory::ModelInventory;
use crate::locator::entry_name;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Supplies the fields of a newly added model entry
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, name: &str) -> Result<ModelFields>;
}

#[async_trait]
impl<T> Enricher for T
where
    T: ModelInventory + ?Sized,
{
    async fn enrich(&self, name: &str) -> Result<ModelFields> {
        Ok(ModelFields::from(self.model_info(name).await?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Sort entries by name, byte-wise
    pub sort: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { sort: true }
    }
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub added: Vec<String>,
    /// Added without details because enrichment failed
    pub degraded: Vec<String>,
    /// Sorting changed the order of the entries
    pub reordered: bool,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && !self.reordered
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Bring `models` in line with `authoritative`
    ///
    /// `authoritative` is the already filtered inventory list; duplicate
    /// names in it are added once.
    pub async fn reconcile<E>(
        &self,
        models: &Sequence,
        authoritative: &[String],
        enricher: &E,
    ) -> Result<ReconcileReport>
    where
        E: Enricher + ?Sized,
    {
        let wanted: HashSet<&str> = authoritative.iter().map(String::as_str).collect();
        let mut report = ReconcileReport::default();

        // Step 1: prune
        let mut doomed = Vec::new();
        for (index, entry) in models.values().enumerate() {
            match entry_name(&entry) {
                Some(name) if wanted.contains(name.as_str()) => report.kept.push(name),
                Some(name) => {
                    info!("remove model: {}", name);
                    report.removed.push(name);
                    doomed.push(index);
                }
                None => {
                    debug!("remove model entry without a name");
                    doomed.push(index);
                }
            }
        }
        let mut target = models.clone();
        for index in doomed.into_iter().rev() {
            remove_item(&mut target, index);
        }

        // Step 2: augment
        let mut present: HashSet<String> = report.kept.iter().cloned().collect();
        for name in authoritative {
            if !present.insert(name.clone()) {
                continue;
            }
            let fields = match enricher.enrich(name).await {
                Ok(fields) => fields,
                Err(e) => {
                    warn!("failed to get details of model {}, adding it by name only: {}", name, e);
                    report.degraded.push(name.clone());
                    ModelFields::default()
                }
            };
            if report.added.is_empty() {
                target = ensure_block(target);
            }
            append_mapping(&target, fields.to_entry(name))?;
            info!("add model: {}", name);
            report.added.push(name.clone());
        }

        // Step 3: order
        if self.options.sort {
            let names: Vec<String> = target
                .values()
                .map(|entry| entry_name(&entry).unwrap_or_default())
                .collect();
            let mut order: Vec<usize> = (0..names.len()).collect();
            order.sort_by(|a, b| names[*a].cmp(&names[*b]));
            report.reordered = reorder(&target, &order);
        }

        debug!(
            "models kept: {}, removed: {}, added: {}",
            report.kept.len(),
            report.removed.len(),
            report.added.len()
        );
        Ok(report)
    }
}

/// First entry, in list order, whose name contains `wanted`
pub fn select_default_model(models: &Sequence, wanted: &str) -> Option<String> {
    models
        .values()
        .filter_map(|entry| entry_name(&entry))
        .find(|name| name.contains(wanted))
}
