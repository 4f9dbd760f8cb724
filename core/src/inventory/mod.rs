//! Model inventory abstractions and the Ollama implementation

pub mod ollama;
pub mod params;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use ollama::OllamaClient;
pub use params::SamplingParams;

/// Capability tags reported by the inventory for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Completion,
    Tools,
    Insert,
    Vision,
    Embedding,
    Thinking,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Completion => "completion",
            Capability::Tools => "tools",
            Capability::Insert => "insert",
            Capability::Vision => "vision",
            Capability::Embedding => "embedding",
            Capability::Thinking => "thinking",
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "completion" => Ok(Capability::Completion),
            "tools" => Ok(Capability::Tools),
            "insert" => Ok(Capability::Insert),
            "vision" => Ok(Capability::Vision),
            "embedding" => Ok(Capability::Embedding),
            "thinking" => Ok(Capability::Thinking),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities of one model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw tags, ignoring the ones that are not known
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|tag| tag.as_ref().trim().parse().ok())
            .collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What the inventory knows about one model; `None` means unknown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub context_length: Option<u64>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub capabilities: Capabilities,
}

/// Source of truth for the models a client serves
#[async_trait]
pub trait ModelInventory: Send + Sync {
    /// Names of all available models, in inventory order
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Details for one model
    async fn model_info(&self, name: &str) -> Result<ModelInfo>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}
