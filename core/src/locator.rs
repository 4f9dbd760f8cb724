//! Locates the sections of an aichat config that a sync run touches
//!
//! ```yaml
//! model: ollama:llama3          # default model, `client:model`
//! clients:
//!   - type: openai-compatible
//!     name: ollama              # client entry, found by name
//!     api_base: http://localhost:11434/v1
//!     models:                   # the list being synchronized
//!       - name: llama3
//! ```

use crate::config::InventoryEndpoint;
use crate::document::{ensure_block, get_child, scalar_value, set_scalar, Mapping, NodeKind, Sequence, YamlNode};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const CLIENTS_KEY: &str = "clients";
pub const MODELS_KEY: &str = "models";
pub const NAME_KEY: &str = "name";
pub const MODEL_KEY: &str = "model";
pub const API_BASE_KEY: &str = "api_base";
pub const API_KEY_KEY: &str = "api_key";

static DEFAULT_MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):(.+)$").expect("default model pattern is valid"));

/// The top-level `model` value, `client:model`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultModel {
    pub client: String,
    pub model: String,
}

impl DefaultModel {
    pub fn new(client: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            model: model.into(),
        }
    }

    /// Split `client:model`; both halves are trimmed
    pub fn parse(value: &str) -> Option<Self> {
        let captures = DEFAULT_MODEL_RE.captures(value)?;
        Some(Self::new(captures[1].trim(), captures[2].trim()))
    }
}

impl fmt::Display for DefaultModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.model)
    }
}

/// Parsed top-level default model, if set and well formed
pub fn default_model(root: &Mapping) -> Option<DefaultModel> {
    scalar_value(root, MODEL_KEY).and_then(|value| DefaultModel::parse(&value))
}

/// Write the top-level default model, in place when the key exists
pub fn set_default_model(root: &Mapping, value: &DefaultModel) {
    set_scalar(root, MODEL_KEY, &value.to_string())
}

/// Client entries; empty when `clients` is missing or not a sequence
pub fn clients(root: &Mapping) -> Vec<Mapping> {
    get_child(root, CLIENTS_KEY, NodeKind::Sequence)
        .and_then(|clients| clients.as_sequence().cloned())
        .map(|clients| {
            clients
                .values()
                .filter_map(|client| client.as_mapping().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// The `name` of a client or model entry
pub fn entry_name(entry: &YamlNode) -> Option<String> {
    entry.as_mapping().and_then(|entry| scalar_value(entry, NAME_KEY))
}

/// The first client entry called `name`
pub fn find_client(root: &Mapping, name: &str) -> Option<Mapping> {
    clients(root)
        .into_iter()
        .find(|client| scalar_value(client, NAME_KEY).as_deref() == Some(name))
}

/// The client's `models` sequence, if it has one
pub fn models(client: &Mapping) -> Option<Sequence> {
    get_child(client, MODELS_KEY, NodeKind::Sequence).and_then(|models| models.as_sequence().cloned())
}

/// The client's `models` sequence, created empty when missing or not a
/// sequence; an empty `[]` turns block once entries are added
pub fn ensure_models(client: &Mapping) -> Sequence {
    if let Some(models) = models(client) {
        return ensure_block(models);
    }
    client.set(MODELS_KEY, Sequence::new());
    models(client).unwrap_or_default()
}

/// Inventory location written in a client entry
pub fn endpoint(client: &Mapping) -> InventoryEndpoint {
    InventoryEndpoint::new(
        scalar_value(client, API_BASE_KEY),
        scalar_value(client, API_KEY_KEY),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{append_mapping, Document, MappingBuilder};

    const CONFIG: &str = "model: ollama:llama3:8b\nclients:\n  - type: openai\n    name: openai\n  - type: openai-compatible\n    name: ollama\n    api_base: http://localhost:11434/v1\n    api_key: ~\n    models:\n      - name: llama3:8b\n      - name: qwen2\n";

    #[test]
    fn test_default_model_parse() {
        assert_eq!(
            DefaultModel::parse("ollama:llama3:8b"),
            Some(DefaultModel::new("ollama", "llama3:8b"))
        );
        assert_eq!(
            DefaultModel::parse(" local : qwen "),
            Some(DefaultModel::new("local", "qwen"))
        );
        assert_eq!(DefaultModel::parse("no-client"), None);
        assert_eq!(DefaultModel::parse(":model"), None);
        assert_eq!(DefaultModel::new("a", "b").to_string(), "a:b");
    }

    #[test]
    fn test_locate_client_and_models() {
        let document = Document::parse(CONFIG).unwrap();
        let root = document.root();
        assert_eq!(default_model(root), Some(DefaultModel::new("ollama", "llama3:8b")));
        assert_eq!(clients(root).len(), 2);
        assert!(find_client(root, "missing").is_none());

        let client = find_client(root, "ollama").unwrap();
        let names: Vec<_> = models(&client).unwrap().values().filter_map(|m| entry_name(&m)).collect();
        assert_eq!(names, ["llama3:8b", "qwen2"]);

        let endpoint = endpoint(&client);
        assert_eq!(endpoint.api_base.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(endpoint.api_key, None);
        assert!(models(&find_client(root, "openai").unwrap()).is_none());
    }

    #[test]
    fn test_missing_sections() {
        let document = Document::parse("model: nothing\n").unwrap();
        assert!(clients(document.root()).is_empty());
        assert_eq!(default_model(document.root()), None);
        assert!(find_client(document.root(), "ollama").is_none());

        let document = Document::parse("clients: not-a-list\n").unwrap();
        assert!(clients(document.root()).is_empty());
    }

    #[test]
    fn test_ensure_models_creates_sequence() {
        let document =
            Document::parse("clients:\n  - name: ollama # local\n    models:\n  - name: other\n").unwrap();
        let client = find_client(document.root(), "ollama").unwrap();
        let list = ensure_models(&client);
        append_mapping(&list, MappingBuilder::new().pair("name", "a")).unwrap();

        let rendered = document.render();
        assert!(rendered.starts_with("clients:\n  - name: ollama # local\n"), "{}", rendered);
        let value: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(value["clients"][0]["models"][0]["name"].as_str(), Some("a"));
        assert_eq!(value["clients"][1]["name"].as_str(), Some("other"));
    }

    #[test]
    fn test_ensure_models_turns_empty_flow_list_block() {
        let document = Document::parse("clients:\n- name: ollama\n  models: []\n").unwrap();
        let client = find_client(document.root(), "ollama").unwrap();
        let list = ensure_models(&client);
        append_mapping(&list, MappingBuilder::new().pair("name", "a")).unwrap();
        let rendered = document.render();
        assert!(!rendered.contains("[]"), "{}", rendered);
        assert!(rendered.contains("- name: a\n"), "{}", rendered);
    }

    #[test]
    fn test_set_default_model() {
        let document = Document::parse("# default\nmodel: x:y # note\nclients: []\n").unwrap();
        set_default_model(document.root(), &DefaultModel::new("ollama", "qwen2"));
        assert_eq!(
            document.render(),
            "# default\nmodel: ollama:qwen2 # note\nclients: []\n"
        );

        let document = Document::parse("clients: []\n").unwrap();
        set_default_model(document.root(), &DefaultModel::new("ollama", "qwen2"));
        assert_eq!(document.render(), "clients: []\nmodel: ollama:qwen2\n");
    }
}
