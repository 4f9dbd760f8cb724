//! Model entry fields derived from inventory details

use crate::document::MappingBuilder;
use crate::inventory::{Capabilities, Capability, ModelInfo};

/// Fields written into a new model entry; `None` and missing capabilities
/// produce no key at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFields {
    pub max_input_tokens: Option<u64>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub capabilities: Capabilities,
}

impl From<ModelInfo> for ModelFields {
    /// Keep only meaningful values: zero and negative numbers are dropped
    fn from(info: ModelInfo) -> Self {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        Self {
            max_input_tokens: info.context_length.filter(|n| *n > 0),
            temperature: info.temperature.filter(positive),
            top_p: info.top_p.filter(positive),
            capabilities: info.capabilities,
        }
    }
}

impl ModelFields {
    /// Build the model entry mapping for `name`
    ///
    /// Floats are written with a decimal point, so `1.0` stays a float when
    /// read back.
    pub fn to_entry(&self, name: &str) -> MappingBuilder {
        let mut entry = MappingBuilder::new().pair("name", name);
        if let Some(tokens) = self.max_input_tokens {
            entry = entry.pair("max_input_tokens", tokens);
        }
        if let Some(temperature) = self.temperature {
            entry = entry.pair("temperature", temperature);
        }
        if let Some(top_p) = self.top_p {
            entry = entry.pair("top_p", top_p);
        }
        let flags = [
            (Capability::Vision, "supports_vision"),
            (Capability::Tools, "supports_function_calling"),
            (Capability::Thinking, "supports_reasoning"),
        ];
        for (capability, key) in flags {
            if self.capabilities.contains(capability) {
                entry = entry.pair(key, true);
            }
        }
        if self.capabilities.contains(Capability::Embedding) {
            entry = entry.pair("type", "embedding");
        }
        entry
    }
}
