//! Ollama inventory client

use super::{Capabilities, ModelInfo, ModelInventory, SamplingParams};
use crate::config::InventoryEndpoint;
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Environment variable Ollama itself reads for its listen address
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 11434;

/// Client for the Ollama HTTP API
pub struct OllamaClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl OllamaClient {
    /// Create a client for a configured endpoint, falling back to
    /// `OLLAMA_HOST` and then to the local default address
    pub fn new(endpoint: &InventoryEndpoint) -> Result<Self> {
        let host = std::env::var(OLLAMA_HOST_ENV).ok();
        let base_url = resolve_base_url(endpoint.api_base.as_deref(), host.as_deref())?;
        Ok(Self::with_base_url(base_url, endpoint.api_key.clone()))
    }

    pub fn with_base_url(base_url: Url, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| InventoryError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err((InventoryError::ApiError {
                status,
                message: error_text.trim().to_string(),
            })
            .into());
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await.map_err(|e| InventoryError::Network {
            message: e.to_string(),
        })?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ModelInventory for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.base_url.join("api/tags")?;
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        let tags: TagsResponse = Self::decode(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn model_info(&self, name: &str) -> Result<ModelInfo> {
        let url = self.base_url.join("api/show")?;
        debug!("POST {} ({})", url, name);
        let request = self.client.post(url).json(&ShowRequest { model: name });
        let response = match self.send(request).await {
            Err(crate::Error::Inventory(InventoryError::ApiError { status, .. }))
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Err(InventoryError::ModelNotFound {
                    model: name.to_string(),
                }
                .into());
            }
            other => other?,
        };
        let show: ShowResponse = Self::decode(response).await?;
        Ok(show.into_model_info())
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// Base URL of the inventory service
///
/// A configured `api_base` wins; only its scheme, host and port are kept, so
/// an OpenAI-compatible `/v1` suffix is dropped. Without one, `ollama_host`
/// (the `OLLAMA_HOST` value) is used, then `http://127.0.0.1:11434`.
pub fn resolve_base_url(api_base: Option<&str>, ollama_host: Option<&str>) -> Result<Url> {
    if let Some(api_base) = api_base.map(str::trim).filter(|s| !s.is_empty()) {
        let mut url = Url::parse(api_base)?;
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        return Ok(url);
    }
    match ollama_host.map(str::trim).filter(|s| !s.is_empty()) {
        Some(host) => ollama_host_url(host),
        None => default_url(),
    }
}

fn default_url() -> Result<Url> {
    Ok(Url::parse(&format!("http://{}:{}/", DEFAULT_HOST, DEFAULT_PORT))?)
}

/// Interpret an `OLLAMA_HOST` value the way Ollama does: the scheme defaults
/// to http and the port to 11434, or to 80/443 when a scheme is given
fn ollama_host_url(value: &str) -> Result<Url> {
    let (scheme, rest, default_port) = match value.split_once("://") {
        None => ("http", value, DEFAULT_PORT),
        Some(("http", rest)) => ("http", rest, 80),
        Some(("https", rest)) => ("https", rest, 443),
        Some((scheme, rest)) => (scheme, rest, DEFAULT_PORT),
    };
    let (host_port, path) = rest.split_once('/').unwrap_or((rest, ""));

    let (host, port) = match split_host_port(host_port) {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host.to_string(), port),
            Err(_) => return default_url(),
        },
        None => {
            let bare = host_port.trim_matches(['[', ']']);
            let host = if bare.is_empty() {
                DEFAULT_HOST.to_string()
            } else if bare.contains(':') {
                format!("[{}]", bare)
            } else {
                bare.to_string()
            };
            (host, default_port)
        }
    };

    let mut path = path.trim_end_matches('/').to_string();
    if !path.is_empty() {
        path.push('/');
    }
    Ok(Url::parse(&format!("{}://{}:{}/{}", scheme, host, port, path))?)
}

/// `host:port` or `[v6]:port`; `None` when there is no port
fn split_host_port(value: &str) -> Option<(&str, &str)> {
    if value.starts_with('[') {
        let end = value.find(']')?;
        let port = value[end + 1..].strip_prefix(':')?;
        return Some((&value[..=end], port));
    }
    let (host, port) = value.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ShowResponse {
    #[serde(default)]
    parameters: String,
    #[serde(default)]
    model_info: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    capabilities: Vec<String>,
}

impl ShowResponse {
    fn into_model_info(self) -> ModelInfo {
        let context_length = self
            .model_info
            .iter()
            .filter(|(key, _)| key.ends_with(".context_length"))
            .find_map(|(_, value)| {
                value
                    .as_u64()
                    .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            });
        let sampling = SamplingParams::parse(&self.parameters);
        ModelInfo {
            context_length,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            capabilities: Capabilities::from_tags(&self.capabilities),
        }
    }
}
