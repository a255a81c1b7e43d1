//! HuggingFace Inference provider
//!
//! Authenticates with a static `HF_TOKEN`. The hub listing alone does not say
//! whether a model is actually served, so discovery probes every candidate
//! with a tiny generation call and keeps the ones that answer. The probe
//! result is cached for [`HuggingFaceConfig::discovery_ttl`].
//!
//! Candidates, in order: `HF_MODEL`, the comma-separated
//! `HF_MODEL_CANDIDATES`, then the most downloaded text-generation models on
//! the hub. `HF_API_URL` pins every request to one dedicated endpoint.

use crate::error::ensure_success;
use crate::{LLMError, ProviderFactory, Result, TextGenerator};
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use futures::{StreamExt, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const PROVIDER: &str = "hf_api";
const DEFAULT_MODELS_API: &str = "https://huggingface.co/api/models";
const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";
const DISCOVERY_LIMIT: usize = 60;
const PROBE_TIMEOUT_SECS: u64 = 6;
const GENERATION_TIMEOUT_SECS: u64 = PROBE_TIMEOUT_SECS + 4;
const LISTING_TIMEOUT_SECS: u64 = 10;
const PROBE_PROMPT: &str = "ping";
const PROBE_MAX_TOKENS: usize = 4;
const PROBE_CONCURRENCY: usize = 4;

/// Configuration for the HuggingFace provider
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// API token
    pub token: Option<String>,
    /// Preferred model, probed first
    pub model: Option<String>,
    /// Extra candidates probed after `model`
    pub candidates: Vec<String>,
    /// Dedicated endpoint that serves every request
    pub api_url: Option<String>,
    /// Hub listing endpoint
    pub models_api: String,
    /// Base URL for per-model inference
    pub inference_base: String,
    /// How many hub models to consider
    pub discovery_limit: usize,
    /// How long a discovery result stays valid
    pub discovery_ttl: Duration,
}

impl HuggingFaceConfig {
    /// Create a config with a token and default endpoints
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Read `HF_TOKEN`, `HF_MODEL`, `HF_MODEL_CANDIDATES` and `HF_API_URL`
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            token: var("HF_TOKEN"),
            model: var("HF_MODEL"),
            candidates: var("HF_MODEL_CANDIDATES")
                .map(|list| split_candidates(&list))
                .unwrap_or_default(),
            api_url: var("HF_API_URL"),
            ..Self::default()
        }
    }

    /// Set the preferred model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set extra candidates
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Set the hub listing endpoint
    pub fn with_models_api(mut self, url: impl Into<String>) -> Self {
        self.models_api = url.into();
        self
    }

    /// Set the inference base URL
    pub fn with_inference_base(mut self, url: impl Into<String>) -> Self {
        self.inference_base = url.into();
        self
    }

    /// Pin requests to a dedicated endpoint
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| LLMError::ConfigurationError("HF_TOKEN is not set".to_string()))
    }

    fn endpoint(&self, model: &str) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("{}/{model}", self.inference_base))
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            token: None,
            model: None,
            candidates: Vec::new(),
            api_url: None,
            models_api: DEFAULT_MODELS_API.to_string(),
            inference_base: DEFAULT_INFERENCE_BASE.to_string(),
            discovery_limit: DISCOVERY_LIMIT,
            discovery_ttl: Duration::from_secs(3600),
        }
    }
}

fn split_candidates(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Creates HuggingFace clients and discovers usable models
pub struct HuggingFaceFactory {
    client: Client,
    config: Arc<HuggingFaceConfig>,
    discovered: Mutex<TimedCache<(), Vec<String>>>,
}

impl HuggingFaceFactory {
    /// Create a factory; no network call is made here
    pub fn new(config: HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| LLMError::ConfigurationError(format!("HTTP client: {e}")))?;
        let discovered = Mutex::new(TimedCache::with_lifespan(config.discovery_ttl));

        Ok(Self {
            client,
            config: Arc::new(config),
            discovered,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &HuggingFaceConfig {
        &self.config
    }

    fn client_for(&self, model: &str) -> HuggingFaceClient {
        HuggingFaceClient {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            model: model.to_string(),
        }
    }

    async fn hub_models(&self, token: &str) -> Vec<String> {
        let limit = self.config.discovery_limit.to_string();
        let response = self
            .client
            .get(&self.config.models_api)
            .timeout(Duration::from_secs(LISTING_TIMEOUT_SECS))
            .bearer_auth(token)
            .query(&[
                ("pipeline_tag", "text-generation"),
                ("sort", "downloads"),
                ("direction", "-1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await;

        let listed: std::result::Result<Vec<HubModel>, String> = match response {
            Ok(resp) if resp.status().is_success() => resp.json().await.map_err(|e| e.to_string()),
            Ok(resp) => Err(format!("HTTP {}", resp.status())),
            Err(e) => Err(e.to_string()),
        };

        match listed {
            Ok(models) => models
                .into_iter()
                .filter(|m| !m.disabled && !m.private)
                .filter_map(|m| m.model_id.or(m.id))
                .collect(),
            Err(e) => {
                warn!(error = %e, "HuggingFace model listing failed");
                Vec::new()
            }
        }
    }

    async fn candidates(&self, token: &str) -> Vec<String> {
        let configured = self
            .config
            .model
            .iter()
            .chain(self.config.candidates.iter())
            .cloned();
        let listed = self.hub_models(token).await;

        let mut candidates: Vec<String> = Vec::new();
        for model in configured.chain(listed) {
            if !candidates.contains(&model) {
                candidates.push(model);
            }
        }
        candidates
    }

    #[instrument(skip(self, token))]
    async fn discover(&self, token: &str) -> Vec<String> {
        let candidates = self.candidates(token).await;
        info!(candidates = candidates.len(), "HuggingFace discovery started");

        let probed: Vec<(String, bool)> = stream::iter(candidates)
            .map(|model| async move {
                let client = self.client_for(&model);
                let reachable = match client
                    .request(PROBE_PROMPT, PROBE_MAX_TOKENS, PROBE_TIMEOUT_SECS)
                    .await
                {
                    Ok(_) => true,
                    Err(e) => {
                        debug!(model = %model, error = %e, "probe failed");
                        false
                    }
                };
                (model, reachable)
            })
            .buffered(PROBE_CONCURRENCY)
            .collect()
            .await;

        let available: Vec<String> = probed
            .into_iter()
            .filter_map(|(model, ok)| ok.then_some(model))
            .collect();
        info!(available = available.len(), "HuggingFace discovery finished");
        available
    }
}

#[async_trait]
impl ProviderFactory for HuggingFaceFactory {
    async fn available_models(&self) -> Result<Vec<String>> {
        let token = self.config.token()?;

        // Held across discovery so concurrent callers probe once.
        let mut cache = self.discovered.lock().await;
        if let Some(models) = cache.cache_get(&()) {
            debug!("HuggingFace discovery cache hit");
            return Ok(models.clone());
        }

        let models = self.discover(token).await;
        if !models.is_empty() {
            cache.cache_set((), models.clone());
        }
        Ok(models)
    }

    fn create(&self, model: &str) -> Result<Arc<dyn TextGenerator>> {
        self.config.token()?;
        Ok(Arc::new(self.client_for(model)))
    }
}

/// HuggingFace Inference client bound to one model
pub struct HuggingFaceClient {
    client: Client,
    config: Arc<HuggingFaceConfig>,
    model: String,
}

impl HuggingFaceClient {
    /// Model this client sends requests to
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, prompt: &str, max_tokens: usize, timeout_secs: u64) -> Result<String> {
        let token = self.config.token()?;
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: max_tokens,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(self.config.endpoint(&self.model))
            .timeout(Duration::from_secs(timeout_secs))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::from_transport(PROVIDER, &e))?;

        let response = ensure_success(PROVIDER, response).await?;
        let body: InferenceResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("HuggingFace inference: {e}")))?;

        body.into_text()
            .ok_or_else(|| LLMError::UnexpectedResponse("Empty generation".to_string()))
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        self.request(prompt, max_tokens, GENERATION_TIMEOUT_SECS).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

// ============================================================================
// HuggingFace wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct HubModel {
    #[serde(rename = "modelId", default)]
    model_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: usize,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<Generated>),
    Single(Generated),
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::Single(item) => Some(item.generated_text),
        }
    }
}
