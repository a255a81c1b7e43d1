//! The generation pipeline
//!
//! One call runs these stages in order, each logged:
//!
//! `Start → EngineResolved → PromptAssembled → ResponseReceived → Decoded | DecodeFailed`
//!
//! `EngineResolved` is the alias table lookup only. Models are listed and a
//! client is created after the prompt is assembled, so template and prompt
//! errors never reach the network. Any failure before `ResponseReceived` ends
//! the call with its error. The pipeline itself writes no state apart from
//! the caches owned by the enrichers and providers.

use crate::recovery;
use crate::request::{PromptRequest, PromptSource};
use crate::result::GenerationResult;
use crate::{GenerationError, Result};
use coursegen_context::{ExternalContext, FeedbackSummarizer};
use coursegen_llm::{EngineModels, EngineRegistry};
use coursegen_prompt::{Language, PromptRegistry};
use coursegen_utils::Config;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Template variable receiving the external search text
pub const EXTERNAL_CONTEXT_VAR: &str = "external_context";
/// Template variable receiving the feedback summary
pub const FEEDBACK_CONTEXT_VAR: &str = "feedback_context";

#[derive(Debug, Clone, Copy)]
enum Stage {
    Start,
    EngineResolved,
    PromptAssembled,
    ResponseReceived,
    Decoded,
    DecodeFailed,
}

/// Entry point for content generation
#[derive(Clone)]
pub struct Generator {
    engines: EngineRegistry,
    prompts: Arc<PromptRegistry>,
    external: Option<ExternalContext>,
    feedback: Option<FeedbackSummarizer>,
}

impl Generator {
    /// Create a pipeline without enrichers
    pub fn new(engines: EngineRegistry, prompts: Arc<PromptRegistry>) -> Self {
        Self {
            engines,
            prompts,
            external: None,
            feedback: None,
        }
    }

    /// Default providers, templates from `prompts_dir` and the public search
    /// sources, all configured from `config` and the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let engines = EngineRegistry::from_env()?;
        let prompts = PromptRegistry::from_dir(&config.prompts_dir)
            .with_language(Language::from_code(&config.default_language));
        let external = ExternalContext::with_defaults(
            config.search_results_per_source,
            config.context_cache_capacity,
            config.context_cache_ttl,
        );

        Ok(Self::new(engines, Arc::new(prompts)).with_external_context(external))
    }

    pub fn with_external_context(mut self, external: ExternalContext) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackSummarizer) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Run one generation call
    #[instrument(skip(self, request), fields(engine = request.engine()))]
    pub async fn generate(&self, request: &PromptRequest) -> Result<GenerationResult> {
        debug!(stage = ?Stage::Start, "generation started");

        let engine = self.engines.canonical(request.engine())?;
        debug!(stage = ?Stage::EngineResolved, engine);

        let prompt = self.assemble_prompt(request).await?;
        debug!(stage = ?Stage::PromptAssembled, chars = prompt.chars().count());

        let resolved = self.engines.resolve(engine, request.model()).await?;
        debug!(model = %resolved.model, "model selected");
        info!(model = %resolved.model, "Prompt:\n{prompt}");

        let raw = resolved
            .generator
            .generate(&prompt, request.max_tokens())
            .await?;
        let raw = raw.trim().to_string();
        debug!(stage = ?Stage::ResponseReceived, chars = raw.chars().count());
        info!(model = %resolved.model, "Raw output:\n{raw}");

        if !request.expects_structured() {
            return Ok(GenerationResult::Text {
                text: raw,
                model: resolved.model,
            });
        }

        match recovery::recover(&raw) {
            Ok(value) => {
                debug!(stage = ?Stage::Decoded, keys = value.len());
                Ok(GenerationResult::Structured {
                    value,
                    model: resolved.model,
                })
            }
            Err(e) => {
                error!(stage = ?Stage::DecodeFailed, model = %resolved.model, error = %e);
                Err(e)
            }
        }
    }

    /// Render `template` with `params` and decode the reply as JSON, without
    /// enrichers. Returns the object with `_model` added.
    pub async fn generate_json(
        &self,
        template: &str,
        engine: &str,
        model: Option<&str>,
        params: Value,
    ) -> Result<Value> {
        let request = PromptRequest::template(template)
            .params(params)
            .engine(engine)
            .maybe_model(model.map(str::to_string))
            .external_context(false)
            .feedback(false)
            .structured()
            .build();

        Ok(self.generate(&request).await?.into_json())
    }

    /// Models per engine; engines whose listing fails are left out
    pub async fn list_models(&self) -> Vec<EngineModels> {
        self.engines.list_models().await
    }

    /// All available model ids across engines
    pub async fn list_available_models(&self) -> Vec<String> {
        self.list_models()
            .await
            .into_iter()
            .flat_map(|listing| listing.models)
            .collect()
    }

    async fn assemble_prompt(&self, request: &PromptRequest) -> Result<String> {
        match request.source() {
            Some(PromptSource::Template(name)) => {
                let mut vars = request.params().clone();
                vars.insert(
                    EXTERNAL_CONTEXT_VAR.to_string(),
                    Value::String(self.external_text(request).await),
                );
                vars.insert(
                    FEEDBACK_CONTEXT_VAR.to_string(),
                    Value::String(self.feedback_text(request).await),
                );

                Ok(self
                    .prompts
                    .render_with_lang(name, request.language(), &Value::Object(vars))?)
            }
            Some(PromptSource::Literal(text)) if !text.trim().is_empty() => Ok(text.clone()),
            _ => request
                .params()
                .get("prompt")
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
                .ok_or(GenerationError::MissingPrompt),
        }
    }

    async fn external_text(&self, request: &PromptRequest) -> String {
        if !request.include_external_context() {
            return String::new();
        }
        match (&self.external, request.search_query()) {
            (Some(external), Some(query)) => external.context_for(&query, request.language()).await,
            _ => String::new(),
        }
    }

    async fn feedback_text(&self, request: &PromptRequest) -> String {
        if !request.use_feedback() {
            return String::new();
        }
        match (&self.feedback, request.lesson_id()) {
            (Some(feedback), Some(lesson_id)) => feedback.summary_for(lesson_id).await,
            _ => String::new(),
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("engines", &self.engines)
            .field("prompts", &self.prompts)
            .field("external_context", &self.external.is_some())
            .field("feedback", &self.feedback.is_some())
            .finish()
    }
}
