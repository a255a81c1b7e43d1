//! Engine registry
//!
//! Maps engine names (and their aliases) to provider factories. Alias
//! resolution is a plain table lookup and happens before any factory is
//! touched, so an unknown engine never reaches the network.

use crate::providers::{GigaChatConfig, GigaChatFactory, HuggingFaceConfig, HuggingFaceFactory};
use crate::{LLMError, Result, TextGenerator};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[cfg(test)]
use mockall::automock;

/// Canonical name of the GigaChat engine
pub const GIGACHAT_ENGINE: &str = "gigachat";
/// Canonical name of the HuggingFace Inference engine
pub const HUGGINGFACE_ENGINE: &str = "hf_api";

/// Produces live clients for one provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Model ids the provider can serve right now
    async fn available_models(&self) -> Result<Vec<String>>;

    /// Create a client bound to `model`
    fn create(&self, model: &str) -> Result<Arc<dyn TextGenerator>>;
}

/// A registered engine
#[derive(Clone)]
pub struct ProviderDescriptor {
    name: String,
    aliases: Vec<String>,
    factory: Arc<dyn ProviderFactory>,
}

impl ProviderDescriptor {
    /// Describe an engine by canonical name and factory
    pub fn new(name: impl Into<String>, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            factory,
        }
    }

    /// Add an alternate name for this engine
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Canonical engine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The engine's factory
    pub fn factory(&self) -> &Arc<dyn ProviderFactory> {
        &self.factory
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`EngineRegistry::resolve`]
#[derive(Clone)]
pub struct ResolvedEngine {
    /// Canonical engine name
    pub engine: String,
    /// Concrete model the client is bound to
    pub model: String,
    /// The live client
    pub generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for ResolvedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEngine")
            .field("engine", &self.engine)
            .field("model", &self.model)
            .field("provider", &self.generator.name())
            .finish()
    }
}

/// Models offered by one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineModels {
    /// Canonical engine name
    pub engine: String,
    /// Available model ids
    pub models: Vec<String>,
}

/// Registry of engines, read-only once built
#[derive(Debug, Default, Clone)]
pub struct EngineRegistry {
    engines: Vec<ProviderDescriptor>,
    lookup: HashMap<String, usize>,
}

impl EngineRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with GigaChat and HuggingFace and their usual aliases
    pub fn with_default_providers(
        gigachat: GigaChatConfig,
        huggingface: HuggingFaceConfig,
    ) -> Result<Self> {
        let giga = ProviderDescriptor::new(GIGACHAT_ENGINE, Arc::new(GigaChatFactory::new(gigachat)?))
            .alias("lc_giga")
            .alias("lc_gc")
            .alias("giga");
        let hf = ProviderDescriptor::new(
            HUGGINGFACE_ENGINE,
            Arc::new(HuggingFaceFactory::new(huggingface)?),
        )
        .alias("lc_hf")
        .alias("hf")
        .alias("huggingface");

        Ok(Self::new().register(giga).register(hf))
    }

    /// Default providers configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::with_default_providers(GigaChatConfig::from_env(), HuggingFaceConfig::from_env())
    }

    /// Add an engine. A later registration wins on name clashes.
    pub fn register(mut self, descriptor: ProviderDescriptor) -> Self {
        let index = self.engines.len();
        self.lookup.insert(normalize(descriptor.name()), index);
        for alias in descriptor.aliases() {
            self.lookup.insert(normalize(alias), index);
        }
        self.engines.push(descriptor);
        self
    }

    /// Canonical names of all registered engines, in registration order
    pub fn engines(&self) -> Vec<&str> {
        self.engines.iter().map(ProviderDescriptor::name).collect()
    }

    /// Find the descriptor for an engine name or alias
    pub fn descriptor(&self, engine: &str) -> Result<&ProviderDescriptor> {
        self.lookup
            .get(&normalize(engine))
            .map(|&index| &self.engines[index])
            .ok_or_else(|| LLMError::UnsupportedEngine(engine.to_string()))
    }

    /// Canonical name for an engine name or alias
    pub fn canonical(&self, engine: &str) -> Result<&str> {
        self.descriptor(engine).map(ProviderDescriptor::name)
    }

    /// Resolve an engine to a live client and a concrete model.
    ///
    /// `preferred` is used when the provider lists it, otherwise the first
    /// available model is chosen.
    #[instrument(skip(self))]
    pub async fn resolve(&self, engine: &str, preferred: Option<&str>) -> Result<ResolvedEngine> {
        let descriptor = self.descriptor(engine)?;
        let models = descriptor.factory().available_models().await?;

        let model = match preferred {
            Some(wanted) if models.iter().any(|m| m == wanted) => wanted.to_string(),
            _ => {
                let first = models
                    .into_iter()
                    .next()
                    .ok_or_else(|| LLMError::NoModelsAvailable(descriptor.name().to_string()))?;
                if let Some(wanted) = preferred {
                    warn!(engine = descriptor.name(), wanted, chosen = %first, "preferred model unavailable");
                }
                first
            }
        };

        debug!(engine = descriptor.name(), model = %model, "engine resolved");
        let generator = descriptor.factory().create(&model)?;

        Ok(ResolvedEngine {
            engine: descriptor.name().to_string(),
            model,
            generator,
        })
    }

    /// Models of every engine; an engine whose listing fails is skipped
    pub async fn list_models(&self) -> Vec<EngineModels> {
        let listings = self.engines.iter().map(|descriptor| async move {
            match descriptor.factory().available_models().await {
                Ok(models) => Some(EngineModels {
                    engine: descriptor.name().to_string(),
                    models,
                }),
                Err(e) => {
                    warn!(engine = descriptor.name(), error = %e, "model listing failed");
                    None
                }
            }
        });

        futures::future::join_all(listings)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockTextGenerator;

    fn generator_named(name: &'static str) -> Arc<dyn TextGenerator> {
        let mut generator = MockTextGenerator::new();
        generator.expect_name().return_const(name);
        Arc::new(generator)
    }

    fn factory(provider: &'static str, models: &'static [&'static str]) -> MockProviderFactory {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_available_models()
            .returning(move || Ok(models.iter().map(ToString::to_string).collect()));
        factory
            .expect_create()
            .returning(move |_| Ok(generator_named(provider)));
        factory
    }

    fn registry() -> EngineRegistry {
        EngineRegistry::new()
            .register(
                ProviderDescriptor::new(
                    GIGACHAT_ENGINE,
                    Arc::new(factory("gigachat", &["GigaChat", "GigaChat-Pro"])),
                )
                .alias("lc_giga")
                .alias("lc_gc"),
            )
            .register(
                ProviderDescriptor::new(HUGGINGFACE_ENGINE, Arc::new(factory("hf_api", &["mistral"])))
                    .alias("lc_hf"),
            )
    }

    #[tokio::test]
    async fn test_aliases_resolve_like_canonical() {
        let registry = registry();

        for (alias, canonical) in [
            ("lc_giga", GIGACHAT_ENGINE),
            ("lc_gc", GIGACHAT_ENGINE),
            ("lc_hf", HUGGINGFACE_ENGINE),
        ] {
            let via_alias = registry.resolve(alias, None).await.unwrap();
            let direct = registry.resolve(canonical, None).await.unwrap();
            assert_eq!(via_alias.engine, direct.engine);
            assert_eq!(via_alias.model, direct.model);
            assert_eq!(via_alias.generator.name(), direct.generator.name());
        }
    }

    #[tokio::test]
    async fn test_unknown_engine_touches_no_factory() {
        let mut untouched = MockProviderFactory::new();
        untouched.expect_available_models().times(0);
        untouched.expect_create().times(0);

        let registry = EngineRegistry::new()
            .register(ProviderDescriptor::new(GIGACHAT_ENGINE, Arc::new(untouched)));

        let err = registry.resolve("bogus", None).await.unwrap_err();
        assert!(matches!(err, LLMError::UnsupportedEngine(ref name) if name == "bogus"));
    }

    #[tokio::test]
    async fn test_preferred_model_selection() {
        let registry = registry();

        let chosen = registry
            .resolve("gigachat", Some("GigaChat-Pro"))
            .await
            .unwrap();
        assert_eq!(chosen.model, "GigaChat-Pro");

        let fallback = registry
            .resolve("gigachat", Some("GigaChat-Max"))
            .await
            .unwrap();
        assert_eq!(fallback.model, "GigaChat");
    }

    #[tokio::test]
    async fn test_no_models_available() {
        let mut empty = MockProviderFactory::new();
        empty.expect_available_models().returning(|| Ok(Vec::new()));
        empty.expect_create().times(0);

        let registry =
            EngineRegistry::new().register(ProviderDescriptor::new("hf_api", Arc::new(empty)));

        let err = registry.resolve("hf_api", None).await.unwrap_err();
        assert!(matches!(err, LLMError::NoModelsAvailable(ref e) if e == "hf_api"));
    }

    #[tokio::test]
    async fn test_list_models_skips_failing_engine() {
        let mut broken = MockProviderFactory::new();
        broken
            .expect_available_models()
            .returning(|| Err(LLMError::request_failed("gigachat", Some(401), "bad creds")));

        let registry = EngineRegistry::new()
            .register(ProviderDescriptor::new(GIGACHAT_ENGINE, Arc::new(broken)))
            .register(ProviderDescriptor::new(
                HUGGINGFACE_ENGINE,
                Arc::new(factory("hf_api", &["mistral"])),
            ));

        let listed = registry.list_models().await;
        assert_eq!(
            listed,
            vec![EngineModels {
                engine: "hf_api".to_string(),
                models: vec!["mistral".to_string()],
            }]
        );
    }

    #[test]
    fn test_canonical_lookup_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.canonical(" LC_GIGA ").unwrap(), GIGACHAT_ENGINE);
        assert_eq!(registry.engines(), vec![GIGACHAT_ENGINE, HUGGINGFACE_ENGINE]);
    }

    #[test]
    fn test_default_providers_register_aliases() {
        let registry = EngineRegistry::with_default_providers(
            GigaChatConfig::default(),
            HuggingFaceConfig::default(),
        )
        .unwrap();

        assert_eq!(registry.canonical("lc_giga").unwrap(), GIGACHAT_ENGINE);
        assert_eq!(registry.canonical("lc_gc").unwrap(), GIGACHAT_ENGINE);
        assert_eq!(registry.canonical("lc_hf").unwrap(), HUGGINGFACE_ENGINE);
        assert!(registry.canonical("bogus").is_err());
    }
}
