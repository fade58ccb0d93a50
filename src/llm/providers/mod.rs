//! LLM provider implementations.
//!
//! `build(config, api_key)` and `build_embedder(config, dimension, api_key)`
//! are the factories, called once at startup. The embedding provider follows
//! the generation provider family.
//! Adding a new backend = new module + new match arms.

pub mod dummy;
pub mod ollama;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{EmbeddingProvider, LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "ollama" => {
            let o = &config.ollama;
            let p = ollama::OllamaProvider::new(
                o.base_url.clone(),
                config.model.clone(),
                o.temperature,
                o.timeout_seconds,
            )?;
            Ok(LlmProvider::Ollama(p))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                config.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

/// Construct the `EmbeddingProvider` for the configured provider family.
///
/// `dimension` only matters for the dummy embedder, which produces vectors of
/// exactly that length. Remote models decide their own output size.
pub fn build_embedder(
    config: &LlmConfig,
    dimension: usize,
    api_key: Option<String>,
) -> Result<EmbeddingProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(EmbeddingProvider::Dummy(dummy::DummyEmbedder::new(dimension))),
        "ollama" => {
            let o = &config.ollama;
            let e = ollama::OllamaEmbedder::new(
                o.base_url.clone(),
                config.embedding_model.clone(),
                o.timeout_seconds,
            )?;
            Ok(EmbeddingProvider::Ollama(e))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let e = openai_compatible::OpenAiEmbedder::new(
                oai.api_base_url.clone(),
                config.embedding_model.clone(),
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(EmbeddingProvider::OpenAiCompatible(e))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvOverrides, defaults};

    #[test]
    fn builds_every_known_family() {
        let mut cfg = defaults(&EnvOverrides::default()).llm;
        for (family, name) in [("dummy", "dummy"), ("ollama", "ollama"), ("openai", "openai")] {
            cfg.provider = family.into();
            assert_eq!(build(&cfg, None).unwrap().name(), name);
            assert!(build_embedder(&cfg, 8, None).is_ok());
        }
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut cfg = Config::offline(8).llm;
        cfg.provider = "nope".into();
        assert!(matches!(build(&cfg, None), Err(ProviderError::UnknownProvider(_))));
        assert!(matches!(
            build_embedder(&cfg, 8, None),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn embedding_model_flows_through() {
        let mut cfg = Config::offline(8).llm;
        cfg.provider = "ollama".into();
        cfg.embedding_model = "nomic-embed-text".into();
        let e = build_embedder(&cfg, 8, None).unwrap();
        assert_eq!(e.model(), "nomic-embed-text");
    }
}
