//! LLM provider abstraction.
//!
//! Two capabilities live here: text generation ([`LlmProvider`]) and text
//! embedding ([`EmbeddingProvider`]). Both are enums over concrete provider
//! implementations; add a new variant + module in `providers/` for each
//! additional backend.
//!
//! Provider instances are shared immutable capabilities: clone them freely.
//! Async is delegated to the underlying provider; the methods are `async fn`
//! on the enums so callers need no trait-object machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    /// The backend answered but the payload was unusable.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Token counts reported by the backend, when it reports them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

// ── Generation provider enum ─────────────────────────────────────────────────

/// All available generation backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Ollama(providers::ollama::OllamaProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `prompt` to the provider and return its text reply.
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(prompt).await,
            LlmProvider::Ollama(p) => p.complete(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(prompt, None).await,
        }
    }

    /// Reachability probe used at startup.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) => Ok(()),
            LlmProvider::Ollama(p) => p.ping().await,
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Ollama(_) => "ollama",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}

// ── Embedding provider enum ──────────────────────────────────────────────────

/// All available embedding backends. Mirrors [`LlmProvider`].
#[derive(Debug, Clone)]
pub enum EmbeddingProvider {
    Dummy(providers::dummy::DummyEmbedder),
    Ollama(providers::ollama::OllamaEmbedder),
    OpenAiCompatible(providers::openai_compatible::OpenAiEmbedder),
}

impl EmbeddingProvider {
    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match vectors.pop() {
            Some(v) if vectors.is_empty() => Ok(v),
            _ => Err(ProviderError::InvalidResponse(
                "expected exactly one embedding".into(),
            )),
        }
    }

    /// Embed several texts in one call. Output order matches input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let vectors = match self {
            EmbeddingProvider::Dummy(p) => Ok(p.embed_batch(texts)),
            EmbeddingProvider::Ollama(p) => p.embed_batch(texts).await,
            EmbeddingProvider::OpenAiCompatible(p) => p.embed_batch(texts).await,
        }?;
        if vectors.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    pub fn model(&self) -> &str {
        match self {
            EmbeddingProvider::Dummy(_) => "dummy",
            EmbeddingProvider::Ollama(p) => p.model(),
            EmbeddingProvider::OpenAiCompatible(p) => p.model(),
        }
    }
}
