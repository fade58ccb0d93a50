//! Public configuration structs consumed by the agent and its providers.

use std::fmt;
use std::path::PathBuf;

/// Generation / embedding provider configuration (`[llm]`).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider family is active: `"ollama"`, `"openai"` or `"dummy"`.
    /// The embedding provider follows the same family.
    pub provider: String,
    /// Generation model identifier.
    pub model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
}

/// Local Ollama server (`[llm.ollama]`).
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server root, e.g. `http://localhost:11434`.
    pub base_url: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible endpoint (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API root ending in the version segment, e.g. `https://api.openai.com/v1`.
    pub api_base_url: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// Vector memory configuration (`[memory]`).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Remote backend address. `None` means in-process ephemeral only.
    pub backend_url: Option<String>,
    pub collection: String,
    /// Every stored vector must have exactly this many components.
    pub vector_dimension: usize,
    /// Records retrieved per `ask`.
    pub top_k: usize,
    /// Ingested text longer than this is truncated at a char boundary.
    pub max_record_chars: usize,
    pub connect_timeout_seconds: u64,
}

/// A search API endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub only_main_content: bool,
}

#[derive(Debug, Clone)]
pub struct DirectFetchConfig {
    pub enabled: bool,
    pub timeout_seconds: u64,
}

/// Web tools configuration (`[tools]`).
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Results requested from a search provider.
    pub max_results: usize,
    /// Search provider priority, first entry tried first.
    pub search_order: Vec<String>,
    pub serpapi: EndpointConfig,
    pub brave: EndpointConfig,
    pub firecrawl: FirecrawlConfig,
    pub fetch: DirectFetchConfig,
}

/// Provider credentials. Sourced from the environment only, never TOML.
///
/// An empty value counts as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub llm_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub brave_api_key: Option<String>,
    pub firecrawl_api_key: Option<String>,
}

impl Credentials {
    /// Read all credentials from the process environment.
    pub fn from_env() -> Self {
        Self {
            llm_api_key: non_empty_env("LLM_API_KEY"),
            serpapi_api_key: non_empty_env("SERPAPI_API_KEY"),
            brave_api_key: non_empty_env("BRAVE_API_KEY"),
            firecrawl_api_key: non_empty_env("FIRECRAWL_API_KEY"),
        }
    }

    /// Credential for a named search provider, if present.
    pub fn search_key(&self, provider: &str) -> Option<&str> {
        match provider {
            "serpapi" => self.serpapi_api_key.as_deref(),
            "brave" => self.brave_api_key.as_deref(),
            _ => None,
        }
    }
}

// Keys must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = |k: &Option<String>| if k.is_some() { "set" } else { "unset" };
        f.debug_struct("Credentials")
            .field("llm_api_key", &present(&self.llm_api_key))
            .field("serpapi_api_key", &present(&self.serpapi_api_key))
            .field("brave_api_key", &present(&self.brave_api_key))
            .field("firecrawl_api_key", &present(&self.firecrawl_api_key))
            .finish()
    }
}

pub(super) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Write logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Directory holding the prompt templates.
    pub prompts_dir: PathBuf,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub tools: ToolsConfig,
    pub credentials: Credentials,
}
