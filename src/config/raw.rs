//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults, so an
//! empty document deserializes to the built-in configuration. The `load`
//! module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub agent: RawAgent,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub memory: RawMemory,
    #[serde(default)]
    pub tools: RawTools,
}

#[derive(Deserialize)]
pub(super) struct RawAgent {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

impl Default for RawAgent {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            prompts_dir: default_prompts_dir(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub ollama: RawOllamaConfig,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            ollama: RawOllamaConfig::default(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_ollama_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            temperature: default_temperature(),
            timeout_seconds: default_ollama_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            temperature: default_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

// ── Memory ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawMemory {
    /// Empty string and absent both mean "ephemeral only".
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_record_chars")]
    pub max_record_chars: usize,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for RawMemory {
    fn default() -> Self {
        Self {
            backend_url: None,
            collection: default_collection(),
            vector_dimension: default_vector_dimension(),
            top_k: default_top_k(),
            max_record_chars: default_max_record_chars(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

// ── Tools ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawTools {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_order")]
    pub search_order: Vec<String>,
    #[serde(default = "RawEndpoint::serpapi")]
    pub serpapi: RawEndpoint,
    #[serde(default = "RawEndpoint::brave")]
    pub brave: RawEndpoint,
    #[serde(default)]
    pub firecrawl: RawFirecrawl,
    #[serde(default)]
    pub fetch: RawFetch,
}

impl Default for RawTools {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            search_order: default_search_order(),
            serpapi: RawEndpoint::serpapi(),
            brave: RawEndpoint::brave(),
            firecrawl: RawFirecrawl::default(),
            fetch: RawFetch::default(),
        }
    }
}

/// Base URL + timeout for a search API. Each provider section has its own
/// default base URL, so a partially specified section keeps it.
#[derive(Deserialize)]
pub(super) struct RawEndpoint {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_tool_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl RawEndpoint {
    fn serpapi() -> Self {
        Self { base_url: Some(SERPAPI_BASE_URL.to_string()), timeout_seconds: default_tool_timeout_seconds() }
    }

    fn brave() -> Self {
        Self { base_url: Some(BRAVE_BASE_URL.to_string()), timeout_seconds: default_tool_timeout_seconds() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawFirecrawl {
    #[serde(default = "default_firecrawl_base_url")]
    pub base_url: String,
    #[serde(default = "default_firecrawl_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub only_main_content: bool,
}

impl Default for RawFirecrawl {
    fn default() -> Self {
        Self {
            base_url: default_firecrawl_base_url(),
            timeout_seconds: default_firecrawl_timeout_seconds(),
            only_main_content: true,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawFetch {
    /// Direct HTTP fetch when Firecrawl is not configured.
    #[serde(default = "default_true")]
    pub direct: bool,
    #[serde(default = "default_tool_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawFetch {
    fn default() -> Self {
        Self { direct: true, timeout_seconds: default_tool_timeout_seconds() }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

pub(super) const SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub(super) const BRAVE_BASE_URL: &str = "https://api.search.brave.com";

pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_prompts_dir() -> String { "config/prompts".to_string() }
pub(super) fn default_llm_provider() -> String { "ollama".to_string() }
pub(super) fn default_model() -> String { "mistral:7b".to_string() }
pub(super) fn default_embedding_model() -> String { "all-minilm".to_string() }
pub(super) fn default_ollama_base_url() -> String { "http://localhost:11434".to_string() }
pub(super) fn default_ollama_timeout_seconds() -> u64 { 120 }
pub(super) fn default_openai_api_base_url() -> String { "https://api.openai.com/v1".to_string() }
pub(super) fn default_openai_timeout_seconds() -> u64 { 60 }
pub(super) fn default_temperature() -> f32 { 0.2 }
pub(super) fn default_collection() -> String { "ollama_cli_agent".to_string() }
pub(super) fn default_vector_dimension() -> usize { 384 }
pub(super) fn default_top_k() -> usize { 4 }
pub(super) fn default_max_record_chars() -> usize { 8000 }
pub(super) fn default_connect_timeout_seconds() -> u64 { 5 }
pub(super) fn default_max_results() -> usize { 5 }
pub(super) fn default_search_order() -> Vec<String> { vec!["serpapi".to_string(), "brave".to_string()] }
pub(super) fn default_firecrawl_base_url() -> String { "https://api.firecrawl.dev".to_string() }
pub(super) fn default_firecrawl_timeout_seconds() -> u64 { 60 }
pub(super) fn default_tool_timeout_seconds() -> u64 { 20 }

fn default_true() -> bool {
    true
}
