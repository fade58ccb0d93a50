//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `OLLAMA_AGENT_LOG_LEVEL` / `QDRANT_URL` env overrides.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;
use super::types::non_empty_env;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values taken from the environment rather than the file.
///
/// Tests build this directly instead of mutating process env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub memory_url: Option<String>,
    pub credentials: Credentials,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            log_level: non_empty_env("OLLAMA_AGENT_LOG_LEVEL"),
            memory_url: non_empty_env("QDRANT_URL"),
            credentials: Credentials::from_env(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and the default file does not
/// exist, the built-in defaults are used.
pub fn load(config_path: Option<&Path>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(path, &overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        Ok(resolve(RawConfig::default(), &overrides))
    }
}

/// Internal loader. Accepts an explicit path and overrides.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    let config = resolve(parsed, overrides);
    validate(&config)?;
    Ok(config)
}

/// Turn the raw file shape into the public config.
fn resolve(parsed: RawConfig, overrides: &EnvOverrides) -> Config {
    let log_level = overrides.log_level.clone().unwrap_or(parsed.agent.log_level);

    let backend_url = overrides
        .memory_url
        .clone()
        .or(parsed.memory.backend_url)
        .filter(|u| !u.trim().is_empty());

    let tools = parsed.tools;

    Config {
        log_level,
        log_file: parsed.agent.log_file.filter(|p| !p.is_empty()).map(|p| expand_home(&p)),
        prompts_dir: expand_home(&parsed.agent.prompts_dir),
        llm: LlmConfig {
            provider: parsed.llm.provider,
            model: parsed.llm.model,
            embedding_model: parsed.llm.embedding_model,
            ollama: OllamaConfig {
                base_url: parsed.llm.ollama.base_url,
                temperature: parsed.llm.ollama.temperature,
                timeout_seconds: parsed.llm.ollama.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        memory: MemoryConfig {
            backend_url,
            collection: parsed.memory.collection,
            vector_dimension: parsed.memory.vector_dimension,
            top_k: parsed.memory.top_k,
            max_record_chars: parsed.memory.max_record_chars,
            connect_timeout_seconds: parsed.memory.connect_timeout_seconds,
        },
        tools: ToolsConfig {
            max_results: tools.max_results,
            search_order: tools.search_order,
            serpapi: EndpointConfig {
                base_url: tools.serpapi.base_url.unwrap_or_else(|| raw::SERPAPI_BASE_URL.to_string()),
                timeout_seconds: tools.serpapi.timeout_seconds,
            },
            brave: EndpointConfig {
                base_url: tools.brave.base_url.unwrap_or_else(|| raw::BRAVE_BASE_URL.to_string()),
                timeout_seconds: tools.brave.timeout_seconds,
            },
            firecrawl: FirecrawlConfig {
                base_url: tools.firecrawl.base_url,
                timeout_seconds: tools.firecrawl.timeout_seconds,
                only_main_content: tools.firecrawl.only_main_content,
            },
            fetch: DirectFetchConfig {
                enabled: tools.fetch.direct,
                timeout_seconds: tools.fetch.timeout_seconds,
            },
        },
        credentials: overrides.credentials.clone(),
    }
}

/// Reject values that would make the agent unusable.
fn validate(config: &Config) -> Result<(), AppError> {
    if config.memory.vector_dimension == 0 {
        return Err(AppError::Config("memory.vector_dimension must be > 0".into()));
    }
    if config.memory.top_k == 0 {
        return Err(AppError::Config("memory.top_k must be > 0".into()));
    }
    if config.tools.max_results == 0 {
        return Err(AppError::Config("tools.max_results must be > 0".into()));
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Built-in defaults with the given overrides applied.
pub fn defaults(overrides: &EnvOverrides) -> Config {
    resolve(RawConfig::default(), overrides)
}
