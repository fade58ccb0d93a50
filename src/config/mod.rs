//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies environment overrides. Credentials only ever come from the
//! environment.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `LlmConfig`,
//!   `MemoryConfig`, `ToolsConfig`, `Credentials`).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{DEFAULT_CONFIG_PATH, EnvOverrides, defaults, expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Offline configuration: dummy providers, ephemeral memory, no credentials.
    ///
    /// `dimension` sets both the store dimension and the dummy embedder output.
    pub fn offline(dimension: usize) -> Self {
        let mut config = defaults(&EnvOverrides::default());
        config.llm.provider = "dummy".into();
        config.memory.vector_dimension = dimension;
        config
    }

    /// Search providers whose credential is present, in priority order.
    pub fn configured_search_providers(&self) -> Vec<&str> {
        self.tools
            .search_order
            .iter()
            .map(String::as_str)
            .filter(|p| self.credentials.search_key(p).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[agent]
log_level = "warn"

[llm]
default = "ollama"
model = "llama3:8b"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.model, "llama3:8b");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.llm.embedding_model, "all-minilm");
        assert_eq!(cfg.memory.vector_dimension, 384);
        assert_eq!(cfg.memory.top_k, 4);
        assert_eq!(cfg.tools.search_order, vec!["serpapi", "brave"]);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.ollama.base_url, "http://localhost:11434");
        assert!(cfg.memory.backend_url.is_none());
        assert_eq!(cfg.tools.serpapi.base_url, "https://serpapi.com");
        assert_eq!(cfg.tools.brave.base_url, "https://api.search.brave.com");
        assert!(cfg.tools.fetch.enabled);
    }

    #[test]
    fn partial_endpoint_section_keeps_default_base_url() {
        let f = write_toml("[tools.brave]\ntimeout_seconds = 3\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.tools.brave.timeout_seconds, 3);
        assert_eq!(cfg.tools.brave.base_url, "https://api.search.brave.com");
    }

    #[test]
    fn empty_backend_url_means_ephemeral() {
        let f = write_toml("[memory]\nbackend_url = \"\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert!(cfg.memory.backend_url.is_none());
    }

    #[test]
    fn env_memory_url_overrides_file() {
        let f = write_toml("[memory]\nbackend_url = \"http://file:6333\"\n");
        let overrides = EnvOverrides {
            memory_url: Some("http://env:6333".into()),
            ..Default::default()
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.memory.backend_url.as_deref(), Some("http://env:6333"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides { log_level: Some("debug".into()), ..Default::default() };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn zero_dimension_rejected() {
        let f = write_toml("[memory]\nvector_dimension = 0\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("vector_dimension"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn base_chain_merges_tables() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[llm]\nmodel = \"base-model\"\nembedding_model = \"base-embed\"\n",
        )
        .unwrap();
        let overlay = dir.path().join("overlay.toml");
        std::fs::write(&overlay, "[meta]\nbase = \"base.toml\"\n\n[llm]\nmodel = \"overlay-model\"\n").unwrap();

        let cfg = load_from(&overlay, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.llm.model, "overlay-model");
        assert_eq!(cfg.llm.embedding_model, "base-embed");
    }

    #[test]
    fn circular_base_detected() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        std::fs::write(&a, "[meta]\nbase = \"b.toml\"\n").unwrap();
        std::fs::write(&b, "[meta]\nbase = \"a.toml\"\n").unwrap();
        let err = load_from(&a, &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.ollama-agent");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".ollama-agent"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("config/prompts"), PathBuf::from("config/prompts"));
    }

    #[test]
    fn configured_search_providers_follow_order_and_keys() {
        let mut cfg = Config::offline(8);
        assert!(cfg.configured_search_providers().is_empty());

        cfg.credentials.brave_api_key = Some("b".into());
        assert_eq!(cfg.configured_search_providers(), vec!["brave"]);

        cfg.credentials.serpapi_api_key = Some("s".into());
        assert_eq!(cfg.configured_search_providers(), vec!["serpapi", "brave"]);
    }

    #[test]
    fn credentials_debug_hides_values() {
        let creds = Credentials {
            serpapi_api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("set"));
    }
}
