//! Web tools: search providers and page fetchers.
//!
//! Both are closed enums ([`SearchProvider`], [`FetchProvider`]) built once at
//! startup from [`ToolsConfig`] and the environment credentials. Credential
//! presence is checked at construction; a missing key is
//! [`ToolError::Unavailable`], never a runtime surprise.

pub mod brave;
pub mod direct;
pub mod firecrawl;
pub mod serpapi;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::{Credentials, ToolsConfig};

#[derive(Debug, Error)]
pub enum ToolError {
    /// The provider cannot be built (missing credential, unknown name).
    #[error("{0} is not configured")]
    Unavailable(String),
    /// Network, timeout, HTTP status or decode failure.
    #[error("{provider} request failed: {message}")]
    Request { provider: &'static str, message: String },
}

impl ToolError {
    fn request(provider: &'static str, message: impl fmt::Display) -> Self {
        ToolError::Request { provider, message: message.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Result of fetching one page. `message` is non-empty whenever `success`
/// is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub success: bool,
    pub message: String,
}

impl FetchedPage {
    pub fn failed(url: &str, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "fetch failed".into();
        }
        Self {
            url: url.to_string(),
            title: String::new(),
            description: String::new(),
            content: String::new(),
            success: false,
            message,
        }
    }
}

fn build_client(provider: &'static str, timeout_seconds: u64) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("ollama-cli-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ToolError::request(provider, format!("failed to build HTTP client: {e}")))
}

async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();
    Err(ToolError::request(provider, format!("HTTP {status}: {body}")))
}

// ── Search ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SearchProvider {
    SerpApi(serpapi::SerpApiSearch),
    Brave(brave::BraveSearch),
}

impl SearchProvider {
    /// Build a provider by name. Fails with `Unavailable` when its
    /// credential is absent.
    pub fn build(name: &str, config: &ToolsConfig, credentials: &Credentials) -> Result<Self, ToolError> {
        let key = credentials
            .search_key(name)
            .ok_or_else(|| ToolError::Unavailable(name.to_string()))?
            .to_string();
        match name {
            "serpapi" => Ok(SearchProvider::SerpApi(serpapi::SerpApiSearch::new(&config.serpapi, key)?)),
            "brave" => Ok(SearchProvider::Brave(brave::BraveSearch::new(&config.brave, key)?)),
            other => Err(ToolError::Unavailable(other.to_string())),
        }
    }

    /// Build every configured provider in `search_order`, skipping the rest.
    pub fn build_all(config: &ToolsConfig, credentials: &Credentials) -> Vec<Self> {
        config
            .search_order
            .iter()
            .filter_map(|name| match Self::build(name, config, credentials) {
                Ok(p) => Some(p),
                Err(e) => {
                    debug!(provider = %name, error = %e, "search provider skipped");
                    None
                }
            })
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchProvider::SerpApi(_) => "serpapi",
            SearchProvider::Brave(_) => "brave",
        }
    }

    /// Highest relevance first, at most `max_results`.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolError> {
        let mut results = match self {
            SearchProvider::SerpApi(p) => p.search(query, max_results).await,
            SearchProvider::Brave(p) => p.search(query, max_results).await,
        }?;
        results.truncate(max_results);
        Ok(results)
    }
}

// ── Fetch ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum FetchProvider {
    Firecrawl(firecrawl::FirecrawlFetch),
    Direct(direct::DirectFetch),
}

impl FetchProvider {
    /// Firecrawl when its key is present, else direct fetch if enabled.
    pub fn build(config: &ToolsConfig, credentials: &Credentials) -> Result<Self, ToolError> {
        if let Some(key) = &credentials.firecrawl_api_key {
            return Ok(FetchProvider::Firecrawl(firecrawl::FirecrawlFetch::new(
                &config.firecrawl,
                key.clone(),
            )?));
        }
        if config.fetch.enabled {
            return Ok(FetchProvider::Direct(direct::DirectFetch::new(&config.fetch)?));
        }
        Err(ToolError::Unavailable("fetch provider".into()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FetchProvider::Firecrawl(_) => "firecrawl",
            FetchProvider::Direct(_) => "direct",
        }
    }

    /// Never errors; failures come back as `success == false`.
    pub async fn fetch(&self, url: &str) -> FetchedPage {
        match self {
            FetchProvider::Firecrawl(p) => p.fetch(url).await,
            FetchProvider::Direct(p) => p.fetch(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn search_build_requires_key() {
        let cfg = Config::offline(8);
        let err = SearchProvider::build("serpapi", &cfg.tools, &cfg.credentials).unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(ref n) if n == "serpapi"));
        assert!(SearchProvider::build_all(&cfg.tools, &cfg.credentials).is_empty());
    }

    #[test]
    fn build_all_follows_order() {
        let mut cfg = Config::offline(8);
        cfg.credentials.brave_api_key = Some("b".into());
        cfg.credentials.serpapi_api_key = Some("s".into());
        cfg.tools.search_order = vec!["brave".into(), "serpapi".into(), "bing".into()];
        let names: Vec<_> = SearchProvider::build_all(&cfg.tools, &cfg.credentials)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["brave", "serpapi"]);
    }

    #[test]
    fn fetch_prefers_firecrawl() {
        let mut cfg = Config::offline(8);
        assert_eq!(FetchProvider::build(&cfg.tools, &cfg.credentials).unwrap().name(), "direct");

        cfg.credentials.firecrawl_api_key = Some("fc".into());
        assert_eq!(FetchProvider::build(&cfg.tools, &cfg.credentials).unwrap().name(), "firecrawl");
    }

    #[test]
    fn fetch_unavailable_when_direct_disabled() {
        let mut cfg = Config::offline(8);
        cfg.tools.fetch.enabled = false;
        assert!(matches!(
            FetchProvider::build(&cfg.tools, &cfg.credentials),
            Err(ToolError::Unavailable(_))
        ));
    }

    #[test]
    fn failed_page_always_has_message() {
        let page = FetchedPage::failed("https://x", "");
        assert!(!page.success);
        assert!(!page.message.is_empty());
    }
}
