//! SerpAPI (Google engine) web search.

use serde::Deserialize;
use tracing::debug;

use crate::config::EndpointConfig;

use super::{SearchResult, ToolError, build_client, check_status};

const NAME: &str = "serpapi";

#[derive(Debug, Clone)]
pub struct SerpApiSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpApiSearch {
    pub fn new(config: &EndpointConfig, api_key: String) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_client(NAME, config.timeout_seconds)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolError> {
        debug!(%query, max_results, "serpapi search");
        let num = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ToolError::request(NAME, e))?;
        let response = check_status(NAME, response).await?;
        let body: SerpApiResponse = response.json().await.map_err(|e| ToolError::request(NAME, e))?;

        Ok(body
            .organic_results
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult { title: r.title, url: r.link, snippet: r.snippet })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}
