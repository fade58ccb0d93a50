//! Brave Search web search.

use serde::Deserialize;
use tracing::debug;

use crate::config::EndpointConfig;

use super::{SearchResult, ToolError, build_client, check_status};

const NAME: &str = "brave";

#[derive(Debug, Clone)]
pub struct BraveSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BraveSearch {
    pub fn new(config: &EndpointConfig, api_key: String) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_client(NAME, config.timeout_seconds)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolError> {
        debug!(%query, max_results, "brave search");
        let count = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/res/v1/web/search", self.base_url))
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| ToolError::request(NAME, e))?;
        let response = check_status(NAME, response).await?;
        let body: BraveResponse = response.json().await.map_err(|e| ToolError::request(NAME, e))?;

        Ok(body
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult { title: r.title, url: r.url, snippet: r.description })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn provider(url: String) -> BraveSearch {
        BraveSearch::new(&EndpointConfig { base_url: url, timeout_seconds: 5 }, "brave-key".into()).unwrap()
    }

    #[tokio::test]
    async fn sends_token_and_maps_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/res/v1/web/search")
            .match_header("x-subscription-token", "brave-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "qdrant".into()),
                Matcher::UrlEncoded("count".into(), "3".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"type":"search","web":{"results":[
                    {"title":"Qdrant","url":"https://qdrant.tech","description":"Vector database"}
                ]}}"#,
            )
            .create_async()
            .await;

        let results = provider(server.url()).search("qdrant", 3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(
            results,
            vec![SearchResult {
                title: "Qdrant".into(),
                url: "https://qdrant.tech".into(),
                snippet: "Vector database".into(),
            }]
        );
    }

    #[tokio::test]
    async fn no_web_section_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/res/v1/web/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"type":"search"}"#)
            .create_async()
            .await;
        assert!(provider(server.url()).search("q", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_is_request_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/res/v1/web/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;
        let err = provider(server.url()).search("q", 5).await.unwrap_err();
        assert!(matches!(err, ToolError::Request { provider: "brave", .. }));
    }
}
