//! Firecrawl scrape API (`POST /v0/scrape`).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::FirecrawlConfig;

use super::{FetchedPage, ToolError, build_client, check_status};

const NAME: &str = "firecrawl";

#[derive(Debug, Clone)]
pub struct FirecrawlFetch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    only_main_content: bool,
}

impl FirecrawlFetch {
    pub fn new(config: &FirecrawlConfig, api_key: String) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_client(NAME, config.timeout_seconds)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            only_main_content: config.only_main_content,
        })
    }

    pub async fn fetch(&self, url: &str) -> FetchedPage {
        match self.scrape(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "firecrawl scrape failed");
                FetchedPage::failed(url, e.to_string())
            }
        }
    }

    async fn scrape(&self, url: &str) -> Result<FetchedPage, ToolError> {
        debug!(%url, "firecrawl scrape");
        let payload = ScrapeRequest {
            url,
            page_options: PageOptions {
                include_markdown: true,
                include_html: false,
                only_main_content: self.only_main_content,
            },
        };
        let response = self
            .client
            .post(format!("{}/v0/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::request(NAME, e))?;
        let response = check_status(NAME, response).await?;
        let body: ScrapeResponse = response.json().await.map_err(|e| ToolError::request(NAME, e))?;

        let Some(data) = body.data else {
            let reason = body.error.unwrap_or_else(|| "no data returned".into());
            return Ok(FetchedPage::failed(url, reason));
        };

        let metadata = data.metadata.unwrap_or_default();
        let title = metadata.title.unwrap_or_default();
        let description = metadata.description.unwrap_or_default();
        let content = data
            .markdown
            .filter(|m| !m.trim().is_empty())
            .or(data.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Ok(FetchedPage {
                title,
                description,
                ..FetchedPage::failed(url, "page has no extractable content")
            });
        }

        Ok(FetchedPage {
            url: url.to_string(),
            title,
            description,
            content,
            success: true,
            message: String::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    #[serde(rename = "pageOptions")]
    page_options: PageOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOptions {
    include_markdown: bool,
    include_html: bool,
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}
