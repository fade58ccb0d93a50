//! Direct page fetch: plain GET, HTML → markdown via `htmd`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::DirectFetchConfig;

use super::{FetchedPage, ToolError, build_client, check_status};

const NAME: &str = "direct";

static TITLE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok());
static META_DESC_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+[^>]*name\s*=\s*["']description["'][^>]*content\s*=\s*["']([^"']*)["']"#).ok()
});
static META_DESC_REV_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+[^>]*content\s*=\s*["']([^"']*)["'][^>]*name\s*=\s*["']description["']"#).ok()
});

#[derive(Debug, Clone)]
pub struct DirectFetch {
    client: reqwest::Client,
}

impl DirectFetch {
    pub fn new(config: &DirectFetchConfig) -> Result<Self, ToolError> {
        Ok(Self { client: build_client(NAME, config.timeout_seconds)? })
    }

    pub async fn fetch(&self, url: &str) -> FetchedPage {
        match self.get(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "direct fetch failed");
                FetchedPage::failed(url, e.to_string())
            }
        }
    }

    async fn get(&self, url: &str) -> Result<FetchedPage, ToolError> {
        debug!(%url, "direct fetch");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::request(NAME, e))?;
        let response = check_status(NAME, response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        if !is_textual(&content_type) {
            return Ok(FetchedPage::failed(url, format!("unsupported content type: {content_type}")));
        }

        let body = response.text().await.map_err(|e| ToolError::request(NAME, e))?;
        Ok(page_from_body(url, &content_type, &body))
    }
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.contains("json")
}

fn page_from_body(url: &str, content_type: &str, body: &str) -> FetchedPage {
    if !content_type.contains("html") {
        let content = body.trim().to_string();
        if content.is_empty() {
            return FetchedPage::failed(url, "empty response body");
        }
        return FetchedPage {
            url: url.to_string(),
            title: String::new(),
            description: String::new(),
            content,
            success: true,
            message: String::new(),
        };
    }

    let title = extract_title(body);
    let description = extract_description(body);
    let converted = htmd::convert(body).map(|md| md.trim().to_string());

    match converted {
        Ok(content) if !content.is_empty() => FetchedPage {
            url: url.to_string(),
            title,
            description,
            content,
            success: true,
            message: String::new(),
        },
        Ok(_) => FetchedPage { title, description, ..FetchedPage::failed(url, "page has no extractable content") },
        Err(e) => FetchedPage {
            title,
            description,
            ..FetchedPage::failed(url, format!("html conversion failed: {e}"))
        },
    }
}

fn capture(re: Option<&Regex>, html: &str) -> Option<String> {
    re?.captures(html)?
        .get(1)
        .map(|m| collapse_whitespace(m.as_str()))
        .filter(|s| !s.is_empty())
}

fn extract_title(html: &str) -> String {
    capture((*TITLE_RE).as_ref(), html).unwrap_or_default()
}

fn extract_description(html: &str) -> String {
    capture((*META_DESC_RE).as_ref(), html)
        .or_else(|| capture((*META_DESC_REV_RE).as_ref(), html))
        .unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
