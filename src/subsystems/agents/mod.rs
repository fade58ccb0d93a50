//! Agent orchestrator: composes generation, embedding, memory and web tools
//! into the operations the shell exposes.
//!
//! [`Agent`] is the session context. It is built once at startup from
//! [`Config`], owns every provider and the memory handle, and remembers the
//! last content it displayed so `ingest` with no argument can store it.
//!
//! Failures of any one dependency are absorbed where the operation allows it:
//! `ask` falls back to a bare prompt when retrieval fails, `search` moves on
//! to the next provider, `fetch` reports failure inside the page.

pub mod prompt;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::{EmbeddingProvider, LlmProvider, providers};
use crate::subsystems::memory::{MemoryRecord, MemoryStats, MemoryStore, RecordKind, RecordMetadata};
use crate::subsystems::tools::{FetchProvider, FetchedPage, SearchProvider, SearchResult};

/// Maximum characters in an ingest preview.
pub const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("generation failed: {0}")]
    ProviderError(String),
    #[error("embedding failed: {0}")]
    EmbeddingError(String),
    #[error("ingest failed: {0}")]
    IngestError(String),
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),
    #[error("memory backend error: {0}")]
    MemoryBackendError(String),
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub id: String,
    /// First [`PREVIEW_CHARS`] characters of the stored text.
    pub preview: String,
    pub source: String,
    /// Characters stored, after truncation.
    pub chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Ids of the records used as context, most similar first.
    pub context_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub provider: String,
    pub results: Vec<SearchResult>,
}

/// Content the shell most recently showed the user.
#[derive(Debug, Clone)]
enum Displayed {
    Page(FetchedPage),
    Search { query: String, outcome: SearchOutcome },
}

/// Tunables taken from [`Config`].
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub prompts_dir: PathBuf,
    pub top_k: usize,
    pub max_record_chars: usize,
    pub max_results: usize,
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prompts_dir: config.prompts_dir.clone(),
            top_k: config.memory.top_k,
            max_record_chars: config.memory.max_record_chars,
            max_results: config.tools.max_results,
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

pub struct Agent {
    llm: LlmProvider,
    embedder: EmbeddingProvider,
    memory: MemoryStore,
    search_providers: Vec<SearchProvider>,
    fetcher: Option<FetchProvider>,
    settings: AgentSettings,
    last_displayed: Option<Displayed>,
}

impl Agent {
    pub fn new(
        llm: LlmProvider,
        embedder: EmbeddingProvider,
        memory: MemoryStore,
        search_providers: Vec<SearchProvider>,
        fetcher: Option<FetchProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            llm,
            embedder,
            memory,
            search_providers,
            fetcher,
            settings,
            last_displayed: None,
        }
    }

    /// Build every collaborator from config. The memory store never fails
    /// to build; an unknown provider family does.
    pub async fn from_config(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.credentials.llm_api_key.clone();
        let llm = providers::build(&config.llm, api_key.clone())
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;
        let embedder = providers::build_embedder(&config.llm, config.memory.vector_dimension, api_key)
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let memory = MemoryStore::connect(&config.memory).await;
        let search_providers = SearchProvider::build_all(&config.tools, &config.credentials);
        let fetcher = match FetchProvider::build(&config.tools, &config.credentials) {
            Ok(f) => Some(f),
            Err(e) => {
                info!(error = %e, "fetch disabled");
                None
            }
        };

        info!(
            llm = llm.name(),
            model = %config.llm.model,
            embedding_model = embedder.model(),
            memory = %memory.mode(),
            search = ?search_providers.iter().map(SearchProvider::name).collect::<Vec<_>>(),
            fetch = fetcher.as_ref().map(FetchProvider::name).unwrap_or("none"),
            "agent ready"
        );

        Ok(Self::new(
            llm,
            embedder,
            memory,
            search_providers,
            fetcher,
            AgentSettings::from_config(config),
        ))
    }

    /// Startup reachability check for the generation provider.
    pub async fn ping(&self) -> Result<(), AgentError> {
        self.llm
            .ping()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(format!("{}: {e}", self.llm.name())))
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    // ── ingest ────────────────────────────────────────────────────────────────

    /// Store `input` as one record. An `http`/`https` URL is fetched first
    /// and its page content stored instead.
    pub async fn ingest(&self, input: &str) -> Result<IngestOutcome, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::IngestError("nothing to ingest".into()));
        }

        let Some(url) = parse_web_url(input) else {
            return self
                .store_text(input, RecordMetadata::now("user", RecordKind::Text))
                .await;
        };

        let page = self.fetch_page(url.as_str()).await;
        if !page.success {
            return Err(AgentError::IngestError(format!("could not fetch {url}: {}", page.message)));
        }
        self.store_page(&page).await
    }

    /// Store whatever `search` or `fetch` last displayed.
    pub async fn ingest_last(&mut self) -> Result<IngestOutcome, AgentError> {
        let outcome = match &self.last_displayed {
            None => {
                return Err(AgentError::IngestError(
                    "nothing to ingest: run `search` or `fetch` first".into(),
                ));
            }
            Some(Displayed::Page(page)) => self.store_page(page).await?,
            Some(Displayed::Search { query, outcome }) => {
                let text = render_search_results(query, outcome);
                let meta = RecordMetadata::now(format!("search:{query}"), RecordKind::SearchResults);
                self.store_text(&text, meta).await?
            }
        };
        self.last_displayed = None;
        Ok(outcome)
    }

    async fn store_page(&self, page: &FetchedPage) -> Result<IngestOutcome, AgentError> {
        let title = Some(page.title.clone());
        let meta = RecordMetadata::now(page.url.clone(), RecordKind::WebPage)
            .with_url(page.url.clone())
            .with_title(title);
        self.store_text(&page.content, meta).await
    }

    async fn store_text(&self, text: &str, metadata: RecordMetadata) -> Result<IngestOutcome, AgentError> {
        let text = truncate_chars(text.trim(), self.settings.max_record_chars);
        if text.is_empty() {
            return Err(AgentError::IngestError("content is empty".into()));
        }

        let vector = self
            .embedder
            .embed(&text)
            .await
            .map_err(|e| AgentError::EmbeddingError(e.to_string()))?;

        let source = metadata.source.clone();
        let chars = text.chars().count();
        let preview = truncate_chars(&text, PREVIEW_CHARS);
        let id = self
            .memory
            .add(text, vector, metadata)
            .await
            .map_err(|e| AgentError::IngestError(e.to_string()))?;

        info!(%id, %source, chars, "ingested");
        Ok(IngestOutcome { id, preview, source, chars })
    }

    // ── ask ───────────────────────────────────────────────────────────────────

    /// Answer `question`, grounding the prompt in the most similar records
    /// when memory has any.
    pub async fn ask(&self, question: &str) -> Result<Answer, AgentError> {
        let context = self.retrieve(question).await;
        let context_ids: Vec<String> = context.iter().map(|r| r.id.clone()).collect();

        let prompt = if context.is_empty() {
            prompt::bare_prompt(&self.settings.prompts_dir, question)
        } else {
            let block = context
                .iter()
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            prompt::rag_prompt(&self.settings.prompts_dir, &block, question)
        };
        debug!(context_records = context_ids.len(), prompt_len = prompt.len(), "ask");

        let response = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| AgentError::ProviderError(e.to_string()))?;

        if let Some(usage) = &response.usage {
            debug!(input_tokens = usage.input_tokens, output_tokens = usage.output_tokens, "llm usage");
        }

        Ok(Answer { text: response.text, context_ids })
    }

    /// Top-k records for `question`. Any failure yields no context.
    async fn retrieve(&self, question: &str) -> Vec<MemoryRecord> {
        let vector = match self.embedder.embed(question).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "question embedding failed, answering without context");
                return Vec::new();
            }
        };
        match self.memory.search(&vector, self.settings.top_k, None).await {
            Ok(hits) => hits.into_iter().map(|(record, _score)| record).collect(),
            Err(e) => {
                warn!(error = %e, "memory query failed, answering without context");
                Vec::new()
            }
        }
    }

    // ── search / fetch / stats ────────────────────────────────────────────────

    /// Try each configured provider in priority order. The first provider
    /// with results wins and its results are returned as-is. An empty answer
    /// moves on to the next provider and is returned only when no later
    /// provider finds anything.
    pub async fn search(&mut self, query: &str) -> Result<SearchOutcome, AgentError> {
        if self.search_providers.is_empty() {
            return Err(AgentError::SearchUnavailable(
                "no search provider configured (set SERPAPI_API_KEY or BRAVE_API_KEY)".into(),
            ));
        }

        let mut empty: Option<SearchOutcome> = None;
        let mut failures = Vec::new();
        for provider in &self.search_providers {
            match provider.search(query, self.settings.max_results).await {
                Ok(results) if results.is_empty() => {
                    debug!(provider = provider.name(), "search returned nothing, trying next");
                    empty.get_or_insert_with(|| SearchOutcome {
                        provider: provider.name().to_string(),
                        results,
                    });
                }
                Ok(results) => {
                    debug!(provider = provider.name(), count = results.len(), "search succeeded");
                    let outcome = SearchOutcome { provider: provider.name().to_string(), results };
                    self.last_displayed = Some(Displayed::Search {
                        query: query.to_string(),
                        outcome: outcome.clone(),
                    });
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "search provider failed, trying next");
                    failures.push(e.to_string());
                }
            }
        }

        empty.ok_or_else(|| {
            AgentError::SearchUnavailable(format!("all search providers failed: {}", failures.join("; ")))
        })
    }

    /// Fetch a page. Never fails; problems are reported inside the page.
    pub async fn fetch(&mut self, url: &str) -> FetchedPage {
        let url = url.trim();
        let page = match parse_web_url(url) {
            Some(parsed) => self.fetch_page(parsed.as_str()).await,
            None => FetchedPage::failed(url, "not an http(s) URL"),
        };
        if page.success {
            self.last_displayed = Some(Displayed::Page(page.clone()));
        }
        page
    }

    async fn fetch_page(&self, url: &str) -> FetchedPage {
        match &self.fetcher {
            Some(f) => f.fetch(url).await,
            None => FetchedPage::failed(url, "no fetch provider configured"),
        }
    }

    pub async fn stats(&self) -> Result<MemoryStats, AgentError> {
        self.memory
            .stats()
            .await
            .map_err(|e| AgentError::MemoryBackendError(e.to_string()))
    }
}

/// `Some` only for absolute `http`/`https` URLs with a host.
fn parse_web_url(input: &str) -> Option<url::Url> {
    if input.contains(char::is_whitespace) {
        return None;
    }
    url::Url::parse(input)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}

/// First `max` characters of `s`, never splitting a char.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Plain-text rendering of search results, used for display and ingest.
pub fn render_search_results(query: &str, outcome: &SearchOutcome) -> String {
    let mut out = format!("Search results for: {query} (via {})\n", outcome.provider);
    for (i, r) in outcome.results.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n", i + 1, r.title, r.url));
        if !r.snippet.is_empty() {
            out.push_str(&format!("   {}\n", r.snippet));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::{DummyEmbedder, DummyProvider};

    fn settings(max_record_chars: usize) -> AgentSettings {
        AgentSettings {
            prompts_dir: PathBuf::from("/nonexistent/prompts"),
            top_k: 4,
            max_record_chars,
            max_results: 5,
        }
    }

    fn offline_agent(max_record_chars: usize) -> Agent {
        Agent::new(
            LlmProvider::Dummy(DummyProvider),
            EmbeddingProvider::Dummy(DummyEmbedder::new(32)),
            MemoryStore::ephemeral(32),
            Vec::new(),
            None,
            settings(max_record_chars),
        )
    }

    #[test]
    fn web_url_detection() {
        assert!(parse_web_url("https://example.com/a?b=c").is_some());
        assert!(parse_web_url("http://localhost:8080").is_some());
        assert!(parse_web_url("ftp://example.com").is_none());
        assert!(parse_web_url("example.com").is_none());
        assert!(parse_web_url("https://example.com is great").is_none());
        assert!(parse_web_url("mailto:a@b.c").is_none());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("日本語", 1), "日");
    }

    #[tokio::test]
    async fn ingest_text_returns_outcome() {
        let agent = offline_agent(8000);
        let out = agent.ingest("  Paris is the capital of France.  ").await.unwrap();
        assert_eq!(out.source, "user");
        assert_eq!(out.preview, "Paris is the capital of France.");
        assert_eq!(out.chars, 31);
        assert_eq!(agent.stats().await.unwrap().record_count, 1);
    }

    #[tokio::test]
    async fn ingest_truncates_long_text() {
        let agent = offline_agent(10);
        let out = agent.ingest(&"é".repeat(50)).await.unwrap();
        assert_eq!(out.chars, 10);
    }

    #[tokio::test]
    async fn preview_is_capped() {
        let agent = offline_agent(8000);
        let out = agent.ingest(&"word ".repeat(100)).await.unwrap();
        assert!(out.preview.chars().count() <= PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn ingest_empty_is_error() {
        let agent = offline_agent(8000);
        assert!(matches!(agent.ingest("   ").await, Err(AgentError::IngestError(_))));
    }

    #[tokio::test]
    async fn ingest_url_without_fetcher_stores_nothing() {
        let agent = offline_agent(8000);
        let err = agent.ingest("https://example.com").await.unwrap_err();
        assert!(matches!(err, AgentError::IngestError(_)));
        assert_eq!(agent.stats().await.unwrap().record_count, 0);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_ingest_error() {
        let agent = Agent::new(
            LlmProvider::Dummy(DummyProvider),
            EmbeddingProvider::Dummy(DummyEmbedder::new(16)),
            MemoryStore::ephemeral(32),
            Vec::new(),
            None,
            settings(8000),
        );
        let err = agent.ingest("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::IngestError(ref m) if m.contains("dimension")));
    }

    #[tokio::test]
    async fn ask_empty_store_uses_bare_prompt() {
        let agent = offline_agent(8000);
        let answer = agent.ask("Where is Paris?").await.unwrap();
        assert!(answer.context_ids.is_empty());
        assert_eq!(answer.text, "[echo] Question: Where is Paris?\n\nAnswer:");
    }

    #[tokio::test]
    async fn ask_with_memory_includes_context() {
        let agent = offline_agent(8000);
        let stored = agent.ingest("Paris is the capital of France.").await.unwrap();
        let answer = agent.ask("What is the capital of France?").await.unwrap();
        assert_eq!(answer.context_ids, vec![stored.id]);
        assert!(answer.text.contains("Context:\nParis is the capital of France."));
        assert!(answer.text.contains("Question: What is the capital of France?"));
    }

    #[tokio::test]
    async fn ask_with_broken_retrieval_falls_back() {
        // Embedder output never matches the store, so every query fails.
        let agent = Agent::new(
            LlmProvider::Dummy(DummyProvider),
            EmbeddingProvider::Dummy(DummyEmbedder::new(8)),
            MemoryStore::ephemeral(32),
            Vec::new(),
            None,
            settings(8000),
        );
        let answer = agent.ask("anything?").await.unwrap();
        assert!(answer.context_ids.is_empty());
        assert!(!answer.text.contains("Context"));
    }

    #[tokio::test]
    async fn search_without_providers_is_unavailable() {
        let mut agent = offline_agent(8000);
        assert!(matches!(agent.search("rust").await, Err(AgentError::SearchUnavailable(_))));
    }

    #[tokio::test]
    async fn fetch_without_provider_reports_failure() {
        let mut agent = offline_agent(8000);
        let page = agent.fetch("https://example.com").await;
        assert!(!page.success);
        assert_eq!(page.message, "no fetch provider configured");

        let page = agent.fetch("not a url").await;
        assert!(!page.success);
        assert!(!page.message.is_empty());
    }

    #[tokio::test]
    async fn ingest_last_with_nothing_displayed() {
        let mut agent = offline_agent(8000);
        assert!(matches!(agent.ingest_last().await, Err(AgentError::IngestError(_))));
    }

    #[test]
    fn search_rendering_lists_results() {
        let outcome = SearchOutcome {
            provider: "brave".into(),
            results: vec![SearchResult {
                title: "Tokio".into(),
                url: "https://tokio.rs".into(),
                snippet: "An async runtime".into(),
            }],
        };
        let text = render_search_results("tokio", &outcome);
        assert!(text.starts_with("Search results for: tokio (via brave)"));
        assert!(text.contains("1. Tokio\n   https://tokio.rs\n   An async runtime"));
    }
}
