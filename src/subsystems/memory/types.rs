//! Record and statistics types owned by the memory store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of content a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Text,
    WebPage,
    SearchResults,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Text => "text",
            RecordKind::WebPage => "web_page",
            RecordKind::SearchResults => "search_results",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Where the text came from: a URL, `"user"`, or `"search:<query>"`.
    pub source: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RecordMetadata {
    /// Metadata stamped with the current time.
    pub fn now(source: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            source: source.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            url: None,
            title: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.is_empty());
        self
    }
}

/// A stored record. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    /// v4 UUID string.
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Input to [`MemoryStore::add_batch`](super::MemoryStore::add_batch).
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Exact-match search filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    pub source: Option<String>,
    pub kind: Option<RecordKind>,
}

impl MemoryFilter {
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        self.source.as_ref().is_none_or(|s| *s == metadata.source)
            && self.kind.is_none_or(|k| k == metadata.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.kind.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Ephemeral,
    Remote,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Ephemeral => f.write_str("ephemeral"),
            BackendMode::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub record_count: u64,
    pub vector_dimension: usize,
    pub backend_mode: BackendMode,
}
