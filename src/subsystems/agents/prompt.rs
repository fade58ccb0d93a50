//! Layered prompt builder for the agent.
//!
//! Prompts are assembled from plain-text template fragments stored under
//! `config/prompts/`. Each layer is appended in order; missing files are
//! skipped, or replaced by a built-in fallback via [`PromptBuilder::layer_or`].
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.
//! Substituted values are never re-scanned, so a question containing
//! `{{context}}` stays literal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n";

pub const RAG_TEMPLATE: &str = "rag_context.txt";
pub const BARE_TEMPLATE: &str = "bare_question.txt";

const RAG_FALLBACK: &str = "Based on the following context, answer the question.\n\n\
Context:\n{{context}}\n\n\
Question: {{question}}\n\n\
Answer:";
const BARE_FALLBACK: &str = "Question: {{question}}\n\nAnswer:";

/// Fluent builder that assembles a layered prompt from template files.
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// Create a builder rooted at `prompts_dir` (e.g. `"config/prompts"`).
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    fn read_layer(&self, filename: &str) -> Option<String> {
        let path = self.prompts_dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found, skipped", path.display());
                None
            }
        }
    }

    /// Append a layer by loading `filename` from the prompts directory.
    /// Silently skips the layer when the file does not exist.
    pub fn layer(mut self, filename: &str) -> Self {
        if let Some(text) = self.read_layer(filename) {
            self.parts.push(text);
        }
        self
    }

    /// Like [`layer`](Self::layer), but appends `fallback` when the file is
    /// missing or empty.
    pub fn layer_or(self, filename: &str, fallback: &str) -> Self {
        match self.read_layer(filename) {
            Some(text) => {
                let mut this = self;
                this.parts.push(text);
                this
            }
            None => self.append(fallback),
        }
    }

    /// Directly append a text fragment.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim().to_string();
        if !trimmed.is_empty() {
            self.parts.push(trimmed);
        }
        self
    }

    /// Register `{{key}}` → `value` substitution pairs applied at build time.
    pub fn with_vars<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in vars {
            self.vars.insert(k.to_string(), v.to_string());
        }
        self
    }

    /// Register a single variable.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Assemble all layers, join with blank lines, and apply variable
    /// substitution in a single left-to-right pass. Unknown placeholders are
    /// left as they are.
    pub fn build(self) -> String {
        let template = self.parts.join(SEPARATOR);
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match self.vars.get(key.trim()) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("{{");
                            out.push_str(key);
                            out.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Retrieval-augmented prompt: `context` is the joined record texts.
pub fn rag_prompt(prompts_dir: impl AsRef<Path>, context: &str, question: &str) -> String {
    PromptBuilder::new(prompts_dir.as_ref())
        .layer_or(RAG_TEMPLATE, RAG_FALLBACK)
        .var("context", context)
        .var("question", question)
        .build()
}

/// Question-only prompt, used when memory has nothing to offer.
pub fn bare_prompt(prompts_dir: impl AsRef<Path>, question: &str) -> String {
    PromptBuilder::new(prompts_dir.as_ref())
        .layer_or(BARE_TEMPLATE, BARE_FALLBACK)
        .var("question", question)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn missing_dir() -> PathBuf {
        PathBuf::from("/nonexistent/prompts")
    }

    #[test]
    fn builder_assembles_layers_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "first\n").unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        let result = PromptBuilder::new(dir.path()).layer("a.txt").layer("b.txt").build();
        assert_eq!(result, "first\n\nsecond");
    }

    #[test]
    fn builder_skips_missing_file() {
        let result = PromptBuilder::new(missing_dir())
            .layer("nonexistent_file_xyz.md")
            .append("hello")
            .build();
        assert_eq!(result.trim(), "hello");
    }

    #[test]
    fn builder_substitutes_variable() {
        let result = PromptBuilder::new(missing_dir())
            .append("Items: {{items}}")
            .var("items", "item1\nitem2")
            .build();
        assert!(result.contains("item1\nitem2"));
        assert!(!result.contains("{{items}}"));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let result = PromptBuilder::new(missing_dir())
            .append("C: {{context}} Q: {{question}}")
            .with_vars([("context", "ctx"), ("question", "what is {{context}}?")])
            .build();
        assert_eq!(result, "C: ctx Q: what is {{context}}?");
    }

    #[test]
    fn unknown_and_unclosed_placeholders_survive() {
        let result = PromptBuilder::new(missing_dir())
            .append("{{nope}} and {{open")
            .build();
        assert_eq!(result, "{{nope}} and {{open");
    }

    #[test]
    fn layer_or_uses_file_when_present() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(BARE_TEMPLATE), "Q={{question}}").unwrap();
        assert_eq!(bare_prompt(dir.path(), "why"), "Q=why");
    }

    #[test]
    fn fallbacks_apply_without_files() {
        let rag = rag_prompt(missing_dir(), "Paris is in France.", "Where is Paris?");
        assert!(rag.contains("Context:\nParis is in France."));
        assert!(rag.contains("Question: Where is Paris?"));

        let bare = bare_prompt(missing_dir(), "Where is Paris?");
        assert_eq!(bare, "Question: Where is Paris?\n\nAnswer:");
        assert!(!bare.contains("Context"));
    }
}
