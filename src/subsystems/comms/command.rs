//! Shell command grammar and output rendering.
//!
//! Parsing and rendering are pure so the console loop stays a thin driver.

use crate::subsystems::agents::{Answer, IngestOutcome, SearchOutcome, render_search_results};
use crate::subsystems::memory::MemoryStats;
use crate::subsystems::tools::FetchedPage;

/// Characters of page content shown by `fetch`.
const PAGE_PREVIEW_CHARS: usize = 500;

pub const HELP: &str = "\
Commands:
  ask <question>        Ask a question (uses memory for context)
  ingest <text|url>     Store text, or fetch a URL and store the page
  ingest                Store the last search results or fetched page
  search <query>        Search the web
  fetch <url>           Fetch and display a page
  stats [json]          Show memory statistics
  help                  Show this help
  exit | quit           Leave the assistant";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ask(String),
    /// `None` stores the last displayed content.
    Ingest(Option<String>),
    Search(String),
    Fetch(String),
    Stats { json: bool },
    Help,
    Exit,
    /// Known verb, missing argument. Holds that verb's usage line.
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (verb, args) = match line.split_once(char::is_whitespace) {
            Some((v, rest)) => (v, rest.trim()),
            None => (line, ""),
        };
        let arg = (!args.is_empty()).then(|| args.to_string());

        let cmd = match verb.to_lowercase().as_str() {
            "ask" => arg.map_or(Command::Usage("usage: ask <question>"), Command::Ask),
            "ingest" => Command::Ingest(arg),
            "search" => arg.map_or(Command::Usage("usage: search <query>"), Command::Search),
            "fetch" => arg.map_or(Command::Usage("usage: fetch <url>"), Command::Fetch),
            "stats" => Command::Stats { json: args.eq_ignore_ascii_case("json") },
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => Command::Unknown(other.to_string()),
        };
        Some(cmd)
    }
}

pub fn unknown_hint(verb: &str) -> String {
    format!("unknown command: {verb}. Type 'help' for available commands.")
}

pub fn render_error(err: &impl std::fmt::Display) -> String {
    format!("error: {err}")
}

pub fn render_answer(answer: &Answer) -> String {
    if answer.context_ids.is_empty() {
        answer.text.clone()
    } else {
        format!("{}\n\n[{} memory record(s) used]", answer.text, answer.context_ids.len())
    }
}

pub fn render_ingest(outcome: &IngestOutcome) -> String {
    format!(
        "ingested {} ({} chars) from {}\n  {}",
        outcome.id, outcome.chars, outcome.source, outcome.preview
    )
}

pub fn render_search(query: &str, outcome: &SearchOutcome) -> String {
    if outcome.results.is_empty() {
        return format!("no results for: {query} (via {})", outcome.provider);
    }
    format!(
        "{}\n(type `ingest` to store these results)",
        render_search_results(query, outcome).trim_end()
    )
}

pub fn render_page(page: &FetchedPage) -> String {
    let mut out = String::new();
    if !page.title.is_empty() {
        out.push_str(&format!("Title: {}\n", page.title));
    }
    out.push_str(&format!("URL: {}\n", page.url));

    if !page.success {
        out.push_str(&render_error(&format!("fetch failed: {}", page.message)));
        return out;
    }

    if !page.description.is_empty() {
        out.push_str(&format!("Description: {}\n", page.description));
    }
    let total = page.content.chars().count();
    let preview: String = page.content.chars().take(PAGE_PREVIEW_CHARS).collect();
    out.push('\n');
    out.push_str(&preview);
    if total > PAGE_PREVIEW_CHARS {
        out.push_str("...");
    }
    out.push_str(&format!("\n\n({total} chars; type `ingest` to store this page)"));
    out
}

pub fn render_stats(stats: &MemoryStats, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(stats).unwrap_or_else(|e| render_error(&e));
    }
    format!(
        "record_count: {}\nvector_dimension: {}\nbackend_mode: {}",
        stats.record_count, stats.vector_dimension, stats.backend_mode
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::memory::BackendMode;

    #[test]
    fn parses_verbs_and_arguments() {
        assert_eq!(Command::parse("ask  what is rust? "), Some(Command::Ask("what is rust?".into())));
        assert_eq!(Command::parse("SEARCH tokio"), Some(Command::Search("tokio".into())));
        assert_eq!(Command::parse("fetch https://x.y"), Some(Command::Fetch("https://x.y".into())));
        assert_eq!(Command::parse("ingest some text"), Some(Command::Ingest(Some("some text".into()))));
        assert_eq!(Command::parse("ingest"), Some(Command::Ingest(None)));
        assert_eq!(Command::parse("stats"), Some(Command::Stats { json: false }));
        assert_eq!(Command::parse("stats JSON"), Some(Command::Stats { json: true }));
        assert_eq!(Command::parse("quit"), Some(Command::Exit));
        assert_eq!(Command::parse("exit"), Some(Command::Exit));
        assert_eq!(Command::parse("help"), Some(Command::Help));
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn missing_argument_gives_usage() {
        assert_eq!(Command::parse("ask"), Some(Command::Usage("usage: ask <question>")));
        assert_eq!(Command::parse("search   "), Some(Command::Usage("usage: search <query>")));
        assert_eq!(Command::parse("fetch"), Some(Command::Usage("usage: fetch <url>")));
    }

    #[test]
    fn unknown_verb() {
        assert_eq!(Command::parse("reset all"), Some(Command::Unknown("reset".into())));
        assert!(unknown_hint("reset").contains("help"));
    }

    #[test]
    fn stats_rendered_verbatim() {
        let stats = MemoryStats { record_count: 2, vector_dimension: 384, backend_mode: BackendMode::Remote };
        assert_eq!(render_stats(&stats, false), "record_count: 2\nvector_dimension: 384\nbackend_mode: remote");
        assert!(render_stats(&stats, true).contains("\"backend_mode\": \"remote\""));
    }

    #[test]
    fn failed_page_shows_error_and_title() {
        let mut page = FetchedPage::failed("https://x", "HTTP 404");
        page.title = "Gone".into();
        let out = render_page(&page);
        assert!(out.contains("Title: Gone"));
        assert!(out.contains("error: fetch failed: HTTP 404"));
    }

    #[test]
    fn long_page_is_previewed() {
        let page = FetchedPage {
            url: "https://x".into(),
            title: String::new(),
            description: String::new(),
            content: "a".repeat(600),
            success: true,
            message: String::new(),
        };
        let out = render_page(&page);
        assert!(out.contains(&format!("{}...", "a".repeat(500))));
        assert!(out.contains("600 chars"));
    }
}
