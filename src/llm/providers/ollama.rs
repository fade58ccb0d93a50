//! Local Ollama server: `/api/generate` for completion, `/api/embed` for
//! embeddings, `/api/tags` as the reachability probe.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{LlmResponse, LlmUsage, ProviderError};

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(
        base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let client = build_client(timeout_seconds)?;
        Ok(Self { client, base_url, model, temperature })
    }

    /// Lists local models. Any successful HTTP answer means the server is up.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let client = build_client(5)?;
        let url = endpoint(&self.base_url, "api/tags");
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))?;
        check_status(response).await.map(|_| ())
    }

    /// Single non-streaming generation.
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse, ProviderError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending ollama generate request");
        trace!(%prompt, "full ollama prompt");

        let url = endpoint(&self.base_url, "api/generate");
        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            error!(%url, error = %e, "ollama HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;
        let response = check_status(response).await?;

        let parsed = response.json::<GenerateResponse>().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("failed to parse generate response: {e}"))
        })?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(input_tokens), Some(output_tokens)) => Some(LlmUsage { input_tokens, output_tokens }),
            _ => None,
        };

        Ok(LlmResponse { text: parsed.response.trim().to_string(), usage })
    }
}

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, timeout_seconds: u64) -> Result<Self, ProviderError> {
        let client = build_client(timeout_seconds)?;
        Ok(Self { client, base_url, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let payload = EmbedRequest { model: &self.model, input: texts };
        let url = endpoint(&self.base_url, "api/embed");

        debug!(model = %self.model, inputs = texts.len(), "sending ollama embed request");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        let parsed = response.json::<EmbedResponse>().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("failed to parse embed response: {e}"))
        })?;
        Ok(parsed.embeddings)
    }
}

fn build_client(timeout_seconds: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

// Ollama reports errors as `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(b) => format!("HTTP {status}: {}", b.error),
        Err(_) => format!("HTTP {status}: {body}"),
    };
    error!(%status, %message, "ollama request returned HTTP error");
    Err(ProviderError::Request(message))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn generate_is_non_streaming() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "mistral:7b",
                "prompt": "hi",
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":" hello there ","done":true,"prompt_eval_count":4,"eval_count":2}"#)
            .create_async()
            .await;

        let p = OllamaProvider::new(server.url(), "mistral:7b".into(), 0.2, 5).unwrap();
        let resp = p.complete("hi").await.unwrap();
        mock.assert_async().await;
        assert_eq!(resp.text, "hello there");
        assert_eq!(resp.usage, Some(LlmUsage { input_tokens: 4, output_tokens: 2 }));
    }

    #[tokio::test]
    async fn model_not_found_is_request_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model 'nope' not found"}"#)
            .create_async()
            .await;

        let p = OllamaProvider::new(server.url(), "nope".into(), 0.2, 5).unwrap();
        let err = p.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Request(ref m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn ping_hits_tags() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[]}"#)
            .create_async()
            .await;

        let p = OllamaProvider::new(server.url(), "m".into(), 0.2, 5).unwrap();
        p.ping().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn ping_unreachable_fails() {
        // Port 9 (discard) is closed on test hosts.
        let p = OllamaProvider::new("http://127.0.0.1:9".into(), "m".into(), 0.2, 5).unwrap();
        assert!(p.ping().await.is_err());
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "all-minilm",
                "input": ["a", "b"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"all-minilm","embeddings":[[0.1,0.2],[0.3,0.4]]}"#)
            .create_async()
            .await;

        let e = OllamaEmbedder::new(server.url(), "all-minilm".into(), 5).unwrap();
        let out = e.embed_batch(&["a".into(), "b".into()]).await.unwrap();
        assert_eq!(out, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }
}
