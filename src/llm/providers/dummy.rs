//! Dummy providers for offline runs and tests.
//!
//! [`DummyProvider`] echoes its input back prefixed with `[echo]`.
//! [`DummyEmbedder`] hashes word tokens into a fixed-size vector, so texts
//! that share words land close together under cosine similarity.

use crate::llm::{LlmResponse, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, content: &str) -> Result<LlmResponse, ProviderError> {
        Ok(LlmResponse { text: format!("[echo] {content}"), usage: None })
    }
}

/// Deterministic hashed bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct DummyEmbedder {
    dimension: usize,
}

impl DummyEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    pub fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let idx = (fnv1a(&token.to_lowercase()) % self.dimension as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
