//! `remote` backend: Qdrant over its REST API.
//!
//! One collection per configured name, cosine distance, fixed vector size.
//! Points carry the record text and metadata as payload.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::super::MemoryError;
use super::super::types::{MemoryFilter, MemoryRecord, RecordMetadata};

/// Points per upsert request.
pub const UPSERT_CHUNK: usize = 100;

pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect and make sure the collection exists with the right shape.
    ///
    /// An existing collection with a different vector size is an error.
    pub async fn connect(
        base_url: &str,
        collection: &str,
        dimension: usize,
        timeout_seconds: u64,
    ) -> Result<Self, MemoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| MemoryError::Backend(format!("failed to build HTTP client: {e}")))?;
        let store = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            dimension,
        };

        match store.collection_info().await? {
            Some(info) => {
                if let Some(size) = info.vector_size() {
                    if size != dimension {
                        return Err(MemoryError::DimensionMismatch { expected: dimension, actual: size });
                    }
                }
                debug!(collection, "qdrant collection exists");
            }
            None => {
                store.create_collection().await?;
                info!(collection, dimension, "qdrant collection created");
            }
        }
        Ok(store)
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, MemoryError> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let body: QdrantResponse<CollectionInfo> = response
            .json()
            .await
            .map_err(|e| MemoryError::Backend(format!("bad collection info: {e}")))?;
        Ok(Some(body.result))
    }

    async fn create_collection(&self) -> Result<(), MemoryError> {
        let body = json!({ "vectors": { "size": self.dimension, "distance": "Cosine" } });
        let response = self
            .client
            .put(self.collection_url())
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await.map(|_| ())
    }

    /// Upload points in chunks of [`UPSERT_CHUNK`].
    ///
    /// A chunk failure after earlier chunks landed reports how many made it.
    pub async fn upsert(&self, records: &[MemoryRecord]) -> Result<(), MemoryError> {
        let total = records.len();
        let mut stored = 0;
        for chunk in records.chunks(UPSERT_CHUNK) {
            let points: Vec<Point<'_>> = chunk.iter().map(Point::from_record).collect();
            let result = async {
                let response = self
                    .client
                    .put(format!("{}/points?wait=true", self.collection_url()))
                    .json(&json!({ "points": points }))
                    .send()
                    .await
                    .map_err(transport)?;
                check_status(response).await.map(|_| ())
            }
            .await;

            match result {
                Ok(()) => stored += chunk.len(),
                Err(e) if stored == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(stored, total, error = %e, "qdrant upsert failed part-way");
                    return Err(MemoryError::PartialBatch { stored, total });
                }
            }
        }
        debug!(total, "qdrant upsert complete");
        Ok(())
    }

    pub async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MemoryFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
            "with_vector": true,
        });
        if let Some(f) = filter.filter(|f| !f.is_empty()) {
            body["filter"] = filter_json(f);
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let parsed: QdrantResponse<Vec<ScoredPoint>> = response
            .json()
            .await
            .map_err(|e| MemoryError::Backend(format!("bad search response: {e}")))?;

        parsed
            .result
            .into_iter()
            .map(|p| {
                let score = p.score;
                p.into_record().map(|r| (r, score))
            })
            .collect()
    }

    pub async fn count(&self) -> Result<u64, MemoryError> {
        let info = self
            .collection_info()
            .await?
            .ok_or_else(|| MemoryError::Backend(format!("collection {} is missing", self.collection)))?;
        Ok(info.points_count.unwrap_or(0))
    }

    /// Drop and recreate the collection.
    pub async fn reset(&self) -> Result<(), MemoryError> {
        let response = self
            .client
            .delete(self.collection_url())
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::NOT_FOUND {
            check_status(response).await?;
        }
        self.create_collection().await?;
        info!(collection = %self.collection, "qdrant collection reset");
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> MemoryError {
    MemoryError::Backend(format!("qdrant request failed: {e}"))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MemoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MemoryError::Backend(format!("qdrant HTTP {status}: {body}")))
}

fn filter_json(filter: &MemoryFilter) -> Value {
    let mut must = Vec::new();
    if let Some(source) = &filter.source {
        must.push(json!({ "key": "source", "match": { "value": source } }));
    }
    if let Some(kind) = filter.kind {
        must.push(json!({ "key": "kind", "match": { "value": kind.as_str() } }));
    }
    json!({ "must": must })
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    points_count: Option<u64>,
    #[serde(default)]
    config: Option<Value>,
}

impl CollectionInfo {
    fn vector_size(&self) -> Option<usize> {
        self.config
            .as_ref()?
            .pointer("/params/vectors/size")?
            .as_u64()
            .map(|s| s as usize)
    }
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    text: &'a str,
    #[serde(flatten)]
    metadata: &'a RecordMetadata,
}

#[derive(Debug, Serialize)]
struct Point<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: Payload<'a>,
}

impl<'a> Point<'a> {
    fn from_record(r: &'a MemoryRecord) -> Self {
        Self {
            id: &r.id,
            vector: &r.vector,
            payload: Payload { text: &r.text, metadata: &r.metadata },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoredPayload {
    text: String,
    #[serde(flatten)]
    metadata: RecordMetadata,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    payload: Option<StoredPayload>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

impl ScoredPoint {
    fn into_record(self) -> Result<MemoryRecord, MemoryError> {
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let payload = self
            .payload
            .ok_or_else(|| MemoryError::Backend(format!("point {id} has no payload")))?;
        Ok(MemoryRecord {
            id,
            text: payload.text,
            vector: self.vector.unwrap_or_default(),
            metadata: payload.metadata,
        })
    }
}
