//! Memory subsystem: vector store for ingested text.
//!
//! [`MemoryStore`] is built once at startup and lives for the whole process.
//! It validates every vector against the configured dimension, then hands
//! records to one of two backends:
//!
//! * **ephemeral**: in-process, mutex-guarded, lost on exit.
//! * **remote**: a Qdrant collection spoken to over REST.
//!
//! If a remote backend is configured but cannot be reached, [`MemoryStore::connect`]
//! logs a warning and falls back to ephemeral. It never fails.

pub mod stores;
pub mod types;

pub use types::{BackendMode, MemoryFilter, MemoryRecord, MemoryStats, NewRecord, RecordKind, RecordMetadata};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MemoryConfig;
use stores::Backend;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Remote upload stopped part-way; the first `stored` records landed.
    #[error("batch partially stored: {stored} of {total} records")]
    PartialBatch { stored: usize, total: usize },
    #[error("memory backend error: {0}")]
    Backend(String),
}

pub struct MemoryStore {
    backend: Backend,
    dimension: usize,
}

impl MemoryStore {
    /// Connect to the configured backend, falling back to ephemeral.
    pub async fn connect(config: &MemoryConfig) -> Self {
        let Some(url) = config.backend_url.as_deref() else {
            info!(dimension = config.vector_dimension, "memory: ephemeral backend");
            return Self::ephemeral(config.vector_dimension);
        };

        match stores::qdrant::QdrantStore::connect(
            url,
            &config.collection,
            config.vector_dimension,
            config.connect_timeout_seconds,
        )
        .await
        {
            Ok(remote) => {
                info!(%url, collection = %config.collection, "memory: remote backend");
                Self { backend: Backend::Remote(remote), dimension: config.vector_dimension }
            }
            Err(e) => {
                warn!(%url, error = %e, "memory: remote backend unavailable, using ephemeral");
                Self::ephemeral(config.vector_dimension)
            }
        }
    }

    pub fn ephemeral(dimension: usize) -> Self {
        Self {
            backend: Backend::Ephemeral(stores::ephemeral::EphemeralStore::new()),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), MemoryError> {
        if vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Store one record and return its id.
    pub async fn add(
        &self,
        text: String,
        vector: Vec<f32>,
        metadata: RecordMetadata,
    ) -> Result<String, MemoryError> {
        let mut ids = self.add_batch(vec![NewRecord { text, vector, metadata }]).await?;
        ids.pop()
            .ok_or_else(|| MemoryError::Backend("no id returned for stored record".into()))
    }

    /// Store several records. Nothing is written if any vector has the
    /// wrong dimension.
    pub async fn add_batch(&self, records: Vec<NewRecord>) -> Result<Vec<String>, MemoryError> {
        for r in &records {
            self.check_dimension(&r.vector)?;
        }

        let records: Vec<MemoryRecord> = records
            .into_iter()
            .map(|r| MemoryRecord {
                id: uuid::Uuid::new_v4().to_string(),
                text: r.text,
                vector: r.vector,
                metadata: r.metadata,
            })
            .collect();
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        self.backend.insert(records).await?;
        debug!(count = ids.len(), "memory: records stored");
        Ok(ids)
    }

    /// Most similar records first, at most `top_k`.
    pub async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MemoryFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        self.check_dimension(vector)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        self.backend.search(vector, top_k, filter).await
    }

    pub async fn stats(&self) -> Result<MemoryStats, MemoryError> {
        Ok(MemoryStats {
            record_count: self.backend.count().await?,
            vector_dimension: self.dimension,
            backend_mode: self.backend.mode(),
        })
    }

    /// Remove every record.
    pub async fn reset(&self) -> Result<(), MemoryError> {
        self.backend.reset().await?;
        info!("memory: reset");
        Ok(())
    }
}
