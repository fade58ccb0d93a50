//! Memory backends. Closed set, enum dispatch.

pub mod ephemeral;
pub mod qdrant;

use super::MemoryError;
use super::types::{BackendMode, MemoryFilter, MemoryRecord};

pub enum Backend {
    Ephemeral(ephemeral::EphemeralStore),
    Remote(qdrant::QdrantStore),
}

impl Backend {
    pub fn mode(&self) -> BackendMode {
        match self {
            Backend::Ephemeral(_) => BackendMode::Ephemeral,
            Backend::Remote(_) => BackendMode::Remote,
        }
    }

    /// Records must already be validated.
    pub async fn insert(&self, records: Vec<MemoryRecord>) -> Result<(), MemoryError> {
        match self {
            Backend::Ephemeral(s) => s.insert_all(records),
            Backend::Remote(s) => s.upsert(&records).await,
        }
    }

    pub async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MemoryFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        match self {
            Backend::Ephemeral(s) => s.search(vector, top_k, filter),
            Backend::Remote(s) => s.search(vector, top_k, filter).await,
        }
    }

    pub async fn count(&self) -> Result<u64, MemoryError> {
        match self {
            Backend::Ephemeral(s) => s.count(),
            Backend::Remote(s) => s.count().await,
        }
    }

    pub async fn reset(&self) -> Result<(), MemoryError> {
        match self {
            Backend::Ephemeral(s) => s.clear(),
            Backend::Remote(s) => s.reset().await,
        }
    }
}
