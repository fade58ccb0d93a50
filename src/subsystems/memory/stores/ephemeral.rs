//! `ephemeral` backend: in-process vector store.
//!
//! Records live in process memory and are discarded on exit. Search is a
//! linear cosine scan, which is fine for the record counts a terminal session
//! produces.

use std::sync::Mutex;

use super::super::MemoryError;
use super::super::types::{MemoryFilter, MemoryRecord};

pub struct EphemeralStore {
    records: Mutex<Vec<MemoryRecord>>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self { records: Mutex::new(Vec::new()) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<MemoryRecord>>, MemoryError> {
        self.records
            .lock()
            .map_err(|_| MemoryError::Backend("ephemeral store lock poisoned".into()))
    }

    /// Append all records under one lock acquisition.
    pub fn insert_all(&self, records: Vec<MemoryRecord>) -> Result<(), MemoryError> {
        self.lock()?.extend(records);
        Ok(())
    }

    /// Top `top_k` records by descending cosine similarity.
    pub fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MemoryFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        let records = self.lock()?;
        let mut scored: Vec<(MemoryRecord, f32)> = records
            .iter()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| (r.clone(), cosine(vector, &r.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    pub fn count(&self) -> Result<u64, MemoryError> {
        Ok(self.lock()?.len() as u64)
    }

    pub fn clear(&self) -> Result<(), MemoryError> {
        self.lock()?.clear();
        Ok(())
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity. Zero-length vectors score 0.
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
