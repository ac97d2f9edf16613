use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tagwise_core::{Correction, CorrectionBackend, CorrectionId, PatternKey};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    rows: HashMap<CorrectionId, Correction>,
    by_key: HashMap<PatternKey, CorrectionId>,
}

/// A process-local backend. Each instance owns its own tables; clones share
/// them.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl CorrectionBackend for MemoryBackend {
    type Error = Infallible;

    async fn get(&self, id: CorrectionId) -> Result<Option<Correction>, Infallible> {
        Ok(self.tables.read().await.rows.get(&id).cloned())
    }

    async fn find(&self, key: &PatternKey) -> Result<Option<Correction>, Infallible> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_key
            .get(key)
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    async fn scan(&self, min_confidence: f64) -> Result<Vec<Correction>, Infallible> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Correction> = tables
            .rows
            .values()
            .filter(|c| c.confidence >= min_confidence)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert(&self, correction: &Correction) -> Result<bool, Infallible> {
        let mut tables = self.tables.write().await;
        let key = correction.key();
        if tables.by_key.contains_key(&key) || tables.rows.contains_key(&correction.id) {
            return Ok(false);
        }
        tables.by_key.insert(key, correction.id);
        tables.rows.insert(correction.id, correction.clone());
        Ok(true)
    }

    async fn replace(
        &self,
        correction: &Correction,
        expected_revision: u64,
    ) -> Result<bool, Infallible> {
        let mut tables = self.tables.write().await;
        match tables.rows.get_mut(&correction.id) {
            Some(stored) if stored.revision == expected_revision => {
                // pattern and match_type are immutable, so by_key stays valid.
                let (pattern, match_type) = (stored.pattern.clone(), stored.match_type);
                *stored = Correction {
                    pattern,
                    match_type,
                    ..correction.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(
        &self,
        id: CorrectionId,
        expected_revision: Option<u64>,
    ) -> Result<bool, Infallible> {
        let mut tables = self.tables.write().await;
        let matches = tables
            .rows
            .get(&id)
            .is_some_and(|c| expected_revision.is_none_or(|r| c.revision == r));
        if !matches {
            return Ok(false);
        }
        if let Some(removed) = tables.rows.remove(&id) {
            tables.by_key.remove(&removed.key());
        }
        Ok(true)
    }
}
