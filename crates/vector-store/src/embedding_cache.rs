use crate::embeddings::EmbeddingModel;
use crate::error::{Result, VectorStoreError};
use crate::matrix::VectorMatrix;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thaifood_corpus::{Corpus, CorpusVersion};
use tokio::sync::OnceCell;

/// Corpus matrices are keyed by model, output width and content version, so
/// neither a model swap nor a corpus edit can surface vectors from another
/// snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MatrixKey {
    model_id: String,
    dimension: usize,
    version: CorpusVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct QueryKey {
    model_id: String,
    dimension: usize,
    text: String,
}

type MatrixSlot = Arc<OnceCell<Arc<VectorMatrix>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Batch embedding runs started for corpora
    pub corpus_embeddings: usize,
    /// Corpus versions currently holding a finished matrix
    pub cached_versions: usize,
    pub query_hits: usize,
    pub query_misses: usize,
}

/// Process-owned cache of corpus matrices and (optionally) query vectors.
///
/// Concurrent `embed_corpus` calls for the same version converge on one
/// in-flight computation; waiters never observe a partial matrix. A failed
/// computation stores nothing, so the next caller retries.
pub struct EmbeddingCache {
    model: EmbeddingModel,
    matrices: Mutex<HashMap<MatrixKey, MatrixSlot>>,
    queries: Option<Mutex<LruCache<QueryKey, Arc<Vec<f32>>>>>,
    corpus_embeddings: AtomicUsize,
    query_hits: AtomicUsize,
    query_misses: AtomicUsize,
}

impl EmbeddingCache {
    /// `query_capacity == 0` disables query memoization.
    #[must_use]
    pub fn new(model: EmbeddingModel, query_capacity: usize) -> Self {
        let queries = NonZeroUsize::new(query_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            model,
            matrices: Mutex::new(HashMap::new()),
            queries,
            corpus_embeddings: AtomicUsize::new(0),
            query_hits: AtomicUsize::new(0),
            query_misses: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    fn key_for(&self, version: &CorpusVersion) -> MatrixKey {
        MatrixKey {
            model_id: self.model.model_id().to_string(),
            dimension: self.model.dimension(),
            version: version.clone(),
        }
    }

    fn lock_matrices(&self) -> MutexGuard<'_, HashMap<MatrixKey, MatrixSlot>> {
        self.matrices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Embeds every record's search text in one batch call, at most once per
    /// corpus version.
    pub async fn embed_corpus(&self, corpus: &Corpus) -> Result<Arc<VectorMatrix>> {
        let key = self.key_for(corpus.version());
        let slot = {
            let mut guard = self.lock_matrices();
            if !guard.contains_key(&key) {
                // Older entries for this version were produced by a model
                // that no longer answers under this key.
                guard.retain(|other, _| other.version != key.version);
            }
            guard
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let matrix = slot
            .get_or_try_init(|| self.compute_matrix(corpus))
            .await?;
        Ok(matrix.clone())
    }

    async fn compute_matrix(&self, corpus: &Corpus) -> Result<Arc<VectorMatrix>> {
        self.corpus_embeddings.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "Embedding {} records with '{}' (version {})",
            corpus.len(),
            self.model.model_id(),
            corpus.version().short()
        );
        let started = Instant::now();

        let vectors = self.model.embed_batch(&corpus.search_texts()).await?;
        let matrix = VectorMatrix::from_rows(vectors, self.model.dimension())?;
        if matrix.rows() != corpus.len() {
            return Err(VectorStoreError::service(format!(
                "Corpus matrix has {} rows for {} records",
                matrix.rows(),
                corpus.len()
            )));
        }

        log::info!(
            "Embedded corpus version {} in {} ms",
            corpus.version().short(),
            started.elapsed().as_millis()
        );
        Ok(Arc::new(matrix))
    }

    /// Finished matrix for this corpus, without triggering any embedding.
    #[must_use]
    pub fn cached_matrix(&self, corpus: &Corpus) -> Option<Arc<VectorMatrix>> {
        let guard = self.lock_matrices();
        guard
            .get(&self.key_for(corpus.version()))
            .and_then(|slot| slot.get().cloned())
    }

    /// Drops every matrix held for `version`. Searches already holding one
    /// keep their `Arc`; the next `embed_corpus` for that version recomputes.
    pub fn invalidate(&self, version: &CorpusVersion) -> bool {
        let removed = {
            let mut guard = self.lock_matrices();
            let before = guard.len();
            guard.retain(|key, _| &key.version != version);
            guard.len() != before
        };
        if removed {
            log::info!("Invalidated cached vectors for version {}", version.short());
        }
        removed
    }

    pub async fn embed_query(&self, text: &str) -> Result<Arc<Vec<f32>>> {
        let Some(queries) = &self.queries else {
            return Ok(Arc::new(self.model.embed(text).await?));
        };

        let key = QueryKey {
            model_id: self.model.model_id().to_string(),
            dimension: self.model.dimension(),
            text: text.to_string(),
        };
        let cached = queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(vector) = cached {
            self.query_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector);
        }

        self.query_misses.fetch_add(1, Ordering::Relaxed);
        let vector = Arc::new(self.model.embed(text).await?);
        queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, vector.clone());
        Ok(vector)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let cached_versions = self
            .lock_matrices()
            .values()
            .filter(|slot| slot.initialized())
            .count();
        CacheStats {
            corpus_embeddings: self.corpus_embeddings.load(Ordering::SeqCst),
            cached_versions,
            query_hits: self.query_hits.load(Ordering::Relaxed),
            query_misses: self.query_misses.load(Ordering::Relaxed),
        }
    }
}
