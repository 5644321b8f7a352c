use crate::error::{Result, SearchError};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thaifood_corpus::{Corpus, CorpusVersion, Record};
use thaifood_vector_store::{rank, EmbeddingCache, VectorMatrix, VectorStoreError};

/// One ranked record, joined back to its corpus entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub record: Record,
    pub score: f32,
}

/// A corpus and, once prepared, the vectors computed for it. Swapped as one
/// unit so a search never pairs records with another version's matrix.
struct Snapshot {
    corpus: Arc<Corpus>,
    matrix: Option<Arc<VectorMatrix>>,
}

/// Orchestrates query embedding, ranking and record lookup over a shared,
/// read-only corpus snapshot.
///
/// Each search pins the snapshot current when it starts. A concurrent
/// [`SearchSession::reload`] embeds the new corpus before publishing it, so
/// readers see either the fully-old or the fully-new corpus.
pub struct SearchSession {
    cache: Arc<EmbeddingCache>,
    snapshot: RwLock<Arc<Snapshot>>,
    fault: Mutex<Option<String>>,
}

impl SearchSession {
    #[must_use]
    pub fn new(cache: Arc<EmbeddingCache>, corpus: Corpus) -> Self {
        Self {
            cache,
            snapshot: RwLock::new(Arc::new(Snapshot {
                corpus: Arc::new(corpus),
                matrix: None,
            })),
            fault: Mutex::new(None),
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current corpus snapshot.
    #[must_use]
    pub fn corpus(&self) -> Arc<Corpus> {
        self.snapshot().corpus.clone()
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Startup step: embeds the current corpus (once per version and model)
    /// and clears any fault left by a previous model mismatch.
    pub async fn prepare(&self) -> Result<CorpusVersion> {
        let corpus = self.corpus();
        let matrix = self.cache.embed_corpus(&corpus).await?;
        {
            let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            // A reload that finished meanwhile already published its own vectors.
            if guard.corpus.version() == corpus.version() {
                *guard = Arc::new(Snapshot {
                    corpus: guard.corpus.clone(),
                    matrix: Some(matrix.clone()),
                });
            }
        }
        log::info!(
            "Search session ready: {} records × {} dims (version {})",
            matrix.rows(),
            matrix.dimension(),
            corpus.version().short()
        );
        self.set_fault(None);
        Ok(corpus.version().clone())
    }

    /// Embeds `corpus`, then publishes it in place of the current snapshot.
    /// Returns whether the content version changed.
    ///
    /// Searches keep answering from the previous snapshot until the new
    /// vectors are ready. If embedding fails nothing is swapped. The previous
    /// version's vectors are dropped from the cache once it is replaced.
    pub async fn reload(&self, corpus: Corpus) -> Result<bool> {
        let next = Arc::new(corpus);
        let matrix = self.cache.embed_corpus(&next).await?;
        let previous = {
            let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(
                &mut *guard,
                Arc::new(Snapshot {
                    corpus: next.clone(),
                    matrix: Some(matrix),
                }),
            )
        };
        // The published matrix was just computed with the current model.
        self.set_fault(None);

        let changed = previous.corpus.version() != next.version();
        if changed {
            self.cache.invalidate(previous.corpus.version());
            log::info!(
                "Corpus reloaded: version {} -> {} ({} records)",
                previous.corpus.version().short(),
                next.version().short(),
                next.len()
            );
        } else {
            log::debug!("Corpus reload with unchanged content; keeping cached vectors");
        }
        Ok(changed)
    }

    /// Returns `min(top_k, N)` hits, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if let Some(reason) = self.fault() {
            return Err(SearchError::Faulted(reason));
        }

        let snapshot = self.snapshot();
        let corpus = &snapshot.corpus;
        let matrix = snapshot
            .matrix
            .clone()
            .ok_or_else(|| SearchError::CorpusNotEmbedded(corpus.version().to_string()))?;

        log::debug!("Searching for '{query}' (top_k: {top_k})");
        let query_vector = self.cache.embed_query(query).await?;

        let ranked = match rank(&query_vector, &matrix, top_k) {
            Ok(ranked) => ranked,
            Err(err @ VectorStoreError::DimensionMismatch { .. }) => {
                log::warn!("Refusing further searches until re-embedding: {err}");
                self.set_fault(Some(err.to_string()));
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let hits = ranked
            .into_iter()
            .map(|hit| {
                corpus
                    .get(hit.record_id)
                    .map(|record| SearchHit {
                        record: record.clone(),
                        score: hit.score,
                    })
                    .ok_or_else(|| {
                        SearchError::Faulted(format!(
                            "ranked record {} is not in corpus version {}",
                            hit.record_id,
                            corpus.version().short()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Found {} results", hits.len());
        Ok(hits)
    }

    fn fault(&self) -> Option<String> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_fault(&self, reason: Option<String>) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = reason;
    }
}
