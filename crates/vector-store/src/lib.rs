//! # Thai Food Vector Store
//!
//! Embedding and similarity ranking for the Thai food corpus.
//!
//! ## Architecture
//!
//! ```text
//! Corpus (search_text per record)
//!     │
//!     ├──> EmbeddingCache::embed_corpus (single-flight, once per version)
//!     │      └─> Embedder::embed_batch ──> VectorMatrix[N × D]
//!     │
//! query text
//!     │
//!     ├──> EmbeddingCache::embed_query (optional LRU)
//!     │      └─> Vector[D]
//!     │
//!     └──> rank(query, matrix, k)
//!            └─> RankedHit[min(k, N)]  (score desc, id asc)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use thaifood_corpus::{Corpus, RawRow, SearchTextPolicy};
//! use thaifood_vector_store::{rank, EmbeddingCache, EmbeddingModel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let rows = vec![RawRow::new().with_field("text", "ต้มยำกุ้ง")];
//!     let corpus = Corpus::load(rows, &SearchTextPolicy::new(["text"])?)?;
//!
//!     let cache = EmbeddingCache::new(EmbeddingModel::stub(384), 128);
//!     let matrix = cache.embed_corpus(&corpus).await?;
//!     let query = cache.embed_query("ต้มยำ").await?;
//!
//!     for hit in rank(&query, &matrix, 3)? {
//!         println!("{}: {:.3}", hit.record_id, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

mod embedding_cache;
mod embeddings;
mod error;
mod http;
mod matrix;
mod ranker;

pub use embedding_cache::{CacheStats, EmbeddingCache};
pub use embeddings::{
    Embedder, EmbeddingMode, EmbeddingModel, StubEmbedder, DEFAULT_DIMENSION, DEFAULT_TIMEOUT,
    STUB_MODEL_ID,
};
pub use error::{Result, VectorStoreError};
pub use http::{HttpEmbedder, HttpEmbedderConfig};
pub use matrix::VectorMatrix;
pub use ranker::{rank, RankedHit, DEGENERATE_SCORE};

// Re-export corpus types for convenience
pub use thaifood_corpus::{Corpus, CorpusVersion, RecordId};
