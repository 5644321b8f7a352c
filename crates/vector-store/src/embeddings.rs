use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Output size of the Thai food mpnet models.
pub const DEFAULT_DIMENSION: usize = 768;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const STUB_MODEL_ID: &str = "stub-trigram";

const STUB_NGRAM: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Offline deterministic embedder, no model required
    Stub,
    /// Remote text-embeddings-inference style service
    Http,
}

impl EmbeddingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Http => "http",
        }
    }
}

impl FromStr for EmbeddingMode {
    type Err = VectorStoreError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "http" => Ok(Self::Http),
            other => Err(VectorStoreError::InvalidConfig(format!(
                "Unsupported embedding mode '{other}' (expected 'stub' or 'http')"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps text to fixed-length vectors. Implementations must be deterministic
/// for a fixed model version and must preserve input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Shared handle to one embedder, with a mandatory per-call timeout and
/// validation of everything the backend returns.
#[derive(Clone)]
pub struct EmbeddingModel {
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl fmt::Debug for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("model_id", &self.embedder.model_id())
            .field("dimension", &self.embedder.dimension())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EmbeddingModel {
    pub fn new(embedder: Arc<dyn Embedder>, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(VectorStoreError::InvalidConfig(
                "embedding timeout must be greater than zero".to_string(),
            ));
        }
        if embedder.dimension() == 0 {
            return Err(VectorStoreError::InvalidConfig(format!(
                "embedding model '{}' reports dimension 0",
                embedder.model_id()
            )));
        }
        Ok(Self { embedder, timeout })
    }

    /// Stub-backed model, mostly for tests and offline runs.
    #[must_use]
    pub fn stub(dimension: usize) -> Self {
        Self {
            embedder: Arc::new(StubEmbedder::new(dimension.max(1))),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::service("Empty embedding result"))
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let vectors = tokio::time::timeout(self.timeout, self.embedder.embed_batch(texts))
            .await
            .map_err(|_| VectorStoreError::EmbeddingTimeout { timeout_ms })??;

        if vectors.len() != texts.len() {
            return Err(VectorStoreError::service(format!(
                "Model '{}' returned {} vectors for {} inputs",
                self.model_id(),
                vectors.len(),
                texts.len()
            )));
        }
        let expected = self.dimension();
        for vector in &vectors {
            ensure_dimension(vector, expected)?;
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(VectorStoreError::service(format!(
                    "Model '{}' returned a non-finite embedding",
                    self.model_id()
                )));
            }
        }
        Ok(vectors)
    }

    /// Pairwise cosine similarity; 0.0 for mismatched lengths or zero vectors.
    #[must_use]
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

const fn ensure_dimension(vec: &[f32], expected: usize) -> Result<()> {
    if vec.len() != expected {
        return Err(VectorStoreError::InvalidDimension {
            expected,
            actual: vec.len(),
        });
    }
    Ok(())
}

/// Deterministic offline embedder.
///
/// Each whitespace token is split into grapheme trigrams (Thai is written
/// without spaces, so this is what gives shared dish words shared features),
/// and every trigram is hashed into a signed bucket. Texts sharing substrings
/// land close under cosine similarity; empty text maps to the zero vector.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
    latency: Duration,
    batch_calls: Arc<AtomicUsize>,
}

impl StubEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            latency: Duration::ZERO,
            batch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside every batch call, simulating a remote service.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        STUB_MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0_f32; dimension];
    if dimension == 0 {
        return vec;
    }
    for token in text.split_whitespace() {
        let token = token.to_lowercase();
        let graphemes: Vec<&str> = token.graphemes(true).collect();
        if graphemes.len() < STUB_NGRAM {
            add_feature(&mut vec, &token);
            continue;
        }
        for window in graphemes.windows(STUB_NGRAM) {
            add_feature(&mut vec, &window.concat());
        }
    }
    normalize(&mut vec);
    vec
}

fn add_feature(vec: &mut [f32], feature: &str) {
    let mut state = fnv1a_64(feature.as_bytes());
    let bits = splitmix64(&mut state);
    #[allow(clippy::cast_possible_truncation)]
    let bucket = (bits % vec.len() as u64) as usize;
    let sign = if bits >> 63 == 0 { 1.0 } else { -1.0 };
    vec[bucket] += sign;
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
