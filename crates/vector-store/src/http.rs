use crate::embeddings::Embedder;
use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Connection settings for a remote embedding service.
#[derive(Clone)]
pub struct HttpEmbedderConfig {
    /// Full URL of the embed route, e.g. `http://127.0.0.1:8080/embed`
    pub endpoint: String,
    pub model_id: String,
    pub dimension: usize,
    /// Largest number of texts sent per request
    pub max_batch: usize,
    /// Sent as a bearer token; read from the environment, never from files
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl fmt::Debug for HttpEmbedderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbedderConfig")
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .field("max_batch", &self.max_batch)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

/// Embedder backed by a text-embeddings-inference compatible HTTP service.
///
/// The service receives `{"inputs": [...], "truncate": true}` and answers with
/// one vector per input, in order.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(VectorStoreError::InvalidConfig(
                "embedding endpoint is empty".to_string(),
            ));
        }
        if config.max_batch == 0 {
            return Err(VectorStoreError::InvalidConfig(
                "embedding max_batch must be at least 1".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| VectorStoreError::service(format!("HTTP client setup failed: {e}")))?;
        log::info!(
            "Using remote embedding model '{}' at {}",
            config.model_id,
            config.endpoint
        );
        Ok(Self { client, config })
    }

    fn timeout_error(&self) -> VectorStoreError {
        VectorStoreError::EmbeddingTimeout {
            timeout_ms: u64::try_from(self.config.request_timeout.as_millis())
                .unwrap_or(u64::MAX),
        }
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self.client.post(&self.config.endpoint).json(&EmbedRequest {
            inputs: chunk,
            truncate: true,
        });
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                VectorStoreError::service(format!("Embedding request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(VectorStoreError::service(format!(
                "Embedding service returned HTTP {status}: {snippet}"
            )));
        }

        response.json::<Vec<Vec<f32>>>().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                VectorStoreError::service(format!("Bad embedding response body: {e}"))
            }
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.max_batch) {
            log::debug!("Embedding request with {} texts", chunk.len());
            out.extend(self.embed_chunk(chunk).await?);
        }
        Ok(out)
    }
}
