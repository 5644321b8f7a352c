use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorStoreError {
    /// The embedding backend failed or returned something unusable
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// The embedding backend did not answer within the caller's budget
    #[error("Embedding call timed out after {timeout_ms} ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    /// The backend returned a vector of the wrong length
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Query and corpus vectors come from different vector spaces
    #[error("Dimension mismatch: corpus matrix has {expected} columns, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VectorStoreError {
    pub fn service(msg: impl Into<String>) -> Self {
        Self::EmbeddingService(msg.into())
    }

    /// Failures the caller may reasonably retry with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingService(_) | Self::EmbeddingTimeout { .. } | Self::InvalidDimension { .. }
        )
    }
}
