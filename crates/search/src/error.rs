use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] thaifood_vector_store::VectorStoreError),

    #[error("Corpus error: {0}")]
    CorpusError(#[from] thaifood_corpus::CorpusError),

    #[error("Empty query")]
    EmptyQuery,

    /// `prepare` has not embedded the current corpus version yet
    #[error("Corpus version {0} has not been embedded; call prepare() first")]
    CorpusNotEmbedded(String),

    /// A dimension mismatch was observed; serving stops until the corpus is
    /// re-embedded with the current model
    #[error("Search session is faulted: {0}")]
    Faulted(String),
}

impl SearchError {
    /// Transient embedding failures the caller may retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::VectorStoreError(err) => err.is_retryable(),
            _ => false,
        }
    }
}
