use thiserror::Error;

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors raised while building a corpus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    /// Input rows or the text policy are unusable; fatal to startup
    #[error("Malformed corpus input: {0}")]
    MalformedInput(String),
}

impl CorpusError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}
