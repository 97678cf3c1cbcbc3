use thiserror::Error;

/// Result type for document operations
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur against the document store
#[derive(Error, Debug)]
pub enum DocError {
    #[error("Document not found: {key}")]
    NotFound { key: String },

    #[error("Store backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DocError {
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }
}
