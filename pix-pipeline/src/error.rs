use thiserror::Error;

use pix_blob::BlobError;
use pix_docs::DocError;

/// Errors that abort one pipeline invocation. All of these are
/// retryable from the host's point of view: the invocation failed as
/// a whole and may be redelivered.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("blob store failure: {0}")]
    Blob(#[from] BlobError),

    #[error("document store failure: {0}")]
    Docs(#[from] DocError),

    #[error("image decode/encode failure: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot derive an output key from {key}")]
    UnderivableKey { key: String },

    #[error("preview task failed: {0}")]
    Task(String),
}
