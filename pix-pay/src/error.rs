use thiserror::Error;

/// Result type for processor calls
pub type PayResult<T> = Result<T, PayError>;

/// Errors surfaced by the payment processor boundary
#[derive(Error, Debug)]
pub enum PayError {
    /// The processor answered and said no. `code` is the processor's
    /// own stable code and is safe to forward to clients.
    #[error("processor rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// We never got a usable answer.
    #[error("processor transport failure: {source}")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The processor answered something we could not interpret.
    #[error("unexpected processor response: {message}")]
    Protocol { message: String },
}

impl PayError {
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            source: Box::new(error),
        }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// The stable code to surface to a client, if there is one.
    pub fn stable_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}
